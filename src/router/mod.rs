//! 请求路由
//!
//! 为每个聊天请求选择 Provider、模型和凭证，并保证发往上游的消息列表以 system 消息开头。
//!
//! ```text
//! ChatRequest ──> 校验非空 ──> 解析 Provider ──> 解析模型 ──> 注入系统提示词 ──> ResolvedInvocation
//!                                                                           ├─ stream=true  ─> translator
//!                                                                           └─ stream=false ─> ChatResponse
//! ```

use crate::config::AppConfig;
use crate::error::RelayError;
use crate::logger::sanitize_log_message;
use crate::models::{ChatMessage, ChatRequest, ChatResponse, ModelsResponse, ServiceInfo};
use crate::providers::{ChatProvider, ProviderEntry, ProviderPool};
use crate::stream::translate_stream;
use futures::Stream;
use std::sync::Arc;


/// 一次请求解析后的调用参数
#[derive(Clone)]
pub struct ResolvedInvocation {
    pub provider: String,
    pub client: Arc<dyn ChatProvider>,
    pub model: String,
    /// 调用方未提供 system 消息时，第一条为默认系统提示词
    pub messages: Vec<ChatMessage>,
}

impl std::fmt::Debug for ResolvedInvocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedInvocation")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("messages", &self.messages)
            .finish()
    }
}

impl ResolvedInvocation {
    /// 非流式调用
    pub async fn complete(&self) -> Result<ChatResponse, RelayError> {
        tracing::info!(
            "[CHAT] sending non-streaming request using {} with model {}",
            self.provider,
            self.model
        );
        match self
            .client
            .chat_completion(&self.model, &self.messages)
            .await
        {
            Ok(content) => Ok(ChatResponse::assistant(content)),
            Err(e) => {
                let message = e.to_string();
                tracing::error!(
                    "[CHAT] {} completion failed: {}",
                    self.provider,
                    sanitize_log_message(&message)
                );
                Err(RelayError::ProviderError {
                    provider: self.provider.clone(),
                    message,
                })
            }
        }
    }

    /// 流式调用，返回已分帧的事件流；错误以带内哨兵结束
    pub fn into_event_stream(self) -> impl Stream<Item = String> + Send {
        tracing::info!(
            "[STREAM] streaming response using {} with model {}",
            self.provider,
            self.model
        );
        let ResolvedInvocation {
            client,
            model,
            messages,
            ..
        } = self;
        translate_stream(async move { client.chat_completion_stream(&model, &messages).await })
    }
}

/// 请求路由器
///
/// Provider 池、默认 Provider 和系统提示词在启动时确定，之后只读。
#[derive(Debug, Clone)]
pub struct RequestRouter {
    pool: ProviderPool,
    default_provider: String,
    system_prompt: String,
}

impl RequestRouter {
    pub fn new(
        pool: ProviderPool,
        default_provider: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            pool,
            default_provider: default_provider.into(),
            system_prompt: system_prompt.into(),
        }
    }

    pub fn from_config(config: &AppConfig, pool: ProviderPool) -> Self {
        Self::new(
            pool,
            config.default_provider.clone(),
            config.system_prompt.clone(),
        )
    }

    pub fn default_provider(&self) -> &str {
        &self.default_provider
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// 默认 Provider 的默认模型
    pub fn default_model(&self) -> &str {
        self.pool
            .get(&self.default_provider)
            .map(|entry| entry.config.default_model.as_str())
            .unwrap_or_default()
    }

    pub fn service_info(&self) -> ServiceInfo {
        ServiceInfo {
            message: "AI Streaming API".to_string(),
            system_prompt: self.system_prompt.clone(),
            current_provider: self.default_provider.clone(),
            default_model: self.default_model().to_string(),
        }
    }

    /// 请求指定的 Provider，否则使用默认 Provider
    pub fn resolve_provider(&self, requested: Option<&str>) -> Result<&ProviderEntry, RelayError> {
        let name = requested
            .filter(|p| !p.is_empty())
            .unwrap_or(self.default_provider.as_str());
        self.pool
            .get(name)
            .ok_or_else(|| RelayError::UnsupportedProvider(name.to_string()))
    }

    pub fn resolve(&self, request: &ChatRequest) -> Result<ResolvedInvocation, RelayError> {
        if request.messages.is_empty() {
            return Err(RelayError::InvalidInput);
        }

        let entry = self.resolve_provider(request.requested_provider())?;
        let model = request
            .requested_model()
            .unwrap_or(entry.config.default_model.as_str())
            .to_string();

        Ok(ResolvedInvocation {
            provider: entry.config.name.clone(),
            client: entry.client.clone(),
            model,
            messages: with_system_prompt(&request.messages, &self.system_prompt),
        })
    }

    /// 查询 Provider 的模型列表
    pub async fn list_models(&self, provider: Option<&str>) -> Result<ModelsResponse, RelayError> {
        let entry = self.resolve_provider(provider)?;
        let name = entry.config.name.clone();

        match entry.client.list_models().await {
            Ok(models) => {
                tracing::info!("[MODELS] {} returned {} models", name, models.len());
                Ok(ModelsResponse { models })
            }
            Err(e) => {
                let message = e.to_string();
                tracing::error!(
                    "[MODELS] listing models for {} failed: {}",
                    name,
                    sanitize_log_message(&message)
                );
                Err(RelayError::ModelListError {
                    provider: name,
                    message,
                })
            }
        }
    }
}

/// 没有 system 消息时，在最前面插入默认系统提示词；其余消息保持原顺序
pub fn with_system_prompt(messages: &[ChatMessage], prompt: &str) -> Vec<ChatMessage> {
    let has_system = messages.iter().any(ChatMessage::is_system);

    let mut out = Vec::with_capacity(messages.len() + 1);
    if !has_system {
        out.push(ChatMessage::system(prompt));
    }
    out.extend_from_slice(messages);
    out
}
