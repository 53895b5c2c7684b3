//! 聊天请求/响应数据模型
//!
//! 与前端约定的 JSON 结构：
//! ```text
//! POST /chat   {"messages": [{"role": "user", "content": "hi"}], "stream": true, "model": null, "provider": null}
//! 非流式响应   {"message": {"role": "assistant", "content": "..."}}
//! GET /models  {"models": ["gpt-4o", ...]}
//! ```

use serde::{Deserialize, Serialize};

pub const ROLE_SYSTEM: &str = "system";
pub const ROLE_USER: &str = "user";
pub const ROLE_ASSISTANT: &str = "assistant";

/// 单条聊天消息
///
/// `role` 约定为 system / user / assistant，但不做强制校验，原样转发给上游。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ROLE_SYSTEM, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ROLE_USER, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ROLE_ASSISTANT, content)
    }

    pub fn is_system(&self) -> bool {
        self.role == ROLE_SYSTEM
    }
}

fn default_stream() -> bool {
    true
}

/// POST /chat 请求体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    /// 默认流式返回
    #[serde(default = "default_stream")]
    pub stream: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            stream: true,
            model: None,
            provider: None,
        }
    }

    /// 请求指定的 Provider（空字符串视为未指定）
    pub fn requested_provider(&self) -> Option<&str> {
        self.provider.as_deref().filter(|p| !p.is_empty())
    }

    /// 请求指定的模型（空字符串视为未指定）
    pub fn requested_model(&self) -> Option<&str> {
        self.model.as_deref().filter(|m| !m.is_empty())
    }
}

/// 非流式响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: ChatMessage,
}

impl ChatResponse {
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            message: ChatMessage::assistant(content),
        }
    }
}

/// GET /models 响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
}

/// GET /models 查询参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelsQuery {
    #[serde(default)]
    pub provider: Option<String>,
}

/// GET / 响应：服务元信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub message: String,
    pub system_prompt: String,
    pub current_provider: String,
    pub default_model: String,
}
