//! 测试用 Provider 桩

use super::error::{ProviderError, ProviderResult};
use super::traits::{ChatProvider, FragmentStream};
use crate::config::ProviderConfig;
use crate::models::ChatMessage;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// 记录调用参数并返回预设结果的 Provider
pub struct StubProvider {
    name: String,
    reply: ProviderResult<String>,
    fragments: Vec<ProviderResult<Option<String>>>,
    open_error: Option<ProviderError>,
    models: ProviderResult<Vec<String>>,
    calls: Mutex<Vec<(String, Vec<ChatMessage>)>>,
}

impl StubProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            reply: Ok(String::new()),
            fragments: Vec::new(),
            open_error: None,
            models: Ok(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_reply(mut self, reply: ProviderResult<String>) -> Self {
        self.reply = reply;
        self
    }

    pub fn with_fragments(mut self, fragments: Vec<ProviderResult<Option<String>>>) -> Self {
        self.fragments = fragments;
        self
    }

    pub fn with_open_error(mut self, err: ProviderError) -> Self {
        self.open_error = Some(err);
        self
    }

    pub fn with_models(mut self, models: ProviderResult<Vec<String>>) -> Self {
        self.models = models;
        self
    }

    /// 已收到的 (model, messages) 调用记录
    pub fn calls(&self) -> Vec<(String, Vec<ChatMessage>)> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, model: &str, messages: &[ChatMessage]) {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), messages.to_vec()));
    }
}

#[async_trait]
impl ChatProvider for StubProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> ProviderResult<String> {
        self.record(model, messages);
        self.reply.clone()
    }

    async fn chat_completion_stream(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> ProviderResult<FragmentStream> {
        self.record(model, messages);
        if let Some(err) = &self.open_error {
            return Err(err.clone());
        }
        Ok(Box::pin(futures::stream::iter(self.fragments.clone())))
    }

    async fn list_models(&self) -> ProviderResult<Vec<String>> {
        self.models.clone()
    }
}

pub fn stub_config(name: &str, default_model: &str) -> ProviderConfig {
    ProviderConfig {
        name: name.to_string(),
        api_key: Some(format!("{name}-key")),
        base_url: format!("https://{name}.invalid/v1"),
        default_model: default_model.to_string(),
    }
}

/// openai + gemini 两个桩组成的 Provider 池
pub fn stub_pool(openai: Arc<StubProvider>, gemini: Arc<StubProvider>) -> super::ProviderPool {
    super::ProviderPool::new()
        .with_provider(stub_config("openai", "gpt-3.5-turbo"), openai)
        .with_provider(stub_config("gemini", "gemini-2.0-flash"), gemini)
}
