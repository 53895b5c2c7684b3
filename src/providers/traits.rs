//! Provider Trait 定义
//!
//! 统一的聊天补全接口。路由层只依赖该 trait，具体的 HTTP 协议由实现负责。

use crate::models::ChatMessage;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use super::error::ProviderResult;

/// 文本片段流
///
/// 每个元素对应上游的一个 chunk；`Ok(None)` 表示该 chunk 不含文本。
pub type FragmentStream = Pin<Box<dyn Stream<Item = ProviderResult<Option<String>>> + Send>>;

/// 聊天 Provider
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider 名称（openai, gemini, ...）
    fn name(&self) -> &str;

    /// 非流式补全，返回助手回复的完整文本
    async fn chat_completion(&self, model: &str, messages: &[ChatMessage])
        -> ProviderResult<String>;

    /// 流式补全
    async fn chat_completion_stream(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> ProviderResult<FragmentStream>;

    /// 列出可用模型 ID，保持上游返回的顺序
    async fn list_models(&self) -> ProviderResult<Vec<String>>;
}
