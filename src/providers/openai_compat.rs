//! OpenAI 兼容 Provider
//!
//! 适用于 OpenAI 以及提供 OpenAI 兼容端点的服务（如 Gemini 的 `/v1beta/openai/`）。

use super::error::{ProviderError, ProviderResult};
use super::traits::{ChatProvider, FragmentStream};
use crate::config::ProviderConfig;
use crate::models::ChatMessage;
use crate::stream::{ChunkEvent, OpenAiChunkParser};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

pub struct OpenAiCompatProvider {
    name: String,
    api_key: Option<String>,
    base_url: String,
    client: Client,
}

impl OpenAiCompatProvider {
    pub fn new(config: &ProviderConfig, client: Client) -> Self {
        Self {
            name: config.name.clone(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            client,
        }
    }

    /// 构建完整的 API URL，兼容带或不带末尾 `/` 的 base_url
    fn build_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint)
    }

    fn api_key(&self) -> ProviderResult<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ProviderError::not_configured(&self.name))
    }

    async fn post_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        stream: bool,
    ) -> ProviderResult<reqwest::Response> {
        let api_key = self.api_key()?;
        let url = self.build_url("chat/completions");

        tracing::info!(
            "[{}] 发送请求: url={} model={} stream={} messages={}",
            self.name,
            url,
            model,
            stream,
            messages.len()
        );

        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&CompletionRequest {
                model,
                messages,
                stream,
            })
            .send()
            .await?;

        check_status(resp).await
    }
}

/// 非 2xx 响应转换为 ProviderError，错误信息使用响应体
async fn check_status(resp: reqwest::Response) -> ProviderResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ProviderError::from_status(status.as_u16(), body))
}

/// 提取非流式响应的 `choices[0].message.content`
pub fn extract_message_content(json: &Value) -> ProviderResult<String> {
    let message = json
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| ProviderError::decode("completion response has no choices"))?;

    Ok(message
        .get("content")
        .and_then(|c| c.as_str())
        .unwrap_or_default()
        .to_string())
}

/// 提取模型列表响应 `{"data": [{"id": ...}]}` 中的 ID
pub fn extract_model_ids(json: &Value) -> ProviderResult<Vec<String>> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| ProviderError::decode("model list response has no data array"))?;

    Ok(data
        .iter()
        .filter_map(|m| m.get("id").and_then(|id| id.as_str()))
        .map(str::to_string)
        .collect())
}

#[async_trait]
impl ChatProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> ProviderResult<String> {
        let resp = self.post_completion(model, messages, false).await?;
        let json: Value = resp.json().await?;
        extract_message_content(&json)
    }

    async fn chat_completion_stream(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> ProviderResult<FragmentStream> {
        let resp = self.post_completion(model, messages, true).await?;
        let mut body = resp.bytes_stream();

        let fragments = async_stream::stream! {
            let mut parser = OpenAiChunkParser::new();

            while let Some(chunk) = body.next().await {
                let bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        yield Err(ProviderError::from(e));
                        return;
                    }
                };
                for event in parser.feed(&bytes) {
                    match event {
                        Ok(ChunkEvent::Fragment(text)) => yield Ok(text),
                        Ok(ChunkEvent::Done) => return,
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            }

            match parser.finish() {
                Some(Ok(ChunkEvent::Fragment(text))) => yield Ok(text),
                Some(Err(e)) => yield Err(e),
                Some(Ok(ChunkEvent::Done)) | None => {}
            }
        };

        Ok(Box::pin(fragments))
    }

    async fn list_models(&self) -> ProviderResult<Vec<String>> {
        let api_key = self.api_key()?;
        let url = self.build_url("models");
        tracing::info!("[{}] 查询模型列表: url={}", self.name, url);

        let resp = self.client.get(&url).bearer_auth(api_key).send().await?;
        let json: Value = check_status(resp).await?.json().await?;
        extract_model_ids(&json)
    }
}
