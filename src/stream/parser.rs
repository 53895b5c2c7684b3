//! 上游 OpenAI SSE 解析器
//!
//! 将 Chat Completions 流式响应的原始字节解析为文本片段。
//!
//! ```text
//! data: {"choices":[{"index":0,"delta":{"content":"Hel"}}]}
//!
//! data: {"choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}
//!
//! data: [DONE]
//! ```

use crate::providers::{ProviderError, ProviderResult};
use serde_json::Value;
use tracing::debug;

/// 单条 SSE 数据解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkEvent {
    /// 一个 chunk；`None` 表示该 chunk 不含文本（角色声明、finish_reason 等）
    Fragment(Option<String>),
    /// 上游发送了 `[DONE]`
    Done,
}

/// OpenAI SSE 流解析器
///
/// 按字节缓冲，只在遇到完整行时才解码，避免多字节 UTF-8 字符被网络分片截断。
#[derive(Debug, Default)]
pub struct OpenAiChunkParser {
    buffer: Vec<u8>,
}

impl OpenAiChunkParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一段字节，返回其中所有完整行产生的事件（按顺序）
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<ProviderResult<ChunkEvent>> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = parse_line(&line[..line.len() - 1]) {
                events.push(event);
            }
        }
        events
    }

    /// 上游连接关闭时处理缓冲区中剩余的不完整行
    pub fn finish(&mut self) -> Option<ProviderResult<ChunkEvent>> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buffer);
        parse_line(&rest)
    }
}

/// 解析单行 SSE；空行、注释和非 data 字段返回 `None`
fn parse_line(raw: &[u8]) -> Option<ProviderResult<ChunkEvent>> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    let line = String::from_utf8_lossy(raw);

    let data = line.strip_prefix("data:")?;
    let data = data.strip_prefix(' ').unwrap_or(data);
    debug!("[STREAM] upstream data: {}", data);

    if data.trim() == "[DONE]" {
        return Some(Ok(ChunkEvent::Done));
    }
    Some(parse_chunk_data(data).map(ChunkEvent::Fragment))
}

/// 解析一个 chat.completion.chunk，提取 `choices[0].delta.content`
pub fn parse_chunk_data(data: &str) -> ProviderResult<Option<String>> {
    let json: Value = serde_json::from_str(data)
        .map_err(|e| ProviderError::decode(format!("malformed stream chunk: {e}")))?;

    // 部分兼容服务会在流中直接下发错误对象
    if let Some(error) = json.get("error") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(ProviderError::new(
            crate::providers::ProviderErrorKind::Other,
            message,
        ));
    }

    let content = json
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("delta"))
        .and_then(|delta| delta.get("content"))
        .and_then(|content| content.as_str())
        .map(str::to_string);

    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderErrorKind;

    fn fragments(events: Vec<ProviderResult<ChunkEvent>>) -> Vec<ChunkEvent> {
        events.into_iter().map(|e| e.unwrap()).collect()
    }

    #[test]
    fn test_text_deltas() {
        let mut parser = OpenAiChunkParser::new();
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hello\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\" World\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
            "data: [DONE]\n\n",
        );

        let events = fragments(parser.feed(body.as_bytes()));
        assert_eq!(
            events,
            vec![
                ChunkEvent::Fragment(None),
                ChunkEvent::Fragment(Some("Hello".to_string())),
                ChunkEvent::Fragment(Some(" World".to_string())),
                ChunkEvent::Fragment(None),
                ChunkEvent::Done,
            ]
        );
        assert!(parser.finish().is_none());
    }

    #[test]
    fn test_line_split_across_chunks() {
        let mut parser = OpenAiChunkParser::new();
        let line = "data: {\"choices\":[{\"delta\":{\"content\":\"你好\"}}]}\r\n";
        let bytes = line.as_bytes();
        // 在多字节字符中间切开
        let cut = line.find('你').unwrap() + 1;

        assert!(parser.feed(&bytes[..cut]).is_empty());
        let events = fragments(parser.feed(&bytes[cut..]));
        assert_eq!(events, vec![ChunkEvent::Fragment(Some("你好".to_string()))]);
    }

    #[test]
    fn test_comments_and_other_fields_ignored() {
        let mut parser = OpenAiChunkParser::new();
        let events = parser.feed(b": keep-alive\nevent: message\nid: 7\n\n");
        assert!(events.is_empty());
    }

    #[test]
    fn test_trailing_line_without_newline() {
        let mut parser = OpenAiChunkParser::new();
        assert!(parser.feed(b"data: [DONE]").is_empty());
        assert_eq!(parser.finish().unwrap().unwrap(), ChunkEvent::Done);
    }

    #[test]
    fn test_malformed_chunk_is_error() {
        let mut parser = OpenAiChunkParser::new();
        let mut events = parser.feed(b"data: {not json\n");
        let err = events.remove(0).unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::DecodeError);
    }

    #[test]
    fn test_inline_error_object() {
        let err = parse_chunk_data(r#"{"error":{"message":"quota exceeded"}}"#).unwrap_err();
        assert_eq!(err.message, "quota exceeded");
    }

    #[test]
    fn test_chunk_without_choices() {
        let content = parse_chunk_data(r#"{"choices":[],"usage":{"prompt_tokens":3}}"#).unwrap();
        assert!(content.is_none());
    }

    #[test]
    fn test_null_content() {
        let content = parse_chunk_data(r#"{"choices":[{"delta":{"content":null}}]}"#).unwrap();
        assert!(content.is_none());
    }
}
