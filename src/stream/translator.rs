//! 流式响应转换器
//!
//! 将 Provider 输出的文本片段转换为按行分帧的事件流：
//!
//! ```text
//! data: Hello
//!
//! data:  wor
//! data: ld
//!
//! data: [DONE]
//!
//! ```
//!
//! 失败时以 `data: [ERROR] <message>` 结束，不再发送 `[DONE]`。

use crate::logger::sanitize_log_message;
use crate::providers::{FragmentStream, ProviderResult};
use futures::{Stream, StreamExt};
use std::future::Future;

/// 正常结束哨兵
pub const DONE_EVENT: &str = "data: [DONE]\n\n";

/// 按行切分片段：`\n`、`\r\n`、`\r` 均视为行结束，末尾的行结束符不产生空行
pub fn split_lines(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&text[start..i]);
                i += 1;
                start = i;
            }
            b'\r' => {
                lines.push(&text[start..i]);
                i += if bytes.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                start = i;
            }
            _ => i += 1,
        }
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

/// 将一个片段转换为一组事件行，并以一个空行结束
pub fn frame_fragment(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for line in split_lines(text) {
        out.push_str("data: ");
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');
    out
}

/// 错误哨兵，消息中的换行被替换为空格
pub fn error_event(message: &str) -> String {
    let flattened = message.replace("\r\n", " ").replace(['\r', '\n'], " ");
    format!("data: [ERROR] {flattened}\n\n")
}

/// 打开上游流并转换
///
/// `open` 的失败与迭代过程中的失败一样，以错误哨兵的形式带内返回：
/// 响应头（200）此时已经发出，无法再改变 HTTP 状态码。
pub fn translate_stream<F>(open: F) -> impl Stream<Item = String> + Send
where
    F: Future<Output = ProviderResult<FragmentStream>> + Send,
{
    async_stream::stream! {
        let mut fragments = match open.await {
            Ok(fragments) => fragments,
            Err(e) => {
                tracing::error!(
                    "[STREAM] failed to open upstream stream: {}",
                    sanitize_log_message(&e.to_string())
                );
                yield error_event(&e.to_string());
                return;
            }
        };

        let mut fragment_count = 0usize;
        while let Some(item) = fragments.next().await {
            match item {
                Ok(Some(text)) => {
                    fragment_count += 1;
                    yield frame_fragment(&text);
                }
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!(
                        "[STREAM] upstream failed after {} fragments: {}",
                        fragment_count,
                        sanitize_log_message(&e.to_string())
                    );
                    yield error_event(&e.to_string());
                    return;
                }
            }
        }

        tracing::debug!("[STREAM] finished, {} fragments", fragment_count);
        yield DONE_EVENT.to_string();
    }
}
