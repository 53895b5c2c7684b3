//! 流式处理层
//!
//! ```text
//! 上游 SSE 字节流 ──> [OpenAiChunkParser] ──> 文本片段 ──> [translator] ──> data: 行分帧事件流
//! ```
//!
//! - `parser`: 解析 OpenAI 兼容服务的 SSE 响应
//! - `translator`: 生成返回给前端的事件流

pub mod parser;
pub mod translator;

pub use parser::{parse_chunk_data, ChunkEvent, OpenAiChunkParser};
pub use translator::{error_event, frame_fragment, split_lines, translate_stream, DONE_EVENT};
