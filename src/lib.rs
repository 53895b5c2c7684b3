//! chat-relay
//!
//! 将聊天消息转发给 OpenAI 兼容的 LLM Provider，并以按行分帧的事件流返回结果。
//!
//! ```text
//! POST /chat ──> router (校验 / 选择 Provider / 注入系统提示词)
//!                  ├─ stream=false ──> ChatProvider::chat_completion ──> JSON
//!                  └─ stream=true  ──> ChatProvider::chat_completion_stream ──> stream::translator ──> text/event-stream
//! ```

pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod providers;
pub mod proxy;
pub mod router;
pub mod server;
pub mod stream;

pub use config::AppConfig;
pub use error::RelayError;
pub use router::{RequestRouter, ResolvedInvocation};
