//! HTTP 处理器
//!
//! - `GET /` 服务元信息
//! - `POST /chat` 聊天（流式 / 非流式）
//! - `GET /models` 模型列表

mod chat;
mod models;

pub use chat::chat;
pub use models::{list_models, root};
