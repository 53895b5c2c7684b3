//! 数据模型

pub mod chat_model;

pub use chat_model::{
    ChatMessage, ChatRequest, ChatResponse, ModelsQuery, ModelsResponse, ServiceInfo,
};
