//! Provider 模块
//!
//! - `traits`: `ChatProvider` 接口
//! - `openai_compat`: OpenAI Chat Completions 协议实现
//! - `pool`: 启动时构建的 Provider 池
//! - `error`: 上游调用错误

pub mod error;
pub mod openai_compat;
pub mod pool;
pub mod traits;

pub use error::{ProviderError, ProviderErrorKind, ProviderResult};
pub use openai_compat::OpenAiCompatProvider;
pub use pool::{ProviderEntry, ProviderPool};
pub use traits::{ChatProvider, FragmentStream};

#[cfg(test)]
pub(crate) mod testing;
