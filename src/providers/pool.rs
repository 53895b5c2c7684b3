//! Provider 池
//!
//! 启动时根据配置表为每个已知 Provider 构建一次客户端，之后只读。

use super::openai_compat::OpenAiCompatProvider;
use super::traits::ChatProvider;
use crate::config::{ProviderConfig, ProviderTable};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;

/// 池中的一项：Provider 配置与对应的客户端
#[derive(Clone)]
pub struct ProviderEntry {
    pub config: ProviderConfig,
    pub client: Arc<dyn ChatProvider>,
}

impl std::fmt::Debug for ProviderEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderEntry")
            .field("name", &self.config.name)
            .field("base_url", &self.config.base_url)
            .field("default_model", &self.config.default_model)
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProviderPool {
    entries: HashMap<String, ProviderEntry>,
}

impl ProviderPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为配置表中的每个 Provider 创建 OpenAI 兼容客户端，共享同一个 HTTP 连接池
    pub fn from_table(table: &ProviderTable, http: Client) -> Self {
        let mut pool = Self::new();
        for config in table.iter() {
            if config.api_key.is_none() {
                tracing::warn!(
                    "[CONFIG] provider '{}' has no API key; calls to it will fail",
                    config.name
                );
            }
            let client = Arc::new(OpenAiCompatProvider::new(config, http.clone()));
            pool = pool.with_provider(config.clone(), client);
        }
        pool
    }

    /// 注册（或替换）一个 Provider
    pub fn with_provider(mut self, config: ProviderConfig, client: Arc<dyn ChatProvider>) -> Self {
        self.entries
            .insert(config.name.clone(), ProviderEntry { config, client });
        self
    }

    pub fn get(&self, name: &str) -> Option<&ProviderEntry> {
        self.entries.get(name)
    }
}
