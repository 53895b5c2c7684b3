//! 上游 HTTP 客户端工厂
//!
//! 所有 Provider 共享一个 `reqwest::Client`，在启动时按配置创建一次。

use crate::config::HttpClientConfig;
use reqwest::{Client, Proxy};
use std::time::Duration;
use thiserror::Error;

/// 支持的代理协议
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyProtocol {
    Socks5,
    Http,
    Https,
}

impl ProxyProtocol {
    pub fn from_url(url: &str) -> Option<Self> {
        let lower = url.trim().to_lowercase();
        if lower.starts_with("socks5://") {
            Some(Self::Socks5)
        } else if lower.starts_with("http://") {
            Some(Self::Http)
        } else if lower.starts_with("https://") {
            Some(Self::Https)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Socks5 => "socks5",
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("无效的代理 URL: {0}")]
    InvalidUrl(String),

    #[error("不支持的代理协议: {0}")]
    UnsupportedProtocol(String),

    #[error("代理配置错误: {0}")]
    ConfigError(String),

    #[error("客户端构建错误: {0}")]
    ClientBuildError(String),
}

/// HTTP 客户端工厂
#[derive(Debug, Clone)]
pub struct ProxyClientFactory {
    proxy: Option<String>,
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl ProxyClientFactory {
    pub fn from_config(config: &HttpClientConfig) -> Self {
        Self {
            proxy: config.proxy.clone(),
            connect_timeout: config.connect_timeout,
            request_timeout: config.request_timeout,
        }
    }

    /// 校验代理 URL 并返回协议
    pub fn parse_proxy_url(url: &str) -> Result<ProxyProtocol, ProxyError> {
        if url.trim().is_empty() {
            return Err(ProxyError::InvalidUrl("代理 URL 不能为空".to_string()));
        }
        ProxyProtocol::from_url(url).ok_or_else(|| ProxyError::UnsupportedProtocol(url.to_string()))
    }

    /// 创建客户端
    ///
    /// 流式响应可能持续数分钟，`request_timeout` 需覆盖整个流的传输时间。
    pub fn create_client(&self) -> Result<Client, ProxyError> {
        let mut builder = Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60));

        if let Some(url) = self.proxy.as_deref() {
            let protocol = Self::parse_proxy_url(url)?;
            tracing::info!("[HTTP_CLIENT] using {} proxy", protocol.as_str());
            let proxy = Proxy::all(url).map_err(|e| ProxyError::ConfigError(e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        builder
            .build()
            .map_err(|e| ProxyError::ClientBuildError(e.to_string()))
    }
}
