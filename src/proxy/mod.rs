//! 上游 HTTP 客户端
//!
//! 超时与可选的全局代理（http / https / socks5）

mod client_factory;

pub use client_factory::{ProxyClientFactory, ProxyError, ProxyProtocol};
