//! Provider 调用错误
//!
//! 上游 HTTP 调用的统一错误类型，按 HTTP 状态码或传输层错误分类。

/// Provider 调用结果
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Provider 错误类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// 未配置 API Key
    NotConfigured,
    /// 认证错误
    AuthenticationError,
    /// 网络错误
    NetworkError,
    /// 请求超时
    Timeout,
    /// 服务端错误
    ServerError,
    /// 请求格式错误
    BadRequest,
    /// 速率限制
    RateLimited,
    /// 响应解析失败
    DecodeError,
    /// 其他错误
    Other,
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "NotConfigured"),
            Self::AuthenticationError => write!(f, "AuthenticationError"),
            Self::NetworkError => write!(f, "NetworkError"),
            Self::Timeout => write!(f, "Timeout"),
            Self::ServerError => write!(f, "ServerError"),
            Self::BadRequest => write!(f, "BadRequest"),
            Self::RateLimited => write!(f, "RateLimited"),
            Self::DecodeError => write!(f, "DecodeError"),
            Self::Other => write!(f, "Other"),
        }
    }
}

/// Provider 错误
#[derive(Debug, Clone)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    /// 上游 HTTP 状态码（如果有）
    pub status_code: Option<u16>,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: None,
        }
    }

    pub fn with_status(kind: ProviderErrorKind, message: impl Into<String>, status: u16) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: Some(status),
        }
    }

    /// 从 HTTP 状态码推断错误类型
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let kind = match status {
            401 | 403 => ProviderErrorKind::AuthenticationError,
            400 => ProviderErrorKind::BadRequest,
            429 => ProviderErrorKind::RateLimited,
            500..=599 => ProviderErrorKind::ServerError,
            _ => ProviderErrorKind::Other,
        };
        Self::with_status(kind, message, status)
    }

    pub fn not_configured(provider: &str) -> Self {
        Self::new(
            ProviderErrorKind::NotConfigured,
            format!("API key not configured for provider '{provider}'"),
        )
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::DecodeError, message)
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(code) = self.status_code {
            write!(f, "{} ({}): {}", self.kind, code, self.message)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for ProviderError {}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ProviderErrorKind::Timeout
        } else if err.is_connect() || err.is_request() || err.is_body() {
            ProviderErrorKind::NetworkError
        } else if err.is_decode() {
            ProviderErrorKind::DecodeError
        } else {
            ProviderErrorKind::Other
        };
        match err.status() {
            Some(status) => Self::with_status(kind, err.to_string(), status.as_u16()),
            None => Self::new(kind, err.to_string()),
        }
    }
}
