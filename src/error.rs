//! 请求处理错误
//!
//! 对外的 JSON 格式为 `{"detail": "<message>"}`。

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// 消息列表为空
    #[error("Messages cannot be empty")]
    InvalidInput,

    /// 请求体不是合法的 ChatRequest JSON
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// 未知的 Provider 名称
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// 上游 Provider 调用失败（聊天）
    #[error("Error from {provider}: {message}")]
    ProviderError { provider: String, message: String },

    /// 上游 Provider 调用失败（模型列表）
    #[error("Error listing models for {provider}: {message}")]
    ModelListError { provider: String, message: String },
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::InvalidInput => StatusCode::BAD_REQUEST,
            RelayError::InvalidBody(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RelayError::UnsupportedProvider(_) => StatusCode::BAD_REQUEST,
            RelayError::ProviderError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::ModelListError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(serde_json::json!({ "detail": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(RelayError::InvalidInput.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            RelayError::UnsupportedProvider("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RelayError::InvalidBody("missing field `messages`".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );

        let err = RelayError::ProviderError {
            provider: "openai".into(),
            message: "timeout".into(),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            RelayError::InvalidInput.to_string(),
            "Messages cannot be empty"
        );
        assert_eq!(
            RelayError::UnsupportedProvider("anthropic".into()).to_string(),
            "Unsupported provider: anthropic"
        );
        assert_eq!(
            RelayError::ModelListError {
                provider: "gemini".into(),
                message: "AuthenticationError (401): bad key".into(),
            }
            .to_string(),
            "Error listing models for gemini: AuthenticationError (401): bad key"
        );
    }
}
