//! POST /chat

use axum::{
    body::{Body, Bytes},
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::StreamExt;

use crate::error::RelayError;
use crate::models::ChatRequest;
use crate::server::AppState;

/// 处理聊天请求
///
/// 请求体无法解析时返回 422 `{"detail": ...}`。
/// 流式请求立即以 200 返回 `text/event-stream`，之后的上游错误只能在流中以
/// `data: [ERROR] ...` 告知客户端。
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, RelayError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!("[CHAT] malformed body: {}", rejection.body_text());
        RelayError::InvalidBody(rejection.body_text())
    })?;

    let invocation = state.router.resolve(&request).map_err(|e| {
        tracing::warn!("[CHAT] rejected request: {}", e);
        e
    })?;

    tracing::info!(
        "[CHAT] provider={} model={} stream={} messages={}",
        invocation.provider,
        invocation.model,
        request.stream,
        invocation.messages.len()
    );

    if !request.stream {
        let response = invocation.complete().await?;
        return Ok(Json(response).into_response());
    }

    let body_stream = invocation
        .into_event_stream()
        .map(|event| Ok::<Bytes, std::io::Error>(Bytes::from(event)));

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .header("X-Accel-Buffering", "no")
        .body(Body::from_stream(body_stream))
        .unwrap_or_else(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"detail": "Failed to build streaming response"})),
            )
                .into_response()
        }))
}
