//! HTTP 服务
//!
//! axum 路由、共享状态与启动逻辑。

pub mod handlers;


use std::sync::Arc;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::providers::ProviderPool;
use crate::proxy::ProxyClientFactory;
use crate::router::RequestRouter;

/// 处理器共享状态，启动后只读
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<RequestRouter>,
}

impl AppState {
    pub fn new(router: RequestRouter) -> Self {
        Self {
            router: Arc::new(router),
        }
    }

    /// 根据配置构建 HTTP 客户端、Provider 池和路由器
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let http = ProxyClientFactory::from_config(&config.http)
            .create_client()
            .context("failed to build upstream HTTP client")?;
        let pool = ProviderPool::from_table(&config.providers, http);
        Ok(Self::new(RequestRouter::from_config(config, pool)))
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/chat", post(handlers::chat))
        .route("/models", get(handlers::list_models))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// 启动服务，直到收到 Ctrl-C
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config)?;
    let app = build_router(state.clone());

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        "[SERVER] listening on {} provider={} model={}",
        addr,
        state.router.default_provider(),
        state.router.default_model()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("[SERVER] stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("[SERVER] failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
