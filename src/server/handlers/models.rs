//! GET / 与 GET /models

use axum::{
    extract::{Query, State},
    Json,
};

use crate::error::RelayError;
use crate::models::{ModelsQuery, ModelsResponse, ServiceInfo};
use crate::server::AppState;

pub async fn root(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(state.router.service_info())
}

pub async fn list_models(
    State(state): State<AppState>,
    Query(query): Query<ModelsQuery>,
) -> Result<Json<ModelsResponse>, RelayError> {
    let models = state.router.list_models(query.provider.as_deref()).await?;
    Ok(Json(models))
}
