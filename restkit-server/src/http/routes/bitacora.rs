//! Activity log endpoint

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::services::BitacoraService;

/// GET /bitacora
async fn get_bitacora(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Value>>, ApiError> {
    tracing::info!("GET /bitacora");
    let entries = BitacoraService::new(state.executor.as_ref())
        .get_bitacora()
        .await?;
    Ok(Json(entries))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/bitacora", get(get_bitacora))
}
