//! Payment methods catalogue endpoint

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::services::FormasPagoService;

/// GET /formas-pago
async fn get_formas_pago(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Value>>, ApiError> {
    tracing::info!("GET /formas-pago");
    let formas = FormasPagoService::new(state.executor.as_ref())
        .get_formas_pago()
        .await?;
    Ok(Json(formas))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/formas-pago", get(get_formas_pago))
}
