//! Sample CRUD endpoints backed by the in-memory store
//!
//! Routes:
//! - POST   /sample       - Create a sample (201)
//! - GET    /sample       - List samples
//! - GET    /sample/{id}  - Get one sample
//! - PATCH  /sample/{id}  - Update the provided fields
//! - DELETE /sample/{id}  - Remove a sample (204)

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::http::error::ApiError;
use crate::http::extractors::ValidJson;
use crate::http::server::AppState;
use crate::models::{CreateSample, Sample, UpdateSample};

/// POST /sample
async fn create_sample(
    State(state): State<Arc<AppState>>,
    ValidJson(input): ValidJson<CreateSample>,
) -> (StatusCode, Json<Sample>) {
    tracing::info!("POST /sample");
    let sample = state.samples.create(input).await;
    (StatusCode::CREATED, Json(sample))
}

/// GET /sample
async fn list_samples(State(state): State<Arc<AppState>>) -> Json<Vec<Sample>> {
    tracing::info!("GET /sample");
    Json(state.samples.find_all().await)
}

/// GET /sample/{id}
async fn get_sample(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Sample>, ApiError> {
    tracing::info!("GET /sample/{}", id);
    let sample = state.samples.find_one(&id).await?;
    Ok(Json(sample))
}

/// PATCH /sample/{id}
async fn update_sample(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidJson(changes): ValidJson<UpdateSample>,
) -> Result<Json<Sample>, ApiError> {
    tracing::info!("PATCH /sample/{}", id);
    let sample = state.samples.update(&id, changes).await?;
    Ok(Json(sample))
}

/// DELETE /sample/{id}
async fn delete_sample(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    tracing::info!("DELETE /sample/{}", id);
    state.samples.remove(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Sample routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sample", get(list_samples).post(create_sample))
        .route(
            "/sample/{id}",
            get(get_sample).patch(update_sample).delete(delete_sample),
        )
}
