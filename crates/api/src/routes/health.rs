//! Liveness probe, mounted at the root rather than under `/api/v1`.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok` when every dependency answers, `degraded` otherwise.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// The attachment root exists and is a directory.
    pub storage_healthy: bool,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = portal_db::health_check(&state.pool).await.is_ok();
    let storage_healthy = tokio::fs::metadata(state.attachments.root())
        .await
        .is_ok_and(|m| m.is_dir());
    if !db_healthy || !storage_healthy {
        tracing::warn!(db_healthy, storage_healthy, "Health check degraded");
    }

    Json(HealthResponse {
        status: if db_healthy && storage_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        storage_healthy,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
