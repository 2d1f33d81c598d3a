//! Liveness and readiness endpoints

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use axum_helpers::{HealthCheckFuture, health_router, run_health_checks};
use database::mongodb::check_health;
use serde_json::Value;

use crate::state::AppState;

type ReadyResponse = (StatusCode, Json<Value>);

async fn ready(State(state): State<AppState>) -> Result<ReadyResponse, ReadyResponse> {
    let checks: Vec<(&str, HealthCheckFuture<'_>)> = vec![(
        "mongodb",
        Box::pin(async {
            check_health(&state.mongo_client)
                .await
                .map_err(|e| e.to_string())
        }),
    )];

    run_health_checks(checks).await
}

/// `GET /health` and `GET /ready`, served outside `/api`.
pub fn router(state: AppState) -> Router {
    let app = state.config.app;

    Router::new()
        .route("/ready", get(ready))
        .with_state(state)
        .merge(health_router(app))
}
