//! Readiness check backed by the vector store heartbeat.

use crate::state::AppState;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use axum_helpers::server::{HealthCheckFuture, run_health_checks};

/// Readiness check endpoint that sends a heartbeat to the vector store.
pub async fn ready_handler(State(state): State<AppState>) -> Response {
    let checks: Vec<(&str, HealthCheckFuture<'_>)> = vec![(
        "vector_store",
        Box::pin(async {
            state
                .documents
                .heartbeat()
                .await
                .map(|_| ())
                .map_err(|e| format!("Vector store heartbeat failed: {}", e))
        }),
    )];

    match run_health_checks(checks).await {
        Ok((status, json)) => (status, json).into_response(),
        Err((status, json)) => (status, json).into_response(),
    }
}
