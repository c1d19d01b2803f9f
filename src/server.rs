//! HTTP surface
//!
//! - `GET /health`: liveness check
//! - `GET /api/dependencies`: rebuild the graph from scratch, store the
//!   snapshot and return it

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{Value, json};

use crate::repository::RepositoryDescriptor;
use crate::service::DependencyDataService;
use crate::snapshot::{SnapshotEnvelope, store_snapshot};
use crate::storage::ObjectStore;

/// Everything a rebuild-and-store cycle needs
pub struct AppState {
    pub service: DependencyDataService,
    pub repositories: Vec<RepositoryDescriptor>,
    pub store: Arc<dyn ObjectStore>,
    pub site_folder: String,
}

impl AppState {
    /// Rebuild the graph, store it under both keys and return the envelope
    pub async fn refresh(&self) -> anyhow::Result<SnapshotEnvelope> {
        let report = self
            .service
            .build_dependency_graph(&self.repositories)
            .await?;
        if !report.validation.dangling.is_empty() {
            tracing::warn!(
                "{} dangling link endpoints in dependency graph",
                report.validation.dangling.len()
            );
        }

        let envelope = SnapshotEnvelope::new(report, self.repositories.len(), Utc::now());
        store_snapshot(self.store.as_ref(), &self.site_folder, &envelope).await?;
        Ok(envelope)
    }
}

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/dependencies", get(dependencies))
        .with_state(state)
}

/// Bind `listen_addr` and serve until the process is stopped
pub async fn serve(state: Arc<AppState>, listen_addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {listen_addr}: {e}"))?;

    tracing::info!("Listening on {}", listen_addr);
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn dependencies(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SnapshotEnvelope>, (StatusCode, Json<Value>)> {
    state.refresh().await.map(Json).map_err(|e| {
        tracing::error!("Failed to generate dependency data: {:#}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": format!("Failed to generate dependency data: {e}")})),
        )
    })
}
