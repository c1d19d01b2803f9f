//! Published graph snapshots
//!
//! A snapshot wraps the merged graph with provenance metadata and is written
//! twice: once under an immutable timestamped key, once under `latest.json`
//! which every run overwrites and which is publicly readable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::graph::DependencyGraph;
use crate::service::BuildReport;
use crate::storage::ObjectStore;

/// Value of `metadata.source`
pub const SNAPSHOT_SOURCE: &str = "dependency-analyzer";

const LATEST_FILE: &str = "latest.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// UTC, whole seconds, `+00:00` offset
    pub created_at: String,
    pub version: String,
    pub repository_count: usize,
    pub source: String,
    #[serde(default)]
    pub failed_repositories: Vec<String>,
}

/// `{results, metadata}` document stored and served to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEnvelope {
    pub results: DependencyGraph,
    pub metadata: SnapshotMetadata,
}

impl SnapshotEnvelope {
    /// Wrap a build result; `repository_count` is the number of configured repositories
    pub fn new(report: BuildReport, repository_count: usize, created_at: DateTime<Utc>) -> Self {
        Self {
            results: report.graph,
            metadata: SnapshotMetadata {
                created_at: format_created_at(created_at),
                version: env!("CARGO_PKG_VERSION").to_string(),
                repository_count,
                source: SNAPSHOT_SOURCE.to_string(),
                failed_repositories: report.failed,
            },
        }
    }
}

/// Format a timestamp the way snapshot keys and metadata carry it
pub fn format_created_at(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%S+00:00").to_string()
}

/// Keys a snapshot is written under
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotKeys {
    pub latest: String,
    pub timestamped: String,
}

/// Storage keys for a snapshot created at `created_at`
pub fn storage_keys(site_folder: &str, created_at: &str) -> SnapshotKeys {
    let prefix = site_folder.trim_end_matches('/');
    let prefix = if prefix.is_empty() {
        "dependencies".to_string()
    } else {
        format!("{prefix}/dependencies")
    };
    SnapshotKeys {
        latest: format!("{prefix}/{LATEST_FILE}"),
        timestamped: format!("{prefix}/{created_at}.json"),
    }
}

/// Write the timestamped copy, then overwrite `latest`
pub async fn store_snapshot(
    store: &dyn ObjectStore,
    site_folder: &str,
    envelope: &SnapshotEnvelope,
) -> anyhow::Result<SnapshotKeys> {
    let keys = storage_keys(site_folder, &envelope.metadata.created_at);
    let body = serde_json::to_value(envelope)?;

    store.put_json(&keys.timestamped, &body, false).await?;
    store.put_json(&keys.latest, &body, true).await?;
    tracing::info!(
        "Stored dependency snapshot at {} and {}",
        keys.timestamped,
        keys.latest
    );

    Ok(keys)
}
