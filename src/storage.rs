//! Object storage for published snapshots
//!
//! Keys are `/`-separated paths relative to the store root. The filesystem
//! store maps the public flag onto file permissions on Unix.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, bail};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

/// Trait for snapshot destinations
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `body` as JSON under `key`, replacing any previous object.
    /// Returns a locator for the written object.
    async fn put_json(
        &self,
        key: &str,
        body: &serde_json::Value,
        public: bool,
    ) -> anyhow::Result<String>;
}

/// Object store backed by a local directory
#[derive(Debug, Clone)]
pub struct FileObjectStore {
    root: PathBuf,
}

impl FileObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key below the root, rejecting absolute keys and `..`
    fn object_path(&self, key: &str) -> anyhow::Result<PathBuf> {
        let relative = Path::new(key);
        if key.is_empty()
            || !relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
        {
            bail!("invalid object key: {key:?}");
        }
        Ok(self.root.join(relative))
    }
}

/// Sibling path an object is staged at before it is renamed into place
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[async_trait]
impl ObjectStore for FileObjectStore {
    async fn put_json(
        &self,
        key: &str,
        body: &serde_json::Value,
        public: bool,
    ) -> anyhow::Result<String> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let bytes = serde_json::to_vec_pretty(body)?;
        let temp_path = temp_path_for(&path);
        {
            let mut file = tokio::fs::File::create(&temp_path)
                .await
                .with_context(|| format!("Failed to create temp file {}", temp_path.display()))?;
            file.write_all(&bytes)
                .await
                .with_context(|| format!("Failed to write temp file {}", temp_path.display()))?;
            file.sync_all().await.context("Failed to sync file to disk")?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = if public { 0o644 } else { 0o600 };
            tokio::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(mode))
                .await
                .with_context(|| format!("Failed to chmod {}", temp_path.display()))?;
        }
        #[cfg(not(unix))]
        let _ = public;

        // Readers of an overwritten key see either the old or the new object
        tokio::fs::rename(&temp_path, &path)
            .await
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        tracing::debug!("Wrote object {}", path.display());
        Ok(path.display().to_string())
    }
}
