use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::debug;

/// Directory-backed blob store keyed by generated filename.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn write(&self, name: &str, body: Bytes) -> anyhow::Result<()>;
    async fn delete(&self, name: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct LocalDir {
    root: PathBuf,
}

impl LocalDir {
    pub async fn new(root: &str) -> anyhow::Result<Self> {
        let root = PathBuf::from(root);
        fs::create_dir_all(&root)
            .await
            .with_context(|| format!("create storage root {}", root.display()))?;
        Ok(Self { root })
    }

    /// Keep only the final path component so a stored name can never
    /// escape the root.
    fn resolve(&self, name: &str) -> PathBuf {
        let base = Path::new(name)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        self.root.join(base)
    }
}

#[async_trait]
impl BlobStore for LocalDir {
    async fn write(&self, name: &str, body: Bytes) -> anyhow::Result<()> {
        let path = self.resolve(name);
        fs::write(&path, &body)
            .await
            .with_context(|| format!("write blob {}", path.display()))?;
        debug!(name, bytes = body.len(), "blob written");
        Ok(())
    }

    async fn delete(&self, name: &str) -> anyhow::Result<()> {
        let path = self.resolve(name);
        fs::remove_file(&path)
            .await
            .with_context(|| format!("delete blob {}", path.display()))?;
        debug!(name, "blob deleted");
        Ok(())
    }
}
