//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use std::path::Path;

use tracing::{info, warn};

/// Ensure the data directory holding the catalog file exists.
pub async fn ensure_data_dir(data_dir: impl AsRef<Path>) -> anyhow::Result<()> {
    let data_dir = data_dir.as_ref();
    if tokio::fs::metadata(data_dir).await.is_err() {
        warn!(data_dir = %data_dir.display(), "data directory not found; creating it");
    }
    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", data_dir.display()))?;
    info!(data_dir = %data_dir.display(), "data directory ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ensure_data_dir_creates_nested_directories() -> anyhow::Result<()> {
        let root = std::env::temp_dir().join(format!("catalog_env_{}", uuid::Uuid::new_v4()));
        let nested = root.join("a").join("b");
        ensure_data_dir(&nested).await?;
        assert!(tokio::fs::metadata(&nested).await?.is_dir());

        // idempotent
        ensure_data_dir(&nested).await?;

        let _ = tokio::fs::remove_dir_all(&root).await;
        Ok(())
    }
}
