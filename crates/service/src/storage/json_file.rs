use std::{
    ffi::OsString,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};
use tokio::{fs, io::AsyncWriteExt};

use crate::errors::ServiceError;

/// Read and parse a JSON document.
///
/// Returns `Ok(None)` when the file does not exist; any other I/O or parse
/// failure is a `ServiceError::Persistence`.
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, ServiceError> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ServiceError::persistence(format!("read {}: {e}", path.display())))
        }
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| ServiceError::persistence(format!("parse {}: {e}", path.display())))
}

/// Serialize `value` as pretty JSON and replace `path` with it.
///
/// The parent directory is created if missing. Data is written to
/// `<file>.tmp` first, synced to disk, and renamed over the target.
pub async fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ServiceError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| ServiceError::persistence(format!("create {}: {e}", parent.display())))?;
    }

    let mut data = serde_json::to_vec_pretty(value).map_err(ServiceError::persistence)?;
    data.push(b'\n');

    let tmp_path = tmp_path_for(path);
    if let Err(e) = write_synced(&tmp_path, &data).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(ServiceError::persistence(format!("write {}: {e}", tmp_path.display())));
    }

    if let Err(e) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(ServiceError::persistence(format!("rename to {}: {e}", path.display())));
    }
    Ok(())
}

async fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(data).await?;
    file.sync_all().await
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn tmp_file(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("json_file_{tag}_{}", Uuid::new_v4())).join("doc.json")
    }

    #[tokio::test]
    async fn missing_file_reads_as_none() -> Result<(), anyhow::Error> {
        let path = tmp_file("missing");
        let got: Option<Vec<u32>> = read_json(&path).await?;
        assert!(got.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn write_creates_parent_and_leaves_no_temp_file() -> Result<(), anyhow::Error> {
        let path = tmp_file("write");
        write_json_atomic(&path, &vec![1, 2, 3]).await?;

        let text = tokio::fs::read_to_string(&path).await?;
        assert!(text.contains('\n'), "pretty printed output expected");
        let back: Option<Vec<u32>> = read_json(&path).await?;
        assert_eq!(back, Some(vec![1, 2, 3]));
        assert!(tokio::fs::metadata(tmp_path_for(&path)).await.is_err());

        // replacing an existing file goes through the same synced temp file
        write_json_atomic(&path, &vec![4]).await?;
        let back: Option<Vec<u32>> = read_json(&path).await?;
        assert_eq!(back, Some(vec![4]));
        assert!(tokio::fs::metadata(tmp_path_for(&path)).await.is_err());

        if let Some(dir) = path.parent() {
            let _ = tokio::fs::remove_dir_all(dir).await;
        }
        Ok(())
    }

    #[tokio::test]
    async fn garbage_is_a_persistence_error() -> Result<(), anyhow::Error> {
        let path = tmp_file("garbage");
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&path, b"{ not json").await?;

        let got = read_json::<Vec<u32>>(&path).await;
        assert!(matches!(got, Err(ServiceError::Persistence(_))));

        if let Some(dir) = path.parent() {
            let _ = tokio::fs::remove_dir_all(dir).await;
        }
        Ok(())
    }

    #[tokio::test]
    async fn failed_temp_write_keeps_target() -> Result<(), anyhow::Error> {
        let path = tmp_file("blocked");
        write_json_atomic(&path, &vec![1]).await?;

        // a directory squatting on the temp name makes the create fail
        tokio::fs::create_dir_all(tmp_path_for(&path)).await?;
        let res = write_json_atomic(&path, &vec![2]).await;
        assert!(matches!(res, Err(ServiceError::Persistence(_))));
        let back: Option<Vec<u32>> = read_json(&path).await?;
        assert_eq!(back, Some(vec![1]));

        if let Some(dir) = path.parent() {
            let _ = tokio::fs::remove_dir_all(dir).await;
        }
        Ok(())
    }

    #[test]
    fn temp_path_is_a_sibling() {
        let p = Path::new("data/products.json");
        assert_eq!(tmp_path_for(p), PathBuf::from("data/products.json.tmp"));
    }
}
