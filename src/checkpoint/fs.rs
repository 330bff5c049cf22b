//! Filesystem-backed checkpoint store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::{Checkpoint, CheckpointError, CheckpointStore};
use crate::types::EmbeddingVector;

/// Persists one JSON document per hash under a root directory.
///
/// Writes go to a temporary sibling first, are flushed to disk, and are then
/// renamed over the final path, so a reader never observes a half-written
/// checkpoint and a crash mid-write leaves the previous state intact.
#[derive(Clone, Debug)]
pub struct FsCheckpointStore {
    root: PathBuf,
}

impl FsCheckpointStore {
    /// Store rooted at the provided directory (created lazily on first save).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the checkpoint files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path holding the checkpoint for `hash`.
    pub fn checkpoint_path(&self, hash: &str) -> PathBuf {
        self.root.join(format!("partial_embeddings_{hash}.json"))
    }
}

#[async_trait]
impl CheckpointStore for FsCheckpointStore {
    async fn load(&self, hash: &str) -> Result<Checkpoint, CheckpointError> {
        let path = self.checkpoint_path(hash);
        let data = match fs::read_to_string(&path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Checkpoint::empty());
            }
            Err(err) => return Err(err.into()),
        };

        let embeddings: Vec<EmbeddingVector> =
            serde_json::from_str(&data).map_err(|err| CheckpointError::Corrupt {
                hash: hash.to_string(),
                message: err.to_string(),
            })?;
        debug!(hash, count = embeddings.len(), "loaded checkpoint");
        Ok(Checkpoint { embeddings })
    }

    async fn save(
        &self,
        hash: &str,
        embeddings: &[EmbeddingVector],
    ) -> Result<(), CheckpointError> {
        fs::create_dir_all(&self.root).await?;

        let serialized = serde_json::to_vec(embeddings).map_err(|err| CheckpointError::Corrupt {
            hash: hash.to_string(),
            message: err.to_string(),
        })?;

        let path = self.checkpoint_path(hash);
        let tmp_path = self.root.join(format!("partial_embeddings_{hash}.json.tmp"));

        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(&serialized).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&tmp_path, &path).await?;
        debug!(hash, count = embeddings.len(), "saved checkpoint");
        Ok(())
    }

    async fn delete(&self, hash: &str) -> Result<(), CheckpointError> {
        match fs::remove_file(self.checkpoint_path(hash)).await {
            Ok(()) => {
                debug!(hash, "deleted checkpoint");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_checkpoint_loads_empty() {
        let dir = tempdir().unwrap();
        let store = FsCheckpointStore::new(dir.path());
        let checkpoint = store.load("absent").await.unwrap();
        assert!(checkpoint.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_roundtrip() {
        let dir = tempdir().unwrap();
        let store = FsCheckpointStore::new(dir.path());

        let embeddings = vec![vec![0.1, 0.2], vec![0.3, 0.4]];
        store.save("abc123", &embeddings).await.unwrap();

        let checkpoint = store.load("abc123").await.unwrap();
        assert_eq!(checkpoint.embeddings, embeddings);
    }

    #[tokio::test]
    async fn save_replaces_previous_state() {
        let dir = tempdir().unwrap();
        let store = FsCheckpointStore::new(dir.path());

        store.save("h", &[vec![1.0]]).await.unwrap();
        store.save("h", &[vec![1.0], vec![2.0]]).await.unwrap();

        let checkpoint = store.load("h").await.unwrap();
        assert_eq!(checkpoint.len(), 2);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = FsCheckpointStore::new(dir.path());

        store.save("h", &[vec![1.0]]).await.unwrap();
        store.delete("h").await.unwrap();
        assert!(store.load("h").await.unwrap().is_empty());

        // Second delete of the same key is a no-op.
        store.delete("h").await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_file_is_reported_not_swallowed() {
        let dir = tempdir().unwrap();
        let store = FsCheckpointStore::new(dir.path());

        tokio::fs::create_dir_all(dir.path()).await.unwrap();
        tokio::fs::write(store.checkpoint_path("bad"), b"not json")
            .await
            .unwrap();

        let err = store.load("bad").await.unwrap_err();
        assert!(matches!(err, CheckpointError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn no_tmp_file_left_behind() {
        let dir = tempdir().unwrap();
        let store = FsCheckpointStore::new(dir.path());
        store.save("h", &[vec![1.0]]).await.unwrap();

        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["partial_embeddings_h.json".to_string()]);
    }
}
