//! Durable checkpoint storage on the local filesystem
//!
//! Each thread is one file, `<root>/<thread_id>.<ext>`. A put writes the new
//! encoding to a sibling temp file, syncs it, and renames it over the live
//! file. Rename within a directory is atomic on POSIX filesystems, so after a
//! crash the live file holds either the previous checkpoint or the new one.
//!
//! ```rust,no_run
//! use workflow_checkpoint::{Checkpoint, CheckpointStore, FileCheckpointStore};
//!
//! # async fn example() -> workflow_checkpoint::Result<()> {
//! let store = FileCheckpointStore::open("./data/checkpoints").await?;
//! store.put(Checkpoint::new("thread-1", 0u32, Some("start".to_string()))).await?;
//! let loaded: Option<Checkpoint<u32>> = store.get("thread-1").await?;
//! # Ok(())
//! # }
//! ```

use crate::checkpoint::Checkpoint;
use crate::error::{CheckpointError, Result};
use crate::serializer::{JsonSerializer, SerializerProtocol};
use crate::traits::CheckpointStore;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// One-file-per-thread checkpoint store with atomic replacement
#[derive(Debug, Clone)]
pub struct FileCheckpointStore<Ser = JsonSerializer> {
    root: PathBuf,
    serializer: Ser,
}

impl FileCheckpointStore<JsonSerializer> {
    /// Open (creating if needed) a JSON store rooted at `root`
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        Self::with_serializer(root, JsonSerializer::pretty()).await
    }
}

impl<Ser: SerializerProtocol> FileCheckpointStore<Ser> {
    /// Open a store with a custom serializer
    pub async fn with_serializer(root: impl Into<PathBuf>, serializer: Ser) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        tracing::debug!(root = %root.display(), "Opened file checkpoint store");
        Ok(Self { root, serializer })
    }

    /// Directory holding the checkpoint files
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, thread_id: &str) -> Result<PathBuf> {
        validate_thread_id(thread_id)?;
        Ok(self
            .root
            .join(format!("{}.{}", thread_id, self.serializer.extension())))
    }
}

/// Thread ids become file names, so anything that could escape the root
/// directory is rejected.
fn validate_thread_id(thread_id: &str) -> Result<()> {
    let invalid = thread_id.is_empty()
        || thread_id == "."
        || thread_id == ".."
        || thread_id.contains(&['/', '\\', '\0'][..]);
    if invalid {
        return Err(CheckpointError::Invalid(format!(
            "thread_id '{}' is not a valid storage key",
            thread_id
        )));
    }
    Ok(())
}

#[async_trait]
impl<S, Ser> CheckpointStore<S> for FileCheckpointStore<Ser>
where
    S: Serialize + DeserializeOwned + Send + Sync + 'static,
    Ser: SerializerProtocol + 'static,
{
    async fn get(&self, thread_id: &str) -> Result<Option<Checkpoint<S>>> {
        // No file can exist for an id that is not a valid storage key
        let Ok(path) = self.path_for(thread_id) else {
            return Ok(None);
        };
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let checkpoint: Checkpoint<S> = self.serializer.loads(&bytes)?;
        if checkpoint.thread_id != thread_id {
            return Err(CheckpointError::Invalid(format!(
                "file for '{}' holds checkpoint of thread '{}'",
                thread_id, checkpoint.thread_id
            )));
        }
        Ok(Some(checkpoint))
    }

    async fn put(&self, checkpoint: Checkpoint<S>) -> Result<()> {
        let path = self.path_for(&checkpoint.thread_id)?;
        let bytes = self.serializer.dumps(&checkpoint)?;

        let mut tmp_name = path.clone().into_os_string();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let mut file = tokio::fs::File::create(&tmp_path).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp_path, &path).await?;
        tracing::trace!(
            thread_id = %checkpoint.thread_id,
            bytes = bytes.len(),
            "Checkpoint written"
        );
        Ok(())
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        let Ok(path) = self.path_for(thread_id) else {
            return Ok(());
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_threads(&self) -> Result<Vec<String>> {
        let suffix = format!(".{}", self.serializer.extension());
        let mut threads = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if let Some(thread_id) = name.to_str().and_then(|n| n.strip_suffix(&suffix)) {
                threads.push(thread_id.to_string());
            }
        }
        Ok(threads)
    }
}
