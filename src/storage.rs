use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to create images directory {dir}: {source}")]
    Init {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {filename}: {source}")]
    Write {
        filename: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to remove {filename}: {source}")]
    Remove {
        filename: String,
        #[source]
        source: io::Error,
    },
    #[error("no such file: {0}")]
    NotFound(String),
}

/// Flat on-disk store for image bytes, shared by all workers through the
/// filesystem mount. Keys are the generated storage filenames.
#[derive(Clone)]
pub struct ImageStore {
    root: Arc<PathBuf>,
}

impl ImageStore {
    /// Opens the store, creating the directory if needed.
    pub async fn init(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|source| StorageError::Init {
                dir: root.clone(),
                source,
            })?;
        Ok(Self {
            root: Arc::new(root),
        })
    }

    pub fn path_of(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes the full contents under `filename`. The handle is scoped to
    /// this call; if any step fails the partial file is removed before the
    /// error propagates, so a failed save never leaves bytes behind.
    pub async fn save(&self, filename: &str, contents: &[u8]) -> Result<(), StorageError> {
        let path = self.path_of(filename);

        let result = async {
            let mut file = tokio::fs::File::create(&path).await?;
            file.write_all(contents).await?;
            file.flush().await?;
            Ok::<_, io::Error>(())
        }
        .await;

        if let Err(source) = result {
            // Best effort: the create itself may have failed.
            let _ = tokio::fs::remove_file(&path).await;
            return Err(StorageError::Write {
                filename: filename.to_string(),
                source,
            });
        }

        Ok(())
    }

    pub async fn remove(&self, filename: &str) -> Result<(), StorageError> {
        let path = self.path_of(filename);
        tokio::fs::remove_file(&path)
            .await
            .map_err(|source| match source.kind() {
                io::ErrorKind::NotFound => StorageError::NotFound(filename.to_string()),
                _ => StorageError::Remove {
                    filename: filename.to_string(),
                    source,
                },
            })
    }
}
