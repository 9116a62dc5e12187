//! Filesystem backend

use super::r#trait::StorageBackend;
use crate::error::{LoadError, SaveError};
use async_trait::async_trait;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Stores each scope as a JSON file on disk.
///
/// Writes go to a sibling temp file first and are renamed over the target,
/// so a crash mid-write leaves the previous content intact.
#[derive(Debug, Clone)]
pub struct FsBackend {
    pretty: bool,
}

impl FsBackend {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn temp_path(path: &Path) -> PathBuf {
        let mut name = path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        path.with_file_name(name)
    }

    fn encode(&self, path: &Path, content: &Value) -> Result<Vec<u8>, SaveError> {
        let encoded = if self.pretty {
            serde_json::to_vec_pretty(content)
        } else {
            serde_json::to_vec(content)
        };
        encoded.map_err(|source| SaveError::Serialize {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Default for FsBackend {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl StorageBackend for FsBackend {
    async fn load(&self, path: &Path) -> Result<Value, LoadError> {
        let raw = fs::read_to_string(path).await.map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                LoadError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                LoadError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        serde_json::from_str(&raw).map_err(|source| LoadError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }

    async fn save(&self, path: &Path, content: &Value) -> Result<(), SaveError> {
        let io_err = |source| SaveError::Io {
            path: path.to_path_buf(),
            source,
        };

        let bytes = self.encode(path, content)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let temp = Self::temp_path(path);
        fs::write(&temp, bytes).await.map_err(io_err)?;
        if let Err(e) = fs::rename(&temp, path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(io_err(e));
        }

        tracing::trace!("Wrote {}", path.display());
        Ok(())
    }
}
