//! JSON persistence for the registry's record list.
//!
//! The whole list is stored as one pretty-printed JSON array in
//! `<storage_dir>/modules.json`. Saves go through a temporary file in the
//! same directory followed by a rename, so a crash mid-write leaves the
//! previous snapshot in place.

use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::module::ModuleRecord;

pub const MODULES_FILE_NAME: &str = "modules.json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse {}: {source}", .path.display())]
    Deserialization {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to encode modules: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone)]
pub struct ModuleStore {
    path: PathBuf,
}

impl ModuleStore {
    pub fn new<P: AsRef<Path>>(storage_dir: P) -> Self {
        Self {
            path: storage_dir.as_ref().join(MODULES_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the persisted list. `Ok(None)` means no file has been written yet.
    pub async fn load(&self) -> StoreResult<Option<Vec<ModuleRecord>>> {
        let contents = match fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        let records =
            serde_json::from_slice(&contents).map_err(|e| StoreError::Deserialization {
                path: self.path.clone(),
                source: e,
            })?;
        Ok(Some(records))
    }

    pub async fn save<'a, I>(&self, records: I) -> StoreResult<()>
    where
        I: IntoIterator<Item = &'a ModuleRecord>,
    {
        let records: Vec<&ModuleRecord> = records.into_iter().collect();
        let json = serde_json::to_vec_pretty(&records)?;
        self.write_atomically(&json)
            .await
            .map_err(|e| StoreError::Write {
                path: self.path.clone(),
                source: e,
            })
    }

    async fn write_atomically(&self, data: &[u8]) -> std::io::Result<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let (file, temp_path) = NamedTempFile::new_in(dir)?.into_parts();
        let mut file = fs::File::from_std(file);
        file.write_all(data).await?;
        file.flush().await?;
        file.sync_all().await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o644))
                .await?;
        }
        drop(file);

        temp_path.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}
