//! JSON file backed [`RelayStore`].

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::RelayStore;
use super::error::{StorageError, StorageResult};
use crate::types::{RelayRecord, RelayTarget};

/// Stores the relay target as a small pretty-printed JSON record.
#[derive(Debug, Clone)]
pub struct FileRelayStore {
    path: PathBuf,
}

impl FileRelayStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_record(&self) -> StorageResult<Option<RelayRecord>> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::file_io(&self.path, e)),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }
}

#[async_trait]
impl RelayStore for FileRelayStore {
    async fn load(&self) -> RelayTarget {
        match self.read_record().await {
            Ok(None) => {
                debug!(path = %self.path.display(), "No relay config yet");
                RelayTarget::Unconfigured
            }
            Ok(Some(record)) => {
                if record.is_partial() {
                    warn!(
                        path = %self.path.display(),
                        channel_id = ?record.channel_id,
                        guild_id = ?record.guild_id,
                        "Relay config is only partially set, treating as unconfigured"
                    );
                }
                RelayTarget::from(record)
            }
            Err(e) => {
                warn!(error = %e, "Failed to read relay config, treating as unconfigured");
                RelayTarget::Unconfigured
            }
        }
    }

    async fn save(&self, target: &RelayTarget) -> StorageResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::file_io(parent, e))?;
        }
        let data = to_pretty_json(&RelayRecord::from(*target))?;
        atomic_write_file(&self.path, &data).await
    }
}

/// Serialize with four-space indentation.
fn to_pretty_json(value: &impl Serialize) -> StorageResult<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}

/// Write data to a temp file, fsync it, then atomically rename to the final path.
///
/// The temp file name carries a ULID so concurrent writers never share one.
/// On failure the temp file is removed.
async fn atomic_write_file(final_path: &Path, data: &[u8]) -> StorageResult<()> {
    let file_name = final_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("relay_config");
    let temp_path = final_path.with_file_name(format!("{}.{}.tmp", file_name, ulid::Ulid::new()));

    let result = write_and_rename(&temp_path, final_path, data).await;
    if result.is_err() {
        match fs::remove_file(&temp_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %temp_path.display(), error = %e, "Failed to remove temp file");
            }
        }
    }
    result
}

async fn write_and_rename(temp_path: &Path, final_path: &Path, data: &[u8]) -> StorageResult<()> {
    let mut file = fs::File::create(temp_path)
        .await
        .map_err(|e| StorageError::file_io(temp_path, e))?;
    file.write_all(data)
        .await
        .map_err(|e| StorageError::file_io(temp_path, e))?;
    file.sync_all()
        .await
        .map_err(|e| StorageError::file_io(temp_path, e))?;
    drop(file);
    fs::rename(temp_path, final_path)
        .await
        .map_err(|e| StorageError::file_io(final_path, e))?;
    Ok(())
}
