use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::store::LettingsSnapshot;

/// Key-value blob storage for the whole snapshot, keyed by one well-known name.
///
/// The service calls `load` once at startup and `save` after each committed
/// command. Saving is best effort: failures are reported but never undo a command.
pub trait SnapshotStore: Send + Sync {
    fn save(&self, snapshot: &LettingsSnapshot) -> Result<(), StoreError>;
    fn load(&self) -> Result<Option<LettingsSnapshot>, StoreError>;
    fn clear(&self) -> Result<(), StoreError>;

    /// Whether a successful `save` outlives the process.
    fn is_durable(&self) -> bool {
        true
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("snapshot io failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot could not be encoded or decoded: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("snapshot store unavailable: {0}")]
    Unavailable(String),
}

/// Keeps nothing. The service stays correct, just not durable.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSnapshotStore;

impl SnapshotStore for NoopSnapshotStore {
    fn save(&self, _snapshot: &LettingsSnapshot) -> Result<(), StoreError> {
        Ok(())
    }

    fn load(&self) -> Result<Option<LettingsSnapshot>, StoreError> {
        Ok(None)
    }

    fn clear(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }
}

/// Holds the encoded blob in process memory, as a browser's local storage would.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    blob: Mutex<Option<String>>,
}

impl MemorySnapshotStore {
    pub fn raw(&self) -> Option<String> {
        self.blob
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn save(&self, snapshot: &LettingsSnapshot) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(snapshot)?;
        *self.blob.lock().unwrap_or_else(PoisonError::into_inner) = Some(encoded);
        Ok(())
    }

    fn load(&self) -> Result<Option<LettingsSnapshot>, StoreError> {
        let guard = self.blob.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_deref() {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.blob.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Stores the snapshot as pretty JSON at `<data_dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileSnapshotStore {
    path: PathBuf,
}

impl JsonFileSnapshotStore {
    pub fn new(data_dir: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: data_dir.as_ref().join(format!("{key}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SnapshotStore for JsonFileSnapshotStore {
    fn save(&self, snapshot: &LettingsSnapshot) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }

        // Write beside the target and rename so readers never see a torn file.
        let staging = self.path.with_extension("json.tmp");
        let encoded = serde_json::to_vec_pretty(snapshot)?;
        fs::write(&staging, encoded).map_err(|source| self.io_error(source))?;
        fs::rename(&staging, &self.path).map_err(|source| self.io_error(source))?;
        Ok(())
    }

    fn load(&self) -> Result<Option<LettingsSnapshot>, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(self.io_error(source)),
        }
    }
}
