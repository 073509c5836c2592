use metrics_exporter_prometheus::PrometheusHandle;
use sole_agent::config::{StorageBackend, StorageConfig};
use sole_agent::error::AppError;
use sole_agent::workflows::lettings::{
    JsonFileSnapshotStore, LettingsService, LettingsSnapshot, MemorySnapshotStore,
    NoopSnapshotStore, SnapshotStore, StoreError,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// The snapshot store selected by `APP_STORAGE_BACKEND`.
#[derive(Debug)]
pub(crate) enum ConfiguredStore {
    File(JsonFileSnapshotStore),
    Memory(MemorySnapshotStore),
    Disabled(NoopSnapshotStore),
}

impl ConfiguredStore {
    pub(crate) fn from_config(config: &StorageConfig) -> Self {
        match config.backend {
            StorageBackend::File => {
                Self::File(JsonFileSnapshotStore::new(&config.data_dir, &config.key))
            }
            StorageBackend::Memory => Self::Memory(MemorySnapshotStore::default()),
            StorageBackend::None => Self::Disabled(NoopSnapshotStore),
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Self::File(store) => format!("json file at {}", store.path().display()),
            Self::Memory(_) => "process memory".to_string(),
            Self::Disabled(_) => "disabled".to_string(),
        }
    }
}

impl SnapshotStore for ConfiguredStore {
    fn save(&self, snapshot: &LettingsSnapshot) -> Result<(), StoreError> {
        match self {
            Self::File(store) => store.save(snapshot),
            Self::Memory(store) => store.save(snapshot),
            Self::Disabled(store) => store.save(snapshot),
        }
    }

    fn load(&self) -> Result<Option<LettingsSnapshot>, StoreError> {
        match self {
            Self::File(store) => store.load(),
            Self::Memory(store) => store.load(),
            Self::Disabled(store) => store.load(),
        }
    }

    fn clear(&self) -> Result<(), StoreError> {
        match self {
            Self::File(store) => store.clear(),
            Self::Memory(store) => store.clear(),
            Self::Disabled(store) => store.clear(),
        }
    }

    fn is_durable(&self) -> bool {
        match self {
            Self::File(store) => store.is_durable(),
            Self::Memory(store) => store.is_durable(),
            Self::Disabled(store) => store.is_durable(),
        }
    }
}

/// Opens the lettings service over the configured store, loading any saved snapshot.
pub(crate) fn open_service(
    config: &StorageConfig,
) -> Result<Arc<LettingsService<ConfiguredStore>>, AppError> {
    let store = ConfiguredStore::from_config(config);
    info!(store = %store.describe(), "opening lettings store");
    let service = LettingsService::open(Arc::new(store))?;
    Ok(Arc::new(service))
}
