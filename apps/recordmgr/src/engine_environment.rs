use crate::config::EngineConfig;
use buffer::BufferManager;
use file::{DiskPageStore, FileCatalog};
use page::FileId;
use recordmgr::RecordManager;
use std::sync::Arc;
use storage_api::StorageManager;

/// All record data for this demo lives in a single backing file.
const DATA_FILE_ID: FileId = 1;

/// State-file name a manager's persisted bytes are written to on close and
/// read back from on startup, alongside the data file itself.
const STATE_FILE_NAME: &str = "recordmgr.state";

/// Owner of the instances needed for the process's lifetime: the page store,
/// buffer, storage manager, and the record manager built on top of them.
pub struct EngineEnvironment {
    pub file_catalog: Arc<FileCatalog>,
    pub page_store: Arc<DiskPageStore>,
    pub buffer: Arc<BufferManager<DiskPageStore>>,
    pub manager: RecordManager<StorageManager<DiskPageStore>>,
    pub engine_config: EngineConfig,
}

impl EngineEnvironment {
    /// Wires the storage stack together and either opens an existing
    /// manager from its persisted state file or builds a fresh one.
    pub fn new(config: EngineConfig) -> Self {
        std::fs::create_dir_all(&config.storage.data_dir)
            .expect("failed to create storage.data_dir");

        let file_catalog = Arc::new(FileCatalog::new());
        let data_path = config.storage.data_dir.join("records.data");
        file_catalog.add_file(DATA_FILE_ID, data_path);

        let page_size = config.storage.page_size.get();
        let page_store = Arc::new(DiskPageStore::new(page_size, file_catalog.clone()));
        let buffer = Arc::new(BufferManager::new(
            page_store.clone(),
            page_size,
            config.storage.buffer_pages.get(),
        ));

        let max_object_size = config.record_manager.max_object_size.get();
        let reservation_capacity = config.record_manager.reservation_capacity.get();
        let strategy = config.record_manager.strategy.build();
        let translator = config.record_manager.translator.build();

        let state_path = config.storage.data_dir.join(STATE_FILE_NAME);
        let manager = match std::fs::read(&state_path) {
            Ok(bytes) => {
                tracing::info!(path = %state_path.display(), "opening record manager from persisted state");
                let container = StorageManager::new(page_store.clone(), buffer.clone(), DATA_FILE_ID);
                RecordManager::open(
                    container,
                    strategy,
                    translator,
                    max_object_size,
                    reservation_capacity,
                    &bytes,
                )
                .expect("failed to restore record manager state")
            }
            Err(_) => {
                tracing::info!("no persisted state found; starting a fresh record manager");
                let container = StorageManager::new(page_store.clone(), buffer.clone(), DATA_FILE_ID);
                RecordManager::new(
                    container,
                    strategy,
                    translator,
                    max_object_size,
                    reservation_capacity,
                )
            }
        };

        Self {
            file_catalog,
            page_store,
            buffer,
            manager,
            engine_config: config,
        }
    }

    /// Flushes buffered pages and writes the manager's state file.
    pub fn persist(&mut self) {
        let bytes = self
            .manager
            .write()
            .expect("failed to serialize record manager state");
        let state_path = self
            .engine_config
            .storage
            .data_dir
            .join(STATE_FILE_NAME);
        std::fs::write(&state_path, bytes).expect("failed to write record manager state file");
        self.buffer.flush_all();
        tracing::info!(path = %state_path.display(), "persisted record manager state");
    }
}
