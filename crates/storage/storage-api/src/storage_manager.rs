//! The storage manager: the default [`PageContainer`] implementation, built
//! on a [`PageStore`] fronted by a [`BufferManager`].

use crate::errors::{StorageError, StorageResult};
use crate::page_container::PageContainer;
use binary_helpers::le::{read_le, write_le};
use buffer::BufferManager;
use file::PageStore;
use page::{FileId, PageId};
use std::sync::Arc;

/// Implements the record manager's [`PageContainer`] trait on top of a
/// [`PageStore`] plus [`BufferManager`]. All pages live in a single
/// `file_id`; multiple data files are not needed for this engine's scope.
#[derive(Debug)]
pub struct StorageManager<S: PageStore> {
    page_store: Arc<S>,
    buffer: Arc<BufferManager<S>>,
    file_id: FileId,
}

impl<S: PageStore> StorageManager<S> {
    /// Creates a new `StorageManager` storing pages under `file_id`.
    pub fn new(page_store: Arc<S>, buffer: Arc<BufferManager<S>>, file_id: FileId) -> Self {
        Self {
            page_store,
            buffer,
            file_id,
        }
    }
}

impl<S: PageStore> PageContainer for StorageManager<S> {
    fn page_size(&self) -> usize {
        self.buffer.page_size()
    }

    fn get(&self, page_id: PageId) -> StorageResult<Vec<u8>> {
        let guard = self
            .buffer
            .read_page(page_id)
            .map_err(|source| StorageError::Buffer { page_id, source })?;
        Ok(guard.to_vec())
    }

    fn insert(&self, bytes: &[u8]) -> StorageResult<PageId> {
        let page_number = self.page_store.allocate_page_number(self.file_id);
        let page_id = PageId::new(self.file_id, page_number);
        let mut guard = self
            .buffer
            .allocate_new_page(page_id)
            .map_err(|source| StorageError::Buffer { page_id, source })?;
        guard.copy_from_slice(bytes);
        Ok(page_id)
    }

    fn update(&self, page_id: PageId, bytes: &[u8]) -> StorageResult<()> {
        let mut guard = self
            .buffer
            .read_page_mut(page_id)
            .map_err(|source| StorageError::Buffer { page_id, source })?;
        guard.copy_from_slice(bytes);
        Ok(())
    }

    fn remove(&self, page_id: PageId) {
        self.buffer.evict_page(page_id);
        self.page_store.remove_page(page_id);
        self.page_store.free_page_number(page_id);
    }

    fn page_id_size(&self) -> usize {
        8
    }

    fn encode_page_id(&self, page_id: PageId) -> Vec<u8> {
        let mut bytes = [0u8; 8];
        write_le(&mut bytes, 0, page_id.file_id).expect("fixed-size PageId buffer");
        write_le(&mut bytes, 4, page_id.page_number).expect("fixed-size PageId buffer");
        bytes.to_vec()
    }

    fn decode_page_id(&self, bytes: &[u8]) -> PageId {
        let file_id: u32 = read_le(bytes, 0).expect("8-byte PageId slice");
        let page_number: u32 = read_le(bytes, 4).expect("8-byte PageId slice");
        PageId::new(file_id, page_number)
    }

    fn flush(&self) {
        self.buffer.flush_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use file::InMemoryPageStore;

    fn manager(page_size: usize) -> StorageManager<InMemoryPageStore> {
        let store = Arc::new(InMemoryPageStore::new());
        let buffer = Arc::new(BufferManager::new(Arc::clone(&store), page_size, 4));
        StorageManager::new(store, buffer, 0)
    }

    #[test]
    fn insert_then_get_roundtrips_bytes() {
        let mgr = manager(16);
        let bytes = vec![7u8; 16];
        let page_id = mgr.insert(&bytes).unwrap();
        assert_eq!(mgr.get(page_id).unwrap(), bytes);
    }

    #[test]
    fn update_overwrites_existing_page() {
        let mgr = manager(8);
        let page_id = mgr.insert(&vec![0u8; 8]).unwrap();
        mgr.update(page_id, &vec![9u8; 8]).unwrap();
        assert_eq!(mgr.get(page_id).unwrap(), vec![9u8; 8]);
    }

    #[test]
    fn remove_then_insert_recycles_the_page_number() {
        let mgr = manager(8);
        let first = mgr.insert(&vec![1u8; 8]).unwrap();
        mgr.remove(first);
        let second = mgr.insert(&vec![2u8; 8]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn page_id_round_trips_through_the_converter() {
        let mgr = manager(8);
        let page_id = PageId::new(3, 77);
        let encoded = mgr.encode_page_id(page_id);
        assert_eq!(encoded.len(), mgr.page_id_size());
        assert_eq!(mgr.decode_page_id(&encoded), page_id);
    }
}
