//! The `PageContainer` trait: the record manager's view of the page storage
//! layer. Deliberately oblivious to the slotted layout — it only moves
//! opaque, fixed-size byte blocks around, keyed by `PageId`.

use crate::errors::StorageResult;
use page::PageId;

/// A container of opaque, fixed-size page byte blocks. The record manager is
/// generic over this trait; it never depends on [`crate::storage_manager::StorageManager`]
/// directly.
pub trait PageContainer: std::fmt::Debug {
    /// The fixed size, in bytes, of every page this container stores.
    fn page_size(&self) -> usize;

    /// Reads the current bytes of `page_id`.
    fn get(&self, page_id: PageId) -> StorageResult<Vec<u8>>;

    /// Allocates a new page holding `bytes` and returns its id.
    /// `bytes.len()` must equal [`Self::page_size`].
    fn insert(&self, bytes: &[u8]) -> StorageResult<PageId>;

    /// Overwrites the bytes of an existing page.
    /// `bytes.len()` must equal [`Self::page_size`].
    fn update(&self, page_id: PageId, bytes: &[u8]) -> StorageResult<()>;

    /// Frees `page_id`, returning its page number to the container's free
    /// pool for the same file.
    fn remove(&self, page_id: PageId);

    /// Frees every id in `page_ids`.
    fn remove_all(&self, page_ids: &[PageId]) {
        for page_id in page_ids {
            self.remove(*page_id);
        }
    }

    /// The fixed width, in bytes, of an encoded `PageId`.
    fn page_id_size(&self) -> usize;

    /// Serializes `page_id` to its fixed-width on-disk form.
    fn encode_page_id(&self, page_id: PageId) -> Vec<u8>;

    /// Deserializes a `PageId` previously produced by [`Self::encode_page_id`].
    fn decode_page_id(&self, bytes: &[u8]) -> PageId;

    /// Forces any buffered writes out to durable storage.
    fn flush(&self);

    /// Flushes and releases any resources held by the container. After
    /// `close`, only persistence-adjacent operations are expected to run.
    fn close(&self) {
        self.flush();
    }
}
