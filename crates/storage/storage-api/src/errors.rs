use buffer::BufferError;
use page::PageId;
use thiserror::Error;

/// Errors raised by the [`crate::storage_manager::StorageManager`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// The buffer pool could not service the request.
    #[error("buffer pool error for page {page_id}: {source}")]
    Buffer {
        /// The page being accessed when the error occurred.
        page_id: PageId,
        /// The underlying buffer error.
        #[source]
        source: BufferError,
    },
}

/// Convenience alias for [`StorageError`]-producing results.
pub type StorageResult<T> = Result<T, StorageError>;
