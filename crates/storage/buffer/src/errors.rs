use page::PageId;
use thiserror::Error;

/// Errors raised by the [`crate::buffer::BufferManager`].
#[derive(Debug, Error)]
pub enum BufferError {
    /// Every frame in the pool is pinned; no frame was free to satisfy the request.
    #[error("buffer pool is full, no frame available")]
    BufferFull,
    /// The page store reported that `page_id` could not be read.
    #[error("failed to read page {0:?} from the page store")]
    IoReadFailed(PageId),
}

/// Convenience alias for [`BufferError`]-producing results.
pub type BufferResult<T> = Result<T, BufferError>;
