use page::PageId;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU32};

/// The ID of a frame is basically just its index in the buffer's vector.
pub(crate) type FrameId = usize;

/// A buffer frame is a fixed-size byte allocation holding the raw contents of
/// a data page in memory, along with the metadata the buffer manager needs to
/// track it.
///
/// Unlike a page's decoded, structured representation, the frame only ever
/// holds the page's encoded bytes: decoding into slots happens above the
/// buffer, in whichever layer actually needs to look at individual records.
///
/// Access to the `BufferFrame` is not allowed outside the `BufferManager` -
/// instead, `guard`-like structs provide references to the underlying bytes.
#[derive(Debug)]
pub(crate) struct BufferFrame {
    /// The `PageId` corresponding to the bytes stored in `bytes`.
    /// `None` if the frame is empty.
    pub(crate) page_id: RwLock<Option<PageId>>,

    /// The page's encoded bytes, always exactly `page_size` long.
    pub(crate) bytes: RwLock<Box<[u8]>>,

    /// Pin count for the frame. Only the claim/release protocol touches this;
    /// there is no eviction policy, so a pinned frame stays pinned until its
    /// page is explicitly released.
    pub(crate) pin_count: AtomicU32,

    /// Whether `bytes` has been written to since it was loaded or last flushed.
    pub(crate) dirty: AtomicBool,
}

impl BufferFrame {
    pub(crate) fn new(page_size: usize) -> Self {
        Self {
            page_id: RwLock::new(None),
            bytes: RwLock::new(vec![0u8; page_size].into_boxed_slice()),
            pin_count: AtomicU32::new(0),
            dirty: AtomicBool::new(false),
        }
    }
}
