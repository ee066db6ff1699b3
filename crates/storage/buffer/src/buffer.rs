//! Provides the implementation for the main buffer leveraged by the engine.

use crate::errors::{BufferError, BufferResult};
use crate::frame::{BufferFrame, FrameId};
use crate::guards::{PageReadGuard, PageWriteGuard};
use file::PageStore;
use page::PageId;
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Condvar, Mutex, RwLock, TryLockError};

/// The state of a page's entry in the buffer.
#[derive(Debug)]
enum PageState {
    /// Page is currently being loaded from the page store.
    Loading,
    /// Page has been loaded and is available at the given frame.
    Ready(FrameId),
}

/// An entry in the `PageId`->`FrameId` map.
#[derive(Debug)]
struct PageEntry {
    state: Mutex<PageState>,
    cond_var: Condvar,
}

/// The buffer manager responsible for caching page bytes in memory on top of
/// a [`PageStore`].
#[derive(Debug)]
pub struct BufferManager<S: PageStore> {
    page_store: Arc<S>,
    page_size: usize,
    page_map: RwLock<HashMap<PageId, Arc<PageEntry>>>,
    frames: Vec<BufferFrame>,
}

impl<S: PageStore> BufferManager<S> {
    /// Creates a new empty buffer manager with `pool_size` frames, each
    /// `page_size` bytes.
    pub fn new(page_store: Arc<S>, page_size: usize, pool_size: usize) -> Self {
        let mut frames = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            frames.push(BufferFrame::new(page_size));
        }
        Self {
            page_store,
            page_size,
            frames,
            page_map: RwLock::new(HashMap::new()),
        }
    }

    /// The byte size of every frame in this pool.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Retrieves a page's bytes from the buffer pool. Loads it from the page
    /// store on a cache miss.
    pub fn read_page(&self, page_id: PageId) -> BufferResult<PageReadGuard<'_>> {
        self.get_or_load_buffered_page(page_id, |s, fid| s.read_guard_from_frame(fid))
    }

    /// Retrieves a page's bytes with a write latch, loading it from the page
    /// store on a cache miss.
    pub fn read_page_mut(&self, page_id: PageId) -> BufferResult<PageWriteGuard<'_>> {
        self.get_or_load_buffered_page(page_id, |s, fid| s.write_guard_from_frame(fid))
    }

    /// Finds a free frame and claims it for a brand new page with the given
    /// `page_id`. The caller is responsible for initializing and zeroing the
    /// contents as it sees fit; the frame starts out zeroed.
    pub fn allocate_new_page(&self, page_id: PageId) -> BufferResult<PageWriteGuard<'_>> {
        let frame_id = self
            .claim_free_frame(page_id)
            .ok_or(BufferError::BufferFull)?;

        let mut map = self.page_map.write().unwrap();
        map.insert(
            page_id,
            Arc::new(PageEntry {
                state: Mutex::new(PageState::Ready(frame_id)),
                cond_var: Condvar::new(),
            }),
        );
        drop(map);

        Ok(self.write_guard_from_frame(frame_id))
    }

    /// Writes the page back to the page store if its frame is dirty, and
    /// clears the dirty flag. A no-op for pages not currently buffered.
    pub fn flush_page(&self, page_id: PageId) {
        let Some(frame_id) = self.frame_id_of(page_id) else {
            return;
        };
        let frame = &self.frames[frame_id];
        if frame.dirty.swap(false, Ordering::AcqRel) {
            let bytes = frame.bytes.read().unwrap();
            self.page_store.write_page(page_id, &bytes);
        }
    }

    /// Flushes every dirty frame currently in the pool.
    pub fn flush_all(&self) {
        let page_ids: Vec<PageId> = {
            let map = self.page_map.read().unwrap();
            map.keys().copied().collect()
        };
        for page_id in page_ids {
            self.flush_page(page_id);
        }
        self.page_store.flush();
    }

    /// Drops `page_id` from the buffer without writing it back, freeing its
    /// frame for reuse. Used when the page has been deleted from the
    /// underlying store and its bytes are no longer meaningful.
    pub fn evict_page(&self, page_id: PageId) {
        let mut map = self.page_map.write().unwrap();
        if let Some(entry) = map.remove(&page_id) {
            let state = entry.state.lock().unwrap();
            if let PageState::Ready(frame_id) = *state {
                let frame = &self.frames[frame_id];
                *frame.page_id.write().unwrap() = None;
                frame.dirty.store(false, Ordering::Relaxed);
            }
        }
    }

    fn frame_id_of(&self, page_id: PageId) -> Option<FrameId> {
        let map = self.page_map.read().unwrap();
        let entry = map.get(&page_id)?;
        Some(Self::wait_until_ready(entry))
    }

    /// Shared helper containing the common logic for loading or returning a
    /// page from the buffer. `make_guard` converts a `FrameId` into the
    /// requested guard (read or write).
    fn get_or_load_buffered_page<'a, Guard, MakeGuard>(
        &'a self,
        page_id: PageId,
        make_guard: MakeGuard,
    ) -> BufferResult<Guard>
    where
        MakeGuard: Fn(&'a Self, FrameId) -> Guard,
        Guard: 'a,
    {
        let possible_page_entry = {
            let map_guard = self.page_map.read().unwrap();
            map_guard.get(&page_id).cloned()
        };

        if let Some(page_entry) = possible_page_entry {
            let fid = Self::wait_until_ready(&page_entry);
            return Ok(make_guard(self, fid));
        }

        let (entry, is_loader_thread) = {
            let mut map = self.page_map.write().unwrap();

            if let Some(existing) = map.get(&page_id).cloned() {
                (existing, false)
            } else {
                let new_entry = Arc::new(PageEntry {
                    state: Mutex::new(PageState::Loading),
                    cond_var: Condvar::new(),
                });
                map.insert(page_id, new_entry.clone());
                (new_entry, true)
            }
        };

        if !is_loader_thread {
            let frame_id = Self::wait_until_ready(&entry);
            return Ok(make_guard(self, frame_id));
        }

        let frame_id = self
            .claim_free_frame(page_id)
            .ok_or(BufferError::BufferFull)?;
        {
            let mut bytes = self.frames[frame_id].bytes.write().unwrap();
            if !self.page_store.read_page(page_id, &mut bytes) {
                *self.frames[frame_id].page_id.write().unwrap() = None;
                let mut map = self.page_map.write().unwrap();
                map.remove(&page_id);
                return Err(BufferError::IoReadFailed(page_id));
            }
        }

        let guard = make_guard(self, frame_id);

        {
            let mut st = entry.state.lock().unwrap();
            *st = PageState::Ready(frame_id);
            entry.cond_var.notify_all();
        }

        Ok(guard)
    }

    /// Scans `frames` for an empty one, probing each frame's write-latch
    /// without blocking so already-claimed frames are skipped. When a free
    /// frame is found, `page_id` is set immediately to mark it taken even
    /// before its contents are loaded.
    fn claim_free_frame(&self, for_page_id: PageId) -> Option<FrameId> {
        for (frame_id, frame) in self.frames.iter().enumerate() {
            match frame.page_id.try_write() {
                Ok(mut page_id) => {
                    if page_id.is_none() {
                        *page_id = Some(for_page_id);
                        frame.pin_count.store(1, Ordering::Relaxed);
                        frame.dirty.store(false, Ordering::Relaxed);
                        return Some(frame_id);
                    }
                }
                Err(TryLockError::WouldBlock) => continue,
                Err(TryLockError::Poisoned(_)) => continue,
            }
        }
        None
    }

    fn read_guard_from_frame(&self, frame_id: FrameId) -> PageReadGuard<'_> {
        let guard = self.frames[frame_id].bytes.read().unwrap();
        PageReadGuard { guard }
    }

    fn write_guard_from_frame(&self, frame_id: FrameId) -> PageWriteGuard<'_> {
        let guard = self.frames[frame_id].bytes.write().unwrap();
        PageWriteGuard {
            guard,
            dirty: &self.frames[frame_id].dirty,
        }
    }

    /// Waits until the page behind `entry` finishes loading, returning its frame.
    fn wait_until_ready(entry: &Arc<PageEntry>) -> FrameId {
        let mut state = entry.state.lock().unwrap();
        loop {
            match *state {
                PageState::Ready(fid) => return fid,
                PageState::Loading => {
                    state = entry.cond_var.wait(state).unwrap();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use file::InMemoryPageStore;

    fn store_with_page(page_id: PageId, page_size: usize) -> Arc<InMemoryPageStore> {
        let store = Arc::new(InMemoryPageStore::new());
        store.write_page(page_id, &vec![0u8; page_size]);
        store
    }

    #[test]
    fn allocate_then_read_roundtrips_bytes() {
        let page_size = 16;
        let store = Arc::new(InMemoryPageStore::new());
        let buffer = BufferManager::new(store, page_size, 2);
        let page_id = PageId::new(0, 0);

        {
            let mut guard = buffer.allocate_new_page(page_id).unwrap();
            guard[0] = 42;
        }

        let guard = buffer.read_page(page_id).unwrap();
        assert_eq!(guard[0], 42);
    }

    #[test]
    fn flush_page_writes_dirty_frame_to_store() {
        let page_size = 8;
        let page_id = PageId::new(0, 0);
        let store = store_with_page(page_id, page_size);
        let buffer = BufferManager::new(Arc::clone(&store), page_size, 1);

        {
            let mut guard = buffer.read_page_mut(page_id).unwrap();
            guard[3] = 7;
        }
        buffer.flush_page(page_id);

        let mut raw = vec![0u8; page_size];
        store.read_page(page_id, &mut raw);
        assert_eq!(raw[3], 7);
    }

    #[test]
    fn pool_reports_full_once_every_frame_is_claimed() {
        let page_size = 8;
        let store = Arc::new(InMemoryPageStore::new());
        let buffer = BufferManager::new(store, page_size, 1);

        let _first = buffer.allocate_new_page(PageId::new(0, 0)).unwrap();
        let second = buffer.allocate_new_page(PageId::new(0, 1));
        assert!(matches!(second, Err(BufferError::BufferFull)));
    }

    #[test]
    fn evict_page_frees_its_frame_for_reuse() {
        let page_size = 8;
        let store = Arc::new(InMemoryPageStore::new());
        let buffer = BufferManager::new(store, page_size, 1);
        let page_id = PageId::new(0, 0);

        let _ = buffer.allocate_new_page(page_id).unwrap();
        buffer.evict_page(page_id);

        let reused = buffer.allocate_new_page(PageId::new(0, 1));
        assert!(reused.is_ok());
    }
}
