use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLockReadGuard, RwLockWriteGuard};

/// Provides read access to a page's bytes, as held by one of the buffer's
/// frames. Shared latch, allowing concurrent readers.
#[derive(Debug)]
pub struct PageReadGuard<'a> {
    pub(crate) guard: RwLockReadGuard<'a, Box<[u8]>>,
}

impl<'a> Deref for PageReadGuard<'a> {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

/// Provides exclusive access to a page's bytes. Any mutable borrow through
/// this guard marks the frame dirty, since the buffer manager has no way to
/// tell whether the caller actually changed anything.
#[derive(Debug)]
pub struct PageWriteGuard<'a> {
    pub(crate) guard: RwLockWriteGuard<'a, Box<[u8]>>,
    pub(crate) dirty: &'a AtomicBool,
}

impl<'a> Deref for PageWriteGuard<'a> {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl<'a> DerefMut for PageWriteGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.dirty.store(true, Ordering::Relaxed);
        &mut self.guard
    }
}
