use crate::file_catalog::FileCatalog;
use crate::page_number_allocator::PageNumberAllocator;
use crate::page_store::PageStore;
use page::{FileId, PageId};
use std::collections::HashMap;
use std::fs;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::{Arc, RwLock};

#[cfg(unix)]
use std::os::unix::fs::FileExt;
#[cfg(windows)]
use std::os::windows::fs::FileExt;

/// A disk-backed [`PageStore`]. One OS file per `file_id`, pages laid out
/// at `page_number * page_size` byte offsets.
#[derive(Debug)]
pub struct DiskPageStore {
    page_size: usize,
    files: RwLock<HashMap<FileId, Arc<File>>>,
    file_catalog: Arc<FileCatalog>,
    page_numbers: PageNumberAllocator,
}

impl DiskPageStore {
    pub fn new(page_size: usize, file_catalog: Arc<FileCatalog>) -> Self {
        Self {
            page_size,
            files: RwLock::new(HashMap::new()),
            file_catalog,
            page_numbers: PageNumberAllocator::new(),
        }
    }

    fn get_or_open_file(&self, file_id: FileId) -> Arc<File> {
        {
            let files = self.files.read().unwrap();
            if let Some(file) = files.get(&file_id) {
                return Arc::clone(file);
            }
        }

        let mut files = self.files.write().unwrap();
        if let Some(file) = files.get(&file_id) {
            return Arc::clone(file);
        }

        let path = self
            .file_catalog
            .get_file_name(file_id)
            .expect("file_id not registered in FileCatalog");

        Self::ensure_parent_dir(&path);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .expect("failed to open page file");

        let file = Arc::new(file);
        files.insert(file_id, Arc::clone(&file));
        file
    }

    #[inline]
    fn read_at(file: &File, buf: &mut [u8], offset: u64) -> std::io::Result<usize> {
        #[cfg(unix)]
        {
            file.read_at(buf, offset)
        }
        #[cfg(windows)]
        {
            file.seek_read(buf, offset)
        }
    }

    #[inline]
    fn write_at(file: &File, buf: &[u8], offset: u64) -> std::io::Result<usize> {
        #[cfg(unix)]
        {
            file.write_at(buf, offset)
        }
        #[cfg(windows)]
        {
            file.seek_write(buf, offset)
        }
    }

    fn ensure_parent_dir(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create data directory");
        }
    }
}

impl PageStore for DiskPageStore {
    fn read_page(&self, page_id: PageId, destination: &mut [u8]) -> bool {
        let file = self.get_or_open_file(page_id.file_id);
        let offset = (page_id.page_number as u64) * (self.page_size as u64);
        matches!(Self::read_at(file.as_ref(), destination, offset), Ok(n) if n == self.page_size)
    }

    fn write_page(&self, page_id: PageId, page_data: &[u8]) {
        let file = self.get_or_open_file(page_id.file_id);
        let offset = (page_id.page_number as u64) * (self.page_size as u64);

        let mut written = 0;
        while written < page_data.len() {
            let n = Self::write_at(file.as_ref(), &page_data[written..], offset + written as u64)
                .expect("disk write failed");
            if n == 0 {
                panic!("disk write failed - wrote 0 bytes");
            }
            written += n;
        }
    }

    fn remove_page(&self, page_id: PageId) {
        // Pages are recycled by the caller's free list; punching a hole in
        // the backing file is not worth the platform-specific code this
        // would need, so removal only stops tracking the page logically.
        let _ = page_id;
    }

    fn flush(&self) {
        let files = self.files.read().unwrap();
        for file in files.values() {
            let _ = file.sync_data();
        }
    }

    fn allocate_page_number(&self, file_id: FileId) -> u32 {
        self.page_numbers.allocate(file_id)
    }

    fn free_page_number(&self, page_id: PageId) {
        self.page_numbers.free(page_id);
    }
}
