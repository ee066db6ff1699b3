use crate::errors::{StrategyError, StrategyResult};
use crate::histogram::{bucket_for_free_space, min_bucket_required};
use crate::predicate::fits;
use crate::simple::{read_page_id, read_page_id_vec, write_page_id, write_page_id_vec};
use binary_helpers::le::{read_le, write_le};
use page::header;
use page::PageId;
use pageinfo::{PageInformation, PagesMap};
use std::collections::HashMap;

fn free_space(page_size: usize, info: &PageInformation) -> usize {
    let used = info.number_of_bytes_used_by_records() as usize + info.reserved_bytes() as usize;
    page_size.saturating_sub(header::encoded_size(page_size, info.slot_count() as usize, used))
}

fn next_fit_scan(
    pages: &PagesMap,
    page_size: usize,
    bytes_required: usize,
    last_key: Option<PageId>,
) -> Option<PageId> {
    let ids: Vec<PageId> = pages.page_ids().copied().collect();
    if ids.is_empty() {
        return None;
    }
    let start_idx = match last_key {
        Some(k) => ids.iter().position(|x| *x == k).map(|i| (i + 1) % ids.len()).unwrap_or(0),
        None => 0,
    };
    for offset in 0..ids.len() {
        let idx = (start_idx + offset) % ids.len();
        let candidate = ids[idx];
        if let Some(info) = pages.get(&candidate) {
            if fits(page_size, info, bytes_required) {
                return Some(candidate);
            }
        }
    }
    None
}

/// Resumes scanning from the last page it handed out, wrapping around.
#[derive(Debug, Default)]
pub struct NextFit {
    last_key: Option<PageId>,
}

impl NextFit {
    pub fn get_page_for_record(&mut self, pages: &PagesMap, page_size: usize, bytes_required: usize) -> Option<PageId> {
        let found = next_fit_scan(pages, page_size, bytes_required, self.last_key);
        if found.is_some() {
            self.last_key = found;
        }
        found
    }

    pub fn page_removed(&mut self, page_id: PageId) {
        if self.last_key == Some(page_id) {
            self.last_key = None;
        }
    }

    pub fn write(&self, out: &mut Vec<u8>) -> Result<(), binary_helpers::bin_error::BinaryError> {
        match self.last_key {
            Some(id) => {
                out.push(1);
                write_page_id(out, id)
            }
            None => {
                out.push(0);
                Ok(())
            }
        }
    }

    pub fn read(&mut self, bytes: &[u8]) -> Result<(), binary_helpers::bin_error::BinaryError> {
        self.last_key = if bytes.first() == Some(&1) {
            Some(read_page_id(bytes, 1)?)
        } else {
            None
        };
        Ok(())
    }
}

/// [`NextFit`], but first consults an `H`-bucket histogram of free space so
/// a definitely-empty search can be skipped without a scan.
#[derive(Debug)]
pub struct NextFitWithH {
    pub(crate) h: usize,
    max_object_size: usize,
    page_size: usize,
    counts: Vec<u32>,
    bucket_of: HashMap<PageId, usize>,
    last_key: Option<PageId>,
}

impl NextFitWithH {
    pub fn new(h: usize) -> Self {
        Self {
            h: h.max(1),
            max_object_size: 0,
            page_size: 0,
            counts: vec![0; h.max(1)],
            bucket_of: HashMap::new(),
            last_key: None,
        }
    }

    pub fn init(&mut self, pages: &PagesMap, page_size: usize, max_object_size: usize) {
        self.page_size = page_size;
        self.max_object_size = max_object_size;
        self.counts = vec![0; self.h];
        self.bucket_of.clear();
        self.last_key = None;
        for (id, info) in pages.iter() {
            self.insert_into_bucket(*id, info);
        }
    }

    fn insert_into_bucket(&mut self, page_id: PageId, info: &PageInformation) {
        let fs = free_space(self.page_size, info);
        let bucket = bucket_for_free_space(fs, self.h, self.max_object_size);
        self.counts[bucket] += 1;
        self.bucket_of.insert(page_id, bucket);
    }

    pub fn page_inserted(&mut self, pages: &PagesMap, page_id: PageId) {
        if let Some(info) = pages.get(&page_id) {
            self.insert_into_bucket(page_id, info);
        }
    }

    pub fn page_removed(&mut self, page_id: PageId) {
        if let Some(bucket) = self.bucket_of.remove(&page_id) {
            self.counts[bucket] = self.counts[bucket].saturating_sub(1);
        }
        if self.last_key == Some(page_id) {
            self.last_key = None;
        }
    }

    pub fn record_updated(&mut self, pages: &PagesMap, page_id: PageId) {
        let Some(info) = pages.get(&page_id) else {
            return;
        };
        let new_bucket = bucket_for_free_space(free_space(self.page_size, info), self.h, self.max_object_size);
        let old_bucket = self.bucket_of.get(&page_id).copied();
        if old_bucket == Some(new_bucket) {
            return;
        }
        if let Some(old) = old_bucket {
            self.counts[old] = self.counts[old].saturating_sub(1);
        }
        self.counts[new_bucket] += 1;
        self.bucket_of.insert(page_id, new_bucket);
    }

    pub fn get_page_for_record(
        &mut self,
        pages: &PagesMap,
        bytes_required: usize,
    ) -> StrategyResult<Option<PageId>> {
        if self.max_object_size == 0 {
            return Ok(None);
        }
        let min_bucket = min_bucket_required(bytes_required, self.h, self.max_object_size);
        if min_bucket >= self.h {
            return Ok(None);
        }
        if !(min_bucket..self.h).any(|b| self.counts[b] > 0) {
            return Ok(None);
        }
        match next_fit_scan(pages, self.page_size, bytes_required, self.last_key) {
            Some(found) => {
                self.last_key = Some(found);
                Ok(Some(found))
            }
            None => Err(StrategyError::StaleHistogram),
        }
    }

    pub fn write(&self, out: &mut Vec<u8>) -> Result<(), binary_helpers::bin_error::BinaryError> {
        let mut buf = [0u8; 8];
        write_le::<u32>(&mut buf[0..4], 0, self.max_object_size as u32)?;
        write_le::<u32>(&mut buf[4..8], 0, self.page_size as u32)?;
        out.extend_from_slice(&buf);
        let ids: Vec<PageId> = self.bucket_of.keys().copied().collect();
        write_page_id_vec(out, &ids)?;
        match self.last_key {
            Some(id) => {
                out.push(1);
                write_page_id(out, id)
            }
            None => {
                out.push(0);
                Ok(())
            }
        }
    }

    pub fn read(&mut self, pages: &PagesMap, bytes: &[u8]) -> Result<(), binary_helpers::bin_error::BinaryError> {
        let max_object_size = read_le::<u32>(bytes, 0)? as usize;
        let page_size = read_le::<u32>(bytes, 4)? as usize;
        let _tracked_ids = read_page_id_vec(&bytes[8..])?;
        self.init(pages, page_size, max_object_size);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with_bytes(used: u32) -> PageInformation {
        let mut info = PageInformation::empty(4);
        info.update_reserve_information(0, 1, used as i64, 0);
        info
    }

    #[test]
    fn next_fit_wraps_around_after_the_last_key() {
        let mut pages = PagesMap::new();
        pages.insert(PageId::new(0, 0), page_with_bytes(0));
        pages.insert(PageId::new(0, 1), page_with_bytes(0));
        pages.insert(PageId::new(0, 2), page_with_bytes(0));

        let mut strategy = NextFit::default();
        let first = strategy.get_page_for_record(&pages, 128, 10).unwrap();
        assert_eq!(first, PageId::new(0, 0));
        let second = strategy.get_page_for_record(&pages, 128, 10).unwrap();
        assert_eq!(second, PageId::new(0, 1));
    }

    #[test]
    fn histogram_rules_out_impossible_requests_without_scanning() {
        let mut pages = PagesMap::new();
        pages.insert(PageId::new(0, 0), page_with_bytes(120));

        let mut strategy = NextFitWithH::new(4);
        strategy.init(&pages, 128, 128);
        let result = strategy.get_page_for_record(&pages, 128, 1000).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn histogram_finds_a_page_when_one_fits() {
        let mut pages = PagesMap::new();
        pages.insert(PageId::new(0, 0), page_with_bytes(0));

        let mut strategy = NextFitWithH::new(4);
        strategy.init(&pages, 128, 128);
        let result = strategy.get_page_for_record(&pages, 10).unwrap();
        assert_eq!(result, Some(PageId::new(0, 0)));
    }
}
