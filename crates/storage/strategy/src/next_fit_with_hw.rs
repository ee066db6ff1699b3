use crate::errors::{StrategyError, StrategyResult};
use crate::histogram::{bucket_for_free_space, min_bucket_required};
use crate::predicate::fits;
use crate::simple::{read_page_id, write_page_id};
use page::header;
use page::PageId;
use pageinfo::{PageInformation, PagesMap};
use std::collections::HashMap;

fn free_space(page_size: usize, info: &PageInformation) -> usize {
    let used = info.number_of_bytes_used_by_records() as usize + info.reserved_bytes() as usize;
    page_size.saturating_sub(header::encoded_size(page_size, info.slot_count() as usize, used))
}

/// [`crate::next_fit::NextFitWithH`], with a per-bucket "witness" page kept
/// as a cheap existence proof: `getPageForRecord` tries the witness of the
/// smallest matching bucket before falling back to a full next-fit scan.
#[derive(Debug)]
pub struct NextFitWithHW {
    h: usize,
    max_object_size: usize,
    page_size: usize,
    counts: Vec<u32>,
    witnesses: Vec<Option<PageId>>,
    bucket_of: HashMap<PageId, usize>,
    last_key: Option<PageId>,
}

impl NextFitWithHW {
    pub fn new(h: usize) -> Self {
        let h = h.max(1);
        Self {
            h,
            max_object_size: 0,
            page_size: 0,
            counts: vec![0; h],
            witnesses: vec![None; h],
            bucket_of: HashMap::new(),
            last_key: None,
        }
    }

    pub fn init(&mut self, pages: &PagesMap, page_size: usize, max_object_size: usize) {
        self.page_size = page_size;
        self.max_object_size = max_object_size;
        self.counts = vec![0; self.h];
        self.witnesses = vec![None; self.h];
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
        self.witnesses[bucket] = Some(page_id);
        self.bucket_of.insert(page_id, bucket);
    }

    fn remove_from_bucket(&mut self, page_id: PageId, bucket: usize) {
        self.counts[bucket] = self.counts[bucket].saturating_sub(1);
        if self.witnesses[bucket] == Some(page_id) {
            self.witnesses[bucket] = None;
        }
    }

    pub fn page_inserted(&mut self, pages: &PagesMap, page_id: PageId) {
        if let Some(info) = pages.get(&page_id) {
            self.insert_into_bucket(page_id, info);
        }
    }

    pub fn page_removed(&mut self, page_id: PageId) {
        if let Some(bucket) = self.bucket_of.remove(&page_id) {
            self.remove_from_bucket(page_id, bucket);
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
            self.remove_from_bucket(page_id, old);
        }
        self.counts[new_bucket] += 1;
        self.witnesses[new_bucket] = Some(page_id);
        self.bucket_of.insert(page_id, new_bucket);
    }

    fn next_fit_scan(&self, pages: &PagesMap, bytes_required: usize) -> Option<PageId> {
        let ids: Vec<PageId> = pages.page_ids().copied().collect();
        if ids.is_empty() {
            return None;
        }
        let start_idx = match self.last_key {
            Some(k) => ids.iter().position(|x| *x == k).map(|i| (i + 1) % ids.len()).unwrap_or(0),
            None => 0,
        };
        for offset in 0..ids.len() {
            let idx = (start_idx + offset) % ids.len();
            let candidate = ids[idx];
            if let Some(info) = pages.get(&candidate) {
                if fits(self.page_size, info, bytes_required) {
                    return Some(candidate);
                }
            }
        }
        None
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
        let smallest_matching_bucket = (min_bucket..self.h).find(|&b| self.counts[b] > 0);
        let Some(bucket) = smallest_matching_bucket else {
            return Ok(None);
        };

        if let Some(witness) = self.witnesses[bucket] {
            if let Some(info) = pages.get(&witness) {
                if fits(self.page_size, info, bytes_required) {
                    self.last_key = Some(witness);
                    return Ok(Some(witness));
                }
            }
        }

        match self.next_fit_scan(pages, bytes_required) {
            Some(found) => {
                self.last_key = Some(found);
                Ok(Some(found))
            }
            None => Err(StrategyError::StaleHistogram),
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

    pub fn read(&mut self, pages: &PagesMap, page_size: usize, max_object_size: usize, bytes: &[u8]) -> Result<(), binary_helpers::bin_error::BinaryError> {
        self.init(pages, page_size, max_object_size);
        self.last_key = if bytes.first() == Some(&1) {
            Some(read_page_id(bytes, 1)?)
        } else {
            None
        };
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
    fn witness_short_circuits_the_scan() {
        let mut pages = PagesMap::new();
        pages.insert(PageId::new(0, 0), page_with_bytes(0));
        pages.insert(PageId::new(0, 1), page_with_bytes(127));

        let mut strategy = NextFitWithHW::new(4);
        strategy.init(&pages, 128, 128);
        let result = strategy.get_page_for_record(&pages, 10).unwrap();
        assert_eq!(result, Some(PageId::new(0, 0)));
    }
}
