use crate::predicate::slack_after_insert;
use crate::simple::{read_page_id, write_page_id};
use binary_helpers::le::{read_le, write_le};
use page::PageId;
use pageinfo::PagesMap;
use std::collections::HashSet;

/// Scans every page, picking the one with the smallest post-insertion
/// slack. Short-circuits once a page with slack at or below `off` is
/// found — `off` is derived once, at `init`, from the configured free-space
/// percentage and the (then newly known) page size, rather than recomputed
/// per call.
#[derive(Debug)]
pub struct BestFit {
    percentage_free: f64,
    off: usize,
}

impl BestFit {
    pub fn new(percentage_free: f64) -> Self {
        Self {
            percentage_free,
            off: 0,
        }
    }

    pub fn init(&mut self, page_size: usize) {
        self.off = (self.percentage_free * page_size as f64).floor().max(0.0) as usize;
    }

    pub fn get_page_for_record(&self, pages: &PagesMap, page_size: usize, bytes_required: usize) -> Option<PageId> {
        let mut best: Option<(PageId, usize)> = None;
        for (id, info) in pages.iter() {
            let Some(slack) = slack_after_insert(page_size, info, bytes_required) else {
                continue;
            };
            if slack <= self.off {
                return Some(*id);
            }
            match best {
                Some((_, best_slack)) if slack >= best_slack => {}
                _ => best = Some((*id, slack)),
            }
        }
        best.map(|(id, _)| id)
    }

    pub fn write(&self, out: &mut Vec<u8>) -> Result<(), binary_helpers::bin_error::BinaryError> {
        let mut buf = [0u8; 16];
        write_le::<u64>(&mut buf[0..8], 0, self.percentage_free.to_bits())?;
        write_le::<u64>(&mut buf[8..16], 0, self.off as u64)?;
        out.extend_from_slice(&buf);
        Ok(())
    }

    pub fn read(&mut self, bytes: &[u8]) -> Result<(), binary_helpers::bin_error::BinaryError> {
        self.percentage_free = f64::from_bits(read_le::<u64>(bytes, 0)?);
        self.off = read_le::<u64>(bytes, 8)? as usize;
        Ok(())
    }
}

/// Tracks the `n` pages with the lowest `numberOfBytesUsedByRecords`, and
/// performs best-fit only over that tracked set.
#[derive(Debug)]
pub struct BestFitOnNEmptiestPages {
    n: usize,
    tracked: Vec<(PageId, u32)>,
}

impl BestFitOnNEmptiestPages {
    pub fn new(n: usize) -> Self {
        Self {
            n: n.max(1),
            tracked: Vec::new(),
        }
    }

    pub fn init(&mut self, pages: &PagesMap) {
        let mut all: Vec<(PageId, u32)> = pages
            .iter()
            .map(|(id, info)| (*id, info.number_of_bytes_used_by_records()))
            .collect();
        all.sort_by_key(|(_, bytes)| *bytes);
        all.truncate(self.n);
        self.tracked = all;
    }

    fn max_index(&self) -> Option<usize> {
        self.tracked
            .iter()
            .enumerate()
            .max_by_key(|(_, (_, bytes))| *bytes)
            .map(|(i, _)| i)
    }

    fn refill(&mut self, pages: &PagesMap) {
        if self.tracked.len() >= self.n {
            return;
        }
        let tracked_ids: HashSet<PageId> = self.tracked.iter().map(|(id, _)| *id).collect();
        let mut candidates: Vec<(PageId, u32)> = pages
            .iter()
            .filter(|(id, _)| !tracked_ids.contains(*id))
            .map(|(id, info)| (*id, info.number_of_bytes_used_by_records()))
            .collect();
        candidates.sort_by_key(|(_, bytes)| *bytes);
        for candidate in candidates {
            if self.tracked.len() >= self.n {
                break;
            }
            self.tracked.push(candidate);
        }
    }

    pub fn record_updated(&mut self, page_id: PageId, used_bytes: u32) {
        if let Some(entry) = self.tracked.iter_mut().find(|(id, _)| *id == page_id) {
            entry.1 = used_bytes;
            return;
        }
        if self.tracked.len() < self.n {
            self.tracked.push((page_id, used_bytes));
            return;
        }
        if let Some(max_idx) = self.max_index() {
            if used_bytes < self.tracked[max_idx].1 {
                self.tracked[max_idx] = (page_id, used_bytes);
            }
        }
    }

    pub fn page_removed(&mut self, pages: &PagesMap, page_id: PageId) {
        if let Some(pos) = self.tracked.iter().position(|(id, _)| *id == page_id) {
            self.tracked.remove(pos);
            self.refill(pages);
        }
    }

    pub fn get_page_for_record(&self, pages: &PagesMap, page_size: usize, bytes_required: usize) -> Option<PageId> {
        self.tracked
            .iter()
            .filter_map(|(id, _)| {
                let info = pages.get(id)?;
                slack_after_insert(page_size, info, bytes_required).map(|slack| (*id, slack))
            })
            .min_by_key(|(_, slack)| *slack)
            .map(|(id, _)| id)
    }

    pub fn tracked_ids(&self) -> Vec<PageId> {
        self.tracked.iter().map(|(id, _)| *id).collect()
    }

    pub fn write(&self, out: &mut Vec<u8>) -> Result<(), binary_helpers::bin_error::BinaryError> {
        let mut buf = [0u8; 4];
        write_le::<u32>(&mut buf, 0, self.tracked.len() as u32)?;
        out.extend_from_slice(&buf);
        for (id, bytes) in &self.tracked {
            write_page_id(out, *id)?;
            let mut used_buf = [0u8; 4];
            write_le::<u32>(&mut used_buf, 0, *bytes)?;
            out.extend_from_slice(&used_buf);
        }
        Ok(())
    }

    pub fn read(&mut self, bytes: &[u8]) -> Result<(), binary_helpers::bin_error::BinaryError> {
        let len = read_le::<u32>(bytes, 0)? as usize;
        let mut pos = 4;
        let mut tracked = Vec::with_capacity(len);
        for _ in 0..len {
            let id = read_page_id(bytes, pos)?;
            pos += 8;
            let used = read_le::<u32>(bytes, pos)?;
            pos += 4;
            tracked.push((id, used));
        }
        self.tracked = tracked;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pageinfo::PageInformation;

    fn page_with_bytes(used: u32) -> PageInformation {
        let mut info = PageInformation::empty(4);
        info.update_reserve_information(0, 1, used as i64, 0);
        info
    }

    #[test]
    fn best_fit_picks_tightest_fit() {
        let mut pages = PagesMap::new();
        pages.insert(PageId::new(0, 0), page_with_bytes(0));
        pages.insert(PageId::new(0, 1), page_with_bytes(90));
        let mut strategy = BestFit::new(0.0);
        strategy.init(128);
        let chosen = strategy.get_page_for_record(&pages, 128, 10);
        assert_eq!(chosen, Some(PageId::new(0, 1)));
    }

    #[test]
    fn best_fit_on_n_emptiest_tracks_exactly_n_smallest() {
        let mut pages = PagesMap::new();
        for i in 0..10u32 {
            pages.insert(PageId::new(0, i), page_with_bytes(i * 10));
        }
        let mut strategy = BestFitOnNEmptiestPages::new(4);
        strategy.init(&pages);
        let mut tracked = strategy.tracked_ids();
        tracked.sort();
        assert_eq!(tracked.len(), 4);
        assert!(tracked.contains(&PageId::new(0, 0)));
        assert!(tracked.contains(&PageId::new(0, 3)));
        assert!(!tracked.contains(&PageId::new(0, 9)));
    }
}
