use crate::predicate::{fits, slack_after_insert};
use binary_helpers::le::{read_le, write_le};
use page::PageId;
use pageinfo::PagesMap;
use std::collections::VecDeque;

/// Always reports no page: every record becomes its own page.
#[derive(Debug, Default, Clone, Copy)]
pub struct OneRecordPerPage;

impl OneRecordPerPage {
    pub fn get_page_for_record(&self) -> Option<PageId> {
        None
    }
}

/// First `pageId` in pages-map order whose free-space predicate holds.
/// Stateless: the pages map's own ordering is the only index it needs.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstFit;

impl FirstFit {
    pub fn get_page_for_record(&self, pages: &PagesMap, page_size: usize, bytes_required: usize) -> Option<PageId> {
        pages
            .iter()
            .find(|(_, info)| fits(page_size, info, bytes_required))
            .map(|(id, _)| *id)
    }
}

/// Same predicate as [`FirstFit`], scanned in the opposite order. The pages
/// map only iterates forward, so this keeps its own ordered list.
#[derive(Debug, Default)]
pub struct LastToFirstFit {
    order: Vec<PageId>,
}

impl LastToFirstFit {
    pub fn init(&mut self, pages: &PagesMap) {
        self.order = pages.page_ids().copied().collect();
    }

    pub fn page_inserted(&mut self, page_id: PageId) {
        self.order.push(page_id);
    }

    pub fn page_removed(&mut self, page_id: PageId) {
        self.order.retain(|id| *id != page_id);
    }

    pub fn get_page_for_record(&self, pages: &PagesMap, page_size: usize, bytes_required: usize) -> Option<PageId> {
        self.order.iter().rev().find_map(|id| {
            let info = pages.get(id)?;
            fits(page_size, info, bytes_required).then_some(*id)
        })
    }

    pub fn write(&self, out: &mut Vec<u8>) -> Result<(), binary_helpers::bin_error::BinaryError> {
        write_page_id_vec(out, &self.order)
    }

    pub fn read(&mut self, bytes: &[u8]) -> Result<(), binary_helpers::bin_error::BinaryError> {
        self.order = read_page_id_vec(bytes)?;
        Ok(())
    }
}

/// Remembers the last page a record was inserted into; returns it iff it
/// still has room.
#[derive(Debug, Default)]
pub struct AppendOnly {
    last: Option<PageId>,
}

impl AppendOnly {
    pub fn page_inserted(&mut self, page_id: PageId) {
        self.last = Some(page_id);
    }

    pub fn get_page_for_record(&self, pages: &PagesMap, page_size: usize, bytes_required: usize) -> Option<PageId> {
        let id = self.last?;
        let info = pages.get(&id)?;
        fits(page_size, info, bytes_required).then_some(id)
    }

    pub fn write(&self, out: &mut Vec<u8>) -> Result<(), binary_helpers::bin_error::BinaryError> {
        write_option_page_id(out, self.last)
    }

    pub fn read(&mut self, bytes: &[u8]) -> Result<(), binary_helpers::bin_error::BinaryError> {
        self.last = read_option_page_id(bytes)?;
        Ok(())
    }
}

/// Bounded FIFO of the last `n` pages a record was inserted into, scanned
/// most-recent-first.
#[derive(Debug)]
pub struct AppendOnlyN {
    capacity: usize,
    recent: VecDeque<PageId>,
}

impl AppendOnlyN {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            recent: VecDeque::new(),
        }
    }

    pub fn page_inserted(&mut self, page_id: PageId) {
        self.recent.push_back(page_id);
        if self.recent.len() > self.capacity {
            self.recent.pop_front();
        }
    }

    pub fn page_removed(&mut self, page_id: PageId) {
        self.recent.retain(|id| *id != page_id);
    }

    pub fn get_page_for_record(&self, pages: &PagesMap, page_size: usize, bytes_required: usize) -> Option<PageId> {
        self.recent.iter().rev().find_map(|id| {
            let info = pages.get(id)?;
            fits(page_size, info, bytes_required).then_some(*id)
        })
    }

    pub fn write(&self, out: &mut Vec<u8>) -> Result<(), binary_helpers::bin_error::BinaryError> {
        let ids: Vec<PageId> = self.recent.iter().copied().collect();
        write_page_id_vec(out, &ids)
    }

    pub fn read(&mut self, bytes: &[u8]) -> Result<(), binary_helpers::bin_error::BinaryError> {
        self.recent = read_page_id_vec(bytes)?.into();
        Ok(())
    }
}

/// Bounded most-recently-used list, refreshed on every `record_updated`.
/// `get_page_for_record` performs best-fit over the tracked set.
#[derive(Debug)]
pub struct Lru {
    capacity: usize,
    order: VecDeque<PageId>,
}

impl Lru {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::new(),
        }
    }

    fn touch(&mut self, page_id: PageId) {
        self.order.retain(|id| *id != page_id);
        self.order.push_back(page_id);
        if self.order.len() > self.capacity {
            self.order.pop_front();
        }
    }

    pub fn page_inserted(&mut self, page_id: PageId) {
        self.touch(page_id);
    }

    pub fn record_updated(&mut self, page_id: PageId) {
        self.touch(page_id);
    }

    pub fn page_removed(&mut self, page_id: PageId) {
        self.order.retain(|id| *id != page_id);
    }

    pub fn get_page_for_record(&self, pages: &PagesMap, page_size: usize, bytes_required: usize) -> Option<PageId> {
        self.order
            .iter()
            .filter_map(|id| {
                let info = pages.get(id)?;
                slack_after_insert(page_size, info, bytes_required).map(|slack| (*id, slack))
            })
            .min_by_key(|(_, slack)| *slack)
            .map(|(id, _)| id)
    }

    pub fn write(&self, out: &mut Vec<u8>) -> Result<(), binary_helpers::bin_error::BinaryError> {
        let ids: Vec<PageId> = self.order.iter().copied().collect();
        write_page_id_vec(out, &ids)
    }

    pub fn read(&mut self, bytes: &[u8]) -> Result<(), binary_helpers::bin_error::BinaryError> {
        self.order = read_page_id_vec(bytes)?.into();
        Ok(())
    }
}

pub(crate) fn write_page_id_vec(
    out: &mut Vec<u8>,
    ids: &[PageId],
) -> Result<(), binary_helpers::bin_error::BinaryError> {
    let mut buf = [0u8; 4];
    write_le::<u32>(&mut buf, 0, ids.len() as u32)?;
    out.extend_from_slice(&buf);
    for id in ids {
        write_page_id(out, *id)?;
    }
    Ok(())
}

pub(crate) fn read_page_id_vec(bytes: &[u8]) -> Result<Vec<PageId>, binary_helpers::bin_error::BinaryError> {
    let len = read_le::<u32>(bytes, 0)? as usize;
    let mut ids = Vec::with_capacity(len);
    let mut pos = 4;
    for _ in 0..len {
        ids.push(read_page_id(bytes, pos)?);
        pos += 8;
    }
    Ok(ids)
}

pub(crate) fn write_page_id(out: &mut Vec<u8>, id: PageId) -> Result<(), binary_helpers::bin_error::BinaryError> {
    let mut buf = [0u8; 8];
    write_le::<u32>(&mut buf, 0, id.file_id)?;
    write_le::<u32>(&mut buf, 4, id.page_number)?;
    out.extend_from_slice(&buf);
    Ok(())
}

pub(crate) fn read_page_id(bytes: &[u8], pos: usize) -> Result<PageId, binary_helpers::bin_error::BinaryError> {
    let file_id = read_le::<u32>(bytes, pos)?;
    let page_number = read_le::<u32>(bytes, pos + 4)?;
    Ok(PageId::new(file_id, page_number))
}

fn write_option_page_id(out: &mut Vec<u8>, id: Option<PageId>) -> Result<(), binary_helpers::bin_error::BinaryError> {
    match id {
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

fn read_option_page_id(bytes: &[u8]) -> Result<Option<PageId>, binary_helpers::bin_error::BinaryError> {
    if bytes.first() == Some(&1) {
        Ok(Some(read_page_id(bytes, 1)?))
    } else {
        Ok(None)
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
    fn first_fit_returns_first_matching_page_in_map_order() {
        let mut pages = PagesMap::new();
        pages.insert(PageId::new(0, 0), page_with_bytes(100));
        pages.insert(PageId::new(0, 1), page_with_bytes(0));
        let strategy = FirstFit;
        let chosen = strategy.get_page_for_record(&pages, 128, 10);
        assert_eq!(chosen, Some(PageId::new(0, 1)));
    }

    #[test]
    fn last_to_first_fit_scans_in_reverse_insertion_order() {
        let mut pages = PagesMap::new();
        pages.insert(PageId::new(0, 0), page_with_bytes(0));
        pages.insert(PageId::new(0, 1), page_with_bytes(0));
        let mut strategy = LastToFirstFit::default();
        strategy.init(&pages);
        let chosen = strategy.get_page_for_record(&pages, 128, 10);
        assert_eq!(chosen, Some(PageId::new(0, 1)));
    }

    #[test]
    fn append_only_n_evicts_oldest_beyond_capacity() {
        let mut strategy = AppendOnlyN::new(2);
        strategy.page_inserted(PageId::new(0, 0));
        strategy.page_inserted(PageId::new(0, 1));
        strategy.page_inserted(PageId::new(0, 2));
        assert_eq!(strategy.recent.len(), 2);
        assert!(!strategy.recent.contains(&PageId::new(0, 0)));
    }

    #[test]
    fn lru_prefers_tightest_fit_among_tracked_pages() {
        let mut pages = PagesMap::new();
        pages.insert(PageId::new(0, 0), page_with_bytes(0));
        pages.insert(PageId::new(0, 1), page_with_bytes(90));
        let mut strategy = Lru::new(4);
        strategy.page_inserted(PageId::new(0, 0));
        strategy.page_inserted(PageId::new(0, 1));
        let chosen = strategy.get_page_for_record(&pages, 128, 10);
        assert_eq!(chosen, Some(PageId::new(0, 1)));
    }
}
