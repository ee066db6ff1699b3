use crate::errors::StrategyResult;
use crate::next_fit::NextFitWithH;
use crate::predicate::fits;
use crate::simple::{read_page_id, write_page_id};
use binary_helpers::le::{read_le, write_le};
use page::PageId;
use pageinfo::{PageInformation, PagesMap};

/// Maintains a bounded, ascending-by-used-bytes list of pages whose usage
/// ratio is below `u`. When the whole store's average usage ratio exceeds
/// `u`, tries that list append-only-style; otherwise defers to a wrapped
/// [`NextFitWithH`], whose scan opportunistically feeds visited pages back
/// into the list.
#[derive(Debug)]
pub struct HybridAonf {
    n: usize,
    u: f64,
    page_size: usize,
    sorted_list: Vec<(PageId, u32)>,
    wrapped: NextFitWithH,
}

impl HybridAonf {
    pub fn new(n: usize, u: f64) -> Self {
        Self {
            n: n.max(1),
            u,
            page_size: 0,
            sorted_list: Vec::new(),
            wrapped: NextFitWithH::new(n.max(1)),
        }
    }

    pub fn init(&mut self, pages: &PagesMap, page_size: usize, max_object_size: usize) {
        self.page_size = page_size;
        self.wrapped.init(pages, page_size, max_object_size);
        self.sorted_list.clear();
        for (id, info) in pages.iter() {
            self.maybe_insert(*id, info);
        }
    }

    fn usage_ratio(&self, info: &PageInformation) -> f64 {
        if self.page_size == 0 {
            return 0.0;
        }
        info.number_of_bytes_used_by_records() as f64 / self.page_size as f64
    }

    fn maybe_insert(&mut self, page_id: PageId, info: &PageInformation) {
        let ratio = self.usage_ratio(info);
        if ratio >= self.u {
            self.sorted_list.retain(|(id, _)| *id != page_id);
            return;
        }
        let used = info.number_of_bytes_used_by_records();
        if let Some(existing) = self.sorted_list.iter_mut().find(|(id, _)| *id == page_id) {
            existing.1 = used;
        } else {
            self.sorted_list.push((page_id, used));
        }
        self.sorted_list.sort_by_key(|(_, bytes)| *bytes);
        self.sorted_list.truncate(self.n);
    }

    fn total_usage_ratio(&self, pages: &PagesMap) -> f64 {
        let (total_bytes, page_count) = pages
            .iter()
            .fold((0u64, 0u64), |(bytes, count), (_, info)| {
                (bytes + info.number_of_bytes_used_by_records() as u64, count + 1)
            });
        if page_count == 0 || self.page_size == 0 {
            0.0
        } else {
            total_bytes as f64 / (page_count as f64 * self.page_size as f64)
        }
    }

    pub fn page_inserted(&mut self, pages: &PagesMap, page_id: PageId) {
        self.wrapped.page_inserted(pages, page_id);
        if let Some(info) = pages.get(&page_id) {
            self.maybe_insert(page_id, info);
        }
    }

    pub fn page_removed(&mut self, page_id: PageId) {
        self.wrapped.page_removed(page_id);
        self.sorted_list.retain(|(id, _)| *id != page_id);
    }

    pub fn record_updated(&mut self, pages: &PagesMap, page_id: PageId) {
        self.wrapped.record_updated(pages, page_id);
        if let Some(info) = pages.get(&page_id) {
            self.maybe_insert(page_id, info);
        } else {
            self.sorted_list.retain(|(id, _)| *id != page_id);
        }
    }

    pub fn get_page_for_record(
        &mut self,
        pages: &PagesMap,
        bytes_required: usize,
    ) -> StrategyResult<Option<PageId>> {
        let v = self.total_usage_ratio(pages);
        if v > self.u {
            for (id, _) in &self.sorted_list {
                if let Some(info) = pages.get(id) {
                    if fits(self.page_size, info, bytes_required) {
                        return Ok(Some(*id));
                    }
                }
            }
            Ok(None)
        } else {
            let found = self.wrapped.get_page_for_record(pages, bytes_required)?;
            if let Some(id) = found {
                if let Some(info) = pages.get(&id) {
                    self.maybe_insert(id, info);
                }
            }
            Ok(found)
        }
    }

    pub fn write(&self, out: &mut Vec<u8>) -> Result<(), binary_helpers::bin_error::BinaryError> {
        let mut buf = [0u8; 4];
        write_le::<u32>(&mut buf, 0, self.sorted_list.len() as u32)?;
        out.extend_from_slice(&buf);
        for (id, bytes) in &self.sorted_list {
            write_page_id(out, *id)?;
            let mut used_buf = [0u8; 4];
            write_le::<u32>(&mut used_buf, 0, *bytes)?;
            out.extend_from_slice(&used_buf);
        }
        self.wrapped.write(out)
    }

    pub fn read(
        &mut self,
        pages: &PagesMap,
        page_size: usize,
        max_object_size: usize,
        bytes: &[u8],
    ) -> Result<(), binary_helpers::bin_error::BinaryError> {
        self.init(pages, page_size, max_object_size);
        let len = read_le::<u32>(bytes, 0)? as usize;
        let mut pos = 4;
        let mut sorted_list = Vec::with_capacity(len);
        for _ in 0..len {
            let id = read_page_id(bytes, pos)?;
            pos += 8;
            let used = read_le::<u32>(bytes, pos)?;
            pos += 4;
            sorted_list.push((id, used));
        }
        self.sorted_list = sorted_list;
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
    fn append_only_path_is_used_when_average_usage_exceeds_threshold() {
        let mut pages = PagesMap::new();
        pages.insert(PageId::new(0, 0), page_with_bytes(120));
        pages.insert(PageId::new(0, 1), page_with_bytes(10));

        let mut strategy = HybridAonf::new(4, 0.5);
        strategy.init(&pages, 128, 128);
        // average usage ratio (120+10)/(2*128) ~= 0.51 > 0.5, so append-only kicks in.
        let result = strategy.get_page_for_record(&pages, 50).unwrap();
        assert_eq!(result, Some(PageId::new(0, 1)));
    }
}
