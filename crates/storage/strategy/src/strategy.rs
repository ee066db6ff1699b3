use crate::best_fit::{BestFit, BestFitOnNEmptiestPages};
use crate::errors::{StrategyError, StrategyResult};
use crate::hybrid_aonf::HybridAonf;
use crate::next_fit::{NextFit, NextFitWithH};
use crate::next_fit_with_hw::NextFitWithHW;
use crate::simple::{AppendOnly, AppendOnlyN, FirstFit, LastToFirstFit, Lru, OneRecordPerPage};
use binary_helpers::bin_error::BinaryError;
use binary_helpers::le::{read_le, write_le};
use page::PageId;
use pageinfo::{PageInformation, PagesMap};

/// The pluggable placement policy. Every variant reasons purely from
/// [`PagesMap`]/[`PageInformation`] plus whatever derived index it keeps for
/// itself — none of them ever reads page bytes.
///
/// Dispatch is a plain `match` over this enum rather than a trait object:
/// there are exactly fourteen named variants, several of them wrap another
/// `Strategy` recursively (`Hybrid`, `HybridBFOE`), and a `Box<dyn Strategy>`
/// would still need downcasting for those two to serialize their substrategy.
#[derive(Debug)]
pub enum Strategy {
    OneRecordPerPage,
    FirstFit,
    LastToFirstFit(LastToFirstFit),
    NextFit(NextFit),
    NextFitWithH(NextFitWithH),
    NextFitWithHW(NextFitWithHW),
    BestFit(BestFit),
    BestFitOnNEmptiestPages(BestFitOnNEmptiestPages),
    AppendOnly(AppendOnly),
    AppendOnlyN(AppendOnlyN),
    Lru(Lru),
    Hybrid(Box<Strategy>, Box<Strategy>),
    HybridBFOE(BestFitOnNEmptiestPages, Box<Strategy>),
    HybridAONF(HybridAonf),
}

impl Strategy {
    pub fn one_record_per_page() -> Self {
        Strategy::OneRecordPerPage
    }

    pub fn first_fit() -> Self {
        Strategy::FirstFit
    }

    pub fn last_to_first_fit() -> Self {
        Strategy::LastToFirstFit(LastToFirstFit::default())
    }

    pub fn next_fit() -> Self {
        Strategy::NextFit(NextFit::default())
    }

    pub fn next_fit_with_h(h: usize) -> Self {
        Strategy::NextFitWithH(NextFitWithH::new(h))
    }

    pub fn next_fit_with_hw(h: usize) -> Self {
        Strategy::NextFitWithHW(NextFitWithHW::new(h))
    }

    pub fn best_fit(percentage_free: f64) -> Self {
        Strategy::BestFit(BestFit::new(percentage_free))
    }

    pub fn best_fit_on_n_emptiest_pages(n: usize) -> Self {
        Strategy::BestFitOnNEmptiestPages(BestFitOnNEmptiestPages::new(n))
    }

    pub fn append_only() -> Self {
        Strategy::AppendOnly(AppendOnly::default())
    }

    pub fn append_only_n(n: usize) -> Self {
        Strategy::AppendOnlyN(AppendOnlyN::new(n))
    }

    pub fn lru(n: usize) -> Self {
        Strategy::Lru(Lru::new(n))
    }

    pub fn hybrid(s1: Strategy, s2: Strategy) -> Self {
        Strategy::Hybrid(Box::new(s1), Box::new(s2))
    }

    pub fn hybrid_bfoe(n: usize, fallback: Strategy) -> Self {
        Strategy::HybridBFOE(BestFitOnNEmptiestPages::new(n), Box::new(fallback))
    }

    pub fn hybrid_aonf(n: usize, u: f64) -> Self {
        Strategy::HybridAONF(HybridAonf::new(n, u))
    }

    /// Rebuilds every internal index from the current pages map. Idempotent.
    pub fn init(&mut self, pages: &PagesMap, page_size: usize, max_object_size: usize) {
        match self {
            Strategy::OneRecordPerPage | Strategy::FirstFit => {}
            Strategy::LastToFirstFit(s) => s.init(pages),
            Strategy::NextFit(_) => {}
            Strategy::NextFitWithH(s) => s.init(pages, page_size, max_object_size),
            Strategy::NextFitWithHW(s) => s.init(pages, page_size, max_object_size),
            Strategy::BestFit(s) => s.init(page_size),
            Strategy::BestFitOnNEmptiestPages(s) => s.init(pages),
            Strategy::AppendOnly(_) | Strategy::AppendOnlyN(_) | Strategy::Lru(_) => {}
            Strategy::Hybrid(s1, s2) => {
                s1.init(pages, page_size, max_object_size);
                s2.init(pages, page_size, max_object_size);
            }
            Strategy::HybridBFOE(bfoe, fallback) => {
                bfoe.init(pages);
                fallback.init(pages, page_size, max_object_size);
            }
            Strategy::HybridAONF(s) => s.init(pages, page_size, max_object_size),
        }
    }

    /// Returns a page predicted to have room for `bytes_required` more bytes, if any.
    pub fn get_page_for_record(
        &mut self,
        pages: &PagesMap,
        page_size: usize,
        bytes_required: usize,
    ) -> StrategyResult<Option<PageId>> {
        Ok(match self {
            Strategy::OneRecordPerPage => None,
            Strategy::FirstFit => FirstFit.get_page_for_record(pages, page_size, bytes_required),
            Strategy::LastToFirstFit(s) => s.get_page_for_record(pages, page_size, bytes_required),
            Strategy::NextFit(s) => s.get_page_for_record(pages, page_size, bytes_required),
            Strategy::NextFitWithH(s) => return s.get_page_for_record(pages, bytes_required),
            Strategy::NextFitWithHW(s) => return s.get_page_for_record(pages, bytes_required),
            Strategy::BestFit(s) => s.get_page_for_record(pages, page_size, bytes_required),
            Strategy::BestFitOnNEmptiestPages(s) => s.get_page_for_record(pages, page_size, bytes_required),
            Strategy::AppendOnly(s) => s.get_page_for_record(pages, page_size, bytes_required),
            Strategy::AppendOnlyN(s) => s.get_page_for_record(pages, page_size, bytes_required),
            Strategy::Lru(s) => s.get_page_for_record(pages, page_size, bytes_required),
            Strategy::Hybrid(s1, s2) => match s1.get_page_for_record(pages, page_size, bytes_required)? {
                Some(id) => Some(id),
                None => return s2.get_page_for_record(pages, page_size, bytes_required),
            },
            Strategy::HybridBFOE(bfoe, fallback) => {
                match bfoe.get_page_for_record(pages, page_size, bytes_required) {
                    Some(id) => Some(id),
                    None => return fallback.get_page_for_record(pages, page_size, bytes_required),
                }
            }
            Strategy::HybridAONF(s) => return s.get_page_for_record(pages, bytes_required),
        })
    }

    pub fn page_inserted(&mut self, pages: &PagesMap, page_id: PageId, info: &PageInformation) {
        match self {
            Strategy::OneRecordPerPage | Strategy::FirstFit | Strategy::NextFit(_) => {}
            Strategy::LastToFirstFit(s) => s.page_inserted(page_id),
            Strategy::NextFitWithH(s) => s.page_inserted(pages, page_id),
            Strategy::NextFitWithHW(s) => s.page_inserted(pages, page_id),
            Strategy::BestFit(_) => {}
            Strategy::BestFitOnNEmptiestPages(s) => {
                s.record_updated(page_id, info.number_of_bytes_used_by_records())
            }
            Strategy::AppendOnly(s) => s.page_inserted(page_id),
            Strategy::AppendOnlyN(s) => s.page_inserted(page_id),
            Strategy::Lru(s) => s.page_inserted(page_id),
            Strategy::Hybrid(s1, s2) => {
                s1.page_inserted(pages, page_id, info);
                s2.page_inserted(pages, page_id, info);
            }
            Strategy::HybridBFOE(bfoe, fallback) => {
                bfoe.record_updated(page_id, info.number_of_bytes_used_by_records());
                fallback.page_inserted(pages, page_id, info);
            }
            Strategy::HybridAONF(s) => s.page_inserted(pages, page_id),
        }
    }

    pub fn page_removed(&mut self, pages: &PagesMap, page_id: PageId) {
        match self {
            Strategy::OneRecordPerPage | Strategy::FirstFit | Strategy::BestFit(_) => {}
            Strategy::LastToFirstFit(s) => s.page_removed(page_id),
            Strategy::NextFit(s) => s.page_removed(page_id),
            Strategy::NextFitWithH(s) => s.page_removed(page_id),
            Strategy::NextFitWithHW(s) => s.page_removed(page_id),
            Strategy::BestFitOnNEmptiestPages(s) => s.page_removed(pages, page_id),
            Strategy::AppendOnly(_) => {}
            Strategy::AppendOnlyN(s) => s.page_removed(page_id),
            Strategy::Lru(s) => s.page_removed(page_id),
            Strategy::Hybrid(s1, s2) => {
                s1.page_removed(pages, page_id);
                s2.page_removed(pages, page_id);
            }
            Strategy::HybridBFOE(bfoe, fallback) => {
                bfoe.page_removed(pages, page_id);
                fallback.page_removed(pages, page_id);
            }
            Strategy::HybridAONF(s) => s.page_removed(page_id),
        }
    }

    pub fn record_updated(
        &mut self,
        pages: &PagesMap,
        page_id: PageId,
        info: &PageInformation,
        _record_nr: u16,
        _delta_records: i32,
        _delta_bytes: i64,
        _delta_links: i32,
    ) {
        match self {
            Strategy::OneRecordPerPage | Strategy::FirstFit | Strategy::NextFit(_) | Strategy::BestFit(_) => {}
            Strategy::LastToFirstFit(_) => {}
            Strategy::NextFitWithH(s) => s.record_updated(pages, page_id),
            Strategy::NextFitWithHW(s) => s.record_updated(pages, page_id),
            Strategy::BestFitOnNEmptiestPages(s) => {
                s.record_updated(page_id, info.number_of_bytes_used_by_records())
            }
            Strategy::AppendOnly(_) | Strategy::AppendOnlyN(_) => {}
            Strategy::Lru(s) => s.record_updated(page_id),
            Strategy::Hybrid(s1, s2) => {
                s1.record_updated(pages, page_id, info, _record_nr, _delta_records, _delta_bytes, _delta_links);
                s2.record_updated(pages, page_id, info, _record_nr, _delta_records, _delta_bytes, _delta_links);
            }
            Strategy::HybridBFOE(bfoe, fallback) => {
                bfoe.record_updated(page_id, info.number_of_bytes_used_by_records());
                fallback.record_updated(pages, page_id, info, _record_nr, _delta_records, _delta_bytes, _delta_links);
            }
            Strategy::HybridAONF(s) => s.record_updated(pages, page_id),
        }
    }

    /// Serializes this strategy's own durable part. Histograms and witness
    /// tables (`NextFitWithH`'s bucket counts, `NextFitWithHW`'s witnesses,
    /// `HybridAONF`'s wrapped histogram) are transient and rebuilt by
    /// `read`/`init` from the pages map rather than written here; only each
    /// variant's own scan cursor / tracked-page list / FIFO is included.
    pub fn write(&self, out: &mut Vec<u8>) -> StrategyResult<()> {
        match self {
            Strategy::OneRecordPerPage | Strategy::FirstFit => Ok(()),
            Strategy::LastToFirstFit(s) => Ok(s.write(out)?),
            Strategy::NextFit(s) => Ok(s.write(out)?),
            Strategy::NextFitWithH(s) => Ok(s.write(out)?),
            Strategy::NextFitWithHW(s) => Ok(s.write(out)?),
            Strategy::BestFit(s) => Ok(s.write(out)?),
            Strategy::BestFitOnNEmptiestPages(s) => Ok(s.write(out)?),
            Strategy::AppendOnly(s) => Ok(s.write(out)?),
            Strategy::AppendOnlyN(s) => Ok(s.write(out)?),
            Strategy::Lru(s) => Ok(s.write(out)?),
            Strategy::Hybrid(s1, s2) => {
                write_chunk(out, |buf| s1.write(buf))?;
                write_chunk(out, |buf| s2.write(buf))?;
                Ok(())
            }
            Strategy::HybridBFOE(bfoe, fallback) => {
                write_chunk(out, |buf| Ok(bfoe.write(buf)?))?;
                write_chunk(out, |buf| fallback.write(buf))?;
                Ok(())
            }
            Strategy::HybridAONF(s) => Ok(s.write(out)?),
        }
    }

    /// Restores this strategy's state from bytes produced by [`Self::write`],
    /// given the just-restored pages map — needed because several variants
    /// (`NextFitWithH`, `NextFitWithHW`, `HybridAONF`) rebuild their
    /// transient index via their own `init` as part of `read` rather than
    /// deserializing it directly.
    pub fn read(
        &mut self,
        pages: &PagesMap,
        page_size: usize,
        max_object_size: usize,
        bytes: &[u8],
    ) -> StrategyResult<()> {
        match self {
            Strategy::OneRecordPerPage | Strategy::FirstFit => Ok(()),
            Strategy::LastToFirstFit(s) => Ok(s.read(bytes)?),
            Strategy::NextFit(s) => Ok(s.read(bytes)?),
            Strategy::NextFitWithH(s) => Ok(s.read(pages, bytes)?),
            Strategy::NextFitWithHW(s) => Ok(s.read(pages, page_size, max_object_size, bytes)?),
            Strategy::BestFit(s) => Ok(s.read(bytes)?),
            Strategy::BestFitOnNEmptiestPages(s) => Ok(s.read(bytes)?),
            Strategy::AppendOnly(s) => Ok(s.read(bytes)?),
            Strategy::AppendOnlyN(s) => Ok(s.read(bytes)?),
            Strategy::Lru(s) => Ok(s.read(bytes)?),
            Strategy::Hybrid(s1, s2) => {
                let (first, rest) = read_chunk(bytes)?;
                s1.read(pages, page_size, max_object_size, first)?;
                let (second, _) = read_chunk(rest)?;
                s2.read(pages, page_size, max_object_size, second)?;
                Ok(())
            }
            Strategy::HybridBFOE(bfoe, fallback) => {
                let (first, rest) = read_chunk(bytes)?;
                bfoe.read(first)?;
                let (second, _) = read_chunk(rest)?;
                fallback.read(pages, page_size, max_object_size, second)?;
                Ok(())
            }
            Strategy::HybridAONF(s) => Ok(s.read(pages, page_size, max_object_size, bytes)?),
        }
    }

    pub fn close(&mut self) {}
}

/// Writes `f`'s output behind a 4-byte length prefix, so a recursive
/// variant's two nested strategies can be told apart on read without either
/// one needing to report how many bytes it consumed.
fn write_chunk<F>(out: &mut Vec<u8>, f: F) -> StrategyResult<()>
where
    F: FnOnce(&mut Vec<u8>) -> StrategyResult<()>,
{
    let mut buf = Vec::new();
    f(&mut buf)?;
    let mut len_buf = [0u8; 4];
    write_le::<u32>(&mut len_buf, 0, buf.len() as u32)?;
    out.extend_from_slice(&len_buf);
    out.extend_from_slice(&buf);
    Ok(())
}

/// Splits off one [`write_chunk`]-framed section, returning it and whatever
/// bytes follow it.
fn read_chunk(bytes: &[u8]) -> StrategyResult<(&[u8], &[u8])> {
    let len = read_le::<u32>(bytes, 0)? as usize;
    let body = bytes.get(4..4 + len).ok_or(StrategyError::Binary(BinaryError::SliceSizeMismatch {
        from_offset: 4,
        expected: len,
    }))?;
    Ok((body, &bytes[4 + len..]))
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
    fn hybrid_falls_back_to_second_strategy_on_miss() {
        let mut pages = PagesMap::new();
        pages.insert(PageId::new(0, 0), page_with_bytes(120));

        let mut strategy = Strategy::hybrid(Strategy::one_record_per_page(), Strategy::first_fit());
        strategy.init(&pages, 128, 128);
        let chosen = strategy.get_page_for_record(&pages, 128, 5).unwrap();
        assert_eq!(chosen, Some(PageId::new(0, 0)));
    }

    #[test]
    fn one_record_per_page_never_returns_a_page() {
        let mut pages = PagesMap::new();
        pages.insert(PageId::new(0, 0), page_with_bytes(0));
        let mut strategy = Strategy::one_record_per_page();
        strategy.init(&pages, 128, 128);
        assert_eq!(strategy.get_page_for_record(&pages, 128, 5).unwrap(), None);
    }
}
