//! The in-memory decoded representation of a slotted page, and the codec
//! that turns it into / out of the bytes the page container stores.

use crate::errors::{PageError, PageResult, MAX_RECORDS_PER_PAGE};
use crate::header::{self, OffsetWidth, PageHeader};

/// A single slot on a page: either an ordinary record, or a link record
/// pointing at the record's new home after it moved (see the record
/// manager's link-record handling).
#[derive(Debug, Clone)]
struct Slot {
    record_nr: u16,
    is_link: bool,
    bytes: Vec<u8>,
}

/// A fully decoded page: every slot's record number, kind, and payload bytes,
/// in insertion order.
///
/// Every mutating operation here works purely on this in-memory form; bytes
/// are produced only by [`Page::encode`] and consumed only by [`Page::decode`].
/// This format re-derives and re-encodes the whole header on every write
/// rather than patching a live buffer in place — this format's offsets all
/// shift on every insert/remove, so a decode-mutate-encode cycle is simpler
/// to reason about than partial in-place updates.
#[derive(Debug, Clone)]
pub struct Page {
    page_size: usize,
    slots: Vec<Slot>,
}

impl Page {
    /// Builds a fresh, empty page of the given size.
    pub fn empty(page_size: usize) -> Self {
        Self {
            page_size,
            slots: Vec::new(),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Decodes only the header, without materializing any record payloads.
    /// Used by strategies and consistency checks that only need occupancy
    /// and offset bookkeeping.
    pub fn decode_header(bytes: &[u8], page_size: usize) -> PageResult<PageHeader> {
        PageHeader::decode(bytes, page_size)
    }

    /// Decodes a full page, including every record's payload bytes.
    pub fn decode(bytes: &[u8], page_size: usize) -> PageResult<Self> {
        let header = PageHeader::decode(bytes, page_size)?;
        let payload_start = header.header_bytes_len();

        let mut slots = Vec::with_capacity(header.slot_count());
        for i in 0..header.slot_count() {
            let start = payload_start + header.offsets[i] as usize;
            let end = payload_start + header.offsets[i + 1] as usize;
            let record_bytes = bytes
                .get(start..end)
                .ok_or_else(|| PageError::CorruptSlotTable {
                    reason: format!("slot {i} payload range {start}..{end} out of bounds"),
                })?
                .to_vec();
            slots.push(Slot {
                record_nr: header.record_nrs[i],
                is_link: header.link_bits[i],
                bytes: record_bytes,
            });
        }

        Ok(Self { page_size, slots })
    }

    fn to_header(&self) -> PageHeader {
        let mut offsets = Vec::with_capacity(self.slots.len() + 1);
        offsets.push(0u32);
        let mut running = 0u32;
        for slot in &self.slots {
            running += slot.bytes.len() as u32;
            offsets.push(running);
        }
        PageHeader {
            page_size: self.page_size,
            offset_width: OffsetWidth::for_page_size(self.page_size),
            record_nrs: self.slots.iter().map(|s| s.record_nr).collect(),
            link_bits: self.slots.iter().map(|s| s.is_link).collect(),
            offsets,
        }
    }

    /// Total encoded size this page would need with its current slot table.
    pub fn encoded_size(&self) -> usize {
        let total_bytes: usize = self.slots.iter().map(|s| s.bytes.len()).sum();
        header::encoded_size(self.page_size, self.slots.len(), total_bytes)
    }

    /// Bytes still free on the page.
    pub fn free_space(&self) -> usize {
        self.page_size.saturating_sub(self.encoded_size())
    }

    /// Encodes this page into exactly `page_size` bytes.
    pub fn encode(&self) -> PageResult<Vec<u8>> {
        let header = self.to_header();
        let encoded_size = header.encoded_size();
        if encoded_size > self.page_size {
            return Err(PageError::DoesNotFit {
                encoded: encoded_size,
                page_size: self.page_size,
            });
        }

        let mut out = vec![0u8; self.page_size];
        header.encode_into(&mut out[..header.header_bytes_len()])?;

        let payload_start = header.header_bytes_len();
        let mut pos = payload_start;
        for slot in &self.slots {
            out[pos..pos + slot.bytes.len()].copy_from_slice(&slot.bytes);
            pos += slot.bytes.len();
        }

        Ok(out)
    }

    /// Number of slots (records and links) on the page.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn find(&self, record_nr: u16) -> PageResult<usize> {
        self.slots
            .iter()
            .position(|s| s.record_nr == record_nr)
            .ok_or(PageError::RecordNotFound { record_nr })
    }

    pub fn is_used(&self, record_nr: u16) -> bool {
        self.slots.iter().any(|s| s.record_nr == record_nr)
    }

    /// Returns a record's bytes and whether it is a link record.
    pub fn get_record(&self, record_nr: u16) -> PageResult<(&[u8], bool)> {
        let idx = self.find(record_nr)?;
        let slot = &self.slots[idx];
        Ok((&slot.bytes, slot.is_link))
    }

    pub fn get_record_size(&self, record_nr: u16) -> PageResult<usize> {
        let idx = self.find(record_nr)?;
        Ok(self.slots[idx].bytes.len())
    }

    /// The next record number this page would hand out for a new record.
    ///
    /// Mirrors the Java source's allocator: prefer reusing the hole directly
    /// below the current minimum, then the one directly above the current
    /// maximum, and only fall back to a linear scan for the smallest unused
    /// number once both of those are unavailable (e.g. min is already 0 and
    /// max is already `MAX_RECORDS_PER_PAGE`).
    pub fn get_free_record_number(&self) -> PageResult<u16> {
        match self.min_max_record_nr() {
            None => Ok(0),
            Some((min, max)) => {
                if min > 0 {
                    Ok(min - 1)
                } else if max < MAX_RECORDS_PER_PAGE {
                    Ok(max + 1)
                } else {
                    (0..=MAX_RECORDS_PER_PAGE)
                        .find(|nr| !self.is_used(*nr))
                        .ok_or(PageError::OutOfSlotSpace {
                            max: MAX_RECORDS_PER_PAGE,
                        })
                }
            }
        }
    }

    /// Smallest and largest record number present on the page, if any.
    pub fn record_number_range(&self) -> Option<(u16, u16)> {
        self.min_max_record_nr()
    }

    fn min_max_record_nr(&self) -> Option<(u16, u16)> {
        if self.slots.is_empty() {
            return None;
        }
        let min = self.slots.iter().map(|s| s.record_nr).min().unwrap();
        let max = self.slots.iter().map(|s| s.record_nr).max().unwrap();
        Some((min, max))
    }

    fn insert_at(&mut self, record_nr: u16, is_link: bool, bytes: Vec<u8>) -> PageResult<()> {
        if self.is_used(record_nr) {
            return Err(PageError::RecordNumberInUse { record_nr });
        }
        if self.slots.len() >= MAX_RECORDS_PER_PAGE as usize {
            return Err(PageError::OutOfSlotSpace {
                max: MAX_RECORDS_PER_PAGE,
            });
        }

        let total_bytes: usize = self.slots.iter().map(|s| s.bytes.len()).sum::<usize>() + bytes.len();
        let prospective = header::encoded_size(self.page_size, self.slots.len() + 1, total_bytes);
        if prospective > self.page_size {
            return Err(PageError::DoesNotFit {
                encoded: prospective,
                page_size: self.page_size,
            });
        }

        self.slots.push(Slot {
            record_nr,
            is_link,
            bytes,
        });
        Ok(())
    }

    /// Inserts `bytes` as a new ordinary record, picking the record number
    /// via [`Self::get_free_record_number`]. Returns the assigned number.
    pub fn insert_record(&mut self, bytes: Vec<u8>) -> PageResult<u16> {
        let record_nr = self.get_free_record_number()?;
        self.insert_at(record_nr, false, bytes)?;
        Ok(record_nr)
    }

    /// Inserts a zero-length placeholder record, used to reserve a slot
    /// (and a stable TID) ahead of the payload being known.
    pub fn insert_empty_record(&mut self) -> PageResult<u16> {
        self.insert_record(Vec::new())
    }

    /// Inserts `bytes` as an ordinary record at a specific, already-chosen
    /// `record_nr` instead of picking one via [`Self::get_free_record_number`].
    /// Used to materialize a reservation whose TID was already handed out.
    pub fn insert_record_at(&mut self, record_nr: u16, bytes: Vec<u8>) -> PageResult<()> {
        self.insert_at(record_nr, false, bytes)
    }

    /// Inserts a link record: `bytes` is the serialized TID of the record's
    /// new location.
    pub fn insert_link_record(&mut self, bytes: Vec<u8>) -> PageResult<u16> {
        let record_nr = self.get_free_record_number()?;
        self.insert_at(record_nr, true, bytes)?;
        Ok(record_nr)
    }

    /// Inserts a link record at a specific, already-chosen `record_nr`
    /// instead of picking one via [`Self::get_free_record_number`]. Used
    /// when a record moves off its original slot and that slot must keep
    /// forwarding to the new location under the same external id.
    pub fn insert_link_record_at(&mut self, record_nr: u16, bytes: Vec<u8>) -> PageResult<()> {
        self.insert_at(record_nr, true, bytes)
    }

    /// Replaces the bytes stored at `record_nr`, preserving its link/record kind
    /// and record number. Fails without mutating the page if the new bytes
    /// would not fit.
    pub fn update(&mut self, record_nr: u16, bytes: Vec<u8>) -> PageResult<()> {
        let idx = self.find(record_nr)?;
        let old_len = self.slots[idx].bytes.len();
        let new_len = bytes.len();

        let current_total = self.encoded_size();
        let prospective_total = current_total - old_len + new_len;
        if prospective_total > self.page_size {
            return Err(PageError::DoesNotFit {
                encoded: prospective_total,
                page_size: self.page_size,
            });
        }

        self.slots[idx].bytes = bytes;
        Ok(())
    }

    /// Removes the slot for `record_nr`, shifting every later slot left by
    /// one and recomputing offsets. Returns the removed record's bytes.
    pub fn remove(&mut self, record_nr: u16) -> PageResult<Vec<u8>> {
        let idx = self.find(record_nr)?;
        Ok(self.slots.remove(idx).bytes)
    }

    /// Record numbers of every non-link record on the page, in insertion order.
    pub fn iterate_non_link_record_nrs(&self) -> impl Iterator<Item = u16> + '_ {
        self.slots
            .iter()
            .filter(|s| !s.is_link)
            .map(|s| s.record_nr)
    }

    /// Record numbers of every link record on the page, in insertion order.
    pub fn iterate_link_record_nrs(&self) -> impl Iterator<Item = u16> + '_ {
        self.slots.iter().filter(|s| s.is_link).map(|s| s.record_nr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_and_encode_roundtrips() {
        let mut page = Page::empty(128);
        let nr = page.insert_record(b"hello".to_vec()).unwrap();
        assert_eq!(nr, 0);

        let encoded = page.encode().unwrap();
        assert_eq!(encoded.len(), 128);

        let decoded = Page::decode(&encoded, 128).unwrap();
        let (bytes, is_link) = decoded.get_record(nr).unwrap();
        assert_eq!(bytes, b"hello");
        assert!(!is_link);
    }

    #[test]
    fn free_record_number_prefers_hole_below_min() {
        let mut page = Page::empty(128);
        let a = page.insert_record(b"a".to_vec()).unwrap();
        let b = page.insert_record(b"b".to_vec()).unwrap();
        assert_eq!(a, 0);
        assert_eq!(b, 1);

        page.remove(a).unwrap();
        // min is now 1 (> 0), so the free slot is min - 1 == 0.
        let c = page.insert_record(b"c".to_vec()).unwrap();
        assert_eq!(c, 0);
    }

    #[test]
    fn update_that_does_not_fit_leaves_page_unchanged() {
        let mut page = Page::empty(16);
        let nr = page.insert_record(vec![0u8; 4]).unwrap();
        let before = page.encoded_size();
        let err = page.update(nr, vec![0u8; 100]);
        assert!(matches!(err, Err(PageError::DoesNotFit { .. })));
        assert_eq!(page.encoded_size(), before);
    }

    #[test]
    fn remove_shifts_later_offsets() {
        let mut page = Page::empty(128);
        let a = page.insert_record(b"aaaa".to_vec()).unwrap();
        let b = page.insert_record(b"bb".to_vec()).unwrap();
        page.remove(a).unwrap();
        let (bytes, _) = page.get_record(b).unwrap();
        assert_eq!(bytes, b"bb");
        let encoded = page.encode().unwrap();
        let decoded = Page::decode(&encoded, 128).unwrap();
        assert_eq!(decoded.get_record(b).unwrap().0, b"bb");
    }

    #[test]
    fn insert_beyond_capacity_fails_without_panicking() {
        let mut page = Page::empty(20);
        page.insert_record(vec![0u8; 4]).unwrap();
        let err = page.insert_record(vec![0u8; 100]);
        assert!(matches!(err, Err(PageError::DoesNotFit { .. })));
    }

    #[test]
    fn link_records_are_distinguished_from_ordinary_records() {
        let mut page = Page::empty(128);
        let link_nr = page.insert_link_record(vec![1, 2, 3]).unwrap();
        let record_nr = page.insert_record(vec![4, 5]).unwrap();

        let links: Vec<_> = page.iterate_link_record_nrs().collect();
        let records: Vec<_> = page.iterate_non_link_record_nrs().collect();
        assert_eq!(links, vec![link_nr]);
        assert_eq!(records, vec![record_nr]);
    }

    #[test]
    fn duplicate_record_number_is_rejected() {
        let mut page = Page::empty(128);
        let nr = page.insert_record(b"a".to_vec()).unwrap();
        let err = page.insert_at(nr, false, b"b".to_vec());
        assert!(matches!(err, Err(PageError::RecordNumberInUse { .. })));
    }
}
