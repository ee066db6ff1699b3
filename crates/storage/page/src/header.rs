//! Layout and (de)serialization of a slotted page's header.
//!
//! # Page Header Layout
//!
//! ```text
//! +----------------+--------------------+-----------------------------+----------------+
//! | numberOfRecords| link-bit bitmap     | N * (offset, recordNr)      | offset[N]      |
//! |     (u16)      | ceil(N/8) bytes     | slot table, insertion order | trailing       |
//! +----------------+--------------------+-----------------------------+----------------+
//! ```
//!
//! `numberOfRecords` here is the *total* slot count `N` (records **and** link
//! records). Offsets are 16-bit when `page_size <= 32767`, else 32-bit;
//! record numbers are always 16-bit. `offset[N]` is the first free byte of
//! the payload region — i.e. the running total of record bytes.
//!
//! This format re-derives and re-encodes the whole header wholesale on every
//! write rather than patching a live buffer in place: the record manager
//! keeps a decoded [`PageHeader`]/[`crate::page::Page`] in memory, mutates
//! its slot list, and calls [`crate::page::Page::encode`] to produce the
//! bytes handed to the page container. Every insert/remove here can shift
//! every later slot's offset, so a whole-page rewrite via a plain
//! `encode`/`decodeHeader`/`decodeTail` split is clearer than partial
//! in-place patching.

use crate::errors::{PageError, PageResult};
use binary_helpers::le::{read_le, write_le};

/// Size, in bytes, of an offset field — depends on the page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetWidth {
    /// 16-bit offsets, used when `page_size <= 32767`.
    Two,
    /// 32-bit offsets, used for larger pages.
    Four,
}

impl OffsetWidth {
    /// Picks the offset width appropriate for a page of the given size.
    pub fn for_page_size(page_size: usize) -> Self {
        if page_size <= u16::MAX as usize {
            OffsetWidth::Two
        } else {
            OffsetWidth::Four
        }
    }

    /// Size in bytes of a single offset field under this width.
    pub fn bytes(self) -> usize {
        match self {
            OffsetWidth::Two => 2,
            OffsetWidth::Four => 4,
        }
    }

    fn read(self, bytes: &[u8], offset: usize) -> PageResult<u32> {
        Ok(match self {
            OffsetWidth::Two => read_le::<u16>(bytes, offset)? as u32,
            OffsetWidth::Four => read_le::<u32>(bytes, offset)?,
        })
    }

    fn write(self, bytes: &mut [u8], offset: usize, value: u32) -> PageResult<()> {
        match self {
            OffsetWidth::Two => {
                let narrowed = u16::try_from(value).map_err(|_| PageError::DoesNotFit {
                    encoded: value as usize,
                    page_size: u16::MAX as usize,
                })?;
                write_le::<u16>(bytes, offset, narrowed)?;
            }
            OffsetWidth::Four => write_le::<u32>(bytes, offset, value)?,
        }
        Ok(())
    }
}

/// Size in bytes of the record-number field. Always 16-bit.
pub const RECORD_NR_SIZE: usize = 2;

/// The decoded header of a slotted page: enough information to reason about
/// slot occupancy and offsets without touching the payload bytes.
#[derive(Debug, Clone)]
pub struct PageHeader {
    pub page_size: usize,
    pub offset_width: OffsetWidth,
    /// Record numbers of every slot, in insertion order. Includes link slots.
    pub record_nrs: Vec<u16>,
    /// Whether the slot at the same index in `record_nrs` is a link record.
    pub link_bits: Vec<bool>,
    /// Cumulative payload offsets, length `record_nrs.len() + 1`. The length
    /// of slot `i` (by insertion order) is `offsets[i + 1] - offsets[i]`.
    pub offsets: Vec<u32>,
}

impl PageHeader {
    /// Builds the header for a fresh, empty page.
    pub fn empty(page_size: usize) -> Self {
        Self {
            page_size,
            offset_width: OffsetWidth::for_page_size(page_size),
            record_nrs: Vec::new(),
            link_bits: Vec::new(),
            offsets: vec![0],
        }
    }

    /// Total number of slots on the page (records and links).
    pub fn slot_count(&self) -> usize {
        self.record_nrs.len()
    }

    /// Byte length of the record stored at slot index `i` (by insertion order).
    pub fn slot_len(&self, slot_index: usize) -> usize {
        (self.offsets[slot_index + 1] - self.offsets[slot_index]) as usize
    }

    /// Total payload bytes used by all slots.
    pub fn total_payload_bytes(&self) -> usize {
        *self.offsets.last().unwrap_or(&0) as usize
    }

    /// Finds the insertion-order slot index holding `record_nr`, if any.
    pub fn find_slot(&self, record_nr: u16) -> Option<usize> {
        self.record_nrs.iter().position(|&nr| nr == record_nr)
    }

    /// Smallest and largest record numbers present on the page, if any.
    pub fn min_max_record_nr(&self) -> Option<(u16, u16)> {
        if self.record_nrs.is_empty() {
            return None;
        }
        let min = *self.record_nrs.iter().min().unwrap();
        let max = *self.record_nrs.iter().max().unwrap();
        Some((min, max))
    }

    /// Size, in bytes, of the fixed-format part of the header (everything but the payload),
    /// given the current slot count.
    pub fn header_bytes_len(&self) -> usize {
        header_bytes_len(self.slot_count(), self.offset_width)
    }

    /// Total encoded size of the page (header + payload) with the current slot table.
    pub fn encoded_size(&self) -> usize {
        self.header_bytes_len() + self.total_payload_bytes()
    }

    /// Parses the header-only portion of an encoded page.
    pub fn decode(bytes: &[u8], page_size: usize) -> PageResult<Self> {
        let offset_width = OffsetWidth::for_page_size(page_size);
        let n = read_le::<u16>(bytes, 0)? as usize;

        let bitmap_len = n.div_ceil(8);
        let bitmap_start = 2;
        let bitmap = bytes
            .get(bitmap_start..bitmap_start + bitmap_len)
            .ok_or(PageError::SizeMismatch {
                expected: bitmap_start + bitmap_len,
                actual: bytes.len(),
            })?;

        let mut link_bits = Vec::with_capacity(n);
        for i in 0..n {
            let byte = bitmap[i / 8];
            link_bits.push((byte >> (i % 8)) & 1 == 1);
        }

        let slot_entry_size = offset_width.bytes() + RECORD_NR_SIZE;
        let mut pos = bitmap_start + bitmap_len;
        let mut record_nrs = Vec::with_capacity(n);
        let mut offsets = Vec::with_capacity(n + 1);

        for _ in 0..n {
            let offset = offset_width.read(bytes, pos)?;
            let record_nr = read_le::<u16>(bytes, pos + offset_width.bytes())?;
            offsets.push(offset);
            record_nrs.push(record_nr);
            pos += slot_entry_size;
        }

        let trailing_offset = offset_width.read(bytes, pos)?;
        offsets.push(trailing_offset);

        Ok(Self {
            page_size,
            offset_width,
            record_nrs,
            link_bits,
            offsets,
        })
    }

    /// Encodes the fixed-format part of the header into `out`. `out` must
    /// already have at least [`Self::header_bytes_len`] bytes reserved
    /// starting at offset 0.
    pub fn encode_into(&self, out: &mut [u8]) -> PageResult<()> {
        let n = self.slot_count();
        write_le::<u16>(out, 0, n as u16)?;

        let bitmap_len = n.div_ceil(8);
        let bitmap_start = 2;
        for byte in &mut out[bitmap_start..bitmap_start + bitmap_len] {
            *byte = 0;
        }
        for (i, &is_link) in self.link_bits.iter().enumerate() {
            if is_link {
                out[bitmap_start + i / 8] |= 1 << (i % 8);
            }
        }

        let slot_entry_size = self.offset_width.bytes() + RECORD_NR_SIZE;
        let mut pos = bitmap_start + bitmap_len;
        for i in 0..n {
            self.offset_width.write(out, pos, self.offsets[i])?;
            write_le::<u16>(out, pos + self.offset_width.bytes(), self.record_nrs[i])?;
            pos += slot_entry_size;
        }

        self.offset_width.write(out, pos, self.offsets[n])?;

        Ok(())
    }
}

/// Size, in bytes, of the header of a page with `n` slots and the given offset width.
/// `2` (numberOfRecords) + bitmap + `n` slot entries + 1 trailing offset.
pub fn header_bytes_len(n: usize, offset_width: OffsetWidth) -> usize {
    2 + n.div_ceil(8) + n * (offset_width.bytes() + RECORD_NR_SIZE) + offset_width.bytes()
}

/// The layout-level free-space predicate used throughout the codec and every
/// placement strategy: does a page of `page_size` bytes have room for `n`
/// slots totalling `total_bytes` of payload?
pub fn encoded_size(page_size: usize, n: usize, total_bytes: usize) -> usize {
    header_bytes_len(n, OffsetWidth::for_page_size(page_size)) + total_bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_header_roundtrips() {
        let header = PageHeader::empty(128);
        let len = header.header_bytes_len();
        let mut bytes = vec![0u8; len];
        header.encode_into(&mut bytes).unwrap();
        let decoded = PageHeader::decode(&bytes, 128).unwrap();
        assert_eq!(decoded.slot_count(), 0);
        assert_eq!(decoded.offsets, vec![0]);
    }

    #[test]
    fn header_with_slots_roundtrips() {
        let mut header = PageHeader::empty(128);
        header.record_nrs = vec![5, 1, 2];
        header.link_bits = vec![false, true, false];
        header.offsets = vec![0, 10, 14, 30];

        let len = header.header_bytes_len();
        let mut bytes = vec![0u8; len];
        header.encode_into(&mut bytes).unwrap();
        let decoded = PageHeader::decode(&bytes, 128).unwrap();

        assert_eq!(decoded.record_nrs, header.record_nrs);
        assert_eq!(decoded.link_bits, header.link_bits);
        assert_eq!(decoded.offsets, header.offsets);
    }

    #[test]
    fn offset_width_depends_on_page_size() {
        assert_eq!(OffsetWidth::for_page_size(128), OffsetWidth::Two);
        assert_eq!(OffsetWidth::for_page_size(32_767), OffsetWidth::Two);
        assert_eq!(OffsetWidth::for_page_size(32_768), OffsetWidth::Four);
    }

    #[test]
    fn encoded_size_matches_header_plus_payload() {
        let size = encoded_size(128, 2, 30);
        let expected = header_bytes_len(2, OffsetWidth::Two) + 30;
        assert_eq!(size, expected);
    }

    #[test]
    fn min_max_record_nr_tracks_observed_range() {
        let mut header = PageHeader::empty(128);
        assert_eq!(header.min_max_record_nr(), None);
        header.record_nrs = vec![5, 1, 9];
        assert_eq!(header.min_max_record_nr(), Some((1, 9)));
    }
}
