//! On-disk layout for a [`crate::record_manager::RecordManager`]'s durable
//! state: record counters, the pages map, the translator's own bytes, and
//! the placement strategy's own durable part. Each strategy decides for
//! itself what of its state is worth serializing versus rebuilding from the
//! pages map; see [`strategy::Strategy::write`].

use crate::errors::{RecordManagerError, RecordManagerResult};
use binary_helpers::le::{read_le, write_le};
use pageinfo::{PageInformation, PagesMap};
use storage_api::PageContainer;
use strategy::Strategy;
use translator::Translator;

/// Sentinel written for a page's `minRecordNumber`/`maxRecordNumber` when it
/// holds nothing yet. The in-memory range is `Option<(u16, u16)>`; on disk
/// both fields get `0xFFFF` rather than reserving a separate presence flag.
const NO_RECORD_NUMBER: u16 = 0xFFFF;

fn push_u16(out: &mut Vec<u8>, value: u16) {
    let mut buf = [0u8; 2];
    write_le::<u16>(&mut buf, 0, value).expect("fixed-size buffer");
    out.extend_from_slice(&buf);
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    let mut buf = [0u8; 4];
    write_le::<u32>(&mut buf, 0, value).expect("fixed-size buffer");
    out.extend_from_slice(&buf);
}

fn take_u16(bytes: &[u8], pos: &mut usize) -> RecordManagerResult<u16> {
    let value = read_le::<u16>(bytes, *pos)?;
    *pos += 2;
    Ok(value)
}

fn take_u32(bytes: &[u8], pos: &mut usize) -> RecordManagerResult<u32> {
    let value = read_le::<u32>(bytes, *pos)?;
    *pos += 4;
    Ok(value)
}

fn take_slice<'a>(bytes: &'a [u8], pos: &mut usize, len: usize) -> RecordManagerResult<&'a [u8]> {
    let end = *pos + len;
    let slice = bytes
        .get(*pos..end)
        .ok_or_else(|| RecordManagerError::StructuralError {
            reason: format!("persisted state truncated at offset {}, wanted {len} more bytes", *pos),
        })?;
    *pos = end;
    Ok(slice)
}

/// Serializes `numberOfRecords`, `numberOfLinkRecords`, the pages map, the
/// translator's own state, and the strategy's own state into one
/// self-contained byte blob.
pub(crate) fn write_state<C: PageContainer>(
    container: &C,
    pages: &PagesMap,
    translator: &Translator,
    strategy: &Strategy,
    number_of_records: u32,
    number_of_link_records: u32,
) -> RecordManagerResult<Vec<u8>> {
    let mut out = Vec::new();
    push_u32(&mut out, number_of_records);
    push_u32(&mut out, number_of_link_records);
    push_u32(&mut out, pages.len() as u32);

    for (page_id, info) in pages.iter() {
        out.extend(container.encode_page_id(*page_id));
        push_u16(&mut out, info.number_of_records());
        push_u16(&mut out, info.number_of_link_records());
        push_u32(&mut out, info.number_of_bytes_used_by_records());

        let (min, max) = info.record_number_range().unwrap_or((NO_RECORD_NUMBER, NO_RECORD_NUMBER));
        push_u16(&mut out, min);
        push_u16(&mut out, max);

        let reservations: Vec<(u16, u32)> = info
            .pending_record_numbers()
            .zip(info.pending_record_lengths())
            .collect();
        push_u16(&mut out, reservations.len() as u16);
        for (record_nr, length) in reservations {
            push_u16(&mut out, record_nr);
            push_u32(&mut out, length);
        }
    }

    let mut translator_bytes = Vec::new();
    translator.write(&mut translator_bytes)?;
    push_u32(&mut out, translator_bytes.len() as u32);
    out.extend(translator_bytes);

    let mut strategy_bytes = Vec::new();
    strategy.write(&mut strategy_bytes)?;
    push_u32(&mut out, strategy_bytes.len() as u32);
    out.extend(strategy_bytes);

    Ok(out)
}

/// Reconstructs the pages map and record counters from bytes produced by
/// [`write_state`], feeds the translator's own section back into it, and
/// restores the strategy's own state from the pages map it was just handed.
pub(crate) fn read_state<C: PageContainer>(
    container: &C,
    translator: &mut Translator,
    strategy: &mut Strategy,
    max_object_size: usize,
    reservation_capacity: usize,
    bytes: &[u8],
) -> RecordManagerResult<(PagesMap, u32, u32)> {
    let mut pos = 0usize;
    let number_of_records = take_u32(bytes, &mut pos)?;
    let number_of_link_records = take_u32(bytes, &mut pos)?;
    let page_count = take_u32(bytes, &mut pos)? as usize;

    let page_id_size = container.page_id_size();
    let mut pages = PagesMap::new();
    for _ in 0..page_count {
        let page_id = container.decode_page_id(take_slice(bytes, &mut pos, page_id_size)?);

        let number_of_page_records = take_u16(bytes, &mut pos)?;
        let number_of_page_link_records = take_u16(bytes, &mut pos)?;
        let number_of_bytes_used = take_u32(bytes, &mut pos)?;
        let min = take_u16(bytes, &mut pos)?;
        let max = take_u16(bytes, &mut pos)?;
        let range = if min == NO_RECORD_NUMBER && max == NO_RECORD_NUMBER {
            None
        } else {
            Some((min, max))
        };

        let mut info = PageInformation::from_observed(
            number_of_page_records,
            number_of_page_link_records,
            number_of_bytes_used,
            range,
            reservation_capacity,
        );

        let reservation_len = take_u16(bytes, &mut pos)? as usize;
        let mut reservations = Vec::with_capacity(reservation_len);
        for _ in 0..reservation_len {
            let record_nr = take_u16(bytes, &mut pos)?;
            let length = take_u32(bytes, &mut pos)?;
            reservations.push((record_nr, length));
        }
        info.restore_reservations(reservations);

        pages.insert(page_id, info);
    }

    let translator_len = take_u32(bytes, &mut pos)? as usize;
    let translator_bytes = take_slice(bytes, &mut pos, translator_len)?;
    translator.read(translator_bytes)?;

    let strategy_len = take_u32(bytes, &mut pos)? as usize;
    let strategy_bytes = take_slice(bytes, &mut pos, strategy_len)?;
    strategy.read(&pages, container.page_size(), max_object_size, strategy_bytes)?;

    Ok((pages, number_of_records, number_of_link_records))
}
