//! Whole-page operations composing the header, slot-directory, and record
//! layers: initializing a fresh page, inserting/finding/removing a record
//! by slot id, and measuring the contiguous hole between the slot
//! directory and the record region.

use crate::errors::ops_error::PageOpError;
use crate::header::{HeaderMut, HeaderRef, HEADER_SIZE};
use crate::record::{RecordFlag, RecordHeaderMut, RecordHeaderRef, RECORD_HEADER_SIZE};
use crate::slot::SLOT_SIZE;
use crate::slot_array::{SlotArrayMut, SlotArrayRef};
use crate::EMPTY_SENTINEL;

/// Stamps a freshly-mapped page as empty: no slots, an empty reuse
/// freelist, and a hole spanning the whole record region.
pub fn init_page(page: &mut [u8], page_id: u32) -> Result<(), PageOpError> {
    let mut header = HeaderMut::new(&mut page[..HEADER_SIZE])?;
    header.init_empty(page_id)?;
    Ok(())
}

/// The contiguous hole between the end of the slot directory and the start
/// of the record region — distinct from the page's total reclaimable free
/// space, which also counts bytes locked up in dropped-but-not-yet-
/// compacted records and is tracked externally by the free-space index.
pub fn contiguous_free(page: &[u8]) -> Result<u32, PageOpError> {
    let header = HeaderRef::new(&page[..HEADER_SIZE])?;
    header.validate()?;
    Ok(header.get_free_offset()? - header.get_slot_dir_end()?)
}

/// Appends `payload` as a new record, assigning it a slot (reusing one
/// from the freelist if available) and returning that slot id. The caller
/// is responsible for ensuring the contiguous hole is large enough first
/// (compacting beforehand if necessary); this function returns
/// `NotEnoughSpace` rather than panicking if it is not.
pub fn insert_record(page: &mut [u8], payload: &[u8]) -> Result<u32, PageOpError> {
    let (slot_dir_end, free_offset, reuse_slot_head, num_slots) = {
        let header = HeaderRef::new(&page[..HEADER_SIZE])?;
        header.validate()?;
        (
            header.get_slot_dir_end()?,
            header.get_free_offset()?,
            header.get_reuse_slot_head()?,
            header.get_num_slots()?,
        )
    };

    let total_len = RECORD_HEADER_SIZE as u32 + payload.len() as u32;
    let needs_new_slot = reuse_slot_head == EMPTY_SENTINEL;
    let effective_slot_dir_end = if needs_new_slot {
        slot_dir_end + SLOT_SIZE as u32
    } else {
        slot_dir_end
    };
    let new_offset = match free_offset.checked_sub(total_len) {
        Some(offset) if offset >= effective_slot_dir_end => offset,
        _ => {
            return Err(PageOpError::NotEnoughSpace {
                required: total_len,
                available: free_offset.saturating_sub(effective_slot_dir_end),
            });
        }
    };

    {
        let record_region = &mut page[new_offset as usize..new_offset as usize + total_len as usize];
        let (header_bytes, payload_region) = record_region.split_at_mut(RECORD_HEADER_SIZE);
        let mut record_header = RecordHeaderMut::new(header_bytes)?;
        record_header.set_total_len(total_len)?;
        record_header.set_flag(RecordFlag::Normal)?;
        payload_region.copy_from_slice(payload);
    }

    let slot_id = if reuse_slot_head != EMPTY_SENTINEL {
        let popped = reuse_slot_head;
        let next = {
            let slot_region = &page[HEADER_SIZE..slot_dir_end as usize];
            SlotArrayRef::new(slot_region, num_slots)?
                .slot_ref(popped)?
                .value()?
        };
        {
            let slot_region = &mut page[HEADER_SIZE..slot_dir_end as usize];
            SlotArrayMut::new(slot_region, num_slots)?.set_slot(popped, new_offset)?;
        }
        let mut header = HeaderMut::new(&mut page[..HEADER_SIZE])?;
        header.set_reuse_slot_head(next)?;
        popped
    } else {
        let new_slot_dir_end = slot_dir_end + SLOT_SIZE as u32;
        {
            let slot_region = &mut page[HEADER_SIZE..new_slot_dir_end as usize];
            SlotArrayMut::new(slot_region, num_slots + 1)?.set_slot(num_slots, new_offset)?;
        }
        let mut header = HeaderMut::new(&mut page[..HEADER_SIZE])?;
        header.set_num_slots(num_slots + 1)?;
        header.set_slot_dir_end(new_slot_dir_end)?;
        num_slots
    };

    let mut header = HeaderMut::new(&mut page[..HEADER_SIZE])?;
    header.set_free_offset(new_offset)?;

    Ok(slot_id)
}

fn resolve_live(page: &[u8], slot_id: u32) -> Result<u32, PageOpError> {
    let (slot_dir_end, num_slots) = {
        let header = HeaderRef::new(&page[..HEADER_SIZE])?;
        header.validate()?;
        (header.get_slot_dir_end()?, header.get_num_slots()?)
    };
    let slot_region = &page[HEADER_SIZE..slot_dir_end as usize];
    let offset = SlotArrayRef::new(slot_region, num_slots)?
        .slot_ref(slot_id)?
        .value()?;
    if offset == EMPTY_SENTINEL {
        return Err(PageOpError::NotLive);
    }
    let record_header = RecordHeaderRef::new(
        &page[offset as usize..offset as usize + RECORD_HEADER_SIZE],
    )?;
    if record_header.flag()? == RecordFlag::Dropped {
        return Err(PageOpError::NotLive);
    }
    Ok(offset)
}

/// Reads back the payload bytes of the live record at `slot_id`.
/// `slot_id >= num_slots` surfaces as `PageOpError::Slot`; an empty or
/// dropped slot surfaces as `PageOpError::NotLive` — callers translate
/// both into a not-found outcome.
pub fn find_record(page: &[u8], slot_id: u32) -> Result<Vec<u8>, PageOpError> {
    let offset = resolve_live(page, slot_id)?;
    let record_header = RecordHeaderRef::new(
        &page[offset as usize..offset as usize + RECORD_HEADER_SIZE],
    )?;
    let total_len = record_header.total_len()?;
    let payload_start = offset as usize + RECORD_HEADER_SIZE;
    let payload_end = offset as usize + total_len as usize;
    Ok(page[payload_start..payload_end].to_vec())
}

/// Tombstones the live record at `slot_id`: flags its record header
/// dropped and nulls its slot entry. Returns the record's total length
/// (header + payload) so the caller can credit that many bytes back to
/// the page's recorded free space. The slot directory entry itself is
/// not reclaimed until a later compaction pass threads it onto the
/// freelist.
pub fn remove_record(page: &mut [u8], slot_id: u32) -> Result<u32, PageOpError> {
    let offset = resolve_live(page, slot_id)?;
    let total_len = {
        let mut record_header = RecordHeaderMut::new(
            &mut page[offset as usize..offset as usize + RECORD_HEADER_SIZE],
        )?;
        let total_len = record_header.total_len()?;
        record_header.set_flag(RecordFlag::Dropped)?;
        total_len
    };

    let (slot_dir_end, num_slots) = {
        let header = HeaderRef::new(&page[..HEADER_SIZE])?;
        (header.get_slot_dir_end()?, header.get_num_slots()?)
    };
    let slot_region = &mut page[HEADER_SIZE..slot_dir_end as usize];
    SlotArrayMut::new(slot_region, num_slots)?.set_slot(slot_id, EMPTY_SENTINEL)?;

    Ok(total_len)
}
