//! In-page compaction.
//!
//! Reclaims the free space locked up inside the holes left by prior
//! `remove` calls, sliding live records together and rebuilding the
//! page's slot-reuse freelist. A live slot's id never changes across
//! compaction — only the offset it points to may move, which is exactly
//! why callers address records by `(page_id, slot_id)` rather than by raw
//! offset.

use crate::errors::ops_error::PageOpError;
use crate::header::{HeaderMut, HeaderRef, HEADER_SIZE};
use crate::record::{RecordFlag, RecordHeaderMut, RecordHeaderRef, RECORD_HEADER_SIZE};
use crate::slot_array::{SlotArrayMut, SlotArrayRef};
use crate::EMPTY_SENTINEL;

struct LiveRecord {
    slot_id: u32,
    offset: u32,
    total_len: u32,
}

/// Compacts the page in place.
pub fn compact(page: &mut [u8]) -> Result<(), PageOpError> {
    let (slot_dir_end, num_slots) = {
        let header = HeaderRef::new(&page[..HEADER_SIZE])?;
        header.validate()?;
        (header.get_slot_dir_end()?, header.get_num_slots()?)
    };

    let mut live = Vec::with_capacity(num_slots as usize);
    // Newly-built freelist, threaded in the same pass: each free slot's
    // new value becomes the current head, then it becomes the head.
    let mut freelist_head = EMPTY_SENTINEL;
    let mut freelist_links = vec![EMPTY_SENTINEL; num_slots as usize];

    for slot_id in 0..num_slots {
        let value = {
            let slot_region = &page[HEADER_SIZE..slot_dir_end as usize];
            SlotArrayRef::new(slot_region, num_slots)?
                .slot_ref(slot_id)?
                .value()?
        };

        if value == EMPTY_SENTINEL {
            freelist_links[slot_id as usize] = freelist_head;
            freelist_head = slot_id;
            continue;
        }

        let offset = value;
        let record_header =
            RecordHeaderRef::new(&page[offset as usize..offset as usize + RECORD_HEADER_SIZE])?;
        if record_header.flag()? == RecordFlag::Dropped {
            // Cannot happen under the slot invariant (remove nulls the
            // slot in the same step it drops the record), but treat
            // defensively as free rather than dereference further.
            freelist_links[slot_id as usize] = freelist_head;
            freelist_head = slot_id;
            continue;
        }
        let total_len = record_header.total_len()?;
        live.push(LiveRecord {
            slot_id,
            offset,
            total_len,
        });
    }

    live.sort_by(|a, b| b.offset.cmp(&a.offset));

    let mut cursor = crate::PAGE_SIZE as u32;
    for record in &live {
        cursor -= record.total_len;
        if cursor != record.offset {
            let (src_start, src_end) = (
                record.offset as usize,
                record.offset as usize + record.total_len as usize,
            );
            let dst_start = cursor as usize;
            page.copy_within(src_start..src_end, dst_start);
        }
        let slot_region = &mut page[HEADER_SIZE..slot_dir_end as usize];
        SlotArrayMut::new(slot_region, num_slots)?.set_slot(record.slot_id, cursor)?;
    }

    // Rewrite the freelist chain values (slot entries now hold
    // "next free slot" rather than stale offsets) in the order they were
    // collected above; entries already pushed onto the logical freelist
    // keep the same chain order (LIFO from low to high slot id, reversed
    // by construction of `freelist_head`).
    let mut current = freelist_head;
    while current != EMPTY_SENTINEL {
        let next = freelist_links[current as usize];
        let slot_region = &mut page[HEADER_SIZE..slot_dir_end as usize];
        SlotArrayMut::new(slot_region, num_slots)?.set_slot(current, next)?;
        current = next;
    }

    let mut header = HeaderMut::new(&mut page[..HEADER_SIZE])?;
    header.set_free_offset(cursor)?;
    header.set_reuse_slot_head(freelist_head)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{find_record, init_page, insert_record, remove_record};
    use crate::PAGE_SIZE;

    fn fresh_page() -> Vec<u8> {
        let mut page = vec![0u8; PAGE_SIZE];
        init_page(&mut page, 1).unwrap();
        page
    }

    #[test]
    fn compaction_preserves_live_records_and_reclaims_holes() {
        let mut page = fresh_page();
        let a = insert_record(&mut page, b"aaaa").unwrap();
        let b = insert_record(&mut page, b"bbbb").unwrap();
        let c = insert_record(&mut page, b"cccc").unwrap();
        remove_record(&mut page, b).unwrap();

        let free_before = crate::ops::contiguous_free(&page).unwrap();
        compact(&mut page).unwrap();
        let free_after = crate::ops::contiguous_free(&page).unwrap();
        assert!(free_after > free_before);

        assert_eq!(find_record(&page, a).unwrap(), b"aaaa");
        assert_eq!(find_record(&page, c).unwrap(), b"cccc");
        assert!(find_record(&page, b).is_err());
    }

    #[test]
    fn reclaimed_slot_is_reused_after_compaction() {
        let mut page = fresh_page();
        let a = insert_record(&mut page, b"aaaa").unwrap();
        remove_record(&mut page, a).unwrap();
        compact(&mut page).unwrap();

        let reused = insert_record(&mut page, b"zz").unwrap();
        assert_eq!(reused, a);
    }

    #[test]
    fn compacting_a_page_with_no_removals_is_a_noop_on_contents() {
        let mut page = fresh_page();
        let a = insert_record(&mut page, b"one").unwrap();
        let b = insert_record(&mut page, b"two").unwrap();
        compact(&mut page).unwrap();
        assert_eq!(find_record(&page, a).unwrap(), b"one");
        assert_eq!(find_record(&page, b).unwrap(), b"two");
    }
}
