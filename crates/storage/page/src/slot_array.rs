//! Zero-copy view over the slot directory region of a page.
//!
//! Unlike a reverse-growing slot array, this layout keeps slot ordering
//! simple: the slot directory begins immediately after the page header and
//! grows upward one [`SLOT_SIZE`]-byte entry at a time, so slot index `i`
//! always lives at byte offset `i * SLOT_SIZE` within the region.

use crate::errors::slot_error::SlotError;
use crate::slot::{SLOT_SIZE, SlotMut, SlotRef};
use std::ops::Range;

fn slot_range(num_slots: u32, slot_index: u32) -> Result<Range<usize>, SlotError> {
    if slot_index >= num_slots {
        return Err(SlotError::InvalidSlot {
            slot_index,
            num_slots,
        });
    }
    let start = slot_index as usize * SLOT_SIZE;
    Ok(start..start + SLOT_SIZE)
}

/// Immutable zero-copy view into the slot directory.
#[derive(Debug)]
pub struct SlotArrayRef<'a> {
    bytes: &'a [u8],
    num_slots: u32,
}

impl<'a> SlotArrayRef<'a> {
    /// Builds a view over `bytes`, which must cover exactly `num_slots *
    /// SLOT_SIZE` bytes.
    pub fn new(bytes: &'a [u8], num_slots: u32) -> Result<Self, SlotError> {
        let expected = num_slots as usize * SLOT_SIZE;
        if bytes.len() != expected {
            return Err(SlotError::SlotRegionSizeMismatch {
                expected_size: expected,
                actual_size: bytes.len(),
            });
        }
        Ok(Self { bytes, num_slots })
    }

    pub fn slot_ref(&self, slot_index: u32) -> Result<SlotRef<'a>, SlotError> {
        let range = slot_range(self.num_slots, slot_index)?;
        SlotRef::from_raw(slot_index, &self.bytes[range])
    }
}

/// Mutable zero-copy view into the slot directory.
#[derive(Debug)]
pub struct SlotArrayMut<'a> {
    bytes: &'a mut [u8],
    num_slots: u32,
}

impl<'a> SlotArrayMut<'a> {
    /// Builds a view over `bytes`, which must cover exactly `num_slots *
    /// SLOT_SIZE` bytes.
    pub fn new(bytes: &'a mut [u8], num_slots: u32) -> Result<Self, SlotError> {
        let expected = num_slots as usize * SLOT_SIZE;
        if bytes.len() != expected {
            return Err(SlotError::SlotRegionSizeMismatch {
                expected_size: expected,
                actual_size: bytes.len(),
            });
        }
        Ok(Self { bytes, num_slots })
    }

    pub fn slot_ref(&self, slot_index: u32) -> Result<SlotRef<'_>, SlotError> {
        let range = slot_range(self.num_slots, slot_index)?;
        SlotRef::from_raw(slot_index, &self.bytes[range])
    }

    pub fn slot_mut(&mut self, slot_index: u32) -> Result<SlotMut<'_>, SlotError> {
        let range = slot_range(self.num_slots, slot_index)?;
        SlotMut::from_raw(slot_index, &mut self.bytes[range])
    }

    pub fn set_slot(&mut self, slot_index: u32, value: u32) -> Result<(), SlotError> {
        self.slot_mut(slot_index)?.set_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_region_size() {
        let bytes = vec![0u8; 10];
        let result = SlotArrayRef::new(&bytes, 3);
        assert!(matches!(
            result,
            Err(SlotError::SlotRegionSizeMismatch {
                expected_size: 12,
                actual_size: 10
            })
        ));
    }

    #[test]
    fn rejects_out_of_range_index() {
        let bytes = vec![0u8; SLOT_SIZE * 2];
        let array = SlotArrayRef::new(&bytes, 2).unwrap();
        assert!(matches!(
            array.slot_ref(2),
            Err(SlotError::InvalidSlot {
                slot_index: 2,
                num_slots: 2
            })
        ));
    }

    #[test]
    fn set_and_read_back_each_slot() {
        let mut bytes = vec![0u8; SLOT_SIZE * 3];
        let mut array = SlotArrayMut::new(&mut bytes, 3).unwrap();
        array.set_slot(0, 111).unwrap();
        array.set_slot(1, 222).unwrap();
        array.set_slot(2, crate::EMPTY_SENTINEL).unwrap();

        assert_eq!(array.slot_ref(0).unwrap().value().unwrap(), 111);
        assert_eq!(array.slot_ref(1).unwrap().value().unwrap(), 222);
        assert_eq!(
            array.slot_ref(2).unwrap().value().unwrap(),
            crate::EMPTY_SENTINEL
        );
    }
}
