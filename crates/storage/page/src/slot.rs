use crate::errors::slot_error::SlotError;
use binary_helpers::le::{read_le, write_le};

/// Fixed size of a slot-directory entry in bytes.
pub const SLOT_SIZE: usize = 4;

/// A zero-copy read-only view into a single 4-byte slot-directory entry.
///
/// The stored `u32` is either the byte offset of this slot's current
/// record, or — when the slot is on the page's reuse freelist — the index
/// of the next free slot (or [`crate::EMPTY_SENTINEL`] to terminate the
/// chain). Which interpretation applies is a property of the page's
/// freelist bookkeeping, not of the slot itself.
#[derive(Debug)]
pub struct SlotRef<'a> {
    slot_index: u32,
    bytes: &'a [u8; SLOT_SIZE],
}

impl<'a> SlotRef<'a> {
    #[inline]
    pub(crate) fn from_raw(slot_index: u32, bytes: &'a [u8]) -> Result<Self, SlotError> {
        let bytes_array: &[u8; SLOT_SIZE] =
            bytes
                .try_into()
                .map_err(|_| SlotError::InvalidSlot {
                    slot_index,
                    num_slots: 0,
                })?;
        Ok(Self {
            slot_index,
            bytes: bytes_array,
        })
    }

    #[inline]
    pub fn slot_index(&self) -> u32 {
        self.slot_index
    }

    #[inline]
    pub fn value(&self) -> Result<u32, SlotError> {
        Ok(read_le::<u32>(self.bytes, 0)?)
    }
}

/// A zero-copy mutable view into a single 4-byte slot-directory entry.
#[derive(Debug)]
pub struct SlotMut<'a> {
    slot_index: u32,
    bytes: &'a mut [u8; SLOT_SIZE],
}

impl<'a> SlotMut<'a> {
    #[inline]
    pub(crate) fn from_raw(slot_index: u32, bytes: &'a mut [u8]) -> Result<Self, SlotError> {
        let bytes_array: &mut [u8; SLOT_SIZE] =
            bytes
                .try_into()
                .map_err(|_| SlotError::InvalidSlot {
                    slot_index,
                    num_slots: 0,
                })?;
        Ok(Self {
            slot_index,
            bytes: bytes_array,
        })
    }

    #[inline]
    pub fn slot_index(&self) -> u32 {
        self.slot_index
    }

    #[inline]
    pub fn value(&self) -> Result<u32, SlotError> {
        Ok(read_le::<u32>(self.bytes, 0)?)
    }

    #[inline]
    pub fn set_value(&mut self, value: u32) -> Result<(), SlotError> {
        Ok(write_le::<u32>(self.bytes, 0, value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_size_constant_is_four() {
        assert_eq!(SLOT_SIZE, 4);
    }

    #[test]
    fn slot_ref_reads_value() {
        let bytes = 100u32.to_le_bytes();
        let slot = SlotRef::from_raw(5, &bytes).unwrap();
        assert_eq!(slot.slot_index(), 5);
        assert_eq!(slot.value().unwrap(), 100);
    }

    #[test]
    fn slot_mut_roundtrips_value() {
        let mut bytes = [0u8; SLOT_SIZE];
        {
            let mut slot = SlotMut::from_raw(1, &mut bytes).unwrap();
            slot.set_value(0x0102_0304).unwrap();
            assert_eq!(slot.value().unwrap(), 0x0102_0304);
        }
        assert_eq!(u32::from_le_bytes(bytes), 0x0102_0304);
    }

    #[test]
    fn slot_mut_writes_and_reads_sentinel() {
        let mut bytes = [0u8; SLOT_SIZE];
        let mut slot = SlotMut::from_raw(0, &mut bytes).unwrap();
        slot.set_value(crate::EMPTY_SENTINEL).unwrap();
        assert_eq!(slot.value().unwrap(), crate::EMPTY_SENTINEL);
    }
}
