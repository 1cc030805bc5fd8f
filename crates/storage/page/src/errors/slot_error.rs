use thiserror::Error;

#[derive(Debug, Error)]
pub enum SlotError {
    #[error(
        "Slot array region expected to be {expected_size} bytes, but was actually {actual_size}"
    )]
    SlotRegionSizeMismatch {
        expected_size: usize,
        actual_size: usize,
    },
    #[error("Attempted to access slot index {slot_index}, but the page only has {num_slots} slots")]
    InvalidSlot { slot_index: u32, num_slots: u32 },
    #[error("Error while interpreting slot binary data")]
    BinaryError(#[from] binary_helpers::bin_error::BinaryError),
}
