use crate::errors::header_error::HeaderError;
use crate::errors::record_error::RecordError;
use crate::errors::slot_error::SlotError;
use thiserror::Error;

/// Errors from whole-page operations (`ops`, `compactor`) that compose the
/// header, slot-directory, and record layers.
#[derive(Debug, Error)]
pub enum PageOpError {
    #[error("Error while accessing the page header")]
    Header(#[from] HeaderError),
    #[error("Error while accessing the slot directory")]
    Slot(#[from] SlotError),
    #[error("Error while accessing a record")]
    Record(#[from] RecordError),
    #[error("record of {required} bytes does not fit in {available} available bytes")]
    NotEnoughSpace { required: u32, available: u32 },
    #[error("slot does not reference a live record")]
    NotLive,
}
