use std::array::TryFromSliceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BinaryError {
    #[error(
        "Attempt to read {expected} bytes from offset {from_offset}, but the provided slice does not contain that range."
    )]
    SliceSizeMismatch { expected: usize, from_offset: usize },
    #[error("Error converting a slice into a fixed-size array")]
    SliceConversionError(#[from] TryFromSliceError),
    #[error(
        "Error when attempting to write data due to size mismatch: source {src} vs target {target}"
    )]
    WriteSliceSizeMismatch { src: usize, target: usize },
}
