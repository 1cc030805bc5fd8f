use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error(
        "Record region at offset {offset} needs {expected} bytes, but only {available} are available in the page"
    )]
    RecordOutOfBounds {
        offset: usize,
        expected: usize,
        available: usize,
    },
    #[error("Error while interpreting record header binary data")]
    BinaryError(#[from] binary_helpers::bin_error::BinaryError),
    #[error("Unrecognized record flag byte: {0}")]
    UnknownFlag(u8),
}
