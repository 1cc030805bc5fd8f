use thiserror::Error;

#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("Error while interpreting header binary data")]
    BinaryError(#[from] binary_helpers::bin_error::BinaryError),
    #[error("Provided slice length ({actual}) does not match the expected header length ({expected})")]
    HeaderSliceSizeMismatch { actual: usize, expected: usize },
    #[error("page header eye-catcher does not match the expected marker")]
    BadEyeCatcher,
    #[error("page header reports size {actual}, expected {expected}")]
    BadSize { actual: u32, expected: u32 },
}
