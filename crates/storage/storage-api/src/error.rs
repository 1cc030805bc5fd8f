//! The engine's public error type.
//!
//! Lower-level errors (binary layout, page-layer, host-file) fold upward
//! into one of the six kinds below via `#[from]` / explicit mapping —
//! never via string formatting.

use thiserror::Error;

/// Errors returned by [`crate::engine::Engine`]'s public operations.
#[derive(Debug, Error)]
pub enum DmsError {
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    #[error("record not found")]
    NotFound,

    #[error("on-disk data is corrupted: {0}")]
    Corruption(String),

    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("out of memory / file cannot grow further: {0}")]
    Oom(String),

    #[error("internal engine error: {0}")]
    Internal(String),
}

impl From<page::errors::ops_error::PageOpError> for DmsError {
    fn from(err: page::errors::ops_error::PageOpError) -> Self {
        use page::errors::header_error::HeaderError;
        use page::errors::ops_error::PageOpError;
        let message = err.to_string();
        match err {
            PageOpError::NotLive => DmsError::NotFound,
            PageOpError::Slot(page::errors::slot_error::SlotError::InvalidSlot { .. }) => {
                DmsError::NotFound
            }
            PageOpError::Header(HeaderError::BadEyeCatcher) => DmsError::Corruption(message),
            PageOpError::Header(HeaderError::BadSize { .. }) => DmsError::Corruption(message),
            PageOpError::NotEnoughSpace { .. } => {
                DmsError::Internal("page reported space it does not have".to_string())
            }
            other => DmsError::Internal(other.to_string()),
        }
    }
}

impl From<file::FileError> for DmsError {
    fn from(err: file::FileError) -> Self {
        match err {
            file::FileError::Io(io) => DmsError::Io(io),
            file::FileError::BadEyeCatcher | file::FileError::PartialSegment { .. } => {
                DmsError::Corruption(err.to_string())
            }
            file::FileError::PageOutOfRange(_) => DmsError::NotFound,
            other => DmsError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use page::errors::header_error::HeaderError;
    use page::errors::ops_error::PageOpError;

    #[test]
    fn page_eye_catcher_mismatch_surfaces_as_corruption() {
        let err: DmsError = PageOpError::Header(HeaderError::BadEyeCatcher).into();
        assert!(matches!(err, DmsError::Corruption(_)));
    }

    #[test]
    fn page_bad_size_surfaces_as_corruption() {
        let err: DmsError = PageOpError::Header(HeaderError::BadSize {
            actual: 1,
            expected: 2,
        })
        .into();
        assert!(matches!(err, DmsError::Corruption(_)));
    }
}
