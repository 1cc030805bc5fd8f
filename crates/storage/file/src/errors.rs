//! Error types for the host-file adapter, segment manager, and bootstrap.

use thiserror::Error;

/// Errors surfaced by the `file` crate's public operations.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("I/O error against the backing file")]
    Io(#[from] std::io::Error),

    #[error("failed to map a region of the backing file")]
    Mmap(#[source] mmap_rs::Error),

    #[error("file header eye-catcher does not match the expected marker")]
    BadEyeCatcher,

    #[error(
        "file header reports {page_count} pages, which is not a multiple of PAGES_PER_SEGMENT ({pages_per_segment}); the file was likely truncated mid-extension"
    )]
    PartialSegment {
        page_count: u32,
        pages_per_segment: u32,
    },

    #[error("extend() called with {requested} bytes, which is not a positive multiple of EXTEND_UNIT ({unit})")]
    BadExtensionSize { requested: u64, unit: u64 },

    #[error("error while stamping a freshly-extended page's header")]
    Header(#[from] page::errors::header_error::HeaderError),

    #[error("error while interpreting the file header's binary layout")]
    Binary(#[from] binary_helpers::bin_error::BinaryError),

    #[error("page id {0} lies outside the currently mapped segments")]
    PageOutOfRange(u32),
}
