//! Binary layout and zero-copy accessors for the slotted-page format used by
//! the storage engine: a fixed-size page holding a header, a slot directory
//! that grows upward from the header, and records that grow downward from
//! the end of the page.

pub mod compactor;
pub mod errors;
pub mod header;
pub mod ops;
pub mod record;
pub mod slot;
pub mod slot_array;

/// Size, in bytes, of every page in the file. Large enough to comfortably
/// hold typical documents while keeping `SEGMENT_SIZE` at a convenient 64
/// MiB with [`PAGES_PER_SEGMENT`] pages per segment.
pub const PAGE_SIZE: usize = 65536;

/// Number of pages in one segment. `PAGES_PER_SEGMENT * PAGE_SIZE ==
/// SEGMENT_SIZE`.
pub const PAGES_PER_SEGMENT: u32 = 1024;

/// Sentinel shared by slot-directory entries (meaning "this slot holds no
/// record") and by a page's reuse-freelist head (meaning "freelist is
/// empty"). There is deliberately a single sentinel for both roles.
pub const EMPTY_SENTINEL: u32 = u32::MAX;

/// Largest payload a single record may carry, derived from `PAGE_SIZE` so
/// that an empty, freshly-initialized page can always hold one record of
/// this size (see `header::HEADER_SIZE`, `record::RECORD_HEADER_SIZE` and
/// `slot::SLOT_SIZE`).
///
/// The free-space index keys pages by free byte count and answers
/// "does some page have more than `required` free bytes" with a strict
/// upper-bound query. A record of exactly `MAX_RECORD` bytes needs
/// `required` bytes equal to a fresh page's entire free region, which a
/// strict `>` query could never admit. The extra `- 1` below leaves one
/// byte of headroom so a freshly-initialized page always satisfies that
/// query for a max-size record.
pub const MAX_RECORD: usize =
    PAGE_SIZE - header::HEADER_SIZE - record::RECORD_HEADER_SIZE - slot::SLOT_SIZE - 1;
