//! Host-file I/O, segment management, the free-space index, and bootstrap
//! for the single-file heap storage engine.

pub mod bootstrap;
pub mod errors;
pub mod file_header;
pub mod free_space;
pub mod host_file;
pub mod segment;

pub use bootstrap::{bootstrap, BootstrappedFile};
pub use errors::FileError;
pub use file_header::FILE_HEADER_SIZE;
pub use host_file::{HostFile, MappedRegion, EXTEND_UNIT};
pub use segment::{NewPage, PreparedSegment, SegmentManager, SEGMENT_SIZE};
