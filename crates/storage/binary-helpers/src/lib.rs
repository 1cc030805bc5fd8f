//! Little-endian byte<->integer conversion helpers shared by the page and
//! file-header layouts.

pub mod bin_error;
pub mod conversions;
pub mod le;
