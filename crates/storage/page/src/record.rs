//! Layout and accessors for the fixed-size header that precedes every
//! record's payload bytes.

use crate::errors::record_error::RecordError;
use binary_helpers::le::{read_le, write_le};

/// Size, in bytes, of a record header: a little-endian `u32` total length
/// (header + payload) followed by a one-byte flag.
pub const RECORD_HEADER_SIZE: usize = 5;

/// Whether a record is live or has been tombstoned by `remove`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFlag {
    Normal,
    Dropped,
}

impl RecordFlag {
    fn from_byte(byte: u8) -> Result<Self, RecordError> {
        match byte {
            0 => Ok(RecordFlag::Normal),
            1 => Ok(RecordFlag::Dropped),
            other => Err(RecordError::UnknownFlag(other)),
        }
    }

    fn to_byte(self) -> u8 {
        match self {
            RecordFlag::Normal => 0,
            RecordFlag::Dropped => 1,
        }
    }
}

/// Immutable zero-copy view into a record header.
#[derive(Debug)]
pub struct RecordHeaderRef<'a> {
    bytes: &'a [u8; RECORD_HEADER_SIZE],
}

impl<'a> RecordHeaderRef<'a> {
    pub fn new(bytes: &'a [u8]) -> Result<Self, RecordError> {
        let bytes_array: &[u8; RECORD_HEADER_SIZE] =
            bytes
                .try_into()
                .map_err(|_| RecordError::RecordOutOfBounds {
                    offset: 0,
                    expected: RECORD_HEADER_SIZE,
                    available: bytes.len(),
                })?;
        Ok(Self { bytes: bytes_array })
    }

    pub fn total_len(&self) -> Result<u32, RecordError> {
        Ok(read_le::<u32>(self.bytes, 0)?)
    }

    pub fn flag(&self) -> Result<RecordFlag, RecordError> {
        RecordFlag::from_byte(self.bytes[4])
    }
}

/// Mutable zero-copy view into a record header.
#[derive(Debug)]
pub struct RecordHeaderMut<'a> {
    bytes: &'a mut [u8; RECORD_HEADER_SIZE],
}

impl<'a> RecordHeaderMut<'a> {
    pub fn new(bytes: &'a mut [u8]) -> Result<Self, RecordError> {
        let available = bytes.len();
        let bytes_array: &mut [u8; RECORD_HEADER_SIZE] =
            bytes
                .try_into()
                .map_err(|_| RecordError::RecordOutOfBounds {
                    offset: 0,
                    expected: RECORD_HEADER_SIZE,
                    available,
                })?;
        Ok(Self { bytes: bytes_array })
    }

    pub fn total_len(&self) -> Result<u32, RecordError> {
        Ok(read_le::<u32>(self.bytes, 0)?)
    }

    pub fn flag(&self) -> Result<RecordFlag, RecordError> {
        RecordFlag::from_byte(self.bytes[4])
    }

    pub fn set_total_len(&mut self, len: u32) -> Result<(), RecordError> {
        Ok(write_le::<u32>(self.bytes, 0, len)?)
    }

    pub fn set_flag(&mut self, flag: RecordFlag) -> Result<(), RecordError> {
        self.bytes[4] = flag.to_byte();
        Ok(())
    }
}
