//! Layout and accessors for the page header.
//!
//! # Page Header Layout
//!
//! The page header occupies the first [`HEADER_SIZE`] bytes of every page.
//! All fields are little-endian `u32`.
//!
//! | Field             | Offset              | Description |
//! |-------------------|---------------------|-------------|
//! | `eye_catcher`     | [`EYE_CATCHER`]     | Magic marker identifying this as a live, stamped page; validated on every access. |
//! | `size`            | [`SIZE`]            | Always `PAGE_SIZE`. |
//! | `flag`            | [`FLAG`]            | Reserved page status flags; `NORMAL` (0) today. |
//! | `page_id`         | [`PAGE_ID`]         | Global, stable page identifier. |
//! | `num_slots`       | [`NUM_SLOTS`]       | Slot-directory entries ever allocated on this page (includes ones currently on the reuse freelist). |
//! | `slot_dir_end`    | [`SLOT_DIR_END`]    | One past the last allocated slot entry; the slot directory grows upward from here. |
//! | `free_offset`     | [`FREE_OFFSET`]     | Start of the record region; records grow downward from `PAGE_SIZE`. |
//! | `reuse_slot_head` | [`REUSE_SLOT_HEAD`] | Head of the in-page slot reuse freelist, or `EMPTY_SENTINEL`. |
//! | `reserved`        | [`RESERVED`]        | Unused, always zero. |
//!
//! ```text
//! +----------------------+-------------------+----------------------+
//! |      Header          |   Slot Directory  |      Records         |
//! |    (HEADER_SIZE)      |   (grows right)   |   (grows left)       |
//! +----------------------+-------------------+----------------------+
//! ```

use crate::errors::header_error::HeaderError;
use binary_helpers::le::{read_le, write_le};
use paste::paste;

/// Size of the page header in bytes.
pub const HEADER_SIZE: usize = 36;

/// Magic marker stamped into every freshly-initialized page header,
/// validated on every subsequent read.
pub const PAGE_EYE_CATCHER: u32 = 0x5047_4531; // "PGE1"

/// Reserved page-level status flags. Only `NORMAL` exists today.
pub const PAGE_FLAG_NORMAL: u32 = 0;

/// Immutable zero-copy view into a page header.
#[derive(Debug)]
pub struct HeaderRef<'a> {
    bytes: &'a [u8; HEADER_SIZE],
}

impl<'a> HeaderRef<'a> {
    /// Builds a `HeaderRef` from a slice, failing if its length does not
    /// match `HEADER_SIZE`.
    pub fn new(bytes: &'a [u8]) -> Result<Self, HeaderError> {
        if bytes.len() != HEADER_SIZE {
            return Err(HeaderError::HeaderSliceSizeMismatch {
                actual: bytes.len(),
                expected: HEADER_SIZE,
            });
        }
        Ok(HeaderRef {
            bytes: bytes.try_into().expect("length checked above"),
        })
    }

    /// Validates the eye-catcher and recorded size of an already-initialized page.
    pub fn validate(&self) -> Result<(), HeaderError> {
        validate_fields(self.get_eye_catcher()?, self.get_size()?)
    }
}

fn validate_fields(eye_catcher: u32, size: u32) -> Result<(), HeaderError> {
    if eye_catcher != PAGE_EYE_CATCHER {
        return Err(HeaderError::BadEyeCatcher);
    }
    if size != crate::PAGE_SIZE as u32 {
        return Err(HeaderError::BadSize {
            actual: size,
            expected: crate::PAGE_SIZE as u32,
        });
    }
    Ok(())
}

/// Mutable zero-copy view into a page header.
#[derive(Debug)]
pub struct HeaderMut<'a> {
    bytes: &'a mut [u8; HEADER_SIZE],
}

impl<'a> HeaderMut<'a> {
    /// Builds a `HeaderMut` from a slice, failing if its length does not
    /// match `HEADER_SIZE`.
    pub fn new(bytes: &'a mut [u8]) -> Result<Self, HeaderError> {
        if bytes.len() != HEADER_SIZE {
            return Err(HeaderError::HeaderSliceSizeMismatch {
                actual: bytes.len(),
                expected: HEADER_SIZE,
            });
        }
        Ok(HeaderMut {
            bytes: bytes.try_into().expect("length checked above"),
        })
    }

    /// Stamps a freshly-extended, empty page: no slots, an empty hole
    /// spanning the whole record region, and an empty reuse freelist.
    pub fn init_empty(&mut self, page_id: u32) -> Result<(), HeaderError> {
        self.set_eye_catcher(PAGE_EYE_CATCHER)?;
        self.set_size(crate::PAGE_SIZE as u32)?;
        self.set_flag(PAGE_FLAG_NORMAL)?;
        self.set_page_id(page_id)?;
        self.set_num_slots(0)?;
        self.set_slot_dir_end(HEADER_SIZE as u32)?;
        self.set_free_offset(crate::PAGE_SIZE as u32)?;
        self.set_reuse_slot_head(crate::EMPTY_SENTINEL)?;
        self.set_reserved(0)?;
        Ok(())
    }

    /// Validates the eye-catcher and recorded size of an already-initialized page.
    pub fn validate(&self) -> Result<(), HeaderError> {
        validate_fields(self.get_eye_catcher()?, self.get_size()?)
    }
}

macro_rules! impl_header_accessors {
    ( $( $field_name:ident : $field_type:ty = $field_offset:expr ; )* ) => {
        paste! {
            $(
                /// Byte offset of this header field.
                pub const [<$field_name:upper>] : usize = $field_offset;

                impl<'a> HeaderRef<'a> {
                    #[doc = concat!("Reads `", stringify!($field_name), "`.")]
                    pub fn [<get_ $field_name>](&self) -> Result<$field_type, HeaderError> {
                        Ok(read_le::<$field_type>(self.bytes, $field_offset)?)
                    }
                }

                impl<'a> HeaderMut<'a> {
                    #[doc = concat!("Reads `", stringify!($field_name), "`.")]
                    pub fn [<get_ $field_name>](&self) -> Result<$field_type, HeaderError> {
                        Ok(read_le::<$field_type>(self.bytes, $field_offset)?)
                    }

                    #[doc = concat!("Writes `", stringify!($field_name), "`.")]
                    pub fn [<set_ $field_name>](&mut self, val: $field_type) -> Result<(), HeaderError> {
                        write_le::<$field_type>(self.bytes, $field_offset, val)?;
                        Ok(())
                    }
                }
            )*
        }
    };
}

impl_header_accessors! {
    eye_catcher: u32 = 0;
    size: u32 = 4;
    flag: u32 = 8;
    page_id: u32 = 12;
    num_slots: u32 = 16;
    slot_dir_end: u32 = 20;
    free_offset: u32 = 24;
    reuse_slot_head: u32 = 28;
    reserved: u32 = 32;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_size_is_nine_u32_fields() {
        assert_eq!(HEADER_SIZE, 36);
    }

    #[test]
    fn init_empty_stamps_expected_values() {
        let mut bytes = [0u8; HEADER_SIZE];
        let mut header = HeaderMut::new(&mut bytes).unwrap();
        header.init_empty(7).unwrap();

        assert_eq!(header.get_eye_catcher().unwrap(), PAGE_EYE_CATCHER);
        assert_eq!(header.get_size().unwrap(), crate::PAGE_SIZE as u32);
        assert_eq!(header.get_flag().unwrap(), PAGE_FLAG_NORMAL);
        assert_eq!(header.get_page_id().unwrap(), 7);
        assert_eq!(header.get_num_slots().unwrap(), 0);
        assert_eq!(header.get_slot_dir_end().unwrap(), HEADER_SIZE as u32);
        assert_eq!(header.get_free_offset().unwrap(), crate::PAGE_SIZE as u32);
        assert_eq!(header.get_reuse_slot_head().unwrap(), crate::EMPTY_SENTINEL);
        header.validate().unwrap();
    }

    #[test]
    fn header_ref_rejects_wrong_size() {
        let bytes = [0u8; HEADER_SIZE - 1];
        assert!(HeaderRef::new(&bytes).is_err());
    }

    #[test]
    fn validate_rejects_zeroed_page() {
        let bytes = [0u8; HEADER_SIZE];
        let header = HeaderRef::new(&bytes).unwrap();
        assert!(matches!(
            header.validate(),
            Err(HeaderError::BadEyeCatcher)
        ));
    }

    #[test]
    fn validate_rejects_wrong_size_field() {
        let mut bytes = [0u8; HEADER_SIZE];
        let mut header = HeaderMut::new(&mut bytes).unwrap();
        header.init_empty(1).unwrap();
        header.set_size(1).unwrap();
        assert!(matches!(header.validate(), Err(HeaderError::BadSize { .. })));
    }

    #[test]
    fn roundtrip_all_fields() {
        let mut bytes = [0u8; HEADER_SIZE];
        {
            let mut header = HeaderMut::new(&mut bytes).unwrap();
            header.set_eye_catcher(PAGE_EYE_CATCHER).unwrap();
            header.set_size(crate::PAGE_SIZE as u32).unwrap();
            header.set_flag(PAGE_FLAG_NORMAL).unwrap();
            header.set_page_id(42).unwrap();
            header.set_num_slots(3).unwrap();
            header.set_slot_dir_end(HEADER_SIZE as u32).unwrap();
            header.set_free_offset(65000).unwrap();
            header.set_reuse_slot_head(crate::EMPTY_SENTINEL).unwrap();
        }
        let header = HeaderRef::new(&bytes).unwrap();
        assert_eq!(header.get_eye_catcher().unwrap(), PAGE_EYE_CATCHER);
        assert_eq!(header.get_size().unwrap(), crate::PAGE_SIZE as u32);
        assert_eq!(header.get_flag().unwrap(), PAGE_FLAG_NORMAL);
        assert_eq!(header.get_page_id().unwrap(), 42);
        assert_eq!(header.get_num_slots().unwrap(), 3);
        assert_eq!(header.get_slot_dir_end().unwrap(), HEADER_SIZE as u32);
        assert_eq!(header.get_free_offset().unwrap(), 65000);
        assert_eq!(header.get_reuse_slot_head().unwrap(), crate::EMPTY_SENTINEL);
        header.validate().unwrap();
    }
}
