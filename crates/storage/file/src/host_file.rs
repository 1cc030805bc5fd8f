//! The host file I/O adapter.
//!
//! Owns the single [`std::fs::File`] backing the engine and the primitive
//! operations the rest of the engine is built on: size, zero-filled growth,
//! and memory-mapping a byte range for direct access.

use crate::errors::FileError;
use mmap_rs::{MmapFlags, MmapMut, MmapOptions};
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

/// Every call to [`HostFile::extend`] must grow the file by a multiple of
/// this many bytes; growth is performed in chunks of exactly this size so a
/// crash mid-extension leaves a prefix of whole zero-filled chunks.
pub const EXTEND_UNIT: u64 = 4096;

/// A memory-mapped, read-write region of the backing file. The base address
/// is stable for the lifetime of the handle; growth always maps a new,
/// additional region rather than resizing an existing one.
#[derive(Debug)]
pub struct MappedRegion {
    mmap: MmapMut,
}

impl MappedRegion {
    /// Borrowed view of the mapped bytes.
    pub fn as_slice(&self) -> &[u8] {
        self.mmap.as_slice()
    }

    /// Mutable borrowed view of the mapped bytes.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        self.mmap.as_mut_slice()
    }

    /// Length, in bytes, of the mapped region.
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Whether the mapped region is empty (never true for a real segment or
    /// header mapping, only for a default/placeholder value).
    pub fn is_empty(&self) -> bool {
        self.mmap.len() == 0
    }

    /// Flushes the given byte range back to the backing file.
    pub fn flush(&self, range: std::ops::Range<usize>) -> Result<(), FileError> {
        self.mmap.flush(range).map_err(FileError::Mmap)
    }
}

/// The host-file adapter (C1).
#[derive(Debug)]
pub struct HostFile {
    file: File,
}

impl HostFile {
    /// Opens (creating if absent) the backing file for read+write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FileError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        Ok(Self { file })
    }

    /// Current length of the backing file, in bytes.
    pub fn size(&self) -> Result<u64, FileError> {
        Ok(self.file.metadata()?.len())
    }

    /// Grows the file by `additional_bytes`, zero-filled, appended at the
    /// current end. `additional_bytes` must be a positive multiple of
    /// [`EXTEND_UNIT`]; every caller inside this engine sizes its requests
    /// that way, so a violation here is an internal bug, not ordinary
    /// caller error.
    pub fn extend(&mut self, additional_bytes: u64) -> Result<(), FileError> {
        if additional_bytes == 0 || additional_bytes % EXTEND_UNIT != 0 {
            return Err(FileError::BadExtensionSize {
                requested: additional_bytes,
                unit: EXTEND_UNIT,
            });
        }

        let chunk = vec![0u8; EXTEND_UNIT as usize];
        let mut remaining = additional_bytes;
        while remaining > 0 {
            self.file.seek(SeekFrom::End(0))?;
            self.file.write_all(&chunk)?;
            remaining -= EXTEND_UNIT;
        }
        self.file.sync_data()?;
        Ok(())
    }

    /// Maps `[offset, offset + len)` of the file, shared, read-write. The
    /// returned handle's base address is stable for its whole lifetime.
    pub fn map(&self, offset: u64, len: usize) -> Result<MappedRegion, FileError> {
        let mmap = unsafe {
            MmapOptions::new(len)
                .map_err(FileError::Mmap)?
                .with_file(&self.file, offset)
                .with_flags(MmapFlags::SHARED)
                .map_mut()
                .map_err(FileError::Mmap)?
        };
        Ok(MappedRegion { mmap })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn fresh_file_has_zero_size() {
        let tmp = NamedTempFile::new().unwrap();
        let host = HostFile::open(tmp.path()).unwrap();
        assert_eq!(host.size().unwrap(), 0);
    }

    #[test]
    fn extend_grows_by_exact_amount_and_zero_fills() {
        let tmp = NamedTempFile::new().unwrap();
        let mut host = HostFile::open(tmp.path()).unwrap();
        host.extend(EXTEND_UNIT * 3).unwrap();
        assert_eq!(host.size().unwrap(), EXTEND_UNIT * 3);

        let region = host.map(0, (EXTEND_UNIT * 3) as usize).unwrap();
        assert!(region.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn extend_rejects_non_multiple_of_unit() {
        let tmp = NamedTempFile::new().unwrap();
        let mut host = HostFile::open(tmp.path()).unwrap();
        assert!(matches!(
            host.extend(EXTEND_UNIT + 1),
            Err(FileError::BadExtensionSize { .. })
        ));
    }

    #[test]
    fn map_reflects_writes_through_mmap() {
        let tmp = NamedTempFile::new().unwrap();
        let mut host = HostFile::open(tmp.path()).unwrap();
        host.extend(EXTEND_UNIT).unwrap();

        let mut region = host.map(0, EXTEND_UNIT as usize).unwrap();
        region.as_mut_slice()[0] = 0xAB;
        region.flush(0..EXTEND_UNIT as usize).unwrap();

        let region2 = host.map(0, EXTEND_UNIT as usize).unwrap();
        assert_eq!(region2.as_slice()[0], 0xAB);
    }
}
