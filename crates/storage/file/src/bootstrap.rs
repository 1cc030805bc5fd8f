//! File bootstrap.
//!
//! Opens (or creates) the backing file and brings the in-memory segment
//! list and free-space index to match what is on disk.

use crate::errors::FileError;
use crate::file_header::{FileHeaderMut, FileHeaderRef, FILE_HEADER_SIZE};
use crate::free_space::FreeSpaceIndex;
use crate::host_file::{HostFile, MappedRegion};
use crate::segment::{SegmentManager, SEGMENT_SIZE};
use page::header::HeaderRef;
use page::PAGES_PER_SEGMENT;

/// Everything bootstrap brings up: the open file, its header mapping, the
/// mapped segments, and a free-space index seeded from every page.
#[derive(Debug)]
pub struct BootstrappedFile {
    pub host: HostFile,
    pub header_region: MappedRegion,
    pub segments: SegmentManager,
    pub free_space: FreeSpaceIndex,
}

/// Opens `path`, creating and initializing a fresh file if it did not
/// already exist or was empty, then maps every existing segment and seeds
/// the free-space index from each page's header.
pub fn bootstrap(path: impl AsRef<std::path::Path>) -> Result<BootstrappedFile, FileError> {
    let mut host = HostFile::open(path)?;

    if host.size()? == 0 {
        host.extend(FILE_HEADER_SIZE as u64)?;
        let mut header_region = host.map(0, FILE_HEADER_SIZE)?;
        let mut header = FileHeaderMut::new(header_region.as_mut_slice());
        header.init_empty()?;
        header_region.flush(0..FILE_HEADER_SIZE)?;
    }

    let header_region = host.map(0, FILE_HEADER_SIZE)?;
    let header = FileHeaderRef::new(header_region.as_slice());
    header.validate_eye_catcher()?;
    let page_count = header.page_count()?;
    if page_count % PAGES_PER_SEGMENT != 0 {
        return Err(FileError::PartialSegment {
            page_count,
            pages_per_segment: PAGES_PER_SEGMENT,
        });
    }
    let num_segments = page_count / PAGES_PER_SEGMENT;

    let mut segments = SegmentManager::new();
    let mut free_space = FreeSpaceIndex::new();
    for s in 0..num_segments {
        let offset = FILE_HEADER_SIZE as u64 + (s as u64) * SEGMENT_SIZE;
        let region = host.map(offset, SEGMENT_SIZE as usize)?;
        segments.push_mapped(region);

        for k in 0..PAGES_PER_SEGMENT {
            let global_page_id = s * PAGES_PER_SEGMENT + k;
            let page_bytes = segments.resolve(global_page_id)?;
            let header_bytes = &page_bytes[..page::header::HEADER_SIZE];
            let page_header = HeaderRef::new(header_bytes)?;
            page_header.validate()?;
            let free_bytes = page_header.get_free_offset()? - page_header.get_slot_dir_end()?;
            free_space.seed(global_page_id, free_bytes);
        }
    }

    Ok(BootstrappedFile {
        host,
        header_region,
        segments,
        free_space,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn bootstrap_fresh_file_has_no_segments() {
        let tmp = NamedTempFile::new().unwrap();
        let bootstrapped = bootstrap(tmp.path()).unwrap();
        assert_eq!(bootstrapped.segments.segment_count(), 0);
    }

    #[test]
    fn bootstrap_rejects_corrupted_eye_catcher() {
        use std::io::Write;
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(&[0u8; FILE_HEADER_SIZE]).unwrap();
        tmp.flush().unwrap();
        assert!(matches!(
            bootstrap(tmp.path()),
            Err(FileError::BadEyeCatcher)
        ));
    }

    #[test]
    fn reopen_preserves_segments_and_seeds_free_space() {
        let tmp = NamedTempFile::new().unwrap();
        {
            let mut bootstrapped = bootstrap(tmp.path()).unwrap();
            let mut header = FileHeaderMut::new(bootstrapped.header_region.as_mut_slice());
            bootstrapped
                .segments
                .extend_one_segment(&mut bootstrapped.host, &mut header)
                .unwrap();
            bootstrapped.header_region.flush(0..FILE_HEADER_SIZE).unwrap();
        }

        let reopened = bootstrap(tmp.path()).unwrap();
        assert_eq!(reopened.segments.segment_count(), 1);
        assert!(reopened.free_space.find_page(0).is_some());
    }
}
