//! The segment manager.
//!
//! Keeps the in-memory list of mapped segments and translates a global
//! `page_id` into the byte slice for that page. Page ids are dense and
//! globally unique across the whole file, never segment-local: reusing a
//! segment-local id across segments would collide two unrelated pages
//! under the same `Rid`.

use crate::errors::FileError;
use crate::file_header::FileHeaderMut;
use crate::host_file::{HostFile, MappedRegion};
use page::header::HeaderMut;
use page::{PAGES_PER_SEGMENT, PAGE_SIZE};

/// Number of bytes spanned by one segment.
pub const SEGMENT_SIZE: u64 = PAGES_PER_SEGMENT as u64 * PAGE_SIZE as u64;

/// A global page id and the free-byte count its freshly-stamped header
/// reports, handed back to the caller so it can seed the free-space index.
#[derive(Debug, Clone, Copy)]
pub struct NewPage {
    pub page_id: u32,
    pub free_bytes: u32,
}

/// The in-memory list of mapped segments.
#[derive(Debug, Default)]
pub struct SegmentManager {
    segments: Vec<MappedRegion>,
}

impl SegmentManager {
    /// An empty segment manager, as built by bootstrap before mapping any
    /// segments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently-mapped segments.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Registers an already-mapped segment (used by bootstrap, which maps
    /// each existing segment itself before handing it here).
    pub fn push_mapped(&mut self, region: MappedRegion) {
        self.segments.push(region);
    }

    fn locate(&self, page_id: u32) -> Result<(usize, usize), FileError> {
        let segment_index = (page_id / PAGES_PER_SEGMENT) as usize;
        if segment_index >= self.segments.len() {
            return Err(FileError::PageOutOfRange(page_id));
        }
        let in_segment_offset = (page_id % PAGES_PER_SEGMENT) as usize * PAGE_SIZE;
        Ok((segment_index, in_segment_offset))
    }

    /// Borrowed view of the page's bytes.
    pub fn resolve(&self, page_id: u32) -> Result<&[u8], FileError> {
        let (segment_index, offset) = self.locate(page_id)?;
        Ok(&self.segments[segment_index].as_slice()[offset..offset + PAGE_SIZE])
    }

    /// Mutable borrowed view of the page's bytes.
    pub fn resolve_mut(&mut self, page_id: u32) -> Result<&mut [u8], FileError> {
        let (segment_index, offset) = self.locate(page_id)?;
        Ok(&mut self.segments[segment_index].as_mut_slice()[offset..offset + PAGE_SIZE])
    }

    /// Grows the host file by one `SEGMENT_SIZE`, maps the new region,
    /// stamps every page's header with a globally unique `page_id`,
    /// appends the mapping, bumps the on-disk header's page count, and
    /// returns the new pages' ids with their initial free-byte counts.
    ///
    /// Convenience wrapper around [`prepare_new_segment`] +
    /// [`commit_new_segment`] for callers (bootstrap's own tests, single
    /// -threaded setup code) that don't need the two phases split across
    /// a lock boundary; `Engine::grow_by_one_segment` calls the split
    /// halves directly instead so the slow I/O in the first phase can run
    /// without holding its caller's lock.
    pub fn extend_one_segment(
        &mut self,
        host: &mut HostFile,
        header: &mut FileHeaderMut,
    ) -> Result<Vec<NewPage>, FileError> {
        let prepared = Self::prepare_new_segment(self.segments.len(), host)?;
        let new_pages = self.commit_new_segment(prepared);
        header.set_page_count(self.segments.len() as u32 * PAGES_PER_SEGMENT)?;
        Ok(new_pages)
    }

    /// Phase 1 of segment growth: the slow I/O. Extends the host file by
    /// `SEGMENT_SIZE`, maps the new region, and stamps every one of its
    /// pages with a freshly-initialized, empty header. Takes only the
    /// segment count the caller observed (not `&self`/`&mut self`) so it
    /// can run without holding the engine lock; `commit_new_segment`
    /// below performs the bookkeeping that does need it.
    pub fn prepare_new_segment(
        existing_segment_count: usize,
        host: &mut HostFile,
    ) -> Result<PreparedSegment, FileError> {
        let existing_total_pages = existing_segment_count as u32 * PAGES_PER_SEGMENT;
        let offset = crate::file_header::FILE_HEADER_SIZE as u64
            + existing_segment_count as u64 * SEGMENT_SIZE;
        host.extend(SEGMENT_SIZE)?;
        let mut region = host.map(offset, SEGMENT_SIZE as usize)?;

        let mut new_pages = Vec::with_capacity(PAGES_PER_SEGMENT as usize);
        for local_index in 0..PAGES_PER_SEGMENT {
            let page_id = existing_total_pages + local_index;
            let page_start = local_index as usize * PAGE_SIZE;
            let page_bytes = &mut region.as_mut_slice()[page_start..page_start + PAGE_SIZE];
            let (header_bytes, _) = page_bytes.split_at_mut(page::header::HEADER_SIZE);
            let mut page_header = HeaderMut::new(header_bytes)?;
            page_header.init_empty(page_id)?;

            let free_bytes = page_header.get_free_offset()? - page_header.get_slot_dir_end()?;
            new_pages.push(NewPage {
                page_id,
                free_bytes,
            });
        }
        region.flush(0..SEGMENT_SIZE as usize)?;

        Ok(PreparedSegment { region, new_pages })
    }

    /// Phase 2 of segment growth: the in-memory bookkeeping. Registers
    /// the newly-mapped region and returns the new pages so the caller
    /// can seed the free-space index and bump the file header's page
    /// count, all under the engine lock.
    pub fn commit_new_segment(&mut self, prepared: PreparedSegment) -> Vec<NewPage> {
        self.segments.push(prepared.region);
        prepared.new_pages
    }
}

/// The result of [`SegmentManager::prepare_new_segment`]: a freshly mapped,
/// already-stamped segment awaiting [`SegmentManager::commit_new_segment`].
#[derive(Debug)]
pub struct PreparedSegment {
    region: MappedRegion,
    new_pages: Vec<NewPage>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_header::FILE_HEADER_SIZE;
    use crate::host_file::HostFile;
    use tempfile::NamedTempFile;

    #[test]
    fn extend_one_segment_stamps_globally_unique_ids() {
        let tmp = NamedTempFile::new().unwrap();
        let mut host = HostFile::open(tmp.path()).unwrap();
        host.extend(FILE_HEADER_SIZE as u64).unwrap();
        let mut header_region = host.map(0, FILE_HEADER_SIZE).unwrap();
        let mut header = FileHeaderMut::new(header_region.as_mut_slice());
        header.init_empty().unwrap();

        let mut segments = SegmentManager::new();
        let first = segments.extend_one_segment(&mut host, &mut header).unwrap();
        assert_eq!(first.len(), PAGES_PER_SEGMENT as usize);
        assert_eq!(first[0].page_id, 0);
        assert_eq!(first.last().unwrap().page_id, PAGES_PER_SEGMENT - 1);

        let second = segments.extend_one_segment(&mut host, &mut header).unwrap();
        assert_eq!(second[0].page_id, PAGES_PER_SEGMENT);
        assert_eq!(header.page_count().unwrap(), PAGES_PER_SEGMENT * 2);
    }

    #[test]
    fn resolve_out_of_range_errors() {
        let tmp = NamedTempFile::new().unwrap();
        let mut host = HostFile::open(tmp.path()).unwrap();
        host.extend(FILE_HEADER_SIZE as u64).unwrap();
        let mut header_region = host.map(0, FILE_HEADER_SIZE).unwrap();
        let mut header = FileHeaderMut::new(header_region.as_mut_slice());
        header.init_empty().unwrap();

        let mut segments = SegmentManager::new();
        segments.extend_one_segment(&mut host, &mut header).unwrap();
        assert!(segments.resolve(PAGES_PER_SEGMENT).is_err());
        assert!(segments.resolve(0).is_ok());
    }
}
