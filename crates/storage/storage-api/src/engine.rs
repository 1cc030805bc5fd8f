//! The record manager: the engine's public `insert` / `find` / `remove`
//! surface, plus the insert-time segment-extension retry protocol. Growing
//! the file (slow `extend`+`mmap` I/O) runs with the engine lock released;
//! only the subsequent in-memory bookkeeping (registering the segment,
//! seeding the free-space index, bumping the header's page count) runs
//! with it re-acquired.

use std::path::Path;
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError};

use file::file_header::FileHeaderMut;
use file::free_space::FreeSpaceIndex;
use file::host_file::{HostFile, MappedRegion};
use file::segment::SegmentManager;
use file::{bootstrap, FILE_HEADER_SIZE};
use page::record::RECORD_HEADER_SIZE;
use page::slot::SLOT_SIZE;
use page::{compactor, ops, MAX_RECORD, PAGES_PER_SEGMENT};

use crate::documents;
use crate::error::DmsError;
use crate::rid::Rid;

/// Everything the engine lock protects: the mapped header, the segment
/// list, and the free-space index. The backing `HostFile` itself is *not*
/// in here — it lives behind its own mutex, since only segment extension
/// ever touches it (see `grow_by_one_segment`).
struct MappedState {
    header_region: MappedRegion,
    segments: SegmentManager,
    free_space: FreeSpaceIndex,
}

/// The slotted-page heap-file document storage engine.
///
/// One `Engine` owns one backing file for its entire lifetime and is
/// shared across threads behind an `Arc` by callers. `insert` and
/// `remove` take the engine lock exclusively; `find` takes it shared. A
/// second, independent mutex serializes the (much rarer) file-growth
/// path so that a slow `extend`+`mmap` never blocks readers or writers of
/// unrelated pages.
pub struct Engine {
    state: RwLock<MappedState>,
    host: Mutex<HostFile>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").finish_non_exhaustive()
    }
}

fn read_lock(lock: &RwLock<MappedState>) -> RwLockReadGuard<'_, MappedState> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock(lock: &RwLock<MappedState>) -> RwLockWriteGuard<'_, MappedState> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Engine {
    /// Opens `path`, creating and initializing it if it does not already
    /// exist, and rebuilding the free-space index from every currently
    /// mapped page's header (see `file::bootstrap`).
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DmsError> {
        let bootstrapped = bootstrap::bootstrap(path)?;
        tracing::debug!(
            segments = bootstrapped.segments.segment_count(),
            "engine opened"
        );
        Ok(Engine {
            state: RwLock::new(MappedState {
                header_region: bootstrapped.header_region,
                segments: bootstrapped.segments,
                free_space: bootstrapped.free_space,
            }),
            host: Mutex::new(bootstrapped.host),
        })
    }

    /// Inserts `document`, an opaque length-prefixed byte blob that must
    /// carry a top-level `_id` field, and returns the `Rid` of the stored
    /// record. Grows the file by one segment, retrying, if no currently
    /// mapped page has room.
    pub fn insert(&self, document: &[u8]) -> Result<Rid, DmsError> {
        let size = documents::objsize(document);
        if size > MAX_RECORD {
            return Err(DmsError::InvalidArg(format!(
                "document of {size} bytes exceeds MAX_RECORD ({MAX_RECORD} bytes)"
            )));
        }
        if !documents::has_top_level_field(document, "_id") {
            return Err(DmsError::InvalidArg(
                "document is missing a top-level `_id` field".to_string(),
            ));
        }

        // Always reserves a slot's worth of space, whether or not a reuse
        // slot ends up being used: conservative and uniform.
        let required = size as u32 + RECORD_HEADER_SIZE as u32 + SLOT_SIZE as u32;

        loop {
            if let Some(rid) = self.try_insert_into_mapped_page(document, required)? {
                return Ok(rid);
            }
            self.grow_by_one_segment()?;
        }
    }

    /// One attempt at landing `document` on an already-mapped page.
    /// Returns `Ok(None)` when no page currently has room, signaling the
    /// caller to grow the file and retry.
    fn try_insert_into_mapped_page(
        &self,
        document: &[u8],
        required: u32,
    ) -> Result<Option<Rid>, DmsError> {
        let mut state = write_lock(&self.state);

        let Some(page_id) = state.free_space.find_page(required) else {
            return Ok(None);
        };

        let old_free = state.free_space.current(page_id).ok_or_else(|| {
            DmsError::Internal(format!(
                "page {page_id} was returned by find_page but has no free-space entry"
            ))
        })?;

        let page = state.segments.resolve_mut(page_id)?;
        let contiguous = ops::contiguous_free(page)?;

        // Only worth compacting if there are reclaimable holes *and* the
        // contiguous hole alone isn't already enough.
        if old_free > contiguous && contiguous < required {
            compactor::compact(page)?;
        }
        let contiguous = ops::contiguous_free(page)?;
        if old_free < required || contiguous < required {
            return Err(DmsError::Internal(format!(
                "page {page_id}'s free-space index ({old_free} bytes) disagrees with its \
                 layout ({contiguous} contiguous bytes) for a {required}-byte insert"
            )));
        }

        let slot_id = ops::insert_record(page, document)?;
        state.free_space.update(page_id, old_free - required);

        tracing::debug!(page_id, slot_id, required, "inserted record");
        Ok(Some(Rid::new(page_id, slot_id)))
    }

    /// Grows the file by exactly one segment. The slow I/O (file growth,
    /// `mmap`, header stamping) runs without the engine lock held; losing
    /// the race to `try_lock` just means another thread already did the
    /// growth, so this call blocks until it's done and returns without
    /// doing anything itself.
    fn grow_by_one_segment(&self) -> Result<(), DmsError> {
        let mut host = match self.host.try_lock() {
            Ok(host) => host,
            Err(TryLockError::WouldBlock) => {
                drop(self.host.lock().unwrap_or_else(|p| p.into_inner()));
                return Ok(());
            }
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };

        let existing_segment_count = read_lock(&self.state).segments.segment_count();
        let prepared = SegmentManager::prepare_new_segment(existing_segment_count, &mut host)?;
        drop(host);

        let mut state = write_lock(&self.state);
        let new_pages = state.segments.commit_new_segment(prepared);
        let total_pages = state.segments.segment_count() as u32 * PAGES_PER_SEGMENT;
        FileHeaderMut::new(state.header_region.as_mut_slice()).set_page_count(total_pages)?;
        for new_page in &new_pages {
            state.free_space.seed(new_page.page_id, new_page.free_bytes);
        }

        tracing::debug!(total_pages, "extended file by one segment");
        Ok(())
    }

    /// Reads back the live record at `rid`. `NotFound` if `rid` names an
    /// unmapped page, an empty slot, or a dropped record.
    pub fn find(&self, rid: Rid) -> Result<Vec<u8>, DmsError> {
        let state = read_lock(&self.state);
        let page = state.segments.resolve(rid.page_id)?;
        Ok(ops::find_record(page, rid.slot_id)?)
    }

    /// Tombstones the live record at `rid`, crediting its bytes back to
    /// the page's recorded free space. The slot directory entry itself is
    /// reclaimed only by a later compaction pass; a second `remove` of
    /// the same `rid` returns `NotFound`.
    pub fn remove(&self, rid: Rid) -> Result<(), DmsError> {
        let mut state = write_lock(&self.state);
        let page = state.segments.resolve_mut(rid.page_id)?;
        let freed = ops::remove_record(page, rid.slot_id)?;

        let old_free = state.free_space.current(rid.page_id).ok_or_else(|| {
            DmsError::Internal(format!(
                "page {} has a mapped page but no free-space entry",
                rid.page_id
            ))
        })?;
        state.free_space.update(rid.page_id, old_free + freed);

        tracing::debug!(page_id = rid.page_id, slot_id = rid.slot_id, freed, "removed record");
        Ok(())
    }

    /// Flushes the file header back to disk. Segment regions are flushed
    /// as they're stamped; dropping the `Engine` unmaps everything.
    pub fn close(self) -> Result<(), DmsError> {
        let state = write_lock(&self.state);
        state.header_region.flush(0..FILE_HEADER_SIZE)?;
        Ok(())
    }
}
