//! The free-space index.
//!
//! An in-memory ordered multimap from a page's recorded free-byte count to
//! its page id, answering "find me a page with headroom for N bytes"
//! without scanning every page. Rebuilt from page headers on every
//! bootstrap (see `bootstrap.rs`); never persisted itself.

use std::collections::{BTreeMap, HashMap};

/// Ordered multimap of `free_bytes -> {page_id}`, plus a reverse index so
/// `update` can find and remove a page's current entry without a scan.
#[derive(Debug, Default)]
pub struct FreeSpaceIndex {
    by_free_bytes: BTreeMap<u32, Vec<u32>>,
    current_free: HashMap<u32, u32>,
}

impl FreeSpaceIndex {
    /// An empty index, as built by bootstrap before scanning any pages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a brand-new page's entry. Used by segment extension and by
    /// bootstrap's page scan.
    pub fn seed(&mut self, page_id: u32, free_bytes: u32) {
        self.by_free_bytes.entry(free_bytes).or_default().push(page_id);
        self.current_free.insert(page_id, free_bytes);
    }

    /// Moves `page_id`'s entry from its current free-byte bucket to
    /// `new_free`. A no-op on the ordering if `new_free` equals the
    /// page's current recorded value.
    pub fn update(&mut self, page_id: u32, new_free: u32) {
        if let Some(&old_free) = self.current_free.get(&page_id) {
            if old_free == new_free {
                return;
            }
            self.remove_from_bucket(old_free, page_id);
        }
        self.by_free_bytes.entry(new_free).or_default().push(page_id);
        self.current_free.insert(page_id, new_free);
    }

    fn remove_from_bucket(&mut self, free_bytes: u32, page_id: u32) {
        if let Some(bucket) = self.by_free_bytes.get_mut(&free_bytes) {
            if let Some(pos) = bucket.iter().position(|&id| id == page_id) {
                bucket.swap_remove(pos);
            }
            if bucket.is_empty() {
                self.by_free_bytes.remove(&free_bytes);
            }
        }
    }

    /// Returns a page id whose recorded free-byte count is **strictly
    /// greater than** `required`, or `None`. Strict, not `>=`: a page with
    /// exactly `required` free bytes is excluded, since the bytes above
    /// this bound already include the cost of any slot the insert may
    /// need to append.
    pub fn find_page(&self, required: u32) -> Option<u32> {
        self.by_free_bytes
            .range((required + 1)..)
            .find_map(|(_, ids)| ids.first().copied())
    }

    /// The free-byte count currently recorded for `page_id`, if present.
    pub fn current(&self, page_id: u32) -> Option<u32> {
        self.current_free.get(&page_id).copied()
    }
}
