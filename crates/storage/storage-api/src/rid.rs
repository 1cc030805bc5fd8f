//! Record identifiers.

/// Identifies a single record: the page it lives on and its slot index
/// within that page. A `Rid`'s `slot_id` stays valid across compaction —
/// only the offset it points to may move underneath it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rid {
    pub page_id: u32,
    pub slot_id: u32,
}

impl Rid {
    pub fn new(page_id: u32, slot_id: u32) -> Self {
        Rid { page_id, slot_id }
    }
}
