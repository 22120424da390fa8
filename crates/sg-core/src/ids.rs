//! Default table naming

use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out default table names `Table_1`, `Table_2`, ...
///
/// Owned by whoever creates grids; share it by reference to keep names unique.
#[derive(Debug, Default)]
pub struct TableIdCounter {
    next: AtomicU64,
}

impl TableIdCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn next_name(&self) -> String {
        format!("Table_{}", self.next_id())
    }
}
