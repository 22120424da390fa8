//! Saved view persistence, keyed by table identity

pub mod json_store;

use ahash::AHashMap;
use indexmap::IndexMap;
use parking_lot::RwLock;
use sg_core::ViewProjection;

use crate::DataError;

pub use json_store::{JsonViewStore, StoreLocation};

/// Saved views by name, in save order
pub type SavedViews = IndexMap<String, ViewProjection>;

/// Storage for named views
///
/// Callers treat any error as "no saved views" and keep running.
pub trait ViewStore: Send + Sync {
    /// Load every saved view for `table_id`; a table never saved loads empty
    fn load(&self, table_id: &str) -> Result<SavedViews, DataError>;

    /// Replace the saved views for `table_id`
    fn save(&self, table_id: &str, views: &SavedViews) -> Result<(), DataError>;
}

/// Process-local view store
#[derive(Default)]
pub struct MemoryViewStore {
    tables: RwLock<AHashMap<String, SavedViews>>,
}

impl MemoryViewStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ViewStore for MemoryViewStore {
    fn load(&self, table_id: &str) -> Result<SavedViews, DataError> {
        Ok(self.tables.read().get(table_id).cloned().unwrap_or_default())
    }

    fn save(&self, table_id: &str, views: &SavedViews) -> Result<(), DataError> {
        self.tables.write().insert(table_id.to_string(), views.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_keyed_by_table() {
        let store = MemoryViewStore::new();
        let mut views = SavedViews::new();
        views.insert(
            "Slim".to_string(),
            ViewProjection::new("Slim", vec!["a".into()], vec!["b".into()]),
        );

        store.save("t1", &views).unwrap();
        assert_eq!(store.load("t1").unwrap().len(), 1);
        assert!(store.load("t2").unwrap().is_empty());
    }
}
