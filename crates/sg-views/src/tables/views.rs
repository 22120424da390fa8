//! Saved and current column layouts

use std::sync::Arc;

use sg_core::consts::{CUSTOM_VIEW_NAME, DEFAULT_VIEW_NAME, MAX_VIEW_NAME_LEN};
use sg_core::{title_case, GridError, ValidationError, ViewProjection};
use sg_data::{SavedViews, ViewStore};
use tracing::{debug, info, warn};

/// The Default view, user-saved views and the current view of one table
///
/// The current view is either one of the known views (by layout) or a
/// transient layout named `Custom...`.
pub struct ViewRegistry {
    table_id: String,
    columns: Vec<String>,
    default_view: ViewProjection,
    saved: SavedViews,
    current: ViewProjection,
    store: Option<Arc<dyn ViewStore>>,
}

impl ViewRegistry {
    /// Registry with only the Default view
    pub fn new(table_id: impl Into<String>, columns: Vec<String>) -> Self {
        let default_view = ViewProjection::default_for(&columns);
        Self {
            table_id: table_id.into(),
            current: default_view.clone(),
            default_view,
            columns,
            saved: SavedViews::new(),
            store: None,
        }
    }

    /// Registry backed by a view store; unreadable or stale entries are dropped
    pub fn with_store(table_id: impl Into<String>, columns: Vec<String>, store: Arc<dyn ViewStore>) -> Self {
        let mut registry = Self::new(table_id, columns);
        match store.load(&registry.table_id) {
            Ok(views) => {
                for (name, mut view) in views {
                    if name.eq_ignore_ascii_case(DEFAULT_VIEW_NAME) {
                        warn!("Ignoring stored view that reuses the Default name");
                        continue;
                    }
                    if let Err(e) = view.validate(&registry.columns) {
                        warn!("Dropping saved view '{}': {}", name, e);
                        continue;
                    }
                    view.name = name.clone();
                    registry.saved.insert(name, view);
                }
                info!("Loaded {} saved views for {}", registry.saved.len(), registry.table_id);
            }
            Err(e) => warn!("Could not load saved views for {}: {}", registry.table_id, e),
        }
        registry.store = Some(store);
        registry
    }

    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    pub fn current(&self) -> &ViewProjection {
        &self.current
    }

    pub fn default_view(&self) -> &ViewProjection {
        &self.default_view
    }

    pub fn saved(&self) -> &SavedViews {
        &self.saved
    }

    /// Whether the current layout is not one of the known views
    pub fn is_custom(&self) -> bool {
        self.current.name == CUSTOM_VIEW_NAME
    }

    /// Known view names: Default first, then saved views in save order
    pub fn names(&self) -> Vec<String> {
        std::iter::once(self.default_view.name.clone())
            .chain(self.saved.keys().cloned())
            .collect()
    }

    /// Look up a known view by name, ignoring case
    pub fn get(&self, name: &str) -> Option<&ViewProjection> {
        self.known_views().find(|v| v.name.eq_ignore_ascii_case(name))
    }

    fn known_views(&self) -> impl Iterator<Item = &ViewProjection> {
        std::iter::once(&self.default_view).chain(self.saved.values())
    }

    /// Make `projection` current; returns whether the current view changed
    ///
    /// A layout equal to a known view takes that view's identity, anything
    /// else becomes `Custom...`.
    pub fn set_current(&mut self, projection: ViewProjection) -> Result<bool, GridError> {
        projection.validate(&self.columns)?;
        let next = match self.known_views().find(|v| **v == projection) {
            Some(known) => known.clone(),
            None => ViewProjection {
                name: CUSTOM_VIEW_NAME.to_string(),
                ..projection
            },
        };
        if next == self.current && next.name == self.current.name {
            return Ok(false);
        }
        debug!("Current view of {} is now '{}'", self.table_id, next.name);
        self.current = next;
        Ok(true)
    }

    /// Switch to a known view by name
    pub fn select(&mut self, name: &str) -> Result<bool, ValidationError> {
        let view = self
            .get(name)
            .cloned()
            .ok_or_else(|| ValidationError::NoSuchView(name.to_string()))?;
        if view == self.current && view.name == self.current.name {
            return Ok(false);
        }
        self.current = view;
        Ok(true)
    }

    /// Save the current custom layout under `name` and make it current
    ///
    /// The name is trimmed and title-cased; the stored name is returned.
    pub fn save_current(&mut self, name: &str) -> Result<String, ValidationError> {
        if !self.is_custom() {
            return Err(ValidationError::ViewAlreadySaved);
        }
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::BlankViewName);
        }
        if trimmed.chars().count() > MAX_VIEW_NAME_LEN {
            return Err(ValidationError::ViewNameTooLong);
        }
        let name = title_case(trimmed);
        let lowered = name.to_lowercase();
        // Custom... is the unsaved layout, never a stored name
        let reserved = lowered == CUSTOM_VIEW_NAME.to_lowercase();
        if reserved || self.names().iter().any(|n| n.to_lowercase() == lowered) {
            return Err(ValidationError::DuplicateViewName);
        }

        let view = ViewProjection::new(
            name.clone(),
            self.current.column_order.clone(),
            self.current.hidden_cols.clone(),
        );
        self.saved.insert(name.clone(), view.clone());
        self.current = view;
        self.persist();
        info!("Saved view '{}' for {}", name, self.table_id);
        Ok(name)
    }

    /// Delete a saved view; the current layout survives as `Custom...`
    pub fn delete(&mut self, name: &str) -> Result<(), ValidationError> {
        if name.trim().eq_ignore_ascii_case(DEFAULT_VIEW_NAME) {
            return Err(ValidationError::DefaultViewReserved);
        }
        let key = self
            .saved
            .keys()
            .find(|k| k.eq_ignore_ascii_case(name.trim()))
            .cloned()
            .ok_or_else(|| ValidationError::NoSuchView(name.to_string()))?;
        self.saved.shift_remove(&key);
        if self.current.name == key {
            self.current.name = CUSTOM_VIEW_NAME.to_string();
        }
        self.persist();
        info!("Deleted view '{}' for {}", key, self.table_id);
        Ok(())
    }

    fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(e) = store.save(&self.table_id, &self.saved) {
            warn!("Could not persist saved views for {}: {}", self.table_id, e);
        }
    }
}

/// Working copy of a layout while the user customises it
///
/// Hidden columns are kept in alphabetical order; shown columns go to the end.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewEditor {
    visible: Vec<String>,
    hidden: Vec<String>,
}

impl ViewEditor {
    pub fn from_view(view: &ViewProjection) -> Self {
        let mut hidden = view.hidden_cols.clone();
        hidden.sort();
        Self {
            visible: view.column_order.clone(),
            hidden,
        }
    }

    pub fn visible(&self) -> &[String] {
        &self.visible
    }

    pub fn hidden(&self) -> &[String] {
        &self.hidden
    }

    pub fn hide(&mut self, column: &str) -> bool {
        let Some(pos) = self.visible.iter().position(|c| c == column) else {
            return false;
        };
        let column = self.visible.remove(pos);
        let at = self.hidden.partition_point(|c| *c < column);
        self.hidden.insert(at, column);
        true
    }

    pub fn show(&mut self, column: &str) -> bool {
        let Some(pos) = self.hidden.iter().position(|c| c == column) else {
            return false;
        };
        let column = self.hidden.remove(pos);
        self.visible.push(column);
        true
    }

    pub fn move_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.visible.len() {
            return false;
        }
        self.visible.swap(index, index - 1);
        true
    }

    pub fn move_down(&mut self, index: usize) -> bool {
        if index + 1 >= self.visible.len() {
            return false;
        }
        self.visible.swap(index, index + 1);
        true
    }

    /// Move the visible column at `from` so it ends up at `to`
    pub fn move_to(&mut self, from: usize, to: usize) -> bool {
        if from >= self.visible.len() || from == to {
            return false;
        }
        let column = self.visible.remove(from);
        let to = to.min(self.visible.len());
        self.visible.insert(to, column);
        true
    }

    /// The edited layout, not yet matched against known views
    pub fn build(&self) -> ViewProjection {
        ViewProjection::new(CUSTOM_VIEW_NAME, self.visible.clone(), self.hidden.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_data::MemoryViewStore;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn registry() -> ViewRegistry {
        ViewRegistry::new("t", cols(&["a", "b", "c"]))
    }

    #[test]
    fn test_custom_layout_and_snap_back() {
        let mut views = registry();
        let hidden = views.current().with_hidden("b");
        assert!(views.set_current(hidden).unwrap());
        assert!(views.is_custom());

        let restored = ViewProjection::new("whatever", cols(&["a", "b", "c"]), vec![]);
        assert!(views.set_current(restored).unwrap());
        assert_eq!(views.current().name, DEFAULT_VIEW_NAME);
        assert!(!views.is_custom());
    }

    #[test]
    fn test_invalid_projection_rejected() {
        let mut views = registry();
        let bad = ViewProjection::new("x", cols(&["a", "b"]), cols(&["b", "c"]));
        assert!(matches!(views.set_current(bad), Err(GridError::InvalidProjection(_))));
        assert_eq!(views.current().name, DEFAULT_VIEW_NAME);
    }

    #[test]
    fn test_save_validation() {
        let mut views = registry();
        assert_eq!(views.save_current("slim"), Err(ValidationError::ViewAlreadySaved));

        views.set_current(views.current().with_hidden("c")).unwrap();
        assert_eq!(views.save_current("   "), Err(ValidationError::BlankViewName));
        assert_eq!(views.save_current("default"), Err(ValidationError::DuplicateViewName));
        assert_eq!(views.save_current("custom..."), Err(ValidationError::DuplicateViewName));
        assert!(views.is_custom());
        assert_eq!(views.names(), cols(&["Default"]));
        assert_eq!(views.save_current("a very long view name"), Err(ValidationError::ViewNameTooLong));
        assert_eq!(views.save_current("  my slim view "), Ok("My Slim View".to_string()));
        assert_eq!(views.current().name, "My Slim View");

        views.set_current(views.current().with_hidden("a")).unwrap();
        assert_eq!(views.save_current("MY SLIM VIEW"), Err(ValidationError::DuplicateViewName));
    }

    #[test]
    fn test_delete_rules() {
        let mut views = registry();
        assert_eq!(views.delete("Default"), Err(ValidationError::DefaultViewReserved));
        assert!(matches!(views.delete("ghost"), Err(ValidationError::NoSuchView(_))));

        views.set_current(views.current().with_hidden("c")).unwrap();
        views.save_current("slim").unwrap();
        views.delete("SLIM").unwrap();
        assert!(views.is_custom());
        assert_eq!(views.names(), cols(&["Default"]));
    }

    #[test]
    fn test_store_round_trip_drops_stale_views() {
        let store: Arc<dyn ViewStore> = Arc::new(MemoryViewStore::new());
        {
            let mut views = ViewRegistry::with_store("t", cols(&["a", "b", "c"]), store.clone());
            views.set_current(views.current().with_hidden("c")).unwrap();
            views.save_current("slim").unwrap();
        }
        let reopened = ViewRegistry::with_store("t", cols(&["a", "b", "c"]), store.clone());
        assert_eq!(reopened.names(), cols(&["Default", "Slim"]));

        let reshaped = ViewRegistry::with_store("t", cols(&["a", "b", "c", "d"]), store);
        assert_eq!(reshaped.names(), cols(&["Default"]));
    }

    #[test]
    fn test_view_editor() {
        let view = ViewProjection::default_for(&cols(&["d", "a", "c", "b"]));
        let mut editor = ViewEditor::from_view(&view);
        assert!(editor.hide("d"));
        assert!(editor.hide("b"));
        assert_eq!(editor.hidden(), cols(&["b", "d"]).as_slice());

        assert!(editor.show("d"));
        assert_eq!(editor.visible(), cols(&["a", "c", "d"]).as_slice());

        assert!(editor.move_up(2));
        assert!(!editor.move_up(0));
        assert!(editor.move_down(0));
        assert_eq!(editor.visible(), cols(&["d", "a", "c"]).as_slice());
        assert!(editor.move_to(0, 2));
        assert_eq!(editor.visible(), cols(&["a", "c", "d"]).as_slice());

        let built = editor.build();
        assert!(built.validate(&cols(&["a", "b", "c", "d"])).is_ok());
        assert_eq!(built.name, CUSTOM_VIEW_NAME);
    }
}
