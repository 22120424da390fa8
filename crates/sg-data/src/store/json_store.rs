//! Saved views as one JSON file per table

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{SavedViews, ViewStore};
use crate::DataError;

/// Environment variable that overrides the store directory
pub const DATA_DIR_ENV: &str = "SMARTGRID_DATA_DIR";

/// Where saved views live on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreLocation {
    pub company: String,
    pub app_name: String,
    pub data_folder: String,
}

impl Default for StoreLocation {
    fn default() -> Self {
        Self {
            company: "SmartGrid".to_string(),
            app_name: "smartgrid".to_string(),
            data_folder: "Smart_Table".to_string(),
        }
    }
}

impl StoreLocation {
    /// Resolve the directory, honouring `SMARTGRID_DATA_DIR`
    pub fn resolve(&self) -> PathBuf {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
            return PathBuf::from(dir);
        }
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(&self.company)
            .join(&self.app_name)
            .join(&self.data_folder)
    }
}

/// One JSON file of saved views per table
pub struct JsonViewStore {
    dir: PathBuf,
}

impl JsonViewStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_location(location: &StoreLocation) -> Self {
        Self::new(location.resolve())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the views of `table_id`
    pub fn path_for(&self, table_id: &str) -> PathBuf {
        let file: String = table_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}_views.json", file))
    }
}

impl ViewStore for JsonViewStore {
    fn load(&self, table_id: &str) -> Result<SavedViews, DataError> {
        let path = self.path_for(table_id);
        if !path.exists() {
            return Ok(SavedViews::new());
        }
        let text = fs::read_to_string(&path)?;
        let views: SavedViews = serde_json::from_str(&text)?;
        debug!("Loaded {} saved views from {}", views.len(), path.display());
        Ok(views)
    }

    fn save(&self, table_id: &str, views: &SavedViews) -> Result<(), DataError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(table_id);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(views)?)?;
        fs::rename(&tmp, &path)?;
        debug!("Saved {} views to {}", views.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_core::ViewProjection;

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonViewStore::new(dir.path().join("views"));

        let mut views = SavedViews::new();
        views.insert(
            "Slim".to_string(),
            ViewProjection::new("Slim", vec!["b".into(), "a".into()], vec!["c".into()]),
        );
        store.save("Table_1", &views).unwrap();

        let loaded = store.load("Table_1").unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["Slim"].column_order, vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonViewStore::new(dir.path());
        assert!(store.load("never saved").unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonViewStore::new(dir.path());
        fs::write(store.path_for("t"), "{ not json").unwrap();
        assert!(matches!(store.load("t"), Err(DataError::Json(_))));
    }

    #[test]
    fn test_table_ids_are_sanitised() {
        let store = JsonViewStore::new("/tmp/x");
        let path = store.path_for("a/b c");
        assert_eq!(path.file_name().unwrap().to_str().unwrap(), "a_b_c_views.json");
    }
}
