use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::io::atomic::atomic_write;
use crate::io::error::StoreError;

/// Small key/value preference store
pub trait Preferences {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Preferences kept in a TOML file. Edits go through `toml_edit`, so
/// comments and unrelated keys survive.
pub struct TomlPreferences {
    path: PathBuf,
    doc: toml_edit::DocumentMut,
}

impl TomlPreferences {
    /// Load preferences from `path`; a missing file is an empty document
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let doc = if path.exists() {
            let text = fs::read_to_string(&path).map_err(|e| StoreError::Read {
                path: path.clone(),
                source: e,
            })?;
            text.parse::<toml_edit::DocumentMut>()?
        } else {
            toml_edit::DocumentMut::new()
        };
        Ok(TomlPreferences { path, doc })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Preferences for TomlPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.doc.get(key)?.as_str().map(str::to_string)
    }

    /// The in-memory document only changes once the file is written
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut doc = self.doc.clone();
        doc[key] = toml_edit::value(value);
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| StoreError::Write {
                path: dir.to_path_buf(),
                source: e,
            })?;
        }
        atomic_write(&self.path, doc.to_string().as_bytes()).map_err(|e| StoreError::Write {
            path: self.path.clone(),
            source: e,
        })?;
        self.doc = doc;
        Ok(())
    }
}

/// Preferences held in memory
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: HashMap<String, String>,
}

impl Preferences for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let prefs = TomlPreferences::load(tmp.path().join("prefs.toml")).unwrap();
        assert_eq!(prefs.get("anything"), None);
    }

    #[test]
    fn set_persists_and_keeps_comments() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("prefs.toml");
        fs::write(&path, "# hand-written note\nother = \"kept\"\n").unwrap();

        let mut prefs = TomlPreferences::load(&path).unwrap();
        prefs.set("project_list_generated_at", "2025-01-10T09:00:00+00:00").unwrap();

        let reloaded = TomlPreferences::load(&path).unwrap();
        assert_eq!(
            reloaded.get("project_list_generated_at").as_deref(),
            Some("2025-01-10T09:00:00+00:00")
        );
        assert_eq!(reloaded.get("other").as_deref(), Some("kept"));
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# hand-written note\n"));
    }

    #[test]
    fn failed_write_keeps_previous_value() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("state");
        fs::write(&blocker, "not a directory").unwrap();
        let path = blocker.join("prefs.toml");

        let mut prefs = TomlPreferences::load(&path).unwrap();
        assert!(matches!(prefs.set("key", "new"), Err(StoreError::Write { .. })));
        assert_eq!(prefs.get("key"), None);
    }

    #[test]
    fn non_string_values_read_as_absent() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("prefs.toml");
        fs::write(&path, "count = 3\n").unwrap();
        let prefs = TomlPreferences::load(&path).unwrap();
        assert_eq!(prefs.get("count"), None);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("prefs.toml");
        fs::write(&path, "not = = toml").unwrap();
        assert!(matches!(TomlPreferences::load(&path), Err(StoreError::Prefs(_))));
    }
}
