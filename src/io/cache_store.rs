use std::fs;
use std::path::{Path, PathBuf};

use crate::io::atomic::atomic_write;
use crate::io::error::StoreError;
use crate::io::lock::IndexLock;
use crate::model::project::Project;

/// Persistence for the serialized project index
pub trait CacheStore {
    /// The stored document, or `None` when there is none
    fn load_all(&self) -> Result<Option<Vec<Project>>, StoreError>;
    fn replace_all(&mut self, projects: &[Project]) -> Result<(), StoreError>;
    fn exists(&self) -> bool;

    /// Replace the entry with the same filename, or append it
    fn upsert_one(&mut self, project: &Project) -> Result<(), StoreError> {
        let mut projects = self.load_all()?.unwrap_or_default();
        match projects.iter_mut().find(|p| p.filename == project.filename) {
            Some(slot) => *slot = project.clone(),
            None => projects.push(project.clone()),
        }
        self.replace_all(&projects)
    }
}

/// The index as a pretty-printed JSON array in the state directory
pub struct JsonCacheStore {
    path: PathBuf,
}

impl JsonCacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonCacheStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn state_dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("."))
    }
}

impl CacheStore for JsonCacheStore {
    fn load_all(&self) -> Result<Option<Vec<Project>>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path).map_err(|e| StoreError::Read {
            path: self.path.clone(),
            source: e,
        })?;
        match serde_json::from_str::<Vec<Project>>(&text) {
            Ok(projects) => Ok(Some(projects)),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "ignoring unreadable project index: {}",
                    e
                );
                Ok(None)
            }
        }
    }

    fn replace_all(&mut self, projects: &[Project]) -> Result<(), StoreError> {
        let dir = self.state_dir().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| StoreError::Write {
            path: dir.clone(),
            source: e,
        })?;
        let mut json = serde_json::to_string_pretty(projects)?;
        json.push('\n');

        let _lock = IndexLock::acquire_default(&self.path)?;
        atomic_write(&self.path, json.as_bytes()).map_err(|e| StoreError::Write {
            path: self.path.clone(),
            source: e,
        })?;
        tracing::debug!(count = projects.len(), path = %self.path.display(), "project index written");
        Ok(())
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }
}

/// In-memory store, used by tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    pub projects: Option<Vec<Project>>,
    pub writes: usize,
}

impl CacheStore for MemoryCacheStore {
    fn load_all(&self) -> Result<Option<Vec<Project>>, StoreError> {
        Ok(self.projects.clone())
    }

    fn replace_all(&mut self, projects: &[Project]) -> Result<(), StoreError> {
        self.projects = Some(projects.to_vec());
        self.writes += 1;
        Ok(())
    }

    fn exists(&self) -> bool {
        self.projects.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::lock::LOCK_FILE;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn project(filename: &str) -> Project {
        Project::new(filename.into(), filename.trim_end_matches(".md").into(), "/".into())
    }

    #[test]
    fn missing_document_loads_as_none() {
        let tmp = TempDir::new().unwrap();
        let store = JsonCacheStore::new(tmp.path().join(".revu/projects.json"));
        assert!(!store.exists());
        assert!(store.load_all().unwrap().is_none());
    }

    #[test]
    fn replace_then_load() {
        let tmp = TempDir::new().unwrap();
        let mut store = JsonCacheStore::new(tmp.path().join(".revu/projects.json"));
        let mut a = project("a.md");
        a.reviewed_date = NaiveDate::from_ymd_opt(2025, 1, 2);
        store.replace_all(&[a.clone(), project("b.md")]).unwrap();

        assert!(store.exists());
        let loaded = store.load_all().unwrap().unwrap();
        assert_eq!(loaded, vec![a, project("b.md")]);

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"reviewed_date\": \"2025-01-02\""));
        assert!(!raw.contains("icon"));
        assert!(tmp.path().join(".revu").join(LOCK_FILE).is_file());
    }

    #[test]
    fn corrupt_document_loads_as_none() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("projects.json");
        fs::write(&path, "{ not json").unwrap();
        let store = JsonCacheStore::new(&path);
        assert!(store.load_all().unwrap().is_none());
    }

    #[test]
    fn upsert_replaces_in_place_or_appends() {
        let mut store = MemoryCacheStore::default();
        store.replace_all(&[project("a.md"), project("b.md")]).unwrap();

        let mut b = project("b.md");
        b.title = "Renamed".into();
        store.upsert_one(&b).unwrap();
        store.upsert_one(&project("c.md")).unwrap();

        let titles: Vec<String> = store
            .load_all()
            .unwrap()
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["a", "Renamed", "c"]);
    }
}
