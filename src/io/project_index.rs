use chrono::{DateTime, Duration, Local, NaiveDate, Utc};

use crate::io::cache_store::CacheStore;
use crate::io::error::StoreError;
use crate::io::note_store::NoteStore;
use crate::io::prefs::Preferences;
use crate::model::config::{ReviewConfig, ScanConfig};
use crate::model::note::{NoteRef, ROOT_FOLDER};
use crate::model::project::Project;
use crate::ops::project_ops::build_project;
use crate::ops::review_dates::recompute;

/// Preference key holding the RFC 3339 time of the last full regeneration
pub const GENERATED_AT_KEY: &str = "project_list_generated_at";

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The persisted list of project summaries, kept in a cache store and
/// rebuilt from the note store when stale.
pub struct ProjectIndex<'a> {
    notes: &'a dyn NoteStore,
    cache: &'a mut dyn CacheStore,
    prefs: &'a mut dyn Preferences,
    config: &'a ReviewConfig,
    now: DateTime<Local>,
}

impl<'a> ProjectIndex<'a> {
    pub fn new(
        notes: &'a dyn NoteStore,
        cache: &'a mut dyn CacheStore,
        prefs: &'a mut dyn Preferences,
        config: &'a ReviewConfig,
    ) -> Self {
        ProjectIndex {
            notes,
            cache,
            prefs,
            config,
            now: Local::now(),
        }
    }

    /// Pin the clock
    pub fn at(mut self, now: DateTime<Local>) -> Self {
        self.now = now;
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    /// When the index was last fully regenerated, if known
    pub fn generated_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.prefs.get(GENERATED_AT_KEY)?;
        DateTime::parse_from_rfc3339(raw.trim())
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// True when there is no cache document, no readable generation time, or
    /// the document is older than the configured maximum age
    pub fn should_regenerate(&self) -> bool {
        if !self.cache.exists() {
            return true;
        }
        let Some(generated) = self.generated_at() else {
            return true;
        };
        let age = self.now.with_timezone(&Utc) - generated;
        age > Duration::minutes(self.config.cache.max_age_minutes)
    }

    /// Rebuild every project from the note store and persist the result
    pub fn regenerate_all(&mut self) -> Result<Vec<Project>, IndexError> {
        let refs: Vec<NoteRef> = self
            .notes
            .list_notes()?
            .into_iter()
            .filter(|r| in_scope(r, &self.config.scan))
            .collect();

        let mut projects = Vec::new();
        for tag in self.config.scan.normalized_tags() {
            for note_ref in refs.iter().filter(|r| r.hashtags.contains(&tag)) {
                if let Some(project) = self.build(&note_ref.filename, &tag) {
                    projects.push(project);
                }
            }
        }

        self.cache.replace_all(&projects)?;
        self.prefs
            .set(GENERATED_AT_KEY, &self.now.to_rfc3339())?;
        tracing::info!(count = projects.len(), "regenerated project index");
        Ok(projects)
    }

    /// All projects, with review fields brought up to date. Regenerates first
    /// when the index is stale.
    pub fn read_all(&mut self) -> Result<Vec<Project>, IndexError> {
        if self.should_regenerate() {
            tracing::debug!("project index is stale or missing");
            return self.regenerate_all();
        }
        let Some(projects) = self.cache.load_all()? else {
            return self.regenerate_all();
        };
        let today = self.today();
        Ok(projects.iter().map(|p| recompute(p, today)).collect())
    }

    /// Replace the entries for `filename`. With `refresh` the note is
    /// re-read and its projects appended; without, the entries are dropped.
    /// Falls back to a full regeneration when the file isn't indexed.
    pub fn update_one(&mut self, filename: &str, refresh: bool) -> Result<Vec<Project>, IndexError> {
        let Some(mut projects) = self.cache.load_all()? else {
            tracing::warn!(file = filename, "no project index to update; regenerating");
            return self.regenerate_all();
        };
        if !projects.iter().any(|p| p.filename == filename) {
            tracing::warn!(file = filename, "not in project index; regenerating");
            return self.regenerate_all();
        }

        projects.retain(|p| p.filename != filename);
        if refresh {
            projects.extend(self.rebuild_note(filename));
        }

        self.cache.replace_all(&projects)?;
        Ok(projects)
    }

    /// Drop the entries for `filename`. Returns whether anything was removed.
    pub fn delete_one(&mut self, filename: &str) -> Result<bool, IndexError> {
        let Some(mut projects) = self.cache.load_all()? else {
            return Ok(false);
        };
        let before = projects.len();
        projects.retain(|p| p.filename != filename);
        if projects.len() == before {
            return Ok(false);
        }
        self.cache.replace_all(&projects)?;
        Ok(true)
    }

    /// Projects for one note, one per configured tag it carries
    fn rebuild_note(&self, filename: &str) -> Vec<Project> {
        let note = match self.notes.read_note(filename) {
            Ok(note) => note,
            Err(e) => {
                tracing::warn!(file = filename, "dropping from index: {}", e);
                return Vec::new();
            }
        };
        if !in_scope(&note.to_ref(), &self.config.scan) {
            return Vec::new();
        }
        let today = self.today();
        self.config
            .scan
            .normalized_tags()
            .iter()
            .filter(|tag| note.has_hashtag(tag))
            .filter_map(|tag| match build_project(&note, Some(tag.as_str()), self.config, today) {
                Ok(p) => Some(p),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", filename, e);
                    None
                }
            })
            .collect()
    }

    fn build(&self, filename: &str, tag: &str) -> Option<Project> {
        let note = match self.notes.read_note(filename) {
            Ok(note) => note,
            Err(e) => {
                tracing::warn!("skipping {}: {}", filename, e);
                return None;
            }
        };
        match build_project(&note, Some(tag), self.config, self.today()) {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!("skipping {}: {}", filename, e);
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Folder and teamspace filters
// ---------------------------------------------------------------------------

/// Whether a note passes the folder and teamspace filters. Include rules take
/// priority over exclude rules.
pub fn in_scope(note: &NoteRef, scan: &ScanConfig) -> bool {
    if let Some(team) = &note.teamspace
        && scan.excluded_teamspaces.iter().any(|t| t == team)
    {
        return false;
    }
    if !scan.include_folders.is_empty() {
        return scan
            .include_folders
            .iter()
            .any(|rule| folder_matches(&note.folder, rule));
    }
    if scan.ignore_special_folders && is_special_folder(&note.folder) {
        return false;
    }
    !scan
        .exclude_folders
        .iter()
        .any(|rule| folder_matches(&note.folder, rule))
}

/// A rule matches its folder and every sub-folder. `/` only matches notes
/// directly in the root.
pub fn folder_matches(folder: &str, rule: &str) -> bool {
    let rule = rule.trim();
    if rule == ROOT_FOLDER || rule.is_empty() {
        return folder == ROOT_FOLDER;
    }
    let rule = rule.trim_matches('/');
    folder == rule
        || folder
            .strip_prefix(rule)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// `@Archive`, `@Trash/old` and the like
fn is_special_folder(folder: &str) -> bool {
    folder.split('/').any(|part| part.starts_with('@'))
}
