use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::ReviewConfig;

/// State directory at the root of a notes tree
pub const STATE_DIR: &str = ".revu";
pub const CONFIG_FILE: &str = "config.toml";
pub const PREFS_FILE: &str = "prefs.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("not a revu notes directory: no .revu/ directory found (run `revu init`)")]
    NotInitialized,
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub fn state_dir(root: &Path) -> PathBuf {
    root.join(STATE_DIR)
}

/// Walk up from `start` looking for a directory containing `.revu/`
pub fn discover_notes_root(start: &Path) -> Result<PathBuf, ConfigError> {
    let mut current = start.to_path_buf();
    loop {
        if state_dir(&current).is_dir() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(ConfigError::NotInitialized);
        }
    }
}

/// Load `.revu/config.toml`. A missing file gives the defaults.
pub fn load_config(root: &Path) -> Result<ReviewConfig, ConfigError> {
    let path = state_dir(root).join(CONFIG_FILE);
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(ReviewConfig::default());
    }
    let text = fs::read_to_string(&path).map_err(|e| ConfigError::Read {
        path: path.clone(),
        source: e,
    })?;
    toml::from_str(&text).map_err(|e| ConfigError::Parse { path, source: e })
}

/// Commented starter config written by `revu init`
pub const CONFIG_TEMPLATE: &str = r##"# revu configuration. Every key is optional; the values shown are defaults.

[scan]
# Notes carrying one of these hashtags are projects. Order sets list order.
tags = ["#project", "#area"]
# Only scan these folders (and sub-folders). "/" is the notes root.
# include_folders = []
# exclude_folders = []
# excluded_teamspaces = []
# Skip @Archive, @Templates, @Trash and other @ folders unless included
# ignore_special_folders = true

[items]
# waiting_marker = "#waiting"
# Items scheduled further ahead than this are "future" and don't count
# towards percent complete when > 0.
# look_ahead_days = 0
# next_action_tags = ["#na"]
# sequential_tag = "#sequential"

[display]
# order = "review"        # "review", "due" or "title"
# group_by_folder = false
# show_finished = false
# only_due = false

[cache]
# max_age_minutes = 60

# [mentions]
# start = "@start"
# due = "@due"
# reviewed = "@reviewed"
# completed = "@completed"
# cancelled = "@cancelled"
# review_interval = "@review"
# next_review = "@nextReview"
"##;

/// Create `.revu/` and write the starter config unless one is present
pub fn init_state_dir(root: &Path) -> Result<PathBuf, ConfigError> {
    let dir = state_dir(root);
    fs::create_dir_all(&dir)?;
    let config_path = dir.join(CONFIG_FILE);
    if !config_path.exists() {
        fs::write(&config_path, CONFIG_TEMPLATE)?;
    }
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::DisplayOrder;
    use tempfile::TempDir;

    #[test]
    fn missing_config_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.scan.tags, vec!["#project", "#area"]);
    }

    #[test]
    fn template_parses_to_defaults() {
        let config: ReviewConfig = toml::from_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.scan.tags, vec!["#project", "#area"]);
        assert_eq!(config.display.order, DisplayOrder::Review);
        assert_eq!(config.cache.max_age_minutes, 60);
    }

    #[test]
    fn init_then_discover_from_subfolder() {
        let tmp = TempDir::new().unwrap();
        init_state_dir(tmp.path()).unwrap();
        assert!(tmp.path().join(".revu/config.toml").exists());

        let sub = tmp.path().join("Work/Clients");
        fs::create_dir_all(&sub).unwrap();
        let root = discover_notes_root(&sub).unwrap();
        assert_eq!(root, tmp.path());
    }

    #[test]
    fn invalid_config_reports_path() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(state_dir(tmp.path())).unwrap();
        fs::write(state_dir(tmp.path()).join(CONFIG_FILE), "[display]\norder = \"sideways\"\n")
            .unwrap();
        let err = load_config(tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }
}
