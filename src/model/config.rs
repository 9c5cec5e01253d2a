use serde::{Deserialize, Serialize};

/// Settings from `.revu/config.toml`. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewConfig {
    #[serde(default)]
    pub mentions: MentionConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub items: ItemConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// The @mention tokens that carry project dates on the metadata line.
/// Matched case-sensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MentionConfig {
    pub start: String,
    pub due: String,
    pub reviewed: String,
    pub completed: String,
    pub cancelled: String,
    pub review_interval: String,
    pub next_review: String,
}

impl Default for MentionConfig {
    fn default() -> Self {
        MentionConfig {
            start: "@start".to_string(),
            due: "@due".to_string(),
            reviewed: "@reviewed".to_string(),
            completed: "@completed".to_string(),
            cancelled: "@cancelled".to_string(),
            review_interval: "@review".to_string(),
            next_review: "@nextReview".to_string(),
        }
    }
}

/// Which notes count as projects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Project tags, in display order
    #[serde(default = "default_tags")]
    pub tags: Vec<String>,
    /// Only scan these folders (and their sub-folders). Takes priority over
    /// `exclude_folders`. `/` is the root folder.
    #[serde(default)]
    pub include_folders: Vec<String>,
    #[serde(default)]
    pub exclude_folders: Vec<String>,
    #[serde(default)]
    pub excluded_teamspaces: Vec<String>,
    /// Skip `@Trash`, `@Archive`, `@Templates` and other `@` folders unless
    /// they are listed in `include_folders`
    #[serde(default = "default_true")]
    pub ignore_special_folders: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            tags: default_tags(),
            include_folders: Vec::new(),
            exclude_folders: Vec::new(),
            excluded_teamspaces: Vec::new(),
            ignore_special_folders: true,
        }
    }
}

impl ScanConfig {
    /// Configured tags, each with a leading `#`
    pub fn normalized_tags(&self) -> Vec<String> {
        self.tags.iter().map(|t| normalize_tag(t)).collect()
    }
}

/// How open items are counted and which become next actions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemConfig {
    #[serde(default = "default_waiting_marker")]
    pub waiting_marker: String,
    /// Items scheduled further ahead than this many days are "future" items.
    /// When > 0 they don't count towards percent complete.
    #[serde(default)]
    pub look_ahead_days: i64,
    /// For each tag, the first open item carrying it becomes a next action
    #[serde(default)]
    pub next_action_tags: Vec<String>,
    /// Notes marked with this tag get their first open item as a next action.
    /// Empty disables.
    #[serde(default = "default_sequential_tag")]
    pub sequential_tag: String,
}

impl Default for ItemConfig {
    fn default() -> Self {
        ItemConfig {
            waiting_marker: default_waiting_marker(),
            look_ahead_days: 0,
            next_action_tags: Vec::new(),
            sequential_tag: default_sequential_tag(),
        }
    }
}

/// Sort key applied after the lifecycle keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayOrder {
    #[default]
    Review,
    Due,
    Title,
}

impl std::str::FromStr for DisplayOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "review" => Ok(DisplayOrder::Review),
            "due" => Ok(DisplayOrder::Due),
            "title" => Ok(DisplayOrder::Title),
            _ => Err(format!(
                "unknown display order '{}' (expected: review, due, title)",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub order: DisplayOrder,
    #[serde(default)]
    pub group_by_folder: bool,
    #[serde(default)]
    pub show_finished: bool,
    #[serde(default)]
    pub only_due: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Regenerate the project index when it is older than this
    #[serde(default = "default_max_age_minutes")]
    pub max_age_minutes: i64,
    /// Cache document name inside `.revu/`
    #[serde(default = "default_cache_file")]
    pub file: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            max_age_minutes: default_max_age_minutes(),
            file: default_cache_file(),
        }
    }
}

/// Prefix a tag with `#` if it lacks one
pub fn normalize_tag(tag: &str) -> String {
    let tag = tag.trim();
    if tag.starts_with('#') {
        tag.to_string()
    } else {
        format!("#{}", tag)
    }
}

fn default_tags() -> Vec<String> {
    vec!["#project".to_string(), "#area".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_waiting_marker() -> String {
    "#waiting".to_string()
}

fn default_sequential_tag() -> String {
    "#sequential".to_string()
}

fn default_max_age_minutes() -> i64 {
    60
}

fn default_cache_file() -> String {
    "projects.json".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config: ReviewConfig = toml::from_str("").unwrap();
        assert_eq!(config.scan.tags, vec!["#project", "#area"]);
        assert_eq!(config.mentions.reviewed, "@reviewed");
        assert_eq!(config.cache.max_age_minutes, 60);
        assert_eq!(config.display.order, DisplayOrder::Review);
        assert!(config.scan.ignore_special_folders);
        assert_eq!(config.items.sequential_tag, "#sequential");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: ReviewConfig = toml::from_str(
            r#"
[mentions]
reviewed = "@lastReview"

[display]
order = "due"
"#,
        )
        .unwrap();
        assert_eq!(config.mentions.reviewed, "@lastReview");
        assert_eq!(config.mentions.due, "@due");
        assert_eq!(config.display.order, DisplayOrder::Due);
        assert!(!config.display.show_finished);
    }

    #[test]
    fn tags_are_normalized() {
        let scan = ScanConfig {
            tags: vec!["project".into(), "#area".into()],
            ..Default::default()
        };
        assert_eq!(scan.normalized_tags(), vec!["#project", "#area"]);
    }
}
