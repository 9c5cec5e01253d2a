use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::dates::iso_date;

/// Review interval used when a note doesn't declare one
pub const DEFAULT_REVIEW_INTERVAL: &str = "1w";

static NEXT_PROJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique token for addressing a project in a UI. Never persisted.
pub fn next_project_id() -> u64 {
    NEXT_PROJECT_ID.fetch_add(1, Ordering::Relaxed)
}

fn default_review_interval() -> String {
    DEFAULT_REVIEW_INTERVAL.to_string()
}

/// Lifecycle state derived from the flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectState {
    Active,
    Paused,
    Completed,
    Cancelled,
}

impl ProjectState {
    /// Marker shown inside `[ ]` in listings
    pub fn marker(self) -> char {
        match self {
            ProjectState::Active => ' ',
            ProjectState::Paused => '~',
            ProjectState::Completed => 'x',
            ProjectState::Cancelled => '-',
        }
    }
}

impl std::fmt::Display for ProjectState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectState::Active => write!(f, "active"),
            ProjectState::Paused => write!(f, "paused"),
            ProjectState::Completed => write!(f, "completed"),
            ProjectState::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A note tracked for periodic review, as stored in the project index.
///
/// Undefined numerics (no due date, not reviewable, no items) are `None` and
/// are left out of the serialized form, as are empty optional strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Ephemeral UI handle
    #[serde(skip, default = "next_project_id")]
    pub id: u64,

    // --- Identity ---
    pub filename: String,
    pub title: String,
    pub folder: String,
    /// Classifying hashtag, e.g. `#project`
    #[serde(default)]
    pub project_tag: String,

    // --- Dates ---
    #[serde(default, with = "iso_date", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, with = "iso_date", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, with = "iso_date", skip_serializing_if = "Option::is_none")]
    pub reviewed_date: Option<NaiveDate>,
    #[serde(default, with = "iso_date", skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<NaiveDate>,
    #[serde(default, with = "iso_date", skip_serializing_if = "Option::is_none")]
    pub cancelled_date: Option<NaiveDate>,

    // --- Review cadence ---
    #[serde(default = "default_review_interval")]
    pub review_interval: String,
    /// Explicit next review date set on the note (`@nextReview(...)`)
    #[serde(default, with = "iso_date", skip_serializing_if = "Option::is_none")]
    pub next_review_override: Option<NaiveDate>,
    #[serde(default, with = "iso_date", skip_serializing_if = "Option::is_none")]
    pub next_review_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_review_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_days: Option<i64>,

    // --- Progress ---
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent_complete: Option<u8>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_progress_comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub most_recent_progress_line_index: Option<usize>,

    // --- Counts ---
    #[serde(default)]
    pub num_open_items: usize,
    #[serde(default)]
    pub num_completed_items: usize,
    #[serde(default)]
    pub num_waiting_items: usize,
    #[serde(default)]
    pub num_future_items: usize,
    #[serde(default)]
    pub num_total_items: usize,

    // --- Lifecycle ---
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub is_cancelled: bool,
    #[serde(default)]
    pub is_paused: bool,

    // --- Presentation ---
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_color: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub next_actions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_duration: Option<String>,
}

impl Project {
    /// A blank active project for the given note filename
    pub fn new(filename: String, title: String, folder: String) -> Self {
        Project {
            id: next_project_id(),
            filename,
            title,
            folder,
            project_tag: String::new(),
            start_date: None,
            due_date: None,
            reviewed_date: None,
            completed_date: None,
            cancelled_date: None,
            review_interval: default_review_interval(),
            next_review_override: None,
            next_review_date: None,
            next_review_days: None,
            due_days: None,
            percent_complete: None,
            last_progress_comment: String::new(),
            most_recent_progress_line_index: None,
            num_open_items: 0,
            num_completed_items: 0,
            num_waiting_items: 0,
            num_future_items: 0,
            num_total_items: 0,
            is_completed: false,
            is_cancelled: false,
            is_paused: false,
            icon: None,
            icon_color: None,
            next_actions: Vec::new(),
            completed_duration: None,
            cancelled_duration: None,
        }
    }

    /// Completed or cancelled
    pub fn is_finished(&self) -> bool {
        self.is_completed || self.is_cancelled
    }

    pub fn state(&self) -> ProjectState {
        if self.is_cancelled {
            ProjectState::Cancelled
        } else if self.is_completed {
            ProjectState::Completed
        } else if self.is_paused {
            ProjectState::Paused
        } else {
            ProjectState::Active
        }
    }

    /// Active, unpaused, and its next review date is today or earlier
    pub fn is_ready_for_review(&self) -> bool {
        !self.is_paused
            && !self.is_finished()
            && self.next_review_days.is_some_and(|days| days <= 0)
    }
}

impl PartialEq for Project {
    fn eq(&self, other: &Self) -> bool {
        self.filename == other.filename
            && self.title == other.title
            && self.folder == other.folder
            && self.project_tag == other.project_tag
            && self.start_date == other.start_date
            && self.due_date == other.due_date
            && self.reviewed_date == other.reviewed_date
            && self.completed_date == other.completed_date
            && self.cancelled_date == other.cancelled_date
            && self.review_interval == other.review_interval
            && self.next_review_override == other.next_review_override
            && self.next_review_date == other.next_review_date
            && self.next_review_days == other.next_review_days
            && self.due_days == other.due_days
            && self.percent_complete == other.percent_complete
            && self.last_progress_comment == other.last_progress_comment
            && self.most_recent_progress_line_index == other.most_recent_progress_line_index
            && self.num_open_items == other.num_open_items
            && self.num_completed_items == other.num_completed_items
            && self.num_waiting_items == other.num_waiting_items
            && self.num_future_items == other.num_future_items
            && self.num_total_items == other.num_total_items
            && self.is_completed == other.is_completed
            && self.is_cancelled == other.is_cancelled
            && self.is_paused == other.is_paused
            && self.icon == other.icon
            && self.icon_color == other.icon_color
            && self.next_actions == other.next_actions
            && self.completed_duration == other.completed_duration
            && self.cancelled_duration == other.cancelled_duration
    }
}

impl Eq for Project {}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Project {
        Project::new("Work/alpha.md".into(), "Alpha".into(), "Work".into())
    }

    #[test]
    fn ids_are_unique() {
        let a = sample();
        let b = sample();
        assert_ne!(a.id, b.id);
        // id is not part of equality
        assert_eq!(a, b);
    }

    #[test]
    fn finished_and_paused_projects_are_never_ready() {
        let mut p = sample();
        p.next_review_days = Some(-3);
        assert!(p.is_ready_for_review());

        for flag in 0..3 {
            let mut q = p.clone();
            match flag {
                0 => q.is_paused = true,
                1 => q.is_completed = true,
                _ => q.is_cancelled = true,
            }
            assert!(!q.is_ready_for_review());
        }
    }

    #[test]
    fn undefined_review_days_is_not_ready() {
        let p = sample();
        assert!(!p.is_ready_for_review());
    }

    #[test]
    fn state_precedence() {
        let mut p = sample();
        assert_eq!(p.state(), ProjectState::Active);
        p.is_paused = true;
        assert_eq!(p.state(), ProjectState::Paused);
        p.is_completed = true;
        assert_eq!(p.state(), ProjectState::Completed);
        p.is_cancelled = true;
        assert_eq!(p.state(), ProjectState::Cancelled);
    }

    #[test]
    fn serialization_omits_empty_optionals() {
        let mut p = sample();
        p.reviewed_date = NaiveDate::from_ymd_opt(2025, 3, 4);
        let json = serde_json::to_value(&p).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj["reviewed_date"], "2025-03-04");
        assert!(!obj.contains_key("id"));
        assert!(!obj.contains_key("icon"));
        assert!(!obj.contains_key("icon_color"));
        assert!(!obj.contains_key("due_days"));
        assert!(!obj.contains_key("start_date"));
    }

    #[test]
    fn deserialization_tolerates_legacy_datetimes() {
        let json = r#"{
            "filename": "a.md",
            "title": "A",
            "folder": "/",
            "reviewed_date": "2024-03-01T10:00:00.000Z",
            "icon": null
        }"#;
        let p: Project = serde_json::from_str(json).unwrap();
        assert_eq!(p.reviewed_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(p.review_interval, "1w");
        assert!(p.icon.is_none());
    }
}
