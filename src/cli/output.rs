use serde::Serialize;

use crate::model::dates::format_iso_date;
use crate::model::project::{Project, ProjectState};
use crate::parse::Interval;
use crate::util::unicode::pad_to_width;

/// Title column width in list output
const TITLE_WIDTH: usize = 36;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct ProjectJson<'a> {
    pub state: ProjectState,
    pub ready_for_review: bool,
    #[serde(flatten)]
    pub project: &'a Project,
}

#[derive(Serialize)]
pub struct StatusJson {
    pub notes_dir: String,
    pub cache_file: String,
    pub prefs_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    pub stale: bool,
    pub counts: StatusCountsJson,
}

#[derive(Serialize, Default)]
pub struct StatusCountsJson {
    pub projects: usize,
    pub active: usize,
    pub paused: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub ready: usize,
}

pub fn project_to_json(project: &Project) -> ProjectJson<'_> {
    ProjectJson {
        state: project.state(),
        ready_for_review: project.is_ready_for_review(),
        project,
    }
}

pub fn count_states(projects: &[Project]) -> StatusCountsJson {
    let mut counts = StatusCountsJson {
        projects: projects.len(),
        ..Default::default()
    };
    for p in projects {
        match p.state() {
            ProjectState::Active => counts.active += 1,
            ProjectState::Paused => counts.paused += 1,
            ProjectState::Completed => counts.completed += 1,
            ProjectState::Cancelled => counts.cancelled += 1,
        }
        if p.is_ready_for_review() {
            counts.ready += 1;
        }
    }
    counts
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// "review overdue 3d", "review today", "review in 5d"
pub fn review_phrase(days: Option<i64>) -> String {
    match days {
        Some(d) if d < 0 => format!("review overdue {}d", -d),
        Some(0) => "review today".to_string(),
        Some(d) => format!("review in {}d", d),
        None => String::new(),
    }
}

/// "overdue 2d", "due today", "due in 9d"
pub fn due_phrase(days: Option<i64>) -> String {
    match days {
        Some(d) if d < 0 => format!("overdue {}d", -d),
        Some(0) => "due today".to_string(),
        Some(d) => format!("due in {}d", d),
        None => String::new(),
    }
}

/// One-line summary: `[ ] Title   #tag  review in 3d  due in 9d  40%`
pub fn format_project_line(p: &Project) -> String {
    let mut parts = vec![format!(
        "[{}] {}",
        p.state().marker(),
        pad_to_width(&p.title, TITLE_WIDTH)
    )];
    if !p.project_tag.is_empty() {
        parts.push(p.project_tag.clone());
    }
    let review = match p.state() {
        ProjectState::Active => review_phrase(p.next_review_days),
        state => state.to_string(),
    };
    if !review.is_empty() {
        parts.push(review);
    }
    let due = due_phrase(p.due_days);
    if !due.is_empty() {
        parts.push(due);
    }
    if let Some(pct) = p.percent_complete {
        parts.push(format!("{}%", pct));
    }
    parts.join("  ").trim_end().to_string()
}

/// Folder heading used when grouping by folder
pub fn format_folder_header(folder: &str) -> String {
    format!("== {} ==", folder)
}

/// Detailed view of one project
pub fn format_project_detail(p: &Project) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!("[{}] {}", p.state().marker(), p.title));
    lines.push(format!("file: {}", p.filename));
    lines.push(format!("folder: {}", p.folder));
    if !p.project_tag.is_empty() {
        lines.push(format!("tag: {}", p.project_tag));
    }
    lines.push(format!("state: {}", p.state()));
    match Interval::parse(&p.review_interval) {
        Ok(i) => lines.push(format!("interval: {} (every {})", p.review_interval, i.describe())),
        Err(_) => lines.push(format!("interval: {} (invalid)", p.review_interval)),
    }

    let date_line = |label: &str, date: Option<chrono::NaiveDate>, extra: String| {
        date.map(|d| {
            if extra.is_empty() {
                format!("{}: {}", label, format_iso_date(d))
            } else {
                format!("{}: {} ({})", label, format_iso_date(d), extra)
            }
        })
    };

    lines.extend(date_line("start", p.start_date, String::new()));
    lines.extend(date_line("reviewed", p.reviewed_date, String::new()));
    lines.extend(date_line(
        "next review",
        p.next_review_date,
        review_phrase(p.next_review_days),
    ));
    lines.extend(date_line("due", p.due_date, due_phrase(p.due_days)));
    lines.extend(date_line(
        "completed",
        p.completed_date,
        p.completed_duration.clone().unwrap_or_default(),
    ));
    lines.extend(date_line(
        "cancelled",
        p.cancelled_date,
        p.cancelled_duration.clone().unwrap_or_default(),
    ));

    match (p.percent_complete, p.last_progress_comment.is_empty()) {
        (Some(pct), false) => lines.push(format!("progress: {}% - {}", pct, p.last_progress_comment)),
        (None, false) => lines.push(format!("progress: {}", p.last_progress_comment)),
        (Some(pct), true) => lines.push(format!("progress: {}%", pct)),
        (None, true) => {}
    }

    lines.push(format!(
        "items: {} open, {} done, {} waiting, {} future",
        p.num_open_items, p.num_completed_items, p.num_waiting_items, p.num_future_items
    ));

    if !p.next_actions.is_empty() {
        lines.push(String::new());
        lines.push("next actions:".to_string());
        for action in &p.next_actions {
            lines.push(format!("  {}", action));
        }
    }

    lines
}
