use std::cmp::Ordering;

use crate::model::config::{DisplayOrder, ReviewConfig, normalize_tag};
use crate::model::project::Project;

/// Filter and ordering for a review queue
#[derive(Debug, Clone, Default)]
pub struct QueueOptions {
    /// Only this project tag
    pub tag: Option<String>,
    /// Configured tags; earlier tags sort first
    pub tag_order: Vec<String>,
    pub group_by_folder: bool,
    pub show_finished: bool,
    pub only_due: bool,
    pub order: DisplayOrder,
}

impl QueueOptions {
    pub fn from_config(config: &ReviewConfig) -> Self {
        QueueOptions {
            tag: None,
            tag_order: config.scan.normalized_tags(),
            group_by_folder: config.display.group_by_folder,
            show_finished: config.display.show_finished,
            only_due: config.display.only_due,
            order: config.display.order,
        }
    }

    pub fn with_tag(mut self, tag: Option<&str>) -> Self {
        self.tag = tag.map(normalize_tag);
        self
    }
}

/// Filter `projects` by tag, lifecycle and due-ness, then sort for display
pub fn filter_and_sort(projects: &[Project], opts: &QueueOptions) -> Vec<Project> {
    let mut out: Vec<Project> = projects
        .iter()
        .filter(|p| opts.tag.as_ref().is_none_or(|t| &p.project_tag == t))
        .filter(|p| opts.show_finished || !p.is_finished())
        .filter(|p| !opts.only_due || p.next_review_days.is_some_and(|d| d <= 0))
        .cloned()
        .collect();

    out.sort_by(|a, b| compare(a, b, opts));
    out
}

fn compare(a: &Project, b: &Project, opts: &QueueOptions) -> Ordering {
    let tag_rank = |p: &Project| {
        opts.tag_order
            .iter()
            .position(|t| t == &p.project_tag)
            .unwrap_or(opts.tag_order.len())
    };

    tag_rank(a)
        .cmp(&tag_rank(b))
        .then_with(|| {
            if opts.group_by_folder {
                a.folder.cmp(&b.folder)
            } else {
                Ordering::Equal
            }
        })
        .then_with(|| a.is_cancelled.cmp(&b.is_cancelled))
        .then_with(|| a.is_completed.cmp(&b.is_completed))
        .then_with(|| a.is_paused.cmp(&b.is_paused))
        .then_with(|| match opts.order {
            DisplayOrder::Review => none_last(a.next_review_days, b.next_review_days),
            DisplayOrder::Due => none_last(a.due_days, b.due_days),
            DisplayOrder::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        })
}

/// Ascending, with undefined values after every defined one
fn none_last(a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// The first project ready for review, in sorted order
pub fn next_ready<'a>(sorted: &'a [Project]) -> Option<&'a Project> {
    sorted.iter().find(|p| p.is_ready_for_review())
}

/// Up to `n` ready projects (all of them when `n` is 0), in sorted order.
///
/// Consecutive entries for the same note are reported once, and projects
/// whose note has gone missing are skipped. Entries are sorted tag first, so
/// a note indexed under two tags is usually not consecutive and shows up
/// once per tag.
pub fn next_n_ready<'a, F>(sorted: &'a [Project], n: usize, note_exists: F) -> Vec<&'a Project>
where
    F: Fn(&str) -> bool,
{
    let mut out: Vec<&Project> = Vec::new();
    let mut last_filename: Option<&str> = None;

    for p in sorted.iter().filter(|p| p.is_ready_for_review()) {
        if n > 0 && out.len() >= n {
            break;
        }
        if last_filename == Some(p.filename.as_str()) {
            continue;
        }
        last_filename = Some(p.filename.as_str());
        if !note_exists(&p.filename) {
            tracing::warn!(file = %p.filename, "note no longer exists; skipping");
            continue;
        }
        out.push(p);
    }
    out
}
