use chrono::{Days, NaiveDate};

use crate::model::config::ReviewConfig;
use crate::model::note::Note;
use crate::model::project::{DEFAULT_REVIEW_INTERVAL, Project};
use crate::ops::review_dates::recompute;
use crate::parse::mentions::{mention_date, mention_value, split_metadata_mentions};
use crate::parse::progress::most_recent_progress;

/// Hashtag that pauses a project
pub const PAUSED_TAG: &str = "#paused";

/// Error type for building a project from a note
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("note {0} has no title")]
    NoTitle(String),
}

/// Build a project summary from a parsed note.
///
/// `tag_override` is the configured tag the note was matched by during a
/// scan; without it the note's own first hashtag is used.
pub fn build_project(
    note: &Note,
    tag_override: Option<&str>,
    config: &ReviewConfig,
    today: NaiveDate,
) -> Result<Project, ProjectError> {
    let title = note
        .title
        .clone()
        .ok_or_else(|| ProjectError::NoTitle(note.filename.clone()))?;

    let mut p = Project::new(note.filename.clone(), title, note.folder.clone());
    p.project_tag = match tag_override {
        Some(tag) => tag.to_string(),
        None => default_project_tag(&note.hashtags),
    };

    // Dates and cadence. A note handed over without its mention list (a
    // store that only fills in hashtags) still has its metadata line read.
    let fallback;
    let mentions: &[String] = if note.mentions.is_empty() {
        fallback = note
            .metadata_line()
            .map(|m| split_metadata_mentions(&m.content))
            .unwrap_or_default();
        &fallback
    } else {
        &note.mentions
    };
    let tokens = &config.mentions;
    p.start_date = mention_date(mentions, &tokens.start);
    p.due_date = mention_date(mentions, &tokens.due);
    p.reviewed_date = mention_date(mentions, &tokens.reviewed);
    p.completed_date = mention_date(mentions, &tokens.completed);
    p.cancelled_date = mention_date(mentions, &tokens.cancelled);
    p.next_review_override = mention_date(mentions, &tokens.next_review);
    p.review_interval = mention_value(mentions, &tokens.review_interval)
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_REVIEW_INTERVAL)
        .to_string();

    // Lifecycle
    p.is_completed = p.completed_date.is_some();
    p.is_cancelled = !p.is_completed && p.cancelled_date.is_some();
    p.is_paused = note.has_hashtag(PAUSED_TAG);

    count_items(note, config, today, &mut p);

    let mut p = recompute(&p, today);

    // Progress
    let record = most_recent_progress(
        note.paragraphs
            .iter()
            .map(|para| (para.line_index, para.raw_content.as_str())),
    );
    if !record.is_sentinel && !record.comment.is_empty() {
        p.percent_complete = record.percent;
        p.last_progress_comment = record.comment;
        p.most_recent_progress_line_index = Some(record.line_index);
    } else {
        p.percent_complete = floor_percent(p.num_completed_items, p.num_total_items);
        if !record.is_sentinel {
            p.most_recent_progress_line_index = Some(record.line_index);
        }
    }

    p.next_actions = next_actions(note, config);

    p.icon = frontmatter_value(note, "icon");
    p.icon_color = frontmatter_value(note, "icon-color");

    Ok(p)
}

/// First hashtag, skipping over a leading `#paused`
fn default_project_tag(hashtags: &[String]) -> String {
    match hashtags.first() {
        Some(first) if first == PAUSED_TAG => hashtags.get(1).cloned().unwrap_or_default(),
        Some(first) => first.clone(),
        None => String::new(),
    }
}

fn count_items(note: &Note, config: &ReviewConfig, today: NaiveDate, p: &mut Project) {
    let items = &config.items;
    let horizon = today
        .checked_add_days(Days::new(items.look_ahead_days.max(0) as u64))
        .unwrap_or(today);

    for para in &note.paragraphs {
        if para.kind.is_completed_item() {
            p.num_completed_items += 1;
        } else if para.kind.is_open_item() {
            p.num_open_items += 1;
            if !items.waiting_marker.is_empty() && para.content.contains(&items.waiting_marker) {
                p.num_waiting_items += 1;
            }
            if para.scheduled.is_some_and(|d| d > horizon) {
                p.num_future_items += 1;
            }
        }
    }

    p.num_total_items = p.num_completed_items + p.num_open_items;
    if items.look_ahead_days > 0 {
        p.num_total_items -= p.num_future_items;
    }
}

/// `floor(100 * completed / total)`, undefined for an empty project
pub fn floor_percent(completed: usize, total: usize) -> Option<u8> {
    if total == 0 {
        return None;
    }
    Some(((100 * completed) / total).min(100) as u8)
}

fn next_actions(note: &Note, config: &ReviewConfig) -> Vec<String> {
    let items = &config.items;
    if items.next_action_tags.is_empty() && items.sequential_tag.is_empty() {
        return Vec::new();
    }

    let open: Vec<_> = note
        .paragraphs
        .iter()
        .filter(|para| para.kind.is_open_item())
        .collect();

    let mut actions: Vec<String> = Vec::new();
    let mut push = |line: &str| {
        // Synced copies of a line are exact duplicates
        if !actions.iter().any(|a| a == line) {
            actions.push(line.to_string());
        }
    };

    if is_sequential(note, &items.sequential_tag)
        && let Some(first) = open.first()
    {
        push(&first.raw_content);
    }

    for tag in &items.next_action_tags {
        if let Some(item) = open.iter().find(|para| para.content.contains(tag.as_str())) {
            push(&item.raw_content);
        }
    }

    actions
}

/// Sequential via frontmatter, then a metadata-line hashtag, then a raw
/// substring of the metadata line
fn is_sequential(note: &Note, tag: &str) -> bool {
    if tag.is_empty() {
        return false;
    }
    let key = tag.trim_start_matches('#');
    if let Some(value) = note.frontmatter.get(key) {
        let value = value.trim().to_lowercase();
        if matches!(value.as_str(), "true" | "yes" | "1") {
            return true;
        }
    }
    let Some(meta) = note.metadata_line() else {
        return false;
    };
    crate::parse::extract_hashtags(&meta.content).iter().any(|t| t == tag)
        || meta.raw_content.contains(tag)
}

fn frontmatter_value(note: &Note, key: &str) -> Option<String> {
    note.frontmatter
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_note;
    use pretty_assertions::assert_eq;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn build(text: &str) -> Project {
        let note = parse_note("Work/p.md", text);
        build_project(&note, None, &ReviewConfig::default(), d("2025-01-10")).unwrap()
    }

    #[test]
    fn dates_and_cadence_from_metadata() {
        let p = build(
            "# Plan\n#project @start(2024-12-01) @due(2025-02-01) @reviewed(2025-01-01) @review(2w)\n",
        );
        assert_eq!(p.title, "Plan");
        assert_eq!(p.folder, "Work");
        assert_eq!(p.project_tag, "#project");
        assert_eq!(p.start_date, Some(d("2024-12-01")));
        assert_eq!(p.due_days, Some(22));
        assert_eq!(p.review_interval, "2w");
        assert_eq!(p.next_review_date, Some(d("2025-01-15")));
        assert_eq!(p.next_review_days, Some(5));
    }

    #[test]
    fn metadata_line_read_when_mention_list_is_missing() {
        let mut note = parse_note("Work/p.md", "# Plan\n#project @reviewed(2025-01-01) @review(2w)\n");
        note.mentions.clear();
        let p = build_project(&note, None, &ReviewConfig::default(), d("2025-01-10")).unwrap();
        assert_eq!(p.reviewed_date, Some(d("2025-01-01")));
        assert_eq!(p.review_interval, "2w");
        assert_eq!(p.next_review_date, Some(d("2025-01-15")));
    }

    #[test]
    fn missing_interval_defaults_to_one_week() {
        let p = build("# Plan\n#project @reviewed(2025-01-01)\n");
        assert_eq!(p.review_interval, "1w");
        assert_eq!(p.next_review_date, Some(d("2025-01-08")));
        assert!(p.is_ready_for_review());
    }

    #[test]
    fn no_title_is_an_error() {
        let note = parse_note("x.md", "#project\n* [ ] task");
        let err = build_project(&note, None, &ReviewConfig::default(), d("2025-01-10"));
        assert!(matches!(err, Err(ProjectError::NoTitle(f)) if f == "x.md"));
    }

    #[test]
    fn paused_tag_is_skipped_for_project_tag() {
        let p = build("# Plan\n#paused #area @review(1m)\n");
        assert!(p.is_paused);
        assert_eq!(p.project_tag, "#area");
        assert_eq!(p.next_review_days, None);

        let p = build("# Plan\n#paused\n");
        assert_eq!(p.project_tag, "");
    }

    #[test]
    fn tag_override_wins() {
        let note = parse_note("p.md", "# Plan\n#area #project\n");
        let p = build_project(&note, Some("#project"), &ReviewConfig::default(), d("2025-01-10"))
            .unwrap();
        assert_eq!(p.project_tag, "#project");
    }

    #[test]
    fn completed_beats_cancelled_and_pause() {
        let p = build("# Plan\n#project #paused @completed(2025-01-05) @cancelled(2025-01-06)\n");
        assert!(p.is_completed);
        assert!(!p.is_cancelled);
        assert_eq!(p.next_review_days, None);
        assert_eq!(p.completed_duration.as_deref(), Some("5 days ago"));
    }

    #[test]
    fn item_counts_and_floor_percent() {
        let p = build(
            "# Plan\n#project\n* [x] one\n* [x] two\n* [ ] three #waiting\n+ [ ] four\n- [-] dropped\n",
        );
        assert_eq!(p.num_completed_items, 2);
        assert_eq!(p.num_open_items, 2);
        assert_eq!(p.num_waiting_items, 1);
        assert_eq!(p.num_total_items, 4);
        assert_eq!(p.percent_complete, Some(50));
        assert_eq!(p.last_progress_comment, "");
    }

    #[test]
    fn percent_floors() {
        assert_eq!(floor_percent(1, 3), Some(33));
        assert_eq!(floor_percent(2, 3), Some(66));
        assert_eq!(floor_percent(0, 0), None);
        assert_eq!(floor_percent(5, 5), Some(100));
    }

    #[test]
    fn future_items_leave_denominator_with_look_ahead() {
        let text = "# Plan\n#project\n* [x] done\n* [ ] soon >2025-01-12\n* [ ] later >2025-03-01\n";
        let note = parse_note("p.md", text);

        let mut config = ReviewConfig::default();
        config.items.look_ahead_days = 7;
        let p = build_project(&note, None, &config, d("2025-01-10")).unwrap();
        assert_eq!(p.num_future_items, 1);
        assert_eq!(p.num_total_items, 2);
        assert_eq!(p.percent_complete, Some(50));

        config.items.look_ahead_days = 0;
        let p = build_project(&note, None, &config, d("2025-01-10")).unwrap();
        assert_eq!(p.num_future_items, 2);
        assert_eq!(p.num_total_items, 3);
        assert_eq!(p.percent_complete, Some(33));
    }

    #[test]
    fn progress_line_overrides_computed_percent() {
        let p = build(
            "# Plan\n#project\nProgress: 40@20250101: early\nProgress: 70:2025-02-01: later\n* [ ] a\n",
        );
        assert_eq!(p.percent_complete, Some(70));
        assert_eq!(p.last_progress_comment, "later");
        assert_eq!(p.most_recent_progress_line_index, Some(3));
    }

    #[test]
    fn progress_without_percent_stays_undefined() {
        let p = build("# Plan\n#project\nProgress: @2025-01-02 blocked\n* [x] a\n");
        assert_eq!(p.percent_complete, None);
        assert_eq!(p.last_progress_comment, "blocked");
    }

    #[test]
    fn next_actions_sequential_and_tagged() {
        let text = "# Plan\n#project #sequential\n* [x] done\n* [ ] first step\n* [ ] call @bob #na\n* [ ] first step\n";
        let note = parse_note("p.md", text);
        let mut config = ReviewConfig::default();
        config.items.next_action_tags = vec!["#na".into(), "#missing".into()];
        let p = build_project(&note, None, &config, d("2025-01-10")).unwrap();
        assert_eq!(p.next_actions, vec!["* [ ] first step", "* [ ] call @bob #na"]);
    }

    #[test]
    fn sequential_from_frontmatter() {
        let text = "---\ntitle: Plan\nsequential: true\n---\n#project\n* [ ] go\n";
        let p = build(text);
        assert_eq!(p.next_actions, vec!["* [ ] go"]);
    }

    #[test]
    fn next_actions_deduplicate_synced_copies() {
        let text = "# Plan\n#project\n* [ ] ship it #na #now\n";
        let note = parse_note("p.md", text);
        let mut config = ReviewConfig::default();
        config.items.next_action_tags = vec!["#na".into(), "#now".into()];
        let p = build_project(&note, None, &config, d("2025-01-10")).unwrap();
        assert_eq!(p.next_actions, vec!["* [ ] ship it #na #now"]);
    }

    #[test]
    fn icon_from_frontmatter() {
        let p = build("---\ntitle: Plan\nicon: rocket\nicon-color: blue-500\n---\n#project\n");
        assert_eq!(p.icon.as_deref(), Some("rocket"));
        assert_eq!(p.icon_color.as_deref(), Some("blue-500"));
    }
}
