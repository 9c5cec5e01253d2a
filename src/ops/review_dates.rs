use chrono::NaiveDate;

use crate::model::dates::days_between;
use crate::model::project::Project;
use crate::parse::interval;

/// Recompute the date-derived fields of `project` against `today`.
///
/// The next review date comes from the first rule that applies:
/// 1. a start date after today,
/// 2. an explicit next-review date on the note,
/// 3. the review interval applied to the last review (or today if never
///    reviewed, or if the interval doesn't parse),
/// 4. nothing.
///
/// Finished and paused projects keep their next review date but have no
/// `next_review_days`, so they never show up as ready.
pub fn recompute(project: &Project, today: NaiveDate) -> Project {
    let mut p = project.clone();

    p.next_review_date = next_review_date(&p, today);
    p.next_review_days = p.next_review_date.map(|d| days_between(today, d));
    p.due_days = p.due_date.map(|d| days_between(today, d));

    if p.is_finished() || p.is_paused {
        p.next_review_days = None;
    }

    p.completed_duration = p.completed_date.map(|d| duration_phrase(p.start_date, d, today));
    p.cancelled_duration = p.cancelled_date.map(|d| duration_phrase(p.start_date, d, today));

    p
}

fn next_review_date(p: &Project, today: NaiveDate) -> Option<NaiveDate> {
    if let Some(start) = p.start_date
        && start > today
    {
        return Some(start);
    }
    if let Some(explicit) = p.next_review_override {
        return Some(explicit);
    }
    if p.review_interval.trim().is_empty() {
        return None;
    }
    let Some(reviewed) = p.reviewed_date else {
        return Some(today);
    };
    match interval::offset(reviewed, &p.review_interval) {
        Ok(date) => Some(date),
        Err(e) => {
            tracing::debug!(file = %p.filename, "{}; treating as due today", e);
            Some(today)
        }
    }
}

/// "after 3 weeks" when the start date is known, else "2 months ago"
fn duration_phrase(start: Option<NaiveDate>, end: NaiveDate, today: NaiveDate) -> String {
    match start {
        Some(start) if start <= end => format!("after {}", span(days_between(start, end))),
        _ => {
            let ago = days_between(end, today);
            if ago <= 0 {
                "today".to_string()
            } else {
                format!("{} ago", span(ago))
            }
        }
    }
}

/// Coarse length of a span of days: "1 day", "5 days", "3 weeks", "2 months"
fn span(days: i64) -> String {
    let plural = |n: i64, unit: &str| {
        if n == 1 {
            format!("1 {}", unit)
        } else {
            format!("{} {}s", n, unit)
        }
    };
    if days < 7 {
        return plural(days.max(0), "day");
    }
    let weeks = days / 7;
    if weeks < 5 {
        return plural(weeks, "week");
    }
    if days < 365 {
        return plural(days / 30, "month");
    }
    plural(days / 365, "year")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn project() -> Project {
        Project::new("a.md".into(), "A".into(), "/".into())
    }

    #[test]
    fn interval_from_last_review() {
        let mut p = project();
        p.reviewed_date = Some(d("2025-01-01"));
        p.review_interval = "2w".into();
        let r = recompute(&p, d("2025-01-10"));
        assert_eq!(r.next_review_date, Some(d("2025-01-15")));
        assert_eq!(r.next_review_days, Some(5));
        assert!(!r.is_ready_for_review());
    }

    #[test]
    fn never_reviewed_is_due_today() {
        let p = project();
        let r = recompute(&p, d("2025-01-10"));
        assert_eq!(r.next_review_date, Some(d("2025-01-10")));
        assert_eq!(r.next_review_days, Some(0));
        assert!(r.is_ready_for_review());
    }

    #[test]
    fn invalid_interval_falls_back_to_today() {
        let mut p = project();
        p.reviewed_date = Some(d("2025-01-01"));
        p.review_interval = "fortnightly".into();
        let r = recompute(&p, d("2025-01-10"));
        assert_eq!(r.next_review_date, Some(d("2025-01-10")));
        assert_eq!(r.next_review_days, Some(0));
    }

    #[test]
    fn empty_interval_leaves_review_unset() {
        let mut p = project();
        p.review_interval = String::new();
        let r = recompute(&p, d("2025-01-10"));
        assert_eq!(r.next_review_date, None);
        assert_eq!(r.next_review_days, None);
    }

    #[test]
    fn future_start_date_takes_precedence() {
        let mut p = project();
        p.start_date = Some(d("2025-03-01"));
        p.reviewed_date = Some(d("2025-01-01"));
        p.next_review_override = Some(d("2025-02-01"));
        let r = recompute(&p, d("2025-01-10"));
        assert_eq!(r.next_review_date, Some(d("2025-03-01")));

        // once started, the explicit date wins
        let r = recompute(&p, d("2025-03-02"));
        assert_eq!(r.next_review_date, Some(d("2025-02-01")));
        assert_eq!(r.next_review_days, Some(-29));
    }

    #[test]
    fn finished_and_paused_have_no_review_days() {
        let mut p = project();
        p.reviewed_date = Some(d("2024-01-01"));
        for flag in 0..3 {
            let mut q = p.clone();
            match flag {
                0 => q.is_paused = true,
                1 => q.is_completed = true,
                _ => q.is_cancelled = true,
            }
            let r = recompute(&q, d("2025-01-10"));
            assert!(r.next_review_date.is_some());
            assert_eq!(r.next_review_days, None);
            assert!(!r.is_ready_for_review());
        }
    }

    #[test]
    fn due_days_signed() {
        let mut p = project();
        p.due_date = Some(d("2025-01-05"));
        assert_eq!(recompute(&p, d("2025-01-10")).due_days, Some(-5));
        p.due_date = None;
        assert_eq!(recompute(&p, d("2025-01-10")).due_days, None);
    }

    #[test]
    fn recompute_does_not_touch_input() {
        let p = project();
        let _ = recompute(&p, d("2025-01-10"));
        assert_eq!(p.next_review_date, None);
    }

    #[test]
    fn durations() {
        let mut p = project();
        p.start_date = Some(d("2025-01-01"));
        p.completed_date = Some(d("2025-01-22"));
        p.is_completed = true;
        let r = recompute(&p, d("2025-06-01"));
        assert_eq!(r.completed_duration.as_deref(), Some("after 3 weeks"));

        p.start_date = None;
        let r = recompute(&p, d("2025-03-23"));
        assert_eq!(r.completed_duration.as_deref(), Some("2 months ago"));

        let mut c = project();
        c.cancelled_date = Some(d("2025-03-20"));
        c.is_cancelled = true;
        let r = recompute(&c, d("2025-03-21"));
        assert_eq!(r.cancelled_duration.as_deref(), Some("1 day ago"));
        assert_eq!(r.completed_duration, None);
    }
}
