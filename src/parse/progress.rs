use chrono::NaiveDate;

use crate::model::dates::format_iso_date;

/// Comment carried by the "nothing found" record
pub const NO_COMMENT_FOUND: &str = "(no comment found)";

/// The most recent `Progress:` annotation in a note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    /// Line the record came from (1 for the sentinel)
    pub line_index: usize,
    /// Declared percent complete, clamped to 0..=100
    pub percent: Option<u8>,
    pub date: Option<NaiveDate>,
    pub comment: String,
    /// True when no progress line was found at all
    pub is_sentinel: bool,
}

impl ProgressRecord {
    pub fn sentinel() -> Self {
        ProgressRecord {
            line_index: 1,
            percent: None,
            date: None,
            comment: NO_COMMENT_FOUND.to_string(),
            is_sentinel: true,
        }
    }
}

/// Parse one line of the form `Progress: [n][@|:]<date>[: ]<comment>`.
///
/// The line may sit behind a list bullet. Percent and date are independent:
/// either may be missing. Returns `None` if the line isn't a progress line.
pub fn parse_progress_line(line: &str) -> Option<(Option<u8>, Option<NaiveDate>, String)> {
    let rest = strip_bullet(line.trim_start());
    let rest = strip_prefix_ignore_case(rest, "progress:")?;
    let mut rest = rest.trim_start();

    // Percent: a run of at most 3 digits not immediately followed by another
    // digit, so `20250101` is read as a date rather than a percent.
    let digit_len = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    let mut percent = None;
    if (1..=3).contains(&digit_len) {
        let value: u32 = rest[..digit_len].parse().ok()?;
        percent = Some(value.min(100) as u8);
        rest = &rest[digit_len..];
        rest = rest.strip_prefix('%').unwrap_or(rest);
    }

    rest = rest.trim_start();
    rest = rest
        .strip_prefix('@')
        .or_else(|| rest.strip_prefix(':'))
        .unwrap_or(rest)
        .trim_start();

    let (date, after_date) = take_date(rest);
    let mut rest = after_date.trim_start();
    if date.is_some() {
        rest = rest
            .strip_prefix(':')
            .or_else(|| rest.strip_prefix('-'))
            .unwrap_or(rest);
    }
    let comment = rest.trim().to_string();

    Some((percent, date, comment))
}

/// Pick the most recent progress record from `(line_index, line)` pairs.
///
/// The latest date wins regardless of line order; for equal dates the later
/// line wins. Dateless progress lines rank below any dated one. When no line
/// parses, the sentinel record is returned.
pub fn most_recent_progress<'a, I>(lines: I) -> ProgressRecord
where
    I: IntoIterator<Item = (usize, &'a str)>,
{
    let mut best: Option<ProgressRecord> = None;

    for (line_index, line) in lines {
        let Some((percent, date, comment)) = parse_progress_line(line) else {
            continue;
        };
        let candidate = ProgressRecord {
            line_index,
            percent,
            date,
            comment,
            is_sentinel: false,
        };
        // Option<NaiveDate> orders None before Some, so dateless lines lose
        let replace = match &best {
            None => true,
            Some(current) => candidate.date >= current.date,
        };
        if replace {
            best = Some(candidate);
        }
    }

    best.unwrap_or_else(ProgressRecord::sentinel)
}

/// Canonical progress line, e.g. `Progress: 40@2025-01-01: first draft done`
pub fn format_progress_line(percent: Option<u8>, date: NaiveDate, comment: &str) -> String {
    let percent = percent
        .map(|p| p.min(100).to_string())
        .unwrap_or_default();
    let comment = comment.trim();
    if comment.is_empty() {
        format!("Progress: {}@{}", percent, format_iso_date(date))
    } else {
        format!("Progress: {}@{}: {}", percent, format_iso_date(date), comment)
    }
}

fn strip_bullet(s: &str) -> &str {
    for bullet in ["- ", "* ", "+ "] {
        if let Some(rest) = s.strip_prefix(bullet) {
            let rest = rest.trim_start();
            // A task box in front of the annotation: `* [ ] Progress: ...`
            if rest.len() >= 3 && rest.starts_with('[') && rest.as_bytes()[2] == b']' {
                return rest[3..].trim_start();
            }
            return rest;
        }
    }
    s
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

/// Take a leading `YYYY-MM-DD` or `YYYYMMDD` date. Returns the remainder
/// unchanged if there is none.
fn take_date(s: &str) -> (Option<NaiveDate>, &str) {
    if let Some(head) = s.get(..10)
        && let Ok(date) = NaiveDate::parse_from_str(head, "%Y-%m-%d")
    {
        return (Some(date), &s[10..]);
    }
    if let Some(head) = s.get(..8)
        && head.bytes().all(|b| b.is_ascii_digit())
        && !s[8..].starts_with(|c: char| c.is_ascii_digit())
        && let Ok(date) = NaiveDate::parse_from_str(head, "%Y%m%d")
    {
        return (Some(date), &s[8..]);
    }
    (None, s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn parse_percent_at_compact_date() {
        let (p, date, comment) = parse_progress_line("Progress: 40@20250101: early").unwrap();
        assert_eq!(p, Some(40));
        assert_eq!(date, Some(d("2025-01-01")));
        assert_eq!(comment, "early");
    }

    #[test]
    fn parse_percent_colon_iso_date() {
        let (p, date, comment) = parse_progress_line("Progress: 70:2025-02-01: later").unwrap();
        assert_eq!(p, Some(70));
        assert_eq!(date, Some(d("2025-02-01")));
        assert_eq!(comment, "later");
    }

    #[test]
    fn parse_date_without_percent() {
        let (p, date, comment) =
            parse_progress_line("Progress: @2025-03-10 waiting on legal").unwrap();
        assert_eq!(p, None);
        assert_eq!(date, Some(d("2025-03-10")));
        assert_eq!(comment, "waiting on legal");

        let (p, date, _) = parse_progress_line("Progress: 20250310 no percent").unwrap();
        assert_eq!(p, None);
        assert_eq!(date, Some(d("2025-03-10")));
    }

    #[test]
    fn parse_clamps_percent() {
        let (p, _, _) = parse_progress_line("Progress: 250@2025-01-01: over").unwrap();
        assert_eq!(p, Some(100));
    }

    #[test]
    fn parse_bulleted_and_case_insensitive() {
        let (p, date, comment) =
            parse_progress_line("* progress: 15% @2025-01-02 - kicked off").unwrap();
        assert_eq!(p, Some(15));
        assert_eq!(date, Some(d("2025-01-02")));
        assert_eq!(comment, "kicked off");
    }

    #[test]
    fn non_progress_lines_are_ignored() {
        assert!(parse_progress_line("Some progress was made").is_none());
        assert!(parse_progress_line("").is_none());
        assert!(parse_progress_line("Prog").is_none());
    }

    #[test]
    fn latest_date_wins_not_last_line() {
        let lines = [
            (3, "Progress: 40@20250101: early"),
            (4, "Progress: 70:2025-02-01: later"),
        ];
        let rec = most_recent_progress(lines);
        assert_eq!(rec.percent, Some(70));
        assert_eq!(rec.comment, "later");
        assert_eq!(rec.line_index, 4);

        let reversed = [
            (3, "Progress: 70:2025-02-01: later"),
            (4, "Progress: 40@20250101: early"),
        ];
        let rec = most_recent_progress(reversed);
        assert_eq!(rec.percent, Some(70));
        assert_eq!(rec.line_index, 3);
    }

    #[test]
    fn dated_line_without_percent_keeps_percent_undefined() {
        let lines = [
            (2, "Progress: 40@2025-01-01: early"),
            (5, "Progress: @2025-04-01 blocked on vendor"),
        ];
        let rec = most_recent_progress(lines);
        assert_eq!(rec.percent, None);
        assert_eq!(rec.comment, "blocked on vendor");
        assert!(!rec.is_sentinel);
    }

    #[test]
    fn no_progress_lines_yields_sentinel() {
        let lines = [(0, "# Title"), (1, "#project @review(1w)"), (2, "- [ ] task")];
        let rec = most_recent_progress(lines);
        assert!(rec.is_sentinel);
        assert_eq!(rec.line_index, 1);
        assert_eq!(rec.percent, None);
        assert_eq!(rec.comment, NO_COMMENT_FOUND);
    }

    #[test]
    fn format_round_trips_through_parser() {
        let line = format_progress_line(Some(55), d("2025-06-01"), "halfway");
        assert_eq!(line, "Progress: 55@2025-06-01: halfway");
        let (p, date, comment) = parse_progress_line(&line).unwrap();
        assert_eq!((p, date, comment.as_str()), (Some(55), Some(d("2025-06-01")), "halfway"));

        assert_eq!(
            format_progress_line(None, d("2025-06-01"), ""),
            "Progress: @2025-06-01"
        );
    }
}
