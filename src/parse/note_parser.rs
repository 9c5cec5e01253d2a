use chrono::NaiveDate;
use indexmap::IndexMap;

use crate::model::note::{Note, Paragraph, ParagraphType, folder_of};
use crate::parse::mentions::{extract_hashtags, extract_mentions};

/// Parse a note file into typed paragraphs, one per line.
///
/// Layout: optional `---` frontmatter, then a `# Title` heading, then body
/// lines. Tasks are `* [ ]`/`- [ ]` (or bare `* `), checklists `+ [ ]`
/// (or bare `+ `); the box character gives the state.
pub fn parse_note(filename: &str, text: &str) -> Note {
    let lines: Vec<&str> = text.lines().collect();
    let mut paragraphs = Vec::with_capacity(lines.len());
    let mut frontmatter = IndexMap::new();

    let body_start = match frontmatter_end(&lines) {
        Some(end) => {
            paragraphs.push(paragraph(0, ParagraphType::Separator, "", lines[0]));
            for (idx, line) in lines.iter().enumerate().take(end).skip(1) {
                if let Some((key, value)) = line.split_once(':') {
                    let key = key.trim();
                    if !key.is_empty() {
                        frontmatter.insert(key.to_string(), unquote(value.trim()).to_string());
                    }
                }
                paragraphs.push(paragraph(idx, ParagraphType::Frontmatter, line.trim(), line));
            }
            paragraphs.push(paragraph(end, ParagraphType::Separator, "", lines[end]));
            end + 1
        }
        None => 0,
    };

    let mut heading_title: Option<String> = None;
    for (idx, line) in lines.iter().enumerate().skip(body_start) {
        let (mut kind, content) = classify_line(line);
        if kind == ParagraphType::Heading && heading_title.is_none() && is_h1(line) {
            kind = ParagraphType::Title;
            heading_title = Some(content.clone());
        }
        paragraphs.push(paragraph(idx, kind, &content, line));
    }

    let title = frontmatter
        .get("title")
        .filter(|t| !t.is_empty())
        .cloned()
        .or(heading_title)
        .filter(|t| !t.trim().is_empty());

    let mut hashtags: Vec<String> = Vec::new();
    let mut mentions: Vec<String> = Vec::new();
    for p in paragraphs.iter().filter(|p| {
        !matches!(p.kind, ParagraphType::Frontmatter | ParagraphType::Separator | ParagraphType::Title)
    }) {
        for tag in extract_hashtags(&p.content) {
            if !hashtags.contains(&tag) {
                hashtags.push(tag);
            }
        }
        for mention in extract_mentions(&p.content) {
            if !mentions.contains(&mention) {
                mentions.push(mention);
            }
        }
    }

    let teamspace = frontmatter.get("teamspace").filter(|t| !t.is_empty()).cloned();

    Note {
        filename: filename.to_string(),
        folder: folder_of(filename),
        title,
        frontmatter,
        paragraphs,
        hashtags,
        mentions,
        changed: None,
        teamspace,
    }
}

/// Find the closing `---` of a frontmatter block that opens on line 0
fn frontmatter_end(lines: &[&str]) -> Option<usize> {
    if lines.first().map(|l| l.trim()) != Some("---") {
        return None;
    }
    lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, l)| l.trim() == "---")
        .map(|(idx, _)| idx)
}

fn paragraph(line_index: usize, kind: ParagraphType, content: &str, raw: &str) -> Paragraph {
    Paragraph {
        line_index,
        kind,
        content: content.to_string(),
        raw_content: raw.trim_end().to_string(),
        scheduled: scheduled_date(content),
    }
}

fn is_h1(line: &str) -> bool {
    line.trim_start().starts_with("# ")
}

/// Classify a body line and strip its markers
fn classify_line(line: &str) -> (ParagraphType, String) {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return (ParagraphType::Empty, String::new());
    }
    if trimmed == "---" || trimmed == "***" {
        return (ParagraphType::Separator, String::new());
    }

    let hashes = trimmed.bytes().take_while(|b| *b == b'#').count();
    if (1..=6).contains(&hashes) && trimmed[hashes..].starts_with(' ') {
        return (ParagraphType::Heading, trimmed[hashes..].trim().to_string());
    }

    for (marker, checklist) in [("- ", false), ("* ", false), ("+ ", true)] {
        let Some(rest) = trimmed.strip_prefix(marker) else {
            continue;
        };
        if let Some((kind, text)) = parse_box(rest, checklist) {
            return (kind, text);
        }
        return match marker {
            "* " => (ParagraphType::Open, rest.trim().to_string()),
            "+ " => (ParagraphType::ChecklistOpen, rest.trim().to_string()),
            // `- text` is a plain bullet
            _ => (ParagraphType::Text, trimmed.to_string()),
        };
    }

    (ParagraphType::Text, trimmed.to_string())
}

/// Parse `[c] text` after a list marker
fn parse_box(rest: &str, checklist: bool) -> Option<(ParagraphType, String)> {
    let inner = rest.strip_prefix('[')?;
    let mut chars = inner.chars();
    let c = chars.next()?;
    let after = chars.as_str().strip_prefix(']')?;
    let kind = ParagraphType::from_box_char(c, checklist)?;
    Some((kind, after.trim().to_string()))
}

/// A `>YYYY-MM-DD` scheduling marker in item content
fn scheduled_date(content: &str) -> Option<NaiveDate> {
    let mut search = content;
    while let Some(pos) = search.find('>') {
        let candidate = &search[pos + 1..];
        if let Some(head) = candidate.get(..10)
            && let Ok(date) = NaiveDate::parse_from_str(head, "%Y-%m-%d")
        {
            return Some(date);
        }
        search = candidate;
    }
    None
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .or_else(|| s.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')))
        .unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const NOTE: &str = "\
# Website relaunch
#project @start(2025-01-06) @review(2w) @reviewed(2025-02-01)
Progress: 30@2025-02-01: design signed off

## Tasks
* [x] Pick a theme
* [ ] Migrate blog posts >2025-03-01
- [-] Old analytics
+ [ ] Check DNS #waiting
* Write launch email
- a plain bullet
";

    #[test]
    fn parses_title_and_types() {
        let note = parse_note("Work/website.md", NOTE);
        assert_eq!(note.title.as_deref(), Some("Website relaunch"));
        assert_eq!(note.folder, "Work");
        let kinds: Vec<ParagraphType> = note.paragraphs.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ParagraphType::Title,
                ParagraphType::Text,
                ParagraphType::Text,
                ParagraphType::Empty,
                ParagraphType::Heading,
                ParagraphType::Done,
                ParagraphType::Open,
                ParagraphType::Cancelled,
                ParagraphType::ChecklistOpen,
                ParagraphType::Open,
                ParagraphType::Text,
            ]
        );
        assert_eq!(note.paragraphs[6].content, "Migrate blog posts >2025-03-01");
        assert_eq!(note.paragraphs[6].raw_content, "* [ ] Migrate blog posts >2025-03-01");
        assert_eq!(note.paragraphs[6].scheduled, NaiveDate::from_ymd_opt(2025, 3, 1));
    }

    #[test]
    fn collects_hashtags_and_mentions() {
        let note = parse_note("website.md", NOTE);
        assert_eq!(note.hashtags, vec!["#project", "#waiting"]);
        assert_eq!(
            note.mentions,
            vec!["@start(2025-01-06)", "@review(2w)", "@reviewed(2025-02-01)"]
        );
        assert_eq!(note.folder, "/");
    }

    #[test]
    fn metadata_line_is_first_line_after_title() {
        let note = parse_note("website.md", NOTE);
        let meta = note.metadata_line().unwrap();
        assert_eq!(meta.line_index, 1);
        assert_eq!(note.metadata_insert_index(), 1);
    }

    #[test]
    fn no_metadata_line_when_first_line_is_plain_text() {
        let note = parse_note("a.md", "# A\nJust some prose\n#project later");
        assert!(note.metadata_line().is_none());
    }

    #[test]
    fn frontmatter_attributes_and_title() {
        let text = "---\ntitle: \"From frontmatter\"\nteamspace: team-1\nicon: rocket\n---\n# Heading title\n#area\n";
        let note = parse_note("f.md", text);
        assert_eq!(note.title.as_deref(), Some("From frontmatter"));
        assert_eq!(note.teamspace.as_deref(), Some("team-1"));
        assert_eq!(note.frontmatter.get("icon").map(String::as_str), Some("rocket"));
        assert_eq!(note.paragraphs[1].kind, ParagraphType::Frontmatter);
        assert_eq!(note.paragraphs[4].kind, ParagraphType::Separator);
        assert_eq!(note.paragraphs[5].kind, ParagraphType::Title);
        assert_eq!(note.metadata_line().unwrap().line_index, 6);
        assert_eq!(note.hashtags, vec!["#area"]);
    }

    #[test]
    fn note_without_title() {
        let note = parse_note("untitled.md", "just text\n* [ ] task");
        assert!(note.title.is_none());
        assert_eq!(note.metadata_insert_index(), 0);
    }

    #[test]
    fn unterminated_frontmatter_is_body() {
        let note = parse_note("x.md", "---\ntitle: nope\n# Real");
        assert_eq!(note.title.as_deref(), Some("Real"));
        assert!(note.frontmatter.is_empty());
    }
}
