use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Folder name used for notes that live directly in the notes root
pub const ROOT_FOLDER: &str = "/";

/// Kind of a single line in a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParagraphType {
    Title,
    Heading,
    Open,
    Done,
    Cancelled,
    Scheduled,
    ChecklistOpen,
    ChecklistDone,
    ChecklistCancelled,
    ChecklistScheduled,
    Frontmatter,
    Separator,
    Empty,
    Text,
}

impl ParagraphType {
    /// Open task or open checklist item
    pub fn is_open_item(self) -> bool {
        matches!(self, ParagraphType::Open | ParagraphType::ChecklistOpen)
    }

    /// Completed task or completed checklist item
    pub fn is_completed_item(self) -> bool {
        matches!(self, ParagraphType::Done | ParagraphType::ChecklistDone)
    }

    /// Parse the character inside a `[ ]` box for a task (`checklist = false`)
    /// or a checklist item (`checklist = true`).
    pub fn from_box_char(c: char, checklist: bool) -> Option<ParagraphType> {
        let kind = match (c, checklist) {
            (' ', false) => ParagraphType::Open,
            ('x' | 'X', false) => ParagraphType::Done,
            ('-', false) => ParagraphType::Cancelled,
            ('>', false) => ParagraphType::Scheduled,
            (' ', true) => ParagraphType::ChecklistOpen,
            ('x' | 'X', true) => ParagraphType::ChecklistDone,
            ('-', true) => ParagraphType::ChecklistCancelled,
            ('>', true) => ParagraphType::ChecklistScheduled,
            _ => return None,
        };
        Some(kind)
    }
}

/// One line of a note, typed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    /// 0-indexed line number in the note file
    pub line_index: usize,
    pub kind: ParagraphType,
    /// Text with list/task markers stripped
    pub content: String,
    /// The full original line
    pub raw_content: String,
    /// `>YYYY-MM-DD` scheduling date found in the content
    pub scheduled: Option<NaiveDate>,
}

/// A parsed note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    /// Path relative to the notes root, using `/` separators
    pub filename: String,
    /// Containing folder (`/` for the root)
    pub folder: String,
    /// Frontmatter `title`, else the first `# ` heading
    pub title: Option<String>,
    /// Frontmatter attributes in declaration order
    pub frontmatter: IndexMap<String, String>,
    pub paragraphs: Vec<Paragraph>,
    /// Distinct `#hashtags` in first-seen order (with the `#`)
    pub hashtags: Vec<String>,
    /// Distinct `@mentions` in first-seen order, payload included
    pub mentions: Vec<String>,
    /// Last modification time, when the store knows it
    pub changed: Option<DateTime<Utc>>,
    /// Teamspace the note belongs to (frontmatter `teamspace`)
    pub teamspace: Option<String>,
}

impl Note {
    /// Index of the title paragraph, if the note has a heading title
    pub fn title_line_index(&self) -> Option<usize> {
        self.paragraphs
            .iter()
            .find(|p| p.kind == ParagraphType::Title)
            .map(|p| p.line_index)
    }

    /// The line after the title (or after the frontmatter) where new
    /// metadata should be inserted.
    pub fn metadata_insert_index(&self) -> usize {
        if let Some(idx) = self.title_line_index() {
            return idx + 1;
        }
        self.paragraphs
            .iter()
            .take_while(|p| matches!(p.kind, ParagraphType::Frontmatter | ParagraphType::Separator))
            .count()
    }

    /// The metadata line: the first non-empty text line after the title,
    /// provided it carries a hashtag, an @mention, or a `project:`/`metadata:`
    /// prefix.
    pub fn metadata_line(&self) -> Option<&Paragraph> {
        let start = self.metadata_insert_index();
        let candidate = self
            .paragraphs
            .iter()
            .skip(start)
            .find(|p| p.kind != ParagraphType::Empty)?;
        if candidate.kind != ParagraphType::Text {
            return None;
        }
        let lower = candidate.content.to_lowercase();
        let has_prefix = lower.starts_with("project:") || lower.starts_with("metadata:");
        let has_tokens = !crate::parse::extract_hashtags(&candidate.content).is_empty()
            || !crate::parse::extract_mentions(&candidate.content).is_empty();
        if has_prefix || has_tokens {
            Some(candidate)
        } else {
            None
        }
    }

    pub fn has_hashtag(&self, tag: &str) -> bool {
        self.hashtags.iter().any(|t| t == tag)
    }

    /// Lightweight reference used when scanning the store
    pub fn to_ref(&self) -> NoteRef {
        NoteRef {
            filename: self.filename.clone(),
            folder: self.folder.clone(),
            hashtags: self.hashtags.clone(),
            mentions: self.mentions.clone(),
            changed: self.changed,
            teamspace: self.teamspace.clone(),
        }
    }
}

/// What a note store reports about a note without handing out its content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRef {
    pub filename: String,
    pub folder: String,
    pub hashtags: Vec<String>,
    pub mentions: Vec<String>,
    pub changed: Option<DateTime<Utc>>,
    pub teamspace: Option<String>,
}

/// Folder portion of a note filename (`/` for notes in the root)
pub fn folder_of(filename: &str) -> String {
    match filename.rsplit_once('/') {
        Some((folder, _)) if !folder.is_empty() => folder.to_string(),
        _ => ROOT_FOLDER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_of_nested_and_root() {
        assert_eq!(folder_of("Projects/Work/plan.md"), "Projects/Work");
        assert_eq!(folder_of("plan.md"), "/");
    }

    #[test]
    fn box_chars() {
        assert_eq!(ParagraphType::from_box_char('x', false), Some(ParagraphType::Done));
        assert_eq!(
            ParagraphType::from_box_char(' ', true),
            Some(ParagraphType::ChecklistOpen)
        );
        assert_eq!(ParagraphType::from_box_char('?', false), None);
        assert!(ParagraphType::ChecklistOpen.is_open_item());
        assert!(!ParagraphType::Scheduled.is_open_item());
    }
}
