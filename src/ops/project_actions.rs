use chrono::NaiveDate;

use crate::io::error::StoreError;
use crate::io::note_store::{NoteHandle, ParagraphEdit};
use crate::model::config::ReviewConfig;
use crate::model::dates::format_iso_date;
use crate::model::note::ParagraphType;
use crate::model::project::{Project, ProjectState};
use crate::ops::project_ops::{PAUSED_TAG, ProjectError, build_project};
use crate::parse::interval::{Interval, ParseError};
use crate::parse::mentions::{
    add_hashtag, has_mention, line_has_hashtag, remove_hashtag, remove_mention, set_mention,
};
use crate::parse::progress::format_progress_line;

/// Error type for review actions
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("'{title}' is already {state}")]
    AlreadyFinished { title: String, state: ProjectState },
    #[error("'{0}' is still paused: #paused could not be removed from every line")]
    StillPaused(String),
    #[error("percent must be between 0 and 100, got {0}")]
    InvalidPercent(u8),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Project(#[from] ProjectError),
}

/// Where a skipped review lands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipUntil {
    Date(NaiveDate),
    /// Interval spec applied to today, e.g. `3d`
    Interval(String),
}

/// Note actions work against one note and hand back a freshly built
/// project; the project passed in is left untouched.
pub struct Actions<'a> {
    pub config: &'a ReviewConfig,
    pub today: NaiveDate,
}

impl<'a> Actions<'a> {
    pub fn new(config: &'a ReviewConfig, today: NaiveDate) -> Self {
        Actions { config, today }
    }

    // -----------------------------------------------------------------------
    // Review cadence
    // -----------------------------------------------------------------------

    /// Mark reviewed today and drop any explicit next-review date
    pub fn finish_review(
        &self,
        project: &Project,
        note: &mut dyn NoteHandle,
    ) -> Result<Project, ActionError> {
        let tokens = &self.config.mentions;
        let today = format_iso_date(self.today);
        self.edit_metadata(project, note, |line| {
            let line = set_mention(line, &tokens.reviewed, &today);
            remove_mention(&line, &tokens.next_review)
        })?;
        self.edit_body_lines(
            note,
            |line| has_mention(line, &tokens.next_review),
            |line| remove_mention(line, &tokens.next_review),
        )?;
        tracing::info!(file = %project.filename, "review finished");
        self.rebuild(project, note)
    }

    /// Push the next review out without marking the project reviewed
    pub fn skip_review(
        &self,
        project: &Project,
        note: &mut dyn NoteHandle,
        until: &SkipUntil,
    ) -> Result<Project, ActionError> {
        let date = match until {
            SkipUntil::Date(date) => *date,
            SkipUntil::Interval(spec) => Interval::parse(spec)?.offset(self.today)?,
        };
        let value = format_iso_date(date);
        let token = &self.config.mentions.next_review;
        self.edit_metadata(project, note, |line| set_mention(line, token, &value))?;
        tracing::info!(file = %project.filename, until = %value, "review skipped");
        self.rebuild(project, note)
    }

    pub fn set_review_interval(
        &self,
        project: &Project,
        note: &mut dyn NoteHandle,
        spec: &str,
    ) -> Result<Project, ActionError> {
        let interval = Interval::parse(spec)?.to_string();
        let token = &self.config.mentions.review_interval;
        self.edit_metadata(project, note, |line| set_mention(line, token, &interval))?;
        self.rebuild(project, note)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    pub fn complete(
        &self,
        project: &Project,
        note: &mut dyn NoteHandle,
    ) -> Result<Project, ActionError> {
        ensure_open(project)?;
        let today = format_iso_date(self.today);
        let token = &self.config.mentions.completed;
        self.edit_metadata(project, note, |line| set_mention(line, token, &today))?;
        tracing::info!(file = %project.filename, "project completed");
        self.rebuild(project, note)
    }

    pub fn cancel(
        &self,
        project: &Project,
        note: &mut dyn NoteHandle,
    ) -> Result<Project, ActionError> {
        ensure_open(project)?;
        let today = format_iso_date(self.today);
        let token = &self.config.mentions.cancelled;
        self.edit_metadata(project, note, |line| set_mention(line, token, &today))?;
        tracing::info!(file = %project.filename, "project cancelled");
        self.rebuild(project, note)
    }

    /// Pause or resume. Pausing also counts as a review.
    pub fn toggle_pause(
        &self,
        project: &Project,
        note: &mut dyn NoteHandle,
    ) -> Result<Project, ActionError> {
        ensure_open(project)?;
        let today = format_iso_date(self.today);
        let reviewed = &self.config.mentions.reviewed;
        let pausing = !project.is_paused;
        self.edit_metadata(project, note, |line| {
            if pausing {
                let line = add_hashtag(line, PAUSED_TAG);
                set_mention(&line, reviewed, &today)
            } else {
                remove_hashtag(line, PAUSED_TAG)
            }
        })?;
        if !pausing {
            self.edit_body_lines(
                note,
                |line| line_has_hashtag(line, PAUSED_TAG),
                |line| remove_hashtag(line, PAUSED_TAG),
            )?;
        }
        tracing::info!(file = %project.filename, paused = pausing, "pause toggled");
        let updated = self.rebuild(project, note)?;
        if !pausing && updated.is_paused {
            return Err(ActionError::StillPaused(updated.title));
        }
        Ok(updated)
    }

    // -----------------------------------------------------------------------
    // Progress
    // -----------------------------------------------------------------------

    /// Insert a dated `Progress:` line right after the metadata line
    pub fn add_progress(
        &self,
        project: &Project,
        note: &mut dyn NoteHandle,
        percent: Option<u8>,
        comment: &str,
    ) -> Result<Project, ActionError> {
        if let Some(p) = percent
            && p > 100
        {
            return Err(ActionError::InvalidPercent(p));
        }

        let mut parsed = note.read()?;
        if parsed.metadata_line().is_none() {
            self.edit_metadata(project, note, |line| line.to_string())?;
            parsed = note.read()?;
        }
        let line_index = parsed
            .metadata_line()
            .map(|m| m.line_index + 1)
            .unwrap_or_else(|| parsed.metadata_insert_index());

        note.write(ParagraphEdit::Insert {
            line_index,
            content: format_progress_line(percent, self.today, comment),
        })?;
        self.rebuild(project, note)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Rewrite the metadata line with `f`. A note without one gets a new
    /// line after the title, seeded with the project tag.
    fn edit_metadata<F>(
        &self,
        project: &Project,
        note: &mut dyn NoteHandle,
        f: F,
    ) -> Result<(), ActionError>
    where
        F: FnOnce(&str) -> String,
    {
        let parsed = note.read()?;
        let edit = match parsed.metadata_line() {
            Some(meta) => ParagraphEdit::Replace {
                line_index: meta.line_index,
                content: f(&meta.raw_content),
            },
            None => ParagraphEdit::Insert {
                line_index: parsed.metadata_insert_index(),
                content: f(&project.project_tag),
            },
        };
        note.write(edit)?;
        Ok(())
    }

    /// Rewrite every body line that `matches` with `f`. Tags and mentions
    /// count wherever they appear in a note, so clearing one means clearing
    /// it everywhere.
    fn edit_body_lines<M, F>(
        &self,
        note: &mut dyn NoteHandle,
        matches: M,
        f: F,
    ) -> Result<(), ActionError>
    where
        M: Fn(&str) -> bool,
        F: Fn(&str) -> String,
    {
        let parsed = note.read()?;
        let edits: Vec<ParagraphEdit> = parsed
            .paragraphs
            .iter()
            .filter(|p| {
                !matches!(
                    p.kind,
                    ParagraphType::Frontmatter | ParagraphType::Separator | ParagraphType::Title
                )
            })
            .filter(|p| matches(&p.raw_content))
            .map(|p| ParagraphEdit::Replace {
                line_index: p.line_index,
                content: f(&p.raw_content),
            })
            .collect();
        for edit in edits {
            note.write(edit)?;
        }
        Ok(())
    }

    fn rebuild(&self, project: &Project, note: &dyn NoteHandle) -> Result<Project, ActionError> {
        let parsed = note.read()?;
        let tag = Some(project.project_tag.as_str()).filter(|t| !t.is_empty());
        Ok(build_project(&parsed, tag, self.config, self.today)?)
    }
}

fn ensure_open(project: &Project) -> Result<(), ActionError> {
    if project.is_finished() {
        return Err(ActionError::AlreadyFinished {
            title: project.title.clone(),
            state: project.state(),
        });
    }
    Ok(())
}
