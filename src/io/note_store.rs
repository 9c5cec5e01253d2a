use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::io::atomic::atomic_write;
use crate::io::error::StoreError;
use crate::model::note::{Note, NoteRef};
use crate::parse::parse_note;

/// File extensions treated as notes
pub const NOTE_EXTENSIONS: &[&str] = &["md", "txt"];

/// A single-line edit applied to a note
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParagraphEdit {
    /// Overwrite the line at `line_index`
    Replace { line_index: usize, content: String },
    /// Insert a new line so it ends up at `line_index`
    Insert { line_index: usize, content: String },
}

/// Read/write access to one note
pub trait NoteHandle {
    fn filename(&self) -> &str;
    fn read(&self) -> Result<Note, StoreError>;
    fn write(&mut self, edit: ParagraphEdit) -> Result<(), StoreError>;
}

/// A collection of notes addressed by relative filename
pub trait NoteStore {
    fn list_notes(&self) -> Result<Vec<NoteRef>, StoreError>;
    fn open(&self, filename: &str) -> Result<Box<dyn NoteHandle + '_>, StoreError>;
    fn exists(&self, filename: &str) -> bool;

    fn read_note(&self, filename: &str) -> Result<Note, StoreError> {
        self.open(filename)?.read()
    }
}

// ---------------------------------------------------------------------------
// Filesystem store
// ---------------------------------------------------------------------------

/// Notes stored as files under a root directory. Sub-directories are folders;
/// dot-directories (`.revu`, `.git`) are skipped.
pub struct FsNoteStore {
    root: PathBuf,
}

impl FsNoteStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsNoteStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative filename, refusing anything that escapes the root
    fn resolve(&self, filename: &str) -> Option<PathBuf> {
        let rel = Path::new(filename);
        if rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(rel))
    }

    fn walk(&self, dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), StoreError> {
        let entries = fs::read_dir(dir).map_err(|e| StoreError::Read {
            path: dir.to_path_buf(),
            source: e,
        })?;
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::Read {
                path: dir.to_path_buf(),
                source: e,
            })?;
            let path = entry.path();
            let name = entry.file_name();
            if name.to_string_lossy().starts_with('.') {
                continue;
            }
            if path.is_dir() {
                self.walk(&path, out)?;
            } else if is_note_file(&path) {
                out.push(path);
            }
        }
        Ok(())
    }
}

impl NoteStore for FsNoteStore {
    fn list_notes(&self) -> Result<Vec<NoteRef>, StoreError> {
        let mut paths = Vec::new();
        self.walk(&self.root, &mut paths)?;
        paths.sort();

        let mut refs = Vec::with_capacity(paths.len());
        for path in paths {
            let Some(filename) = relative_filename(&self.root, &path) else {
                continue;
            };
            match read_note_file(&path, &filename) {
                Ok(note) => refs.push(note.to_ref()),
                Err(e) => tracing::warn!("skipping unreadable note: {}", e),
            }
        }
        Ok(refs)
    }

    fn open(&self, filename: &str) -> Result<Box<dyn NoteHandle + '_>, StoreError> {
        let path = self
            .resolve(filename)
            .filter(|p| p.is_file())
            .ok_or_else(|| StoreError::NotFound(filename.to_string()))?;
        Ok(Box::new(FsNoteHandle {
            filename: filename.to_string(),
            path,
        }))
    }

    fn exists(&self, filename: &str) -> bool {
        self.resolve(filename).is_some_and(|p| p.is_file())
    }
}

/// A note file on disk
pub struct FsNoteHandle {
    filename: String,
    path: PathBuf,
}

impl NoteHandle for FsNoteHandle {
    fn filename(&self) -> &str {
        &self.filename
    }

    fn read(&self) -> Result<Note, StoreError> {
        read_note_file(&self.path, &self.filename)
    }

    fn write(&mut self, edit: ParagraphEdit) -> Result<(), StoreError> {
        let text = fs::read_to_string(&self.path).map_err(|e| StoreError::Read {
            path: self.path.clone(),
            source: e,
        })?;
        let updated = apply_edit(&text, &edit).ok_or_else(|| StoreError::LineOutOfRange {
            filename: self.filename.clone(),
            line: match &edit {
                ParagraphEdit::Replace { line_index, .. } => *line_index,
                ParagraphEdit::Insert { line_index, .. } => *line_index,
            },
        })?;
        atomic_write(&self.path, updated.as_bytes()).map_err(|e| StoreError::Write {
            path: self.path.clone(),
            source: e,
        })?;
        tracing::debug!(file = %self.filename, ?edit, "note updated");
        Ok(())
    }
}

/// Apply an edit to note text, keeping a trailing newline if there was one.
/// Returns `None` when the line index is out of range.
pub fn apply_edit(text: &str, edit: &ParagraphEdit) -> Option<String> {
    let mut lines: Vec<&str> = text.lines().collect();
    match edit {
        ParagraphEdit::Replace {
            line_index,
            content,
        } => {
            let slot = lines.get_mut(*line_index)?;
            *slot = content.as_str();
        }
        ParagraphEdit::Insert {
            line_index,
            content,
        } => {
            if *line_index > lines.len() {
                return None;
            }
            lines.insert(*line_index, content.as_str());
        }
    }
    // Keep the note's own line endings
    let newline = if text.contains("\r\n") { "\r\n" } else { "\n" };
    let mut out = lines.join(newline);
    if text.ends_with('\n') || text.is_empty() {
        out.push_str(newline);
    }
    Some(out)
}

fn read_note_file(path: &Path, filename: &str) -> Result<Note, StoreError> {
    let text = fs::read_to_string(path).map_err(|e| StoreError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut note = parse_note(filename, &text);
    note.changed = fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Utc>::from);
    Ok(note)
}

fn is_note_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| NOTE_EXTENSIONS.contains(&e))
}

/// `root/a/b.md` → `a/b.md`, always with `/` separators
fn relative_filename(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}
