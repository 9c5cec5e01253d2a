pub mod atomic;
pub mod cache_store;
pub mod config_io;
pub mod error;
pub mod lock;
pub mod note_store;
pub mod prefs;
pub mod project_index;

pub use cache_store::{CacheStore, JsonCacheStore, MemoryCacheStore};
pub use error::StoreError;
pub use note_store::{FsNoteStore, NoteHandle, NoteStore, ParagraphEdit};
pub use prefs::{MemoryPreferences, Preferences, TomlPreferences};
pub use project_index::{IndexError, ProjectIndex};
