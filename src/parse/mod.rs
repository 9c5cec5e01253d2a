pub mod interval;
pub mod mentions;
pub mod note_parser;
pub mod progress;

pub use interval::{Interval, IntervalUnit, ParseError, offset};
pub use mentions::{extract_hashtags, extract_mentions, mention_date, mention_value};
pub use note_parser::parse_note;
pub use progress::{ProgressRecord, format_progress_line, most_recent_progress};
