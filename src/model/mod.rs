pub mod config;
pub mod dates;
pub mod note;
pub mod project;

pub use config::*;
pub use note::*;
pub use project::*;
