pub mod project_actions;
pub mod project_ops;
pub mod queue;
pub mod review_dates;

pub use project_actions::{ActionError, Actions, SkipUntil};
pub use project_ops::{ProjectError, build_project};
pub use queue::{QueueOptions, filter_and_sort, next_n_ready, next_ready};
pub use review_dates::recompute;
