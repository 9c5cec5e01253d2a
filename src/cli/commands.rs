use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "revu", about = concat!("revu v", env!("CARGO_PKG_VERSION"), " - periodic reviews for project notes"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different notes directory
    #[arg(short = 'C', long = "notes-dir", global = true)]
    pub notes_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up .revu/ in the current notes directory
    Init(InitArgs),
    /// Show the next project(s) due for review
    Next(NextArgs),
    /// List projects in review order
    List(ListArgs),
    /// Show one project in detail
    Show(FileArg),
    /// Mark a project reviewed today
    Reviewed(FileArg),
    /// Postpone a project's next review
    Skip(SkipArgs),
    /// Set a project's review interval
    Interval(IntervalArgs),
    /// Mark a project completed
    Complete(FileArg),
    /// Mark a project cancelled
    Cancel(FileArg),
    /// Pause or resume a project
    Pause(FileArg),
    /// Record progress on a project
    Progress(ProgressArgs),
    /// Rebuild the project index from the notes
    Regenerate,
    /// Show index status and counts
    Status,
}

// ---------------------------------------------------------------------------
// Args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing config.toml with the starter config
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct NextArgs {
    /// How many projects to show (0 = all that are due)
    #[arg(short = 'n', long)]
    pub count: Option<usize>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Only projects with this tag
    #[arg(long)]
    pub tag: Option<String>,
    /// Include completed and cancelled projects
    #[arg(long)]
    pub all: bool,
    /// Only projects due for review
    #[arg(long)]
    pub due: bool,
    /// Sort order: review, due, title
    #[arg(long)]
    pub order: Option<String>,
}

#[derive(Args)]
pub struct FileArg {
    /// Note filename, relative to the notes directory
    pub file: String,
}

#[derive(Args)]
#[command(group = clap::ArgGroup::new("until").required(true).args(["interval", "date"]))]
pub struct SkipArgs {
    /// Note filename, relative to the notes directory
    pub file: String,
    /// Skip by an interval from today, e.g. 3d, 2w
    #[arg(long)]
    pub interval: Option<String>,
    /// Skip until a date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Args)]
pub struct IntervalArgs {
    /// Note filename, relative to the notes directory
    pub file: String,
    /// New interval, e.g. 1w, 2m, 1q
    pub interval: String,
}

#[derive(Args)]
pub struct ProgressArgs {
    /// Note filename, relative to the notes directory
    pub file: String,
    /// Percent complete (0-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub percent: Option<u8>,
    /// Progress comment
    #[arg(num_args = 1.., trailing_var_arg = true)]
    pub comment: Vec<String>,
}
