mod init;
pub use init::cmd_init;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io::{self, PREFS_FILE};
use crate::io::{
    CacheStore, FsNoteStore, JsonCacheStore, NoteHandle, NoteStore, ProjectIndex, TomlPreferences,
};
use crate::model::config::{DisplayOrder, ReviewConfig};
use crate::model::dates::{self, parse_iso_date};
use crate::model::project::Project;
use crate::parse::ParseError;
use crate::ops::{
    ActionError, Actions, QueueOptions, SkipUntil, build_project, filter_and_sort, next_n_ready,
    recompute,
};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let notes_dir = cli.notes_dir.as_deref();

    let command = match cli.command {
        Commands::Init(args) => return cmd_init(args, notes_dir),
        command => command,
    };

    let mut ctx = Context::load(notes_dir)?;
    match command {
        // Handled above, before notes-root discovery
        Commands::Init(_) => Ok(()),

        // Read commands
        Commands::Next(args) => cmd_next(&mut ctx, args, json),
        Commands::List(args) => cmd_list(&mut ctx, args, json),
        Commands::Show(args) => cmd_show(&mut ctx, args, json),
        Commands::Status => cmd_status(&mut ctx, json),

        // Write commands
        Commands::Reviewed(args) => with_action(&mut ctx, &args.file, json, "Reviewed", |a, p, n| {
            a.finish_review(p, n)
        }),
        Commands::Skip(args) => cmd_skip(&mut ctx, args, json),
        Commands::Interval(args) => {
            with_action(&mut ctx, &args.file, json, "Interval set", |a, p, n| {
                a.set_review_interval(p, n, &args.interval)
            })
        }
        Commands::Complete(args) => with_action(&mut ctx, &args.file, json, "Completed", |a, p, n| {
            a.complete(p, n)
        }),
        Commands::Cancel(args) => with_action(&mut ctx, &args.file, json, "Cancelled", |a, p, n| {
            a.cancel(p, n)
        }),
        Commands::Pause(args) => cmd_pause(&mut ctx, args, json),
        Commands::Progress(args) => cmd_progress(&mut ctx, args, json),

        // Maintenance
        Commands::Regenerate => cmd_regenerate(&mut ctx, json),
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Everything a command needs, loaded from the notes root
struct Context {
    config: ReviewConfig,
    notes: FsNoteStore,
    cache: JsonCacheStore,
    prefs: TomlPreferences,
}

impl Context {
    fn load(notes_dir: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        let start = match notes_dir {
            Some(dir) => std::fs::canonicalize(dir)
                .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?,
            None => std::env::current_dir()?,
        };
        let root = config_io::discover_notes_root(&start)?;
        let config = config_io::load_config(&root)?;
        let state_dir = config_io::state_dir(&root);
        let cache = JsonCacheStore::new(state_dir.join(&config.cache.file));
        let prefs = TomlPreferences::load(state_dir.join(PREFS_FILE))?;
        tracing::debug!(root = %root.display(), "loaded notes directory");

        Ok(Context {
            notes: FsNoteStore::new(root),
            config,
            cache,
            prefs,
        })
    }

    fn index(&mut self) -> ProjectIndex<'_> {
        ProjectIndex::new(&self.notes, &mut self.cache, &mut self.prefs, &self.config)
    }

    fn today(&self) -> chrono::NaiveDate {
        dates::today()
    }

    /// Indexed projects for `filename`, or ones built on the spot when the
    /// note isn't indexed yet
    fn projects_for(&mut self, filename: &str) -> Result<Vec<Project>, Box<dyn std::error::Error>> {
        let indexed: Vec<Project> = self
            .index()
            .read_all()?
            .into_iter()
            .filter(|p| p.filename == filename)
            .collect();
        if !indexed.is_empty() {
            return Ok(indexed);
        }
        if !self.notes.exists(filename) {
            return Err(format!("note not found: {}", filename).into());
        }
        let note = self.notes.read_note(filename)?;
        Ok(vec![build_project(&note, None, &self.config, self.today())?])
    }
}

/// Accept `./Work/a.md` as well as `Work/a.md`
fn normalize_filename(file: &str) -> &str {
    file.trim_start_matches("./")
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_next(ctx: &mut Context, args: NextArgs, json: bool) -> CmdResult {
    let projects = ctx.index().read_all()?;
    let mut opts = QueueOptions::from_config(&ctx.config);
    opts.show_finished = false;
    opts.only_due = false;
    let sorted = filter_and_sort(&projects, &opts);
    let ready = next_n_ready(&sorted, args.count.unwrap_or(1), |f| ctx.notes.exists(f));

    if json {
        let out: Vec<_> = ready.iter().map(|p| project_to_json(p)).collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }
    if ready.is_empty() {
        println!("No projects ready for review");
        return Ok(());
    }
    for p in ready {
        println!("{}", format_project_line(p));
        println!("    {}", p.filename);
    }
    Ok(())
}

fn cmd_list(ctx: &mut Context, args: ListArgs, json: bool) -> CmdResult {
    let projects = ctx.index().read_all()?;
    let mut opts = QueueOptions::from_config(&ctx.config).with_tag(args.tag.as_deref());
    if args.all {
        opts.show_finished = true;
    }
    if args.due {
        opts.only_due = true;
    }
    if let Some(order) = args.order.as_deref() {
        opts.order = order.parse::<DisplayOrder>()?;
    }
    let sorted = filter_and_sort(&projects, &opts);

    if json {
        let out: Vec<_> = sorted.iter().map(project_to_json).collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }
    if sorted.is_empty() {
        println!("No projects");
        return Ok(());
    }

    let mut current_folder: Option<&str> = None;
    for p in &sorted {
        if opts.group_by_folder && current_folder != Some(p.folder.as_str()) {
            if current_folder.is_some() {
                println!();
            }
            println!("{}", format_folder_header(&p.folder));
            current_folder = Some(p.folder.as_str());
        }
        println!("{}", format_project_line(p));
    }
    Ok(())
}

fn cmd_show(ctx: &mut Context, args: FileArg, json: bool) -> CmdResult {
    let projects = ctx.projects_for(normalize_filename(&args.file))?;

    if json {
        let out: Vec<_> = projects.iter().map(project_to_json).collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }
    for (i, p) in projects.iter().enumerate() {
        if i > 0 {
            println!();
        }
        for line in format_project_detail(p) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_status(ctx: &mut Context, json: bool) -> CmdResult {
    let today = ctx.today();
    let projects: Vec<Project> = ctx
        .cache
        .load_all()?
        .unwrap_or_default()
        .iter()
        .map(|p| recompute(p, today))
        .collect();
    let (generated_at, stale) = {
        let index = ctx.index();
        (index.generated_at(), index.should_regenerate())
    };
    let status = StatusJson {
        notes_dir: ctx.notes.root().display().to_string(),
        cache_file: ctx.cache.path().display().to_string(),
        prefs_file: ctx.prefs.path().display().to_string(),
        generated_at: generated_at.map(|t| t.to_rfc3339()),
        stale,
        counts: count_states(&projects),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }
    println!("notes: {}", status.notes_dir);
    println!("index: {}", status.cache_file);
    match &status.generated_at {
        Some(at) => println!("generated: {}{}", at, if status.stale { " (stale)" } else { "" }),
        None => println!("generated: never"),
    }
    let c = &status.counts;
    println!(
        "projects: {} ({} active, {} paused, {} completed, {} cancelled)",
        c.projects, c.active, c.paused, c.completed, c.cancelled
    );
    println!("ready for review: {}", c.ready);
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

/// Run one note action, refresh the note's index entries and report
fn with_action<F>(ctx: &mut Context, file: &str, json: bool, verb: &str, f: F) -> CmdResult
where
    F: FnOnce(&Actions, &Project, &mut dyn NoteHandle) -> Result<Project, ActionError>,
{
    let filename = normalize_filename(file);
    let project = ctx
        .projects_for(filename)?
        .into_iter()
        .next()
        .ok_or_else(|| format!("no project in {}", filename))?;

    let updated = {
        let actions = Actions::new(&ctx.config, ctx.today());
        let mut note = ctx.notes.open(filename)?;
        f(&actions, &project, note.as_mut())?
    };
    ctx.index().update_one(filename, true)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&project_to_json(&updated))?);
    } else {
        println!("{}: {}", verb, updated.title);
        println!("{}", format_project_line(&updated));
    }
    Ok(())
}

fn cmd_skip(ctx: &mut Context, args: SkipArgs, json: bool) -> CmdResult {
    let until = match (args.interval, args.date) {
        (Some(spec), _) => SkipUntil::Interval(spec),
        (None, Some(date)) => {
            SkipUntil::Date(parse_iso_date(&date).ok_or(ParseError::InvalidDate(date))?)
        }
        (None, None) => return Err("give --interval or --date".into()),
    };
    with_action(ctx, &args.file, json, "Skipped", |a, p, n| a.skip_review(p, n, &until))
}

fn cmd_pause(ctx: &mut Context, args: FileArg, json: bool) -> CmdResult {
    let paused = ctx
        .projects_for(normalize_filename(&args.file))?
        .first()
        .is_some_and(|p| p.is_paused);
    let verb = if paused { "Resumed" } else { "Paused" };
    with_action(ctx, &args.file, json, verb, |a, p, n| a.toggle_pause(p, n))
}

fn cmd_progress(ctx: &mut Context, args: ProgressArgs, json: bool) -> CmdResult {
    let comment = args.comment.join(" ");
    with_action(ctx, &args.file, json, "Progress recorded", |a, p, n| {
        a.add_progress(p, n, args.percent, &comment)
    })
}

fn cmd_regenerate(ctx: &mut Context, json: bool) -> CmdResult {
    let projects = ctx.index().regenerate_all()?;
    if json {
        let counts = count_states(&projects);
        println!("{}", serde_json::to_string_pretty(&counts)?);
    } else {
        println!("Indexed {} projects", projects.len());
    }
    Ok(())
}
