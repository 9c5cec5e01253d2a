use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::commands::InitArgs;
use crate::io::config_io::{self, CONFIG_FILE, CONFIG_TEMPLATE};

/// `revu init`: create `.revu/` in the notes directory (or `-C` dir)
pub fn cmd_init(args: InitArgs, notes_dir: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let root = match notes_dir {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir()?,
    };
    if !root.is_dir() {
        return Err(format!("not a directory: {}", root.display()).into());
    }

    let state_dir = config_io::state_dir(&root);
    if state_dir.is_dir() && !args.force {
        return Err(format!(
            "already initialized: {} exists (use --force to reset config.toml)",
            state_dir.display()
        )
        .into());
    }

    // Warn when an enclosing directory is already a notes root
    if let Some(parent) = root.parent()
        && let Ok(outer) = config_io::discover_notes_root(parent)
    {
        eprintln!("note: enclosing notes directory found at {}/", outer.display());
    }

    let dir = config_io::init_state_dir(&root)?;
    if args.force {
        fs::write(dir.join(CONFIG_FILE), CONFIG_TEMPLATE)?;
    }

    println!("Initialized revu in {}", display_dir(&dir));
    Ok(())
}

fn display_dir(dir: &Path) -> String {
    format!("{}/", dir.display())
}
