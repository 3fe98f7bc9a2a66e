//! Command-line surface (spec.md 6).
//!
//! Grounded on `ae6bdb9e_wkemmey-deduplifier`'s `clap::Parser`-derived
//! `Args` struct — `dwetterau-photo-manager` has no CLI surface of its own
//! (it's invoked entirely through Tauri commands), so this shape is
//! imported wholesale from elsewhere in the retrieval pack.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "deduper")]
#[command(about = "Catalogs a filesystem tree and materializes duplicate-group equivalence classes")]
pub struct Cli {
    /// Path to the catalog database.
    #[arg(long, global = true, default_value = "deduper.db")]
    pub db: PathBuf,

    /// Increase log verbosity: none = warn, -v = info, -vv = debug.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Drive a scan against one or more root directories.
    Scan {
        /// Root directories to walk.
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Drop and recreate the catalog before scanning.
        #[arg(short, long)]
        force: bool,

        /// Dump these tables on completion (repeatable).
        #[arg(short = 'p', long = "print", value_name = "TABLE")]
        print_tables: Vec<String>,

        /// Launch an external table browser on completion.
        #[arg(short, long)]
        browse: bool,
    },

    /// Run the hash phase standalone over an already-scanned catalog.
    Hash,

    /// Dump named tables (or all, if none are named).
    Print {
        #[arg(default_value = "all")]
        tables: Vec<String>,
    },
}
