mod cli;
mod print;

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Command};
use deduper::config::Config;
use deduper::store::Store;
use deduper::Scanner;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = Config::load();
    init_logging(cli.verbose.max(config.default_verbosity));

    match run(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// `-v` repeat-count to level mapping, spec.md 6: none = warn, `-v` = info,
/// `-vv` (or higher) = debug.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli, mut config: Config) -> Result<()> {
    let result = match cli.command {
        Command::Scan {
            paths,
            force,
            print_tables,
            browse,
        } => scan(&cli.db, force, &paths, &print_tables, browse),
        Command::Hash => hash(&cli.db),
        Command::Print { tables } => print(&cli.db, &tables),
    };

    // Remember this invocation's db path regardless of outcome, so the next
    // run's config-derived verbosity floor still reflects recent usage.
    config.last_db_path = Some(cli.db.clone());
    config.default_verbosity = config.default_verbosity.max(cli.verbose);
    let _ = config.save();

    result
}

fn scan(db: &Path, force: bool, paths: &[std::path::PathBuf], print_tables: &[String], browse: bool) -> Result<()> {
    let store = Store::open(db, force).with_context(|| format!("opening catalog at {}", db.display()))?;
    let mut scanner = Scanner::new(store);

    for path in paths {
        scanner
            .scan(path)
            .with_context(|| format!("scanning {}", path.display()))?;
    }

    let store = scanner.into_store();
    for table in print_tables {
        print::dump_table(store.conn(), table)?;
    }

    if browse {
        launch_browser(db)?;
    }

    Ok(())
}

fn hash(db: &Path) -> Result<()> {
    let store = Store::open(db, false).with_context(|| format!("opening catalog at {}", db.display()))?;
    let mut scanner = Scanner::new(store);
    scanner.hash().context("running hash phase")?;
    Ok(())
}

fn print(db: &Path, tables: &[String]) -> Result<()> {
    let store = Store::open(db, false).with_context(|| format!("opening catalog at {}", db.display()))?;

    let names: Vec<String> = if tables.iter().any(|t| t == "all") {
        print::all_tables().iter().map(|s| s.to_string()).collect()
    } else {
        tables.to_vec()
    };

    for table in &names {
        print::dump_table(store.conn(), table)?;
    }

    Ok(())
}

/// Best-effort launch of the externally configured table browser (spec.md
/// 6: "`-b/--browse`, launch an external table browser"). The browser
/// itself is an out-of-scope external collaborator (spec.md 1); a missing
/// configuration just skips the launch rather than failing the scan.
fn launch_browser(db: &Path) -> Result<()> {
    let config = Config::load();
    let Some(command) = config.table_browser else {
        log::warn!("--browse requested but no table_browser is configured; skipping");
        return Ok(());
    };

    std::process::Command::new(&command)
        .arg(db)
        .spawn()
        .with_context(|| format!("launching table browser `{command}`"))?;
    Ok(())
}
