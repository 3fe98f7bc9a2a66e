//! `print`/`scan -p` table dump (spec.md 6).
//!
//! Grounded on `dwetterau-photo-manager`'s direct `rusqlite::Row` access
//! (its now-removed `hash_cache.rs`) and on `ae6bdb9e_wkemmey-deduplifier`'s
//! `println!`-based reporting — this crate has no machine-readable output
//! contract (spec.md 6: "no machine-readable output is guaranteed on
//! stdout"), so a plain pipe-separated text dump is sufficient.

use anyhow::{bail, Result};
use rusqlite::types::Value;
use rusqlite::Connection;

const TABLES: &[&str] = &["dirs", "files", "duplicates", "photos"];

/// All table names `print`/`scan -p` accept, in a stable display order.
pub fn all_tables() -> &'static [&'static str] {
    TABLES
}

/// Dumps every row of `table` to stdout as a pipe-separated grid.
pub fn dump_table(conn: &Connection, table: &str) -> Result<()> {
    if !TABLES.contains(&table) {
        bail!("unknown table '{table}' (expected one of {TABLES:?})");
    }

    let mut stmt = conn.prepare(&format!("SELECT * FROM {table}"))?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    println!("== {table} ==");
    println!("{}", columns.join(" | "));

    let mut rows = stmt.query(())?;
    let mut count = 0usize;
    while let Some(row) = rows.next()? {
        let cells: Vec<String> = (0..columns.len())
            .map(|i| format_value(row.get(i).unwrap_or(Value::Null)))
            .collect();
        println!("{}", cells.join(" | "));
        count += 1;
    }
    println!("({count} rows)\n");

    Ok(())
}

fn format_value(value: Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s,
        Value::Blob(_) => "<blob>".to_string(),
    }
}
