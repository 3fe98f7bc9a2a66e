//! Owns the single catalog connection and the transaction-scope primitive
//! (spec.md 4.C "Transaction scope").
//!
//! `with_transaction` wraps a closure in manual `BEGIN`/`COMMIT`/`ROLLBACK`,
//! the idiomatic-Rust analogue of `original_source/db.py`'s
//! `contextmanager`-based `db.transaction()`: enter opens `BEGIN`, a normal
//! return commits, any `Err` rolls back. Transactions never nest (spec.md
//! 5) — every call site holds `&Connection` for the scope of one
//! `with_transaction` call and there is no re-entrant call path, so nesting
//! is a compile-time impossibility, not a runtime check.

use rusqlite::Connection;
use std::path::Path;

use crate::store::schema;

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Opens (or creates) the catalog at `path`. Resets the schema if the
    /// path is new, `:memory:`, or `overwrite_db` is requested.
    pub fn open(path: &Path, overwrite_db: bool) -> rusqlite::Result<Self> {
        let fresh = overwrite_db || schema::is_fresh_path(path);

        let conn = if path.as_os_str() == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };

        // Must happen before any transaction starts (spec.md 5) — toggling
        // foreign_keys mid-transaction is silently ignored by SQLite.
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        if fresh {
            schema::reset(&conn)?;
        }

        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Runs `f` inside its own `BEGIN`/`COMMIT` pair on an already-borrowed
/// connection — the transaction-scope primitive every real call site in this
/// crate uses (the duplicate engine's multi-row lifecycle updates, spec.md
/// 4.D.1 step 3 and 4.D.2 step 2). `rusqlite::Connection::execute` takes
/// `&self`, so `BEGIN`/`COMMIT`/`ROLLBACK` can be sent without exclusive
/// access to the `Store`. Not used for single-statement writes, which SQLite
/// already commits atomically on its own.
pub fn with_transaction<F, T>(conn: &Connection, f: F) -> rusqlite::Result<T>
where
    F: FnOnce() -> rusqlite::Result<T>,
{
    conn.execute_batch("BEGIN")?;
    match f() {
        Ok(value) => {
            conn.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK");
            Err(e)
        }
    }
}
