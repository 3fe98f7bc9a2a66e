//! Schema DDL and initialization policy (spec.md 4.C).
//!
//! Grounded on `dwetterau-photo-manager`'s `HashCache::open()` (`CREATE
//! TABLE IF NOT EXISTS` + indexes in one `execute_batch`) and on
//! `original_source/db.py`'s `_dropAll`/`initialize`, generalized from a
//! single-table hash cache to the full four-table catalog.

use rusqlite::Connection;
use std::path::Path;

const SCHEMA_SQL: &str = r#"
    CREATE TABLE duplicates (
        id INTEGER PRIMARY KEY,
        type TEXT NOT NULL CHECK (type IN ('file', 'dir'))
    );

    CREATE TABLE dirs (
        id INTEGER PRIMARY KEY,
        path TEXT NOT NULL UNIQUE,
        parent_dir INTEGER REFERENCES dirs(id),
        depth INTEGER NOT NULL CHECK (depth >= 0),
        hash TEXT,
        duplicate_id INTEGER REFERENCES duplicates(id)
    );

    CREATE TABLE files (
        id INTEGER PRIMARY KEY,
        path TEXT NOT NULL UNIQUE,
        size INTEGER NOT NULL CHECK (size >= 0),
        parent_dir INTEGER NOT NULL REFERENCES dirs(id),
        partial_hash TEXT,
        complete_hash TEXT,
        duplicate_id INTEGER REFERENCES duplicates(id)
    );

    CREATE TABLE photos (
        id INTEGER PRIMARY KEY,
        file_id INTEGER NOT NULL REFERENCES files(id),
        image_hash TEXT,
        data_json TEXT
    );

    CREATE INDEX idx_files_parent_dir ON files(parent_dir);
    CREATE INDEX idx_files_partial_hash ON files(partial_hash);
    CREATE INDEX idx_files_complete_hash ON files(complete_hash);
    CREATE INDEX idx_files_duplicate_id ON files(duplicate_id);
    CREATE INDEX idx_dirs_hash ON dirs(hash);
    CREATE INDEX idx_dirs_duplicate_id ON dirs(duplicate_id);
    CREATE INDEX idx_photos_file_id ON photos(file_id);
    CREATE INDEX idx_photos_image_hash ON photos(image_hash);
"#;

const DROP_SQL: &str = r#"
    DROP TABLE IF EXISTS photos;
    DROP TABLE IF EXISTS files;
    DROP TABLE IF EXISTS dirs;
    DROP TABLE IF EXISTS duplicates;
"#;

/// Drops any existing tables and recreates the schema. Runs outside a user
/// transaction — DDL in SQLite auto-commits, per spec.md 4.C.
pub fn reset(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(DROP_SQL)?;
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

/// True when `path` should trigger a schema reset on open: it doesn't exist
/// yet, or the caller asked for `:memory:`.
pub fn is_fresh_path(path: &Path) -> bool {
    path.as_os_str() == ":memory:" || !path.exists()
}
