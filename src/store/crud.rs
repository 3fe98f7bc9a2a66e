//! Primitive CRUD operations (spec.md 4.C).
//!
//! The Python source builds these queries dynamically from a `dataclass`'s
//! reflected field list (`core.py`'s `_sqlInsertQuery`/`_sqlUpdateQuery`).
//! Rust has no such runtime reflection, so each entity gets its own typed
//! insert/update function instead of one generic `insert_row(table,
//! payload)` — the same primitive surface from spec.md 4.C, expressed the
//! way a statically typed store layer naturally would.
//!
//! Each `*Update` struct is the spec 9 "explicit `Update` builder" —
//! `Option<Option<T>>` distinguishes "leave alone" from "set to NULL", and
//! because every field is assigned at most once in a single struct literal,
//! double-updating a field before a sync is a compile error, not a runtime
//! `DuplicateAdd` exception.

use rusqlite::{params, Connection, OptionalExtension};

use crate::store::types::{Dir, Duplicate, File, Photo};

#[derive(Debug, Default, Clone)]
pub struct FileUpdate {
    pub partial_hash: Option<String>,
    pub complete_hash: Option<String>,
    pub duplicate_id: Option<Option<i64>>,
}

#[derive(Debug, Default, Clone)]
pub struct DirUpdate {
    pub hash: Option<String>,
    pub duplicate_id: Option<Option<i64>>,
}

pub fn insert_dir(conn: &Connection, path: &str, parent_dir: Option<i64>) -> rusqlite::Result<Dir> {
    conn.query_row(
        "INSERT INTO dirs (path, parent_dir, depth)
         VALUES (?1, ?2, COALESCE((SELECT depth FROM dirs WHERE id = ?2), -1) + 1)
         RETURNING *",
        params![path, parent_dir],
        Dir::from_row,
    )
}

pub fn insert_file(conn: &Connection, path: &str, size: i64, parent_dir: i64) -> rusqlite::Result<File> {
    conn.query_row(
        "INSERT INTO files (path, size, parent_dir) VALUES (?1, ?2, ?3) RETURNING *",
        params![path, size, parent_dir],
        File::from_row,
    )
}

pub fn insert_duplicate(conn: &Connection, kind: &str) -> rusqlite::Result<i64> {
    conn.query_row(
        "INSERT INTO duplicates (type) VALUES (?1) RETURNING id",
        params![kind],
        |row| row.get(0),
    )
}

pub fn insert_photo(
    conn: &Connection,
    file_id: i64,
    image_hash: Option<&str>,
    data_json: &serde_json::Value,
) -> rusqlite::Result<Photo> {
    let json_str = serde_json::to_string(data_json).unwrap_or_else(|_| "null".to_string());
    conn.query_row(
        "INSERT INTO photos (file_id, image_hash, data_json) VALUES (?1, ?2, ?3) RETURNING *",
        params![file_id, image_hash, json_str],
        Photo::from_row,
    )
}

pub fn update_file(conn: &Connection, id: i64, update: &FileUpdate) -> rusqlite::Result<()> {
    if let Some(v) = &update.partial_hash {
        conn.execute("UPDATE files SET partial_hash = ?1 WHERE id = ?2", params![v, id])?;
    }
    if let Some(v) = &update.complete_hash {
        conn.execute("UPDATE files SET complete_hash = ?1 WHERE id = ?2", params![v, id])?;
    }
    if let Some(v) = &update.duplicate_id {
        conn.execute("UPDATE files SET duplicate_id = ?1 WHERE id = ?2", params![v, id])?;
    }
    Ok(())
}

pub fn update_dir(conn: &Connection, id: i64, update: &DirUpdate) -> rusqlite::Result<()> {
    if let Some(v) = &update.hash {
        conn.execute("UPDATE dirs SET hash = ?1 WHERE id = ?2", params![v, id])?;
    }
    if let Some(v) = &update.duplicate_id {
        conn.execute("UPDATE dirs SET duplicate_id = ?1 WHERE id = ?2", params![v, id])?;
    }
    Ok(())
}

pub fn delete_duplicate(conn: &Connection, id: i64) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM duplicates WHERE id = ?1", params![id])?;
    Ok(())
}

pub fn get_dir(conn: &Connection, id: i64) -> rusqlite::Result<Dir> {
    conn.query_row("SELECT * FROM dirs WHERE id = ?1", params![id], Dir::from_row)
}

pub fn get_file(conn: &Connection, id: i64) -> rusqlite::Result<File> {
    conn.query_row("SELECT * FROM files WHERE id = ?1", params![id], File::from_row)
}

/// First-pass probe (spec 4.D.1 step 2): any file sharing `size`/`partial_hash`.
pub fn find_file_by_size_and_partial_hash(
    conn: &Connection,
    size: i64,
    partial_hash: &str,
) -> rusqlite::Result<Option<File>> {
    conn.query_row(
        "SELECT * FROM files WHERE size = ?1 AND partial_hash = ?2 LIMIT 1",
        params![size, partial_hash],
        File::from_row,
    )
    .optional()
}

/// Second-pass probe (spec 4.D.1 step 3): any file sharing `size`/`complete_hash`.
pub fn find_file_by_size_and_complete_hash(
    conn: &Connection,
    size: i64,
    complete_hash: &str,
) -> rusqlite::Result<Option<File>> {
    conn.query_row(
        "SELECT * FROM files WHERE size = ?1 AND complete_hash = ?2 LIMIT 1",
        params![size, complete_hash],
        File::from_row,
    )
    .optional()
}

/// Probe used by the directory-duplicate lifecycle (spec 4.D.2 step 2.b).
pub fn find_dir_by_hash(conn: &Connection, hash: &str) -> rusqlite::Result<Option<Dir>> {
    conn.query_row("SELECT * FROM dirs WHERE hash = ?1 LIMIT 1", params![hash], Dir::from_row)
        .optional()
}

/// All dirs referencing a given duplicate group, for the collapse/persist
/// decision in spec 4.D.2 step 2.a.
pub fn get_dirs_by_duplicate_id(conn: &Connection, duplicate_id: i64) -> rusqlite::Result<Vec<Dir>> {
    let mut stmt = conn.prepare("SELECT * FROM dirs WHERE duplicate_id = ?1")?;
    let rows = stmt.query_map(params![duplicate_id], Dir::from_row)?;
    rows.collect()
}

pub fn get_files_by_duplicate_id(conn: &Connection, duplicate_id: i64) -> rusqlite::Result<Vec<File>> {
    let mut stmt = conn.prepare("SELECT * FROM files WHERE duplicate_id = ?1")?;
    let rows = stmt.query_map(params![duplicate_id], File::from_row)?;
    rows.collect()
}

pub fn get_duplicate(conn: &Connection, id: i64) -> rusqlite::Result<Duplicate> {
    conn.query_row(
        "SELECT * FROM duplicates WHERE id = ?1",
        params![id],
        Duplicate::from_row,
    )
}

pub fn get_all_root_dirs(conn: &Connection) -> rusqlite::Result<Vec<Dir>> {
    let mut stmt = conn.prepare("SELECT * FROM dirs WHERE parent_dir IS NULL")?;
    let rows = stmt.query_map([], Dir::from_row)?;
    rows.collect()
}

pub fn get_files(conn: &Connection, dir_id: i64) -> rusqlite::Result<Vec<File>> {
    let mut stmt = conn.prepare("SELECT * FROM files WHERE parent_dir = ?1")?;
    let rows = stmt.query_map(params![dir_id], File::from_row)?;
    rows.collect()
}

/// DFS children of `dir_id`, deepest-first, mirroring
/// `original_source/core.py`'s `Dir._sqlGetChildenByDFSQuery` recursive CTE.
pub fn get_children_by_dfs(conn: &Connection, dir_id: i64) -> rusqlite::Result<Vec<Dir>> {
    let mut stmt = conn.prepare(
        "WITH RECURSIVE cte (id, path, parent_dir, depth, hash, duplicate_id) AS (
            SELECT id, path, parent_dir, depth, hash, duplicate_id FROM dirs WHERE id = ?1
            UNION ALL
            SELECT dirs.id, dirs.path, dirs.parent_dir, dirs.depth, dirs.hash, dirs.duplicate_id
            FROM dirs JOIN cte ON dirs.parent_dir = cte.id
        )
        SELECT * FROM cte WHERE id != ?1 ORDER BY depth DESC",
    )?;
    let rows = stmt.query_map(params![dir_id], Dir::from_row)?;
    rows.collect()
}

/// The digest sequence `compute_dir_hash` (spec 4.D.3) folds over: child
/// files' `complete_hash OR partial_hash OR ""`, UNION ALL child dirs'
/// `hash OR ""`, ordered by id ascending.
pub fn get_children_hashes(conn: &Connection, dir_id: i64) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT id, COALESCE(complete_hash, partial_hash, '') AS digest
         FROM files WHERE parent_dir = ?1
         UNION ALL
         SELECT id, COALESCE(hash, '') AS digest
         FROM dirs WHERE parent_dir = ?1
         ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![dir_id], |row| row.get::<_, String>(1))?;
    rows.collect()
}
