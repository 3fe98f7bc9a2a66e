//! Row types for the four catalog tables (spec.md 3).

use rusqlite::Row;
use serde_json::Value;

/// Which table a duplicate-group or lifecycle operation targets.
///
/// Spec 9 asks for the duplicate lifecycle to be "centralized in one helper
/// parameterized by entity kind" — this is that parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    File,
    Dir,
}

impl EntityKind {
    pub fn table(self) -> &'static str {
        match self {
            EntityKind::File => "files",
            EntityKind::Dir => "dirs",
        }
    }

    pub fn duplicate_type(self) -> &'static str {
        match self {
            EntityKind::File => "file",
            EntityKind::Dir => "dir",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dir {
    pub id: i64,
    pub path: String,
    pub parent_dir: Option<i64>,
    pub depth: i64,
    pub hash: Option<String>,
    pub duplicate_id: Option<i64>,
}

impl Dir {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            path: row.get("path")?,
            parent_dir: row.get("parent_dir")?,
            depth: row.get("depth")?,
            hash: row.get("hash")?,
            duplicate_id: row.get("duplicate_id")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    pub id: i64,
    pub path: String,
    pub size: i64,
    pub parent_dir: i64,
    pub partial_hash: Option<String>,
    pub complete_hash: Option<String>,
    pub duplicate_id: Option<i64>,
}

impl File {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            path: row.get("path")?,
            size: row.get("size")?,
            parent_dir: row.get("parent_dir")?,
            partial_hash: row.get("partial_hash")?,
            complete_hash: row.get("complete_hash")?,
            duplicate_id: row.get("duplicate_id")?,
        })
    }

    /// Spec invariant 2: files under 1024 bytes have `complete_hash ==
    /// partial_hash` whenever the partial hash is set.
    pub fn is_small(&self) -> bool {
        self.size < crate::hashers::PARTIAL_HASH_SIZE as i64
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duplicate {
    pub id: i64,
    pub kind: String,
}

impl Duplicate {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            kind: row.get("type")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    pub id: i64,
    pub file_id: i64,
    pub image_hash: Option<String>,
    pub data_json: Value,
}

impl Photo {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let raw: Option<String> = row.get("data_json")?;
        let data_json = match raw {
            Some(s) if !s.is_empty() => {
                serde_json::from_str(&s).unwrap_or(Value::Null)
            }
            _ => Value::Null,
        };
        Ok(Self {
            id: row.get("id")?,
            file_id: row.get("file_id")?,
            image_hash: row.get("image_hash")?,
            data_json,
        })
    }
}
