//! Duplicate Engine (spec.md 4.D): the two-pass file fingerprinting
//! protocol and the duplicate-group lifecycle shared by files and dirs.
//!
//! Grounded directly on `original_source/db.py`'s `insertFile`/
//! `updateFileHash`/`updateDirHash`, cross-checked against
//! `original_source/test/test_db.py`'s named scenarios (small-file dup,
//! large-file partial collision, group create/collapse/persist).

use rusqlite::Connection;

use crate::store::connection::with_transaction;
use crate::store::crud::{self, DirUpdate, FileUpdate};
use crate::store::types::{Dir, EntityKind, File};

/// Outcome of the first-pass probe (spec 4.D.1 step 2).
pub enum FirstPassProbe {
    /// No existing file shares `(size, partial_hash)`.
    NoMatch,
    /// A match was found and already has a complete hash — the caller must
    /// compute its own full hash and re-enter at step 3.
    MatchWithComplete,
    /// A match was found with no complete hash yet: a genuine collision.
    /// The caller must repair `other` (full-hash it, persist, cascade a
    /// dir-hash update for its parent) before re-entering at step 3.
    Collision(CollisionInfo),
}

#[derive(Debug, Clone)]
pub struct CollisionInfo {
    pub other_id: i64,
    pub other_path: String,
    pub other_parent_dir: i64,
}

/// Step 2 of the protocol: probe for an existing file with the same
/// `(size, partial_hash)`.
pub fn first_pass_probe(conn: &Connection, size: i64, partial_hash: &str) -> rusqlite::Result<FirstPassProbe> {
    match crud::find_file_by_size_and_partial_hash(conn, size, partial_hash)? {
        None => Ok(FirstPassProbe::NoMatch),
        Some(other) if other.complete_hash.is_some() => Ok(FirstPassProbe::MatchWithComplete),
        Some(other) => Ok(FirstPassProbe::Collision(CollisionInfo {
            other_id: other.id,
            other_path: other.path,
            other_parent_dir: other.parent_dir,
        })),
    }
}

/// Step 2 "no match": persist the partial hash and stop.
pub fn write_partial_only(conn: &Connection, file_id: i64, partial_hash: &str) -> rusqlite::Result<()> {
    crud::update_file(
        conn,
        file_id,
        &FileUpdate {
            partial_hash: Some(partial_hash.to_string()),
            ..Default::default()
        },
    )
}

/// Step 3: attach `file_id` to the content-equivalence class for
/// `(size, complete_hash)`, creating a `Duplicate` row on first collision.
pub fn second_pass_attach(
    conn: &Connection,
    file_id: i64,
    size: i64,
    partial_hash: &str,
    complete_hash: &str,
) -> rusqlite::Result<()> {
    with_transaction(conn, || {
        let existing = crud::find_file_by_size_and_complete_hash(conn, size, complete_hash)?;

        let duplicate_id = match existing {
            None => None,
            Some(g) if g.duplicate_id.is_none() => {
                let d = crud::insert_duplicate(conn, EntityKind::File.duplicate_type())?;
                crud::update_file(
                    conn,
                    g.id,
                    &FileUpdate {
                        duplicate_id: Some(Some(d)),
                        ..Default::default()
                    },
                )?;
                Some(d)
            }
            Some(g) => g.duplicate_id,
        };

        crud::update_file(
            conn,
            file_id,
            &FileUpdate {
                partial_hash: Some(partial_hash.to_string()),
                complete_hash: Some(complete_hash.to_string()),
                duplicate_id: Some(duplicate_id),
            },
        )
    })
}

/// Persist an externally supplied complete hash directly (e.g. a small
/// file's shortcut, or an image's perceptual hash) — equivalent to running
/// step 3 with `partial_hash == complete_hash`.
pub fn attach_with_complete_hash(conn: &Connection, file_id: i64, size: i64, complete_hash: &str) -> rusqlite::Result<()> {
    second_pass_attach(conn, file_id, size, complete_hash, complete_hash)
}

/// Repairs a file discovered via [`FirstPassProbe::Collision`]: persists its
/// full hash. Directory-hash cascade for `other_parent_dir` is the caller's
/// responsibility (spec 4.D.1 step 2 (b); spec 4.E ties it to
/// `dir_hash_update`).
pub fn repair_collided_file(conn: &Connection, other_id: i64, full_hash: &str) -> rusqlite::Result<()> {
    crud::update_file(
        conn,
        other_id,
        &FileUpdate {
            complete_hash: Some(full_hash.to_string()),
            ..Default::default()
        },
    )
}

/// Directory-hash duplicate-group lifecycle (spec 4.D.2), generalized to
/// files too per spec 9 ("the same symmetric policy applies to Files").
/// `kind` selects which table and which hash column (`dirs.hash` vs.
/// `files.complete_hash`) the probe runs against. `size` is the extra key
/// component a File match requires (two files are only equivalent if they
/// share both `size` and `complete_hash`; a Dir has no `size` column, so
/// dir calls pass `None`).
pub fn update_entity_hash(
    conn: &Connection,
    kind: EntityKind,
    id: i64,
    size: Option<i64>,
    new_hash: &str,
) -> rusqlite::Result<()> {
    with_transaction(conn, || {
        let (old_hash, old_dup_id) = read_hash_and_dup(conn, kind, id)?;
        if old_hash.as_deref() == Some(new_hash) {
            return Ok(()); // idempotent (spec invariant 6)
        }

        if let Some(old_dup_id) = old_dup_id {
            let member_ids = get_member_ids(conn, kind, old_dup_id)?;
            if member_ids.len() == 2 {
                for member_id in &member_ids {
                    clear_duplicate(conn, kind, *member_id)?;
                }
                crud::delete_duplicate(conn, old_dup_id)?;
            } else {
                clear_duplicate(conn, kind, id)?;
            }
        }

        match find_by_hash(conn, kind, size, new_hash)? {
            Some((other_id, other_dup_id)) => {
                let dup_id = match other_dup_id {
                    Some(d) => d,
                    None => {
                        let d = crud::insert_duplicate(conn, kind.duplicate_type())?;
                        set_duplicate_only(conn, kind, other_id, d)?;
                        d
                    }
                };
                set_hash_and_duplicate(conn, kind, id, new_hash, Some(dup_id))?;
            }
            None => {
                set_hash_and_duplicate(conn, kind, id, new_hash, None)?;
            }
        }

        Ok(())
    })
}

fn read_hash_and_dup(conn: &Connection, kind: EntityKind, id: i64) -> rusqlite::Result<(Option<String>, Option<i64>)> {
    match kind {
        EntityKind::Dir => {
            let d: Dir = crud::get_dir(conn, id)?;
            Ok((d.hash, d.duplicate_id))
        }
        EntityKind::File => {
            let f: File = crud::get_file(conn, id)?;
            Ok((f.complete_hash, f.duplicate_id))
        }
    }
}

fn get_member_ids(conn: &Connection, kind: EntityKind, duplicate_id: i64) -> rusqlite::Result<Vec<i64>> {
    match kind {
        EntityKind::Dir => Ok(crud::get_dirs_by_duplicate_id(conn, duplicate_id)?
            .into_iter()
            .map(|d| d.id)
            .collect()),
        EntityKind::File => Ok(crud::get_files_by_duplicate_id(conn, duplicate_id)?
            .into_iter()
            .map(|f| f.id)
            .collect()),
    }
}

fn clear_duplicate(conn: &Connection, kind: EntityKind, id: i64) -> rusqlite::Result<()> {
    match kind {
        EntityKind::Dir => crud::update_dir(
            conn,
            id,
            &DirUpdate {
                duplicate_id: Some(None),
                ..Default::default()
            },
        ),
        EntityKind::File => crud::update_file(
            conn,
            id,
            &FileUpdate {
                duplicate_id: Some(None),
                ..Default::default()
            },
        ),
    }
}

fn set_duplicate_only(conn: &Connection, kind: EntityKind, id: i64, duplicate_id: i64) -> rusqlite::Result<()> {
    match kind {
        EntityKind::Dir => crud::update_dir(
            conn,
            id,
            &DirUpdate {
                duplicate_id: Some(Some(duplicate_id)),
                ..Default::default()
            },
        ),
        EntityKind::File => crud::update_file(
            conn,
            id,
            &FileUpdate {
                duplicate_id: Some(Some(duplicate_id)),
                ..Default::default()
            },
        ),
    }
}

fn set_hash_and_duplicate(
    conn: &Connection,
    kind: EntityKind,
    id: i64,
    hash: &str,
    duplicate_id: Option<i64>,
) -> rusqlite::Result<()> {
    match kind {
        EntityKind::Dir => crud::update_dir(
            conn,
            id,
            &DirUpdate {
                hash: Some(hash.to_string()),
                duplicate_id: Some(duplicate_id),
            },
        ),
        EntityKind::File => crud::update_file(
            conn,
            id,
            &FileUpdate {
                complete_hash: Some(hash.to_string()),
                duplicate_id: Some(duplicate_id),
                ..Default::default()
            },
        ),
    }
}

fn find_by_hash(
    conn: &Connection,
    kind: EntityKind,
    size: Option<i64>,
    hash: &str,
) -> rusqlite::Result<Option<(i64, Option<i64>)>> {
    match kind {
        EntityKind::Dir => Ok(crud::find_dir_by_hash(conn, hash)?.map(|d| (d.id, d.duplicate_id))),
        EntityKind::File => {
            let size = size.expect("File lookups require a size");
            Ok(crud::find_file_by_size_and_complete_hash(conn, size, hash)?.map(|f| (f.id, f.duplicate_id)))
        }
    }
}

/// Directory hash (spec 4.D.3): fold the immediate children's digests
/// (`complete_hash OR hash OR ""`, ordered by id ascending) into one hash
/// via the same digest family as the file partial hash.
pub fn compute_dir_hash(conn: &Connection, dir_id: i64) -> rusqlite::Result<String> {
    use sha2::{Digest, Sha256};

    let digests = crud::get_children_hashes(conn, dir_id)?;
    let joined = digests.join("\n");
    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use std::path::Path;

    fn fresh() -> Store {
        Store::open(Path::new(":memory:"), false).unwrap()
    }

    #[test]
    fn small_file_duplicate_creates_one_group() {
        let store = fresh();
        let conn = store.conn();
        let root = crud::insert_dir(conn, "/root", None).unwrap();
        let a = crud::insert_file(conn, "/root/a", 50, root.id).unwrap();
        let b = crud::insert_file(conn, "/root/b", 50, root.id).unwrap();

        attach_with_complete_hash(conn, a.id, 50, "H").unwrap();
        attach_with_complete_hash(conn, b.id, 50, "H").unwrap();

        let a = crud::get_file(conn, a.id).unwrap();
        let b = crud::get_file(conn, b.id).unwrap();
        assert!(a.duplicate_id.is_some());
        assert_eq!(a.duplicate_id, b.duplicate_id);
        assert_eq!(a.complete_hash.as_deref(), Some("H"));
        assert_eq!(b.complete_hash.as_deref(), Some("H"));
    }

    #[test]
    fn partial_hash_collision_is_signaled_and_repair_unifies_full_hash() {
        let store = fresh();
        let conn = store.conn();
        let root = crud::insert_dir(conn, "/root", None).unwrap();
        let x = crud::insert_file(conn, "/root/x", 3000, root.id).unwrap();
        let y = crud::insert_file(conn, "/root/y", 3000, root.id).unwrap();

        write_partial_only(conn, x.id, "P").unwrap();

        match first_pass_probe(conn, 3000, "P").unwrap() {
            FirstPassProbe::Collision(info) => {
                assert_eq!(info.other_id, x.id);
                assert_eq!(info.other_path, "/root/x");

                repair_collided_file(conn, info.other_id, "Fx").unwrap();
                second_pass_attach(conn, y.id, 3000, "P", "Fx").unwrap();
            }
            _ => panic!("expected a collision"),
        }

        let x = crud::get_file(conn, x.id).unwrap();
        let y = crud::get_file(conn, y.id).unwrap();
        assert_eq!(x.complete_hash.as_deref(), Some("Fx"));
        assert_eq!(y.complete_hash.as_deref(), Some("Fx"));
        assert!(x.duplicate_id.is_some());
        assert_eq!(x.duplicate_id, y.duplicate_id);
    }

    #[test]
    fn partial_hash_collision_with_divergent_full_hash_creates_no_group() {
        let store = fresh();
        let conn = store.conn();
        let root = crud::insert_dir(conn, "/root", None).unwrap();
        let x = crud::insert_file(conn, "/root/x", 3000, root.id).unwrap();
        let y = crud::insert_file(conn, "/root/y", 3000, root.id).unwrap();

        write_partial_only(conn, x.id, "P").unwrap();
        match first_pass_probe(conn, 3000, "P").unwrap() {
            FirstPassProbe::Collision(info) => {
                repair_collided_file(conn, info.other_id, "Fx").unwrap();
                second_pass_attach(conn, y.id, 3000, "P", "Fy").unwrap();
            }
            _ => panic!("expected a collision"),
        }

        let x = crud::get_file(conn, x.id).unwrap();
        let y = crud::get_file(conn, y.id).unwrap();
        assert!(x.duplicate_id.is_none());
        assert!(y.duplicate_id.is_none());
    }

    #[test]
    fn dir_duplicate_group_collapses_at_two_members() {
        let store = fresh();
        let conn = store.conn();
        let root = crud::insert_dir(conn, "/root", None).unwrap();
        let d1 = crud::insert_dir(conn, "/root/d1", Some(root.id)).unwrap();
        let d2 = crud::insert_dir(conn, "/root/d2", Some(root.id)).unwrap();

        update_entity_hash(conn, EntityKind::Dir, d1.id, None, "H").unwrap();
        update_entity_hash(conn, EntityKind::Dir, d2.id, None, "H").unwrap();

        let d1_before = crud::get_dir(conn, d1.id).unwrap();
        let group_id = d1_before.duplicate_id.unwrap();

        update_entity_hash(conn, EntityKind::Dir, d1.id, None, "H2").unwrap();

        let d1 = crud::get_dir(conn, d1.id).unwrap();
        let d2 = crud::get_dir(conn, d2.id).unwrap();
        assert_eq!(d1.hash.as_deref(), Some("H2"));
        assert!(d1.duplicate_id.is_none());
        assert!(d2.duplicate_id.is_none());
        assert!(crud::get_duplicate(conn, group_id).is_err());
    }

    #[test]
    fn dir_duplicate_group_persists_above_two_members() {
        let store = fresh();
        let conn = store.conn();
        let root = crud::insert_dir(conn, "/root", None).unwrap();
        let d1 = crud::insert_dir(conn, "/root/d1", Some(root.id)).unwrap();
        let d2 = crud::insert_dir(conn, "/root/d2", Some(root.id)).unwrap();
        let d3 = crud::insert_dir(conn, "/root/d3", Some(root.id)).unwrap();

        update_entity_hash(conn, EntityKind::Dir, d1.id, None, "H").unwrap();
        update_entity_hash(conn, EntityKind::Dir, d2.id, None, "H").unwrap();
        update_entity_hash(conn, EntityKind::Dir, d3.id, None, "H").unwrap();

        update_entity_hash(conn, EntityKind::Dir, d1.id, None, "H2").unwrap();

        let d1 = crud::get_dir(conn, d1.id).unwrap();
        let d2 = crud::get_dir(conn, d2.id).unwrap();
        let d3 = crud::get_dir(conn, d3.id).unwrap();
        assert!(d1.duplicate_id.is_none());
        assert_eq!(d2.duplicate_id, d3.duplicate_id);
        assert!(d2.duplicate_id.is_some());
    }

    #[test]
    fn update_dir_hash_is_idempotent() {
        let store = fresh();
        let conn = store.conn();
        let root = crud::insert_dir(conn, "/root", None).unwrap();
        let d1 = crud::insert_dir(conn, "/root/d1", Some(root.id)).unwrap();

        update_entity_hash(conn, EntityKind::Dir, d1.id, None, "H").unwrap();
        let before = crud::get_dir(conn, d1.id).unwrap();
        update_entity_hash(conn, EntityKind::Dir, d1.id, None, "H").unwrap();
        let after = crud::get_dir(conn, d1.id).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn compute_dir_hash_is_deterministic() {
        let store = fresh();
        let conn = store.conn();
        let root = crud::insert_dir(conn, "/root", None).unwrap();
        let f1 = crud::insert_file(conn, "/root/f1", 50, root.id).unwrap();
        let f2 = crud::insert_file(conn, "/root/f2", 50, root.id).unwrap();
        attach_with_complete_hash(conn, f1.id, 50, "Ha").unwrap();
        attach_with_complete_hash(conn, f2.id, 50, "Hb").unwrap();

        let h1 = compute_dir_hash(conn, root.id).unwrap();
        let h2 = compute_dir_hash(conn, root.id).unwrap();
        assert_eq!(h1, h2);
    }
}
