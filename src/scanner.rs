//! Scanner/Indexer (spec.md 4.E): orchestrates the Traversal, the Hashers,
//! the Catalog Store, and the Duplicate Engine into one walk.
//!
//! Grounded on `original_source/scanner.py`'s `Scanner` class (`dir_stack`,
//! `current_dir_id`, `file_handler`/`dir_handler`, `dir_hash_update`
//! cascading to the parent) and, for the general shape of narrowing
//! candidates before paying for an expensive read, on
//! `dwetterau-photo-manager`'s `scan_directories_with_progress` — rebuilt
//! here against the catalog/duplicate-group data model instead of an
//! in-memory `Vec<PhotoFile>` returned over a Tauri IPC boundary.

use log::{debug, info, warn};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

use crate::duplicate::{self, FirstPassProbe};
use crate::error::{Result, ScanError};
use crate::hashers;
use crate::store::crud;
use crate::store::types::{EntityKind, File};
use crate::store::Store;
use crate::traversal::{Event, Traversal};

/// Result of the pure, store-free half of fingerprinting a file — safe to
/// compute for many files at once (see [`Scanner::hash`]).
enum PrecomputedHash {
    Image(String),
    Partial(String),
}

/// The part of `hash_file` that touches only the filesystem, never the
/// store. Split out so [`Scanner::hash`] can fan this out across a
/// directory's files with `rayon` before attaching anything sequentially.
fn precompute_hash(path: &Path, size: i64) -> Result<PrecomputedHash> {
    if hashers::is_image_path(path) {
        Ok(PrecomputedHash::Image(hashers::image_hash(path)?))
    } else {
        Ok(PrecomputedHash::Partial(hashers::partial_hash(path)?))
    }
}

pub struct Scanner {
    store: Store,
    dir_stack: Vec<(i64, PathBuf)>,
}

impl Scanner {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            dir_stack: Vec::new(),
        }
    }

    pub fn into_store(self) -> Store {
        self.store
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    fn current_dir_id(&self) -> Option<i64> {
        self.dir_stack.last().map(|(id, _)| *id)
    }

    /// Drives a full scan of `root`: inserts the root `Dir`, walks its
    /// contents, and hashes files as they're discovered (the interleaved
    /// mode permitted by spec.md 9). A symlink aborts the scan immediately.
    pub fn scan(&mut self, root: &Path) -> Result<()> {
        info!("scanning {}", root.display());
        // A scanner instance is reused across multiple CLI-supplied roots
        // (see main.rs); without clearing here, the previous root's
        // unfinished stack (if `scan` ever returned early) would make this
        // root a child of it instead of an independent tree.
        self.dir_stack.clear();
        self.dir_handler(root)?;

        let events = Traversal::new(root)?;
        for event in events {
            match event? {
                Event::Symlink(p) => {
                    warn!("symlink encountered at {}, aborting scan", p.display());
                    return Err(ScanError::SymlinkEncountered(p));
                }
                Event::File(p) => self.file_handler(&p)?,
                Event::DirEnter(p) => self.dir_handler(&p)?,
                Event::DirLeave => {
                    let (popped_id, popped_path) = self
                        .dir_stack
                        .pop()
                        .expect("DirLeave without a matching DirEnter");
                    debug!("leaving {}", popped_path.display());
                    self.dir_hash_update(popped_id)?;
                }
                Event::Unknown(p) => return Err(ScanError::UnexpectedEntryKind(p)),
            }
        }

        // The traversal never emits a leave-event for the root itself (spec
        // 4.B: "The root itself is entered by the caller, not by this
        // iterator"), so it's still on the stack here. Pop it and finalize
        // its hash directly, instead of relying on the last subdir's
        // `DirLeave` cascade to have reached it — a flat root (no subdirs)
        // or trailing files after the last subdir would otherwise leave
        // `root.hash` null or stale.
        let (root_id, root_path) = self
            .dir_stack
            .pop()
            .expect("scan always pushes the root before consuming events");
        debug!("finalizing root {}", root_path.display());
        self.dir_hash_update(root_id)?;

        Ok(())
    }

    /// Standalone hash phase (spec.md 4.E, deferred mode): walks every `Dir`
    /// already in the catalog, deepest first, hashing any file that hasn't
    /// been hashed yet and then recomputing that dir's own hash.
    ///
    /// Within a directory, the pure image/partial hash of each unhashed file
    /// is computed in parallel with `rayon` — those reads touch only the
    /// filesystem, never the store. Attaching each result (the first-pass
    /// probe, any collision repair, the second-pass attach) still runs
    /// sequentially on the single connection, since that step mutates shared
    /// rows and spec.md 5 forbids overlapping transactions.
    pub fn hash(&mut self) -> Result<()> {
        let roots = crud::get_all_root_dirs(self.store.conn())?;
        for root in roots {
            let mut dirs = crud::get_children_by_dfs(self.store.conn(), root.id)?;
            dirs.push(root.clone());
            // `get_children_by_dfs` orders descendants deepest-first; the
            // root, appended last, is shallowest and must be processed last.
            for dir in &dirs {
                let files = crud::get_files(self.store.conn(), dir.id)?;
                let unhashed: Vec<File> = files.into_iter().filter(|f| f.partial_hash.is_none()).collect();

                let precomputed: Vec<(File, Result<PrecomputedHash>)> = unhashed
                    .into_par_iter()
                    .map(|f| {
                        let result = precompute_hash(Path::new(&f.path), f.size);
                        (f, result)
                    })
                    .collect();

                for (file, result) in precomputed {
                    self.attach_precomputed(&file, result?)?;
                }

                let hash = duplicate::compute_dir_hash(self.store.conn(), dir.id)?;
                duplicate::update_entity_hash(self.store.conn(), EntityKind::Dir, dir.id, None, &hash)?;
            }
        }
        Ok(())
    }

    /// Attaches a file's precomputed image/partial hash to the duplicate
    /// engine — the store-mutating continuation of [`precompute_hash`],
    /// kept sequential (see [`Scanner::hash`]).
    fn attach_precomputed(&mut self, file: &File, precomputed: PrecomputedHash) -> Result<()> {
        let path = Path::new(&file.path);
        match precomputed {
            PrecomputedHash::Image(h) => {
                duplicate::attach_with_complete_hash(self.store.conn(), file.id, file.size, &h)?;
                crud::insert_photo(self.store.conn(), file.id, Some(&h), &serde_json::json!({}))?;
            }
            PrecomputedHash::Partial(p) => {
                if file.size < hashers::PARTIAL_HASH_SIZE as i64 {
                    duplicate::attach_with_complete_hash(self.store.conn(), file.id, file.size, &p)?;
                    return Ok(());
                }

                match duplicate::first_pass_probe(self.store.conn(), file.size, &p)? {
                    FirstPassProbe::NoMatch => {
                        duplicate::write_partial_only(self.store.conn(), file.id, &p)?;
                    }
                    FirstPassProbe::MatchWithComplete => {
                        let complete = hashers::full_hash(path)?;
                        duplicate::second_pass_attach(self.store.conn(), file.id, file.size, &p, &complete)?;
                    }
                    FirstPassProbe::Collision(other) => {
                        debug!(
                            "partial hash collision on {} (size {}), repairing",
                            other.other_path, file.size
                        );
                        let other_full = hashers::full_hash(Path::new(&other.other_path))?;
                        duplicate::repair_collided_file(self.store.conn(), other.other_id, &other_full)?;
                        self.dir_hash_update(other.other_parent_dir)?;

                        let complete = hashers::full_hash(path)?;
                        duplicate::second_pass_attach(self.store.conn(), file.id, file.size, &p, &complete)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn file_handler(&mut self, path: &Path) -> Result<()> {
        let parent_dir = self.current_dir_id().ok_or(ScanError::NoRootDir)?;
        let metadata = std::fs::symlink_metadata(path)?;
        let size = metadata.len() as i64;

        let file = crud::insert_file(self.store.conn(), &path.to_string_lossy(), size, parent_dir)?;
        self.hash_file(path, file.id, size)
    }

    fn dir_handler(&mut self, path: &Path) -> Result<()> {
        let parent_dir = self.current_dir_id();
        let dir = crud::insert_dir(self.store.conn(), &path.to_string_lossy(), parent_dir)?;
        self.dir_stack.push((dir.id, path.to_path_buf()));
        Ok(())
    }

    /// Fingerprints a single file, repairing any partial-hash collision it
    /// surfaces along the way (spec.md 4.D.1 step 2(b); 4.E `hash_file`).
    fn hash_file(&mut self, path: &Path, file_id: i64, size: i64) -> Result<()> {
        if hashers::is_image_path(path) {
            let image_hash = hashers::image_hash(path)?;
            duplicate::attach_with_complete_hash(self.store.conn(), file_id, size, &image_hash)?;
            crud::insert_photo(self.store.conn(), file_id, Some(&image_hash), &serde_json::json!({}))?;
            return Ok(());
        }

        if size < hashers::PARTIAL_HASH_SIZE as i64 {
            let p = hashers::partial_hash(path)?;
            duplicate::attach_with_complete_hash(self.store.conn(), file_id, size, &p)?;
            return Ok(());
        }

        let partial = hashers::partial_hash(path)?;
        match duplicate::first_pass_probe(self.store.conn(), size, &partial)? {
            FirstPassProbe::NoMatch => {
                duplicate::write_partial_only(self.store.conn(), file_id, &partial)?;
            }
            FirstPassProbe::MatchWithComplete => {
                let complete = hashers::full_hash(path)?;
                duplicate::second_pass_attach(self.store.conn(), file_id, size, &partial, &complete)?;
            }
            FirstPassProbe::Collision(other) => {
                debug!(
                    "partial hash collision on {} (size {}), repairing",
                    other.other_path, size
                );
                let other_full = hashers::full_hash(Path::new(&other.other_path))?;
                duplicate::repair_collided_file(self.store.conn(), other.other_id, &other_full)?;
                self.dir_hash_update(other.other_parent_dir)?;

                let complete = hashers::full_hash(path)?;
                duplicate::second_pass_attach(self.store.conn(), file_id, size, &partial, &complete)?;
            }
        }

        Ok(())
    }

    /// Recomputes `id`'s hash and propagates the change to its parent,
    /// (spec.md 4.D.3, 4.E). Stops at a root — propagation never runs past
    /// the top of a tree.
    fn dir_hash_update(&mut self, id: i64) -> Result<()> {
        let hash = duplicate::compute_dir_hash(self.store.conn(), id)?;
        duplicate::update_entity_hash(self.store.conn(), EntityKind::Dir, id, None, &hash)?;

        let dir = crud::get_dir(self.store.conn(), id)?;
        if let Some(parent) = dir.parent_dir {
            self.dir_hash_update(parent)?;
        }
        Ok(())
    }
}
