//! Lazy, non-restartable event stream over a directory tree.
//!
//! Grounded on `original_source/fs_utlis.py`'s `dir_dfs` generator, which
//! this reproduces as an `Iterator` instead of a Python generator. A plain
//! `walkdir::WalkDir` walk (`dwetterau-photo-manager`'s traversal primitive)
//! cannot express the `Dir(None)` "leave" marker the protocol needs to
//! trigger `dir_hash_update` cascades on the way back up the tree, so the
//! walk here is hand-rolled against `std::fs::read_dir` instead and
//! `walkdir` is dropped entirely (see DESIGN.md).

use std::fs;
use std::path::{Path, PathBuf};

/// One step of the traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A symbolic link was encountered. Fatal by policy (spec 1, Non-goals).
    Symlink(PathBuf),
    /// A regular file.
    File(PathBuf),
    /// Entering a subdirectory.
    DirEnter(PathBuf),
    /// Leaving the most recently entered subdirectory (pop-marker).
    DirLeave,
    /// An entry that is neither a symlink, a regular file, nor a
    /// directory (e.g. a fifo, socket, or block device). Fatal by policy
    /// (spec 4.E: "unknown entry kinds are fatal").
    Unknown(PathBuf),
}

/// Depth-first traversal of `root`'s contents.
///
/// The root itself is not emitted — the caller is expected to have already
/// inserted it (per spec 4.B: "The root itself is entered by the caller,
/// not by this iterator"). Children within a directory are yielded in the
/// order returned by `fs::read_dir`, which is not guaranteed to be sorted;
/// the duplicate-group machinery does not depend on a particular order.
pub struct Traversal {
    /// Stack of directory iterators still being walked, innermost last.
    stack: Vec<fs::ReadDir>,
    /// Pending events queued ahead of further filesystem reads.
    pending: Vec<Event>,
}

impl Traversal {
    pub fn new(root: &Path) -> std::io::Result<Self> {
        let read_dir = fs::read_dir(root)?;
        Ok(Self {
            stack: vec![read_dir],
            pending: Vec::new(),
        })
    }
}

impl Iterator for Traversal {
    type Item = std::io::Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(ev) = self.pending.pop() {
            return Some(Ok(ev));
        }

        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(Ok(entry)) => {
                    let path = entry.path();
                    let file_type = match entry.file_type() {
                        Ok(ft) => ft,
                        Err(e) => return Some(Err(e)),
                    };

                    if file_type.is_symlink() {
                        return Some(Ok(Event::Symlink(path)));
                    } else if file_type.is_file() {
                        return Some(Ok(Event::File(path)));
                    } else if file_type.is_dir() {
                        let child_iter = match fs::read_dir(&path) {
                            Ok(it) => it,
                            Err(e) => return Some(Err(e)),
                        };
                        self.stack.push(child_iter);
                        return Some(Ok(Event::DirEnter(path)));
                    } else {
                        return Some(Ok(Event::Unknown(path)));
                    }
                }
                Some(Err(e)) => return Some(Err(e)),
                None => {
                    self.stack.pop();
                    if self.stack.is_empty() {
                        return None;
                    }
                    return Some(Ok(Event::DirLeave));
                }
            }
        }
    }
}
