//! Catalog Store (spec.md 4.C): schema, transaction scope, and primitive
//! CRUD over the four tables.

pub mod connection;
pub mod crud;
pub mod schema;
pub mod types;

pub use connection::Store;
pub use types::{Dir, Duplicate, EntityKind, File, Photo};

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn fresh_memory_store_has_empty_tables() {
        let store = Store::open(Path::new(":memory:"), false).unwrap();
        let roots = crud::get_all_root_dirs(store.conn()).unwrap();
        assert!(roots.is_empty());
    }

    #[test]
    fn insert_dir_then_read_round_trips() {
        let store = Store::open(Path::new(":memory:"), false).unwrap();
        let root = crud::insert_dir(store.conn(), "/root", None).unwrap();
        assert_eq!(root.depth, 0);
        assert_eq!(root.path, "/root");

        let child = crud::insert_dir(store.conn(), "/root/a", Some(root.id)).unwrap();
        assert_eq!(child.depth, 1);
        assert_eq!(child.parent_dir, Some(root.id));

        let fetched = crud::get_dir(store.conn(), child.id).unwrap();
        assert_eq!(fetched, child);
    }

    #[test]
    fn insert_file_requires_existing_parent_dir() {
        let store = Store::open(Path::new(":memory:"), false).unwrap();
        let err = crud::insert_file(store.conn(), "/root/f", 10, 999);
        assert!(err.is_err());
    }

    #[test]
    fn photo_data_json_round_trips() {
        let store = Store::open(Path::new(":memory:"), false).unwrap();
        let root = crud::insert_dir(store.conn(), "/root", None).unwrap();
        let file = crud::insert_file(store.conn(), "/root/img.jpg", 100, root.id).unwrap();

        let payload = serde_json::json!({ "orientation": 1, "tags": ["a", "b"] });
        let photo = crud::insert_photo(store.conn(), file.id, Some("abc123"), &payload).unwrap();
        assert_eq!(photo.data_json, payload);
    }
}
