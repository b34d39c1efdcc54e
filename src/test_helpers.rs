//! Shared test utilities for the folio test suite.
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let manifest = scan(tmp.path()).unwrap();
//!
//! let item = find_item(&manifest, "articles", "rust-ownership");
//! assert_eq!(item.metadata().title, "Ownership Without Tears");
//! ```

use std::path::Path;
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::scan::{CollectionManifest, Manifest};
use crate::types::ContentItem;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/content/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/content");
    for entry in WalkDir::new(&fixtures).min_depth(1) {
        let entry = entry.unwrap();
        let dest = tmp.path().join(entry.path().strip_prefix(&fixtures).unwrap());
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest).unwrap();
        } else {
            std::fs::copy(entry.path(), &dest).unwrap();
        }
    }
    tmp
}

// =========================================================================
// Manifest lookups, panicking with a clear message on miss
// =========================================================================

/// Find a collection by name. Panics if not found.
pub fn find_collection<'a>(manifest: &'a Manifest, name: &str) -> &'a CollectionManifest {
    manifest.collection(name).unwrap_or_else(|| {
        let names: Vec<&str> = manifest.collections.iter().map(|c| c.name.as_str()).collect();
        panic!("collection '{name}' not found. Available: {names:?}")
    })
}

/// Find an item by id within a collection. Panics if not found.
pub fn find_item<'a>(manifest: &'a Manifest, collection: &str, id: &str) -> &'a ContentItem {
    let collection = find_collection(manifest, collection);
    collection
        .items
        .iter()
        .find(|i| i.id() == id)
        .unwrap_or_else(|| {
            let ids: Vec<&str> = collection.items.iter().map(|i| i.id()).collect();
            panic!("item '{id}' not found in '{}'. Available: {ids:?}", collection.name)
        })
}
