//! Content scanning and manifest generation.
//!
//! Stage 1 of the folio build pipeline. Loads the site config, then every
//! configured collection through the content loader, producing a manifest
//! that the generate stage consumes.
//!
//! ## Directory Structure
//!
//! ```text
//! content/                         # Content root
//! ├── config.toml                  # Site configuration (optional)
//! ├── assets/                      # Copied verbatim to the output root
//! ├── articles/                    # One directory per collection
//! │   ├── rust-ownership.md        # Published if named in `include`
//! │   └── scratch.md               # Not in `include`: ignored
//! └── blogs/
//!     └── first-post.md
//! ```
//!
//! ## Output
//!
//! Produces a [`Manifest`] containing:
//! - Every collection with its items, in inclusion order
//! - Inclusion entries that had no file on disk (`skipped`)
//! - The resolved site configuration
//!
//! A collection whose directory doesn't exist scans as empty. Broken front
//! matter in any published item fails the whole scan.

use crate::config::{self, SiteConfig};
use crate::content::{self, ContentSource};
use crate::exceptions::ExceptionRegistry;
use crate::tags::TagVocabulary;
use crate::types::ContentItem;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Content error: {0}")]
    Content(#[from] content::ContentError),
    #[error("Manifest error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Manifest output from the scan stage
#[derive(Debug, Serialize, Deserialize)]
pub struct Manifest {
    pub collections: Vec<CollectionManifest>,
    pub config: SiteConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CollectionManifest {
    pub name: String,
    pub title: String,
    /// Directory relative to the content root
    pub dir: String,
    pub route: String,
    pub items: Vec<ContentItem>,
    /// Inclusion entries with no file behind them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
}

impl CollectionManifest {
    /// Site path of an item page, without trailing slash.
    pub fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.route, id)
    }
}

impl Manifest {
    pub fn collection(&self, name: &str) -> Option<&CollectionManifest> {
        self.collections.iter().find(|c| c.name == name)
    }

    pub fn registry(&self) -> ExceptionRegistry {
        ExceptionRegistry::new(self.config.exceptions.clone())
    }

    pub fn vocabulary(&self) -> TagVocabulary {
        TagVocabulary::new(self.config.tags.clone())
    }

    pub fn item_count(&self) -> usize {
        self.collections.iter().map(|c| c.items.len()).sum()
    }

    /// Read a manifest written by a previous scan.
    pub fn load(path: &Path) -> Result<Self, ScanError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ScanError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

pub fn scan(root: &Path) -> Result<Manifest, ScanError> {
    let config = config::load_config(root)?;

    let mut collections = Vec::with_capacity(config.collections.len());
    for collection in &config.collections {
        let source = ContentSource::new(root.join(&collection.dir), collection.include.as_slice());
        if !source.dir().is_dir() {
            tracing::warn!(
                collection = %collection.name,
                dir = %source.dir().display(),
                "collection directory not found, treating as empty"
            );
        }

        let items = source.load_all()?;
        let skipped = source.skipped_ids()?;
        tracing::debug!(
            collection = %collection.name,
            items = items.len(),
            skipped = skipped.len(),
            "scanned collection"
        );

        collections.push(CollectionManifest {
            name: collection.name.clone(),
            title: collection.title.clone(),
            dir: collection.dir.clone(),
            route: collection.route.clone(),
            items,
            skipped,
        });
    }

    Ok(Manifest {
        collections,
        config,
    })
}
