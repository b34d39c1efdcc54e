//! Content loading: inclusion lists, front matter, and rendered items.
//!
//! A collection directory holds markdown files, but only the files named in
//! the collection's inclusion list are published, in inclusion-list order:
//!
//! ```text
//! include = ["c.md", "a.md", "b.md"]     articles/
//!                                        ├── a.md
//!                                        ├── b.md
//!                                        └── wip.md      # not included → ignored
//!
//! list_included_ids() → ["a", "b"]       # "c" has no file yet → skipped
//! ```
//!
//! Entries without a file are skipped without error so the list can stage
//! content that hasn't been written yet.
//!
//! ## File Format
//!
//! ```text
//! ---
//! title: Ownership Without Tears
//! cardDescription: How the borrow checker stops being scary
//! cardPageLink: /articles/ownership
//! imagePath: /assets/ownership.png
//! tagIds: [rust, systems]
//! dateWritten: "2024-03-02"
//! ---
//! # Body in markdown
//! ```
//!
//! The YAML block between the `---` fences must come first in the file.

use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::render::render_markdown;
use crate::types::{ContentItem, Metadata};

const EXTENSION: &str = "md";

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Content not found: {0}")]
    NotFound(String),
    #[error("Invalid front matter in '{id}': {message}")]
    Metadata { id: String, message: String },
}

/// Display position of each included id, taken from the inclusion list.
#[derive(Debug, Clone, Default)]
pub struct Ordering {
    ids: Vec<String>,
    index: HashMap<String, usize>,
}

impl Ordering {
    /// Build from inclusion-list entries. `.md` is stripped; a repeated entry
    /// keeps its first position.
    pub fn from_inclusion<S: AsRef<str>>(entries: &[S]) -> Self {
        let mut ordering = Self::default();
        for entry in entries {
            let id = id_from_filename(entry.as_ref());
            if id.is_empty() || ordering.index.contains_key(id) {
                continue;
            }
            ordering.index.insert(id.to_string(), ordering.ids.len());
            ordering.ids.push(id.to_string());
        }
        ordering
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Ids in display order.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Strip a trailing `.md` from a filename.
pub fn id_from_filename(name: &str) -> &str {
    name.strip_suffix(".md").unwrap_or(name)
}

/// One collection's source directory plus its inclusion ordering.
#[derive(Debug, Clone)]
pub struct ContentSource {
    dir: PathBuf,
    ordering: Ordering,
}

impl ContentSource {
    pub fn new<S: AsRef<str>>(dir: impl Into<PathBuf>, inclusion: &[S]) -> Self {
        Self {
            dir: dir.into(),
            ordering: Ordering::from_inclusion(inclusion),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ordering(&self) -> &Ordering {
        &self.ordering
    }

    /// Ids of `.md` files present in the directory. A missing directory is
    /// treated as empty.
    fn ids_on_disk(&self) -> Result<HashSet<String>, ContentError> {
        if !self.dir.is_dir() {
            return Ok(HashSet::new());
        }
        let ids = fs::read_dir(&self.dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.is_file() && p.extension().is_some_and(|e| e == EXTENSION)
            })
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().to_string()))
            .collect();
        Ok(ids)
    }

    /// Included ids that have a file on disk, in inclusion order.
    pub fn list_included_ids(&self) -> Result<Vec<String>, ContentError> {
        let on_disk = self.ids_on_disk()?;
        let mut ids = Vec::with_capacity(self.ordering.len());
        for id in self.ordering.ids() {
            if on_disk.contains(id) {
                ids.push(id.clone());
            } else {
                debug!(id = %id, dir = %self.dir.display(), "included item has no file, skipping");
            }
        }
        Ok(ids)
    }

    /// Included ids with no file on disk, in inclusion order.
    pub fn skipped_ids(&self) -> Result<Vec<String>, ContentError> {
        let on_disk = self.ids_on_disk()?;
        Ok(self
            .ordering
            .ids()
            .iter()
            .filter(|id| !on_disk.contains(*id))
            .cloned()
            .collect())
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, ContentError> {
        // Ids are plain filename stems; anything that could walk out of the
        // directory is reported as not found.
        if id.is_empty() || id.contains(['/', '\\']) || id.contains("..") {
            return Err(ContentError::NotFound(id.to_string()));
        }
        let path = self.dir.join(format!("{id}.{EXTENSION}"));
        if !path.is_file() {
            return Err(ContentError::NotFound(id.to_string()));
        }
        Ok(path)
    }

    /// Read, parse, and render a single item.
    pub fn load_item(&self, id: &str) -> Result<ContentItem, ContentError> {
        let path = self.path_for(id)?;
        let raw = fs::read_to_string(&path)?;
        parse_item(id, raw)
    }

    /// Load every included item, in inclusion order.
    ///
    /// Items are read in parallel; the result is re-sorted by [`Ordering`].
    pub fn load_all(&self) -> Result<Vec<ContentItem>, ContentError> {
        let ids = self.list_included_ids()?;
        let mut items = ids
            .par_iter()
            .map(|id| self.load_item(id))
            .collect::<Result<Vec<_>, _>>()?;
        items.sort_by_key(|item| self.ordering.position(item.id()).unwrap_or(usize::MAX));
        Ok(items)
    }

    /// Front matter of every included item, in inclusion order.
    ///
    /// Bodies are not rendered.
    pub fn load_all_metadata(&self) -> Result<Vec<(String, Metadata)>, ContentError> {
        let ids = self.list_included_ids()?;
        let mut records = ids
            .par_iter()
            .map(|id| -> Result<(String, Metadata), ContentError> {
                let raw = fs::read_to_string(self.path_for(id)?)?;
                let (front, _) = split_front_matter(id, &raw)?;
                Ok((id.clone(), parse_metadata(id, front)?))
            })
            .collect::<Result<Vec<_>, _>>()?;
        records.sort_by_key(|(id, _)| self.ordering.position(id).unwrap_or(usize::MAX));
        Ok(records)
    }
}

/// Build a [`ContentItem`] from a file's full text.
pub fn parse_item(id: &str, raw: String) -> Result<ContentItem, ContentError> {
    let (front, body) = split_front_matter(id, &raw)?;
    let metadata = parse_metadata(id, front)?;
    let body = body.to_string();
    let rendered = render_markdown(&body);
    Ok(ContentItem::new(id.to_string(), raw, body, rendered, metadata))
}

/// Split `---`-fenced front matter from the body.
fn split_front_matter<'a>(id: &str, raw: &'a str) -> Result<(&'a str, &'a str), ContentError> {
    let missing = || ContentError::Metadata {
        id: id.to_string(),
        message: "missing front matter block".to_string(),
    };
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let rest = text
        .strip_prefix("---\r\n")
        .or_else(|| text.strip_prefix("---\n"))
        .ok_or_else(missing)?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let front = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok((front, body));
        }
        offset += line.len();
    }
    Err(missing())
}

fn parse_metadata(id: &str, front: &str) -> Result<Metadata, ContentError> {
    serde_yaml::from_str(front).map_err(|e| ContentError::Metadata {
        id: id.to_string(),
        message: e.to_string(),
    })
}
