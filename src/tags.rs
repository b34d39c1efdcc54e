//! Tag vocabulary and tag-based filtering of content records.
//!
//! The vocabulary is the ordered list of `[[tags]]` from `config.toml`. It
//! decides which tags get filter buttons (and in which order) and which tags
//! can match at all: a tag that appears in front matter but not in the
//! vocabulary is inert.
//!
//! ## Filter Semantics
//!
//! - Nothing selected → everything is shown.
//! - Every vocabulary tag selected → everything is shown, and the selection
//!   resets to empty so the buttons read as "no filter".
//! - Otherwise an item is shown when it shares at least one tag with the
//!   selection (OR, not AND).
//!
//! The generated pages run the same rules in the browser (`static/filter.js`);
//! this module is the server-side rendition used by `folio list --tag`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::types::{ContentItem, Metadata};

/// One filter button: display label plus the tag id it matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagDef {
    pub display_text: String,
    pub tag_id: String,
}

impl TagDef {
    pub fn new(display_text: &str, tag_id: &str) -> Self {
        Self {
            display_text: display_text.to_string(),
            tag_id: tag_id.to_string(),
        }
    }
}

/// Ordered set of filterable tags.
#[derive(Debug, Clone, Default)]
pub struct TagVocabulary {
    tags: Vec<TagDef>,
}

impl TagVocabulary {
    pub fn new(tags: Vec<TagDef>) -> Self {
        Self { tags }
    }

    pub fn contains(&self, tag_id: &str) -> bool {
        self.tags.iter().any(|t| t.tag_id == tag_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TagDef> {
        self.tags.iter()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Display label for a tag, if it belongs to the vocabulary.
    pub fn display_text(&self, tag_id: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.tag_id == tag_id)
            .map(|t| t.display_text.as_str())
    }

    /// The subset of `tag_ids` that the vocabulary knows, in vocabulary order.
    pub fn known<'a>(&'a self, tag_ids: &BTreeSet<String>) -> Vec<&'a TagDef> {
        self.tags
            .iter()
            .filter(|t| tag_ids.contains(&t.tag_id))
            .collect()
    }

    /// True when `selected` includes every vocabulary tag.
    fn is_covered_by(&self, selected: &BTreeSet<String>) -> bool {
        !self.tags.is_empty() && self.tags.iter().all(|t| selected.contains(&t.tag_id))
    }
}

/// Anything that carries a tag set.
pub trait Tagged {
    fn tag_ids(&self) -> &BTreeSet<String>;
}

impl Tagged for Metadata {
    fn tag_ids(&self) -> &BTreeSet<String> {
        &self.tag_ids
    }
}

/// `(id, metadata)` records from a front-matter-only load.
impl Tagged for (String, Metadata) {
    fn tag_ids(&self) -> &BTreeSet<String> {
        &self.1.tag_ids
    }
}

impl Tagged for ContentItem {
    fn tag_ids(&self) -> &BTreeSet<String> {
        &self.metadata().tag_ids
    }
}

/// Narrow `items` to those sharing at least one tag with `selected`.
///
/// An empty selection, or one covering the whole vocabulary, returns every
/// item in the original order. Selected ids outside the vocabulary are
/// ignored.
pub fn filter_by_tags<'a, T: Tagged>(
    items: &'a [T],
    selected: &BTreeSet<String>,
    vocab: &TagVocabulary,
) -> Vec<&'a T> {
    let active: BTreeSet<&str> = selected
        .iter()
        .filter(|id| vocab.contains(id))
        .map(String::as_str)
        .collect();

    if active.is_empty() || vocab.is_covered_by(selected) {
        return items.iter().collect();
    }

    items
        .iter()
        .filter(|item| item.tag_ids().iter().any(|t| active.contains(t.as_str())))
        .collect()
}

/// The user's current filter choice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSelection {
    selected: BTreeSet<String>,
}

impl TagSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selection from ids, dropping any the vocabulary doesn't know.
    pub fn from_ids<I, S>(ids: I, vocab: &TagVocabulary) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let selected = ids
            .into_iter()
            .map(Into::into)
            .filter(|id| vocab.contains(id))
            .collect();
        Self { selected }
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn contains(&self, tag_id: &str) -> bool {
        self.selected.contains(tag_id)
    }

    pub fn selected(&self) -> &BTreeSet<String> {
        &self.selected
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Flip a tag on or off. Returns false for tags outside the vocabulary.
    ///
    /// Reaching full coverage clears the selection.
    pub fn toggle(&mut self, tag_id: &str, vocab: &TagVocabulary) -> bool {
        if !vocab.contains(tag_id) {
            return false;
        }
        if !self.selected.remove(tag_id) {
            self.selected.insert(tag_id.to_string());
        }
        self.reset_if_covered(vocab);
        true
    }

    /// Apply the selection to `items`, resetting it first if it covers the
    /// whole vocabulary.
    pub fn filter<'a, T: Tagged>(&mut self, items: &'a [T], vocab: &TagVocabulary) -> Vec<&'a T> {
        self.reset_if_covered(vocab);
        filter_by_tags(items, &self.selected, vocab)
    }

    fn reset_if_covered(&mut self, vocab: &TagVocabulary) {
        if vocab.is_covered_by(&self.selected) {
            self.selected.clear();
        }
    }
}
