//! Exception registry: per-item overrides of the default access policy.
//!
//! By default every content item sits behind the access gate and is marked
//! `noindex`. Entries under `[exceptions."<id>.md"]` in `config.toml` can lift
//! either restriction. Lookups are keyed by filename, so an id is matched as
//! `"{id}.md"`; unknown ids fall back to the restrictive default.

use std::collections::BTreeMap;

use crate::config::ExceptionEntry;

const SUFFIX: &str = ".md";

/// Read-only view over the configured exceptions.
#[derive(Debug, Clone, Default)]
pub struct ExceptionRegistry {
    entries: BTreeMap<String, ExceptionEntry>,
}

impl ExceptionRegistry {
    pub fn new(entries: BTreeMap<String, ExceptionEntry>) -> Self {
        Self { entries }
    }

    fn lookup(&self, id: &str) -> Option<&ExceptionEntry> {
        if id.ends_with(SUFFIX) {
            self.entries.get(id)
        } else {
            self.entries.get(&format!("{id}{SUFFIX}"))
        }
    }

    /// True iff the item is configured to skip the verification challenge.
    pub fn should_bypass_verification(&self, id: &str) -> bool {
        self.lookup(id).is_some_and(|e| e.bypass_verification)
    }

    /// True iff the item page may be indexed by search engines.
    pub fn should_allow_search_indexing(&self, id: &str) -> bool {
        self.lookup(id).is_some_and(|e| e.allow_search_indexing)
    }

    pub fn exception_reason(&self, id: &str) -> Option<&str> {
        self.lookup(id).and_then(|e| e.reason.as_deref())
    }

    /// Configured keys (`<id>.md`), sorted.
    pub fn exception_articles(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }
}
