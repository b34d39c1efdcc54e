//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives in
//! the content root; stock defaults are the base layer and the user file is
//! deep-merged on top, so a config only needs the keys it wants to change.
//!
//! ## Config File Location
//!
//! ```text
//! content/
//! ├── config.toml              # Site config (optional)
//! ├── articles/
//! │   └── ...
//! └── blogs/
//!     └── ...
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! [site]
//! title = "Portfolio"
//! description = ""
//! author = ""
//! base_url = "https://example.com"   # Optional, enables share links
//!
//! [[collections]]
//! name = "articles"                  # Unique collection name
//! title = "Articles"                 # Heading on listing pages
//! dir = "articles"                   # Directory under the content root
//! route = "/articles"                # URL prefix for item pages
//! include = ["first.md", "second.md"] # Published items, in display order
//!
//! [[tags]]
//! display_text = "Rust"
//! tag_id = "rust"
//!
//! [exceptions."first.md"]
//! bypass_verification = true
//! allow_search_indexing = true
//! reason = "Linked from a public talk"
//!
//! [gate]
//! enabled = true
//! cookie_name = "folio_verified"
//! challenge_path = "/verify"
//! article_route = "/articles"
//! verified_param = "verified"
//! intended_param = "intended"
//! item_param = "article"
//! exempt_prefixes = ["/verify", "/assets", "/favicon.ico", "/robots.txt"]
//!
//! [processing]
//! max_processes = 4                  # Omit for auto = CPU cores
//! ```
//!
//! Arrays (`collections`, `tags`, `include`) replace the defaults wholesale
//! rather than merging element-wise. Unknown keys are rejected to catch typos
//! early.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;
use url::Url;

use crate::tags::TagDef;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site-wide metadata used in page heads and share links.
    pub site: SiteMeta,
    /// Content collections, each with its own inclusion list.
    pub collections: Vec<CollectionConfig>,
    /// Tag vocabulary: the only tags that can be filtered on, in button order.
    pub tags: Vec<TagDef>,
    /// Per-item access policy overrides, keyed by filename (`<id>.md`).
    pub exceptions: BTreeMap<String, ExceptionEntry>,
    /// Access gate settings for the preview server.
    pub gate: GateConfig,
    /// Parallel loading settings.
    pub processing: ProcessingConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site: SiteMeta::default(),
            collections: vec![
                CollectionConfig::new("articles", "Articles"),
                CollectionConfig::new("blogs", "Blog"),
            ],
            tags: Vec::new(),
            exceptions: BTreeMap::new(),
            gate: GateConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        let mut routes = HashSet::new();
        for collection in &self.collections {
            if collection.name.is_empty() {
                return Err(ConfigError::Validation(
                    "collections.name must not be empty".into(),
                ));
            }
            if !names.insert(collection.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate collection name '{}'",
                    collection.name
                )));
            }
            if !is_route(&collection.route) {
                return Err(ConfigError::Validation(format!(
                    "collections.route '{}' must start with '/' and not end with '/'",
                    collection.route
                )));
            }
            if !routes.insert(collection.route.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate collection route '{}'",
                    collection.route
                )));
            }
            if let Some(entry) = collection
                .include
                .iter()
                .find(|e| e.is_empty() || e.contains(['/', '\\']) || e.contains(".."))
            {
                return Err(ConfigError::Validation(format!(
                    "include entry '{entry}' in collection '{}' must be a plain filename",
                    collection.name
                )));
            }
        }

        let mut tag_ids = HashSet::new();
        for tag in &self.tags {
            if tag.tag_id.is_empty() || tag.tag_id.contains(char::is_whitespace) {
                return Err(ConfigError::Validation(format!(
                    "tag_id '{}' must be non-empty and contain no whitespace",
                    tag.tag_id
                )));
            }
            if !tag_ids.insert(tag.tag_id.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate tag_id '{}'",
                    tag.tag_id
                )));
            }
        }

        if let Some(base_url) = &self.site.base_url {
            let parsed = Url::parse(base_url).map_err(|e| {
                ConfigError::Validation(format!("site.base_url '{base_url}' is not a URL: {e}"))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::Validation(format!(
                    "site.base_url '{base_url}' must be an http or https URL"
                )));
            }
        }

        self.gate.validate()
    }

    /// Look up a collection by name.
    pub fn collection(&self, name: &str) -> Option<&CollectionConfig> {
        self.collections.iter().find(|c| c.name == name)
    }
}

fn is_route(route: &str) -> bool {
    route.starts_with('/') && route.len() > 1 && !route.ends_with('/')
}

/// Site-wide metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteMeta {
    /// Site title, shown in the header and page titles.
    pub title: String,
    /// Short description for the home page.
    pub description: String,
    /// Default author for items that don't name one.
    pub author: String,
    /// Absolute public URL of the site. Share links are omitted when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for SiteMeta {
    fn default() -> Self {
        Self {
            title: "Portfolio".to_string(),
            description: String::new(),
            author: String::new(),
            base_url: None,
        }
    }
}

/// A named set of markdown items sharing a directory and a route.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionConfig {
    pub name: String,
    pub title: String,
    /// Directory relative to the content root.
    pub dir: String,
    /// URL prefix; item pages live at `{route}/{id}/`.
    pub route: String,
    /// Inclusion list: filenames to publish, in display order.
    #[serde(default)]
    pub include: Vec<String>,
}

impl CollectionConfig {
    fn new(name: &str, title: &str) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
            dir: name.to_string(),
            route: format!("/{name}"),
            include: Vec::new(),
        }
    }
}

/// Access policy override for one content item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExceptionEntry {
    /// Serve the item without the human-verification challenge.
    pub bypass_verification: bool,
    /// Let search engines index the item page.
    pub allow_search_indexing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Access gate settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GateConfig {
    /// When false every request is allowed through.
    pub enabled: bool,
    /// Name of the verification cookie.
    pub cookie_name: String,
    /// Path of the challenge page.
    pub challenge_path: String,
    /// Route prefix whose items are checked against the exception registry.
    pub article_route: String,
    /// Query marker the challenge page appends on completion.
    pub verified_param: String,
    /// Query parameter carrying the originally requested URL.
    pub intended_param: String,
    /// Query parameter carrying the requested item id.
    pub item_param: String,
    /// Path prefixes that are never gated.
    pub exempt_prefixes: Vec<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cookie_name: "folio_verified".to_string(),
            challenge_path: "/verify".to_string(),
            article_route: "/articles".to_string(),
            verified_param: "verified".to_string(),
            intended_param: "intended".to_string(),
            item_param: "article".to_string(),
            exempt_prefixes: vec![
                "/verify".to_string(),
                "/assets".to_string(),
                "/favicon.ico".to_string(),
                "/robots.txt".to_string(),
            ],
        }
    }
}

impl GateConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let is_token = |s: &str| {
            !s.is_empty()
                && s.chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        };
        if !is_token(&self.cookie_name) {
            return Err(ConfigError::Validation(
                "gate.cookie_name must be non-empty ASCII letters, digits, '_' or '-'".into(),
            ));
        }
        if !is_route(&self.challenge_path) {
            return Err(ConfigError::Validation(
                "gate.challenge_path must start with '/' and not end with '/'".into(),
            ));
        }
        if !is_route(&self.article_route) {
            return Err(ConfigError::Validation(
                "gate.article_route must start with '/' and not end with '/'".into(),
            ));
        }
        for (key, value) in [
            ("verified_param", &self.verified_param),
            ("intended_param", &self.intended_param),
            ("item_param", &self.item_param),
        ] {
            if value.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "gate.{key} must not be empty"
                )));
            }
        }
        if !self
            .exempt_prefixes
            .iter()
            .any(|p| self.challenge_path.starts_with(p.as_str()))
        {
            return Err(ConfigError::Validation(
                "gate.exempt_prefixes must cover gate.challenge_path".into(),
            ));
        }
        Ok(())
    }
}

/// Parallel loading settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel content loading workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(SiteConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay, arrays included, replace base values.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file doesn't exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# folio configuration
# ===================
# All settings are optional. Values shown below are the defaults.
# Place this file at the root of the content directory.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Site metadata
# ---------------------------------------------------------------------------
[site]
title = "Portfolio"
description = ""
# Default author for items whose front matter doesn't name one.
author = ""
# Absolute public URL; share links on item pages need it.
# base_url = "https://example.com"

# ---------------------------------------------------------------------------
# Collections
# ---------------------------------------------------------------------------
# Each collection is a directory of markdown files. Only files named in
# `include` are published, in the order listed. Entries without a file on
# disk are skipped, so the list can stage work that isn't written yet.
[[collections]]
name = "articles"
title = "Articles"
dir = "articles"
route = "/articles"
include = []

[[collections]]
name = "blogs"
title = "Blog"
dir = "blogs"
route = "/blogs"
include = []

# ---------------------------------------------------------------------------
# Tag vocabulary
# ---------------------------------------------------------------------------
# Only these tags get filter buttons, in this order. Tags used in front
# matter but missing here are ignored by the filter.
# [[tags]]
# display_text = "Rust"
# tag_id = "rust"

# ---------------------------------------------------------------------------
# Access exceptions
# ---------------------------------------------------------------------------
# Keyed by filename. Unlisted items are gated and not indexed.
# [exceptions."open-letter.md"]
# bypass_verification = true
# allow_search_indexing = true
# reason = "Shared publicly"

# ---------------------------------------------------------------------------
# Access gate (used by `folio serve`)
# ---------------------------------------------------------------------------
[gate]
enabled = true
cookie_name = "folio_verified"
challenge_path = "/verify"
article_route = "/articles"
verified_param = "verified"
intended_param = "intended"
item_param = "article"
exempt_prefixes = ["/verify", "/assets", "/favicon.ico", "/robots.txt"]

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel content loading workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
