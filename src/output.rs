//! CLI output formatting for all pipeline stages.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. The primary display
//! for every item is its position and title, with the file it came from
//! shown as an indented `Source:` line. The output reads as a content
//! inventory while still pointing back to specific files.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Articles (3 items)
//!     Source: articles/
//!     001 Ownership Without Tears
//!         Source: rust-ownership.md
//!         Tags: Rust
//!     002 Building a Request Gate
//!         Source: building-a-gate.md
//!     Skipped: unwritten-draft.md (no file)
//!
//! Tags
//!     Rust (rust)
//!
//! Exceptions
//!     open-letter.md: bypass verification, search indexing
//!         Reason: Linked from a public talk
//!
//! Config
//!     config.toml
//!     assets/
//! ```
//!
//! ## Generate
//!
//! ```text
//! Home → index.html
//! Articles → articles/index.html
//!     001 Ownership Without Tears → articles/rust-ownership/index.html
//! Challenge → verify.html
//!
//! Generated 1 listing, 1 item page, 1 challenge page, 2 assets
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::config::SiteConfig;
use crate::generate::{GenerateSummary, PageKind};
use crate::scan::Manifest;
use crate::tags::{TagSelection, TagVocabulary};
use crate::types::Metadata;
use std::path::Path;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

/// Display names of the vocabulary tags on an item, in vocabulary order.
fn tag_names(metadata: &Metadata, vocab: &TagVocabulary) -> Vec<String> {
    vocab
        .known(&metadata.tag_ids)
        .into_iter()
        .map(|t| t.display_text.clone())
        .collect()
}

/// `001 Title` plus indented `Source:` and `Tags:` context lines.
fn item_lines(
    depth: usize,
    position: usize,
    id: &str,
    metadata: &Metadata,
    vocab: &TagVocabulary,
) -> Vec<String> {
    let pad = indent(depth);
    let mut lines = vec![format!("{pad}{} {}", format_index(position), metadata.title)];
    lines.push(format!("{pad}    Source: {id}.md"));
    let tags = tag_names(metadata, vocab);
    if !tags.is_empty() {
        lines.push(format!("{pad}    Tags: {}", tags.join(", ")));
    }
    lines
}

fn config_sections(config: &SiteConfig, source_root: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    let vocab = TagVocabulary::new(config.tags.clone());

    if !vocab.is_empty() {
        lines.push(String::new());
        lines.push("Tags".to_string());
        for tag in vocab.iter() {
            lines.push(format!("    {} ({})", tag.display_text, tag.tag_id));
        }
    }

    if !config.exceptions.is_empty() {
        lines.push(String::new());
        lines.push("Exceptions".to_string());
        for (file, entry) in &config.exceptions {
            let mut flags = Vec::new();
            if entry.bypass_verification {
                flags.push("bypass verification");
            }
            if entry.allow_search_indexing {
                flags.push("search indexing");
            }
            if flags.is_empty() {
                flags.push("no overrides");
            }
            lines.push(format!("    {file}: {}", flags.join(", ")));
            if let Some(reason) = &entry.reason {
                lines.push(format!("        Reason: {reason}"));
            }
        }
    }

    lines.push(String::new());
    lines.push("Config".to_string());
    if source_root.join("config.toml").exists() {
        lines.push("    config.toml".to_string());
    } else {
        lines.push("    (stock defaults)".to_string());
    }
    if source_root.join("assets").is_dir() {
        lines.push("    assets/".to_string());
    }
    if !config.gate.enabled {
        lines.push("    gate: disabled".to_string());
    }

    lines
}

// ============================================================================
// Stage 1: Scan output
// ============================================================================

/// Format scan stage output: collections and items, then config summary.
pub fn format_scan_output(manifest: &Manifest, source_root: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    let vocab = manifest.vocabulary();

    for (i, collection) in manifest.collections.iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        lines.push(format!(
            "{} ({})",
            collection.title,
            plural(collection.items.len(), "item", "items")
        ));
        lines.push(format!("    Source: {}/", collection.dir));
        for (pos, item) in collection.items.iter().enumerate() {
            lines.extend(item_lines(1, pos + 1, item.id(), item.metadata(), &vocab));
        }
        for id in &collection.skipped {
            lines.push(format!("    Skipped: {id}.md (no file)"));
        }
    }

    lines.extend(config_sections(&manifest.config, source_root));
    lines
}

/// Print scan output to stdout.
pub fn print_scan_output(manifest: &Manifest, source_root: &Path) {
    for line in format_scan_output(manifest, source_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 2: Generate output
// ============================================================================

/// Format generate stage output: every written page, then totals.
pub fn format_generate_output(summary: &GenerateSummary) -> Vec<String> {
    let mut lines = Vec::new();
    let mut item_pos = 0;

    for page in &summary.pages {
        match page.kind {
            PageKind::Home => lines.push(format!("Home → {}", page.path)),
            PageKind::Listing => {
                item_pos = 0;
                lines.push(format!("{} → {}", page.title, page.path));
            }
            PageKind::Item => {
                item_pos += 1;
                lines.push(format!(
                    "    {} {} → {}",
                    format_index(item_pos),
                    page.title,
                    page.path
                ));
            }
            PageKind::Challenge => lines.push(format!("Challenge → {}", page.path)),
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Generated {}, {}, {}, {}",
        plural(summary.count(PageKind::Listing), "listing", "listings"),
        plural(summary.count(PageKind::Item), "item page", "item pages"),
        plural(
            summary.count(PageKind::Challenge),
            "challenge page",
            "challenge pages"
        ),
        plural(summary.assets_copied, "asset", "assets"),
    ));
    lines
}

/// Print generate output to stdout.
pub fn print_generate_output(summary: &GenerateSummary) {
    for line in format_generate_output(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// List output
// ============================================================================

/// One collection's front-matter records, as loaded for `folio list`.
#[derive(Debug)]
pub struct ListedCollection {
    pub title: String,
    pub route: String,
    pub records: Vec<(String, Metadata)>,
}

/// Format content records, narrowed by the tag selection.
///
/// Positions are inclusion-order positions, so a filtered listing keeps the
/// numbers the full listing shows.
pub fn format_list_output(
    collections: &[ListedCollection],
    selection: &mut TagSelection,
    vocab: &TagVocabulary,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut shown = 0;

    for collection in collections {
        let kept = selection.filter(&collection.records, vocab);
        if kept.is_empty() {
            continue;
        }
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(collection.title.clone());
        for (pos, record) in collection.records.iter().enumerate() {
            if !kept.iter().any(|k| std::ptr::eq(*k, record)) {
                continue;
            }
            let (id, metadata) = record;
            let mut item = item_lines(1, pos + 1, id, metadata, vocab);
            item.push(format!("        Path: {}/{id}", collection.route));
            lines.extend(item);
            shown += 1;
        }
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    let filter_note = if selection.is_empty() {
        String::new()
    } else {
        let names: Vec<&str> = selection
            .selected()
            .iter()
            .filter_map(|id| vocab.display_text(id))
            .collect();
        format!(" tagged {}", names.join(" or "))
    };
    lines.push(format!("{}{filter_note}", plural(shown, "item", "items")));
    lines
}

/// Print list output to stdout.
pub fn print_list_output(
    collections: &[ListedCollection],
    selection: &mut TagSelection,
    vocab: &TagVocabulary,
) {
    for line in format_list_output(collections, selection, vocab) {
        println!("{}", line);
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Config problems that don't stop a build but probably aren't intended.
///
/// - an exception naming a file that isn't published anywhere
/// - a verification bypass on an item outside the gate's article route,
///   where the gate never looks it up
pub fn format_check_warnings(manifest: &Manifest) -> Vec<String> {
    let mut lines = Vec::new();
    let article_route = &manifest.config.gate.article_route;

    for (file, entry) in &manifest.config.exceptions {
        let owners: Vec<&str> = manifest
            .collections
            .iter()
            .filter(|c| c.items.iter().any(|i| format!("{}.md", i.id()) == *file))
            .map(|c| c.route.as_str())
            .collect();

        if owners.is_empty() {
            lines.push(format!("warning: exception {file} matches no published item"));
        } else if entry.bypass_verification && !owners.contains(&article_route.as_str()) {
            lines.push(format!(
                "warning: exception {file} bypasses verification, but only {article_route}/<id> pages are checked"
            ));
        }
    }
    lines
}
