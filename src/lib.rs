//! # folio
//!
//! A static site generator and gated preview server for a personal portfolio
//! or blog. Markdown files with YAML front matter become article pages and
//! filterable cards; a request gate keeps unverified visitors on a challenge
//! page, except for articles the exception registry opens up.
//!
//! # Architecture: Two-Stage Pipeline Plus Server
//!
//! ```text
//! 1. Scan      content/  →  manifest.json    (config + ordered, parsed items)
//! 2. Generate  manifest  →  dist/            (final HTML site)
//! 3. Serve     dist/     →  http             (access gate in front of the files)
//! ```
//!
//! The manifest is plain JSON, so a scan can be inspected on its own and
//! generation can be tested without touching the content directory.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `config.toml` loading over stock defaults, validation, `gen-config` output |
//! | [`exceptions`] | Exception registry: per-item verification bypass and search indexing |
//! | [`gate`] | Access gate: pure allow / set-cookie / rewrite decision per request |
//! | [`render`] | Markdown → HTML with heading ids, external links, figures, code blocks |
//! | [`types`] | Shared content types serialized in the manifest (`ContentItem`, `Metadata`) |
//! | [`content`] | Content loader: inclusion-list ordering, front matter, parallel loading |
//! | [`tags`] | Tag vocabulary, tag filter and the filter selection |
//! | [`scan`] | Stage 1: loads every collection into the manifest |
//! | [`generate`] | Stage 2: renders the site from the manifest using Maud |
//! | [`serve`] | axum server with the gate as middleware over the generated files |
//! | [`output`] | CLI output formatting: information-first display of results |
//!
//! # Design Decisions
//!
//! ## Explicit Inclusion Lists
//!
//! A collection publishes exactly the files its `include` list names, in list
//! order. Drafts can sit in the directory without appearing anywhere, and an
//! entry whose file doesn't exist yet is skipped rather than failing the
//! build.
//!
//! ## Rewrites, Not Redirects
//!
//! The gate serves the challenge page in place of the requested one. The
//! browser keeps the URL it asked for, so the challenge page can send the
//! visitor back to it with `verified=true` without any server-side state.
//!
//! ## Everything Inlined
//!
//! CSS and JavaScript are compiled into the binary and inlined into every
//! page. A challenge page served under an article URL needs no further
//! requests through the gate to render.

pub mod config;
pub mod content;
pub mod exceptions;
pub mod gate;
pub mod generate;
pub mod output;
pub mod render;
pub mod scan;
pub mod serve;
pub mod tags;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
