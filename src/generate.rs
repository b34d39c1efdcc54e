//! HTML site generation.
//!
//! Stage 2 of the folio build pipeline. Takes the scan manifest and writes
//! the final static site.
//!
//! ## Generated Pages
//!
//! - **Home** (`/index.html`): filter bar plus a card section per collection
//! - **Listings** (`/{route}/index.html`): all cards of one collection
//! - **Item pages** (`/{route}/{id}/index.html`): the rendered article
//! - **Challenge** (`/verify.html`): the human check the gate rewrites to
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html
//! ├── verify.html
//! ├── assets/                    # content/assets/, copied verbatim
//! ├── articles/
//! │   ├── index.html
//! │   └── rust-ownership/
//! │       └── index.html
//! └── blogs/
//!     └── ...
//! ```
//!
//! ## Search Indexing
//!
//! Item pages carry `<meta name="robots" content="noindex, nofollow">` unless
//! the exception registry allows indexing for that item.
//!
//! ## CSS and JavaScript
//!
//! Static assets are embedded at compile time and inlined into each page, so
//! a page served in place of another by the gate still renders:
//! - `static/style.css`: site styles
//! - `static/filter.js`: tag filter for card listings
//! - `static/verify.js`: challenge completion

use crate::config::{GateConfig, SiteMeta};
use crate::exceptions::ExceptionRegistry;
use crate::scan::{CollectionManifest, Manifest};
use crate::tags::{TagDef, TagVocabulary};
use crate::types::ContentItem;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Asset copy error: {0}")]
    Walk(#[from] walkdir::Error),
}

const CSS: &str = include_str!("../static/style.css");
const FILTER_JS: &str = include_str!("../static/filter.js");
const VERIFY_JS: &str = include_str!("../static/verify.js");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Home,
    Listing,
    Item,
    Challenge,
}

/// One written HTML file.
#[derive(Debug, Clone)]
pub struct GeneratedPage {
    pub kind: PageKind,
    pub title: String,
    /// Path relative to the output directory
    pub path: String,
}

#[derive(Debug, Default)]
pub struct GenerateSummary {
    pub pages: Vec<GeneratedPage>,
    pub assets_copied: usize,
}

impl GenerateSummary {
    pub fn count(&self, kind: PageKind) -> usize {
        self.pages.iter().filter(|p| p.kind == kind).count()
    }
}

pub fn generate(
    manifest_path: &Path,
    source_root: &Path,
    output_dir: &Path,
) -> Result<GenerateSummary, GenerateError> {
    let manifest_content = fs::read_to_string(manifest_path)?;
    let manifest: Manifest = serde_json::from_str(&manifest_content)?;
    render_site(&manifest, source_root, output_dir)
}

/// Write every page of the site and copy `assets/`.
pub fn render_site(
    manifest: &Manifest,
    source_root: &Path,
    output_dir: &Path,
) -> Result<GenerateSummary, GenerateError> {
    let site = Site::new(manifest);
    let mut summary = GenerateSummary::default();
    fs::create_dir_all(output_dir)?;
    let mut item_routes = static_paths(manifest).into_iter();

    write_page(output_dir, "index.html", render_index(&site))?;
    summary.pages.push(GeneratedPage {
        kind: PageKind::Home,
        title: manifest.config.site.title.clone(),
        path: "index.html".to_string(),
    });

    for collection in &manifest.collections {
        let route_dir = route_to_dir(&collection.route);
        let listing_path = join_rel(&route_dir, "index.html");
        write_page(output_dir, &listing_path, render_listing_page(&site, collection))?;
        summary.pages.push(GeneratedPage {
            kind: PageKind::Listing,
            title: collection.title.clone(),
            path: listing_path,
        });

        // `static_paths` lists items in this same order
        for (item, route) in collection.items.iter().zip(item_routes.by_ref()) {
            let item_path = join_rel(&route_to_dir(&route), "index.html");
            write_page(output_dir, &item_path, render_item_page(&site, collection, item))?;
            summary.pages.push(GeneratedPage {
                kind: PageKind::Item,
                title: item.metadata().title.clone(),
                path: item_path,
            });
        }
        tracing::debug!(
            collection = %collection.name,
            items = collection.items.len(),
            "generated collection pages"
        );
    }

    let challenge_path = challenge_file(&manifest.config.gate);
    write_page(output_dir, &challenge_path, render_challenge_page(&site))?;
    summary.pages.push(GeneratedPage {
        kind: PageKind::Challenge,
        title: "Verify".to_string(),
        path: challenge_path,
    });

    summary.assets_copied = copy_assets(source_root, output_dir)?;
    tracing::info!(
        pages = summary.pages.len(),
        assets = summary.assets_copied,
        output = %output_dir.display(),
        "site generated"
    );
    Ok(summary)
}

/// Site paths of every item page: `{route}/{id}`, in manifest order.
pub fn static_paths(manifest: &Manifest) -> Vec<String> {
    manifest
        .collections
        .iter()
        .flat_map(|c| c.items.iter().map(move |item| c.item_path(item.id())))
        .collect()
}

/// File the challenge page is written to, relative to the output directory.
pub fn challenge_file(gate: &GateConfig) -> String {
    format!("{}.html", gate.challenge_path.trim_start_matches('/'))
}

fn route_to_dir(route: &str) -> String {
    route.trim_matches('/').to_string()
}

fn join_rel(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

fn write_page(output_dir: &Path, rel_path: &str, markup: Markup) -> Result<(), GenerateError> {
    let path = output_dir.join(rel_path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, markup.into_string())?;
    Ok(())
}

/// Copy `<source>/assets/` to `<output>/assets/`. Returns the file count.
fn copy_assets(source_root: &Path, output_dir: &Path) -> Result<usize, GenerateError> {
    let assets = source_root.join("assets");
    if !assets.is_dir() {
        return Ok(0);
    }
    let dest_root = output_dir.join("assets");
    let mut copied = 0;
    for entry in WalkDir::new(&assets).min_depth(1) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(&assets)
            .map_err(std::io::Error::other)?;
        let dest: PathBuf = dest_root.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest)?;
        } else {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &dest)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Everything page renderers read, resolved once per build.
struct Site<'a> {
    manifest: &'a Manifest,
    registry: ExceptionRegistry,
    vocab: TagVocabulary,
}

impl<'a> Site<'a> {
    fn new(manifest: &'a Manifest) -> Self {
        Self {
            manifest,
            registry: manifest.registry(),
            vocab: manifest.vocabulary(),
        }
    }

    fn meta(&self) -> &SiteMeta {
        &self.manifest.config.site
    }

    fn page_title(&self, title: &str) -> String {
        format!("{title} · {}", self.meta().title)
    }
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(
    title: &str,
    description: &str,
    robots: Option<&str>,
    body_class: Option<&str>,
    content: Markup,
) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                @if !description.is_empty() {
                    meta name="description" content=(description);
                }
                @if let Some(robots) = robots {
                    meta name="robots" content=(robots);
                }
                title { (title) }
                style { (PreEscaped(CSS)) }
            }
            body class=[body_class] {
                (content)
            }
        }
    }
}

/// Renders the site header: title link plus one nav entry per collection
fn site_header(site: &Site, current_route: Option<&str>) -> Markup {
    html! {
        header.site-header {
            a.site-title href="/" { (site.meta().title) }
            nav.site-nav {
                ul {
                    @for collection in &site.manifest.collections {
                        @let is_current = current_route == Some(collection.route.as_str());
                        li class=[is_current.then_some("current")] {
                            a href={ (collection.route) "/" } { (collection.title) }
                        }
                    }
                }
            }
        }
    }
}

/// Filter buttons in vocabulary order. Empty when there is no vocabulary.
fn render_filter_bar(vocab: &TagVocabulary) -> Markup {
    html! {
        @if !vocab.is_empty() {
            div.tag-filter role="group" aria-label="Filter by tag" {
                @for tag in vocab.iter() {
                    button.tag-button type="button" data-tag=(tag.tag_id) aria-pressed="false" {
                        (tag.display_text)
                    }
                }
                button.tag-button.tag-clear type="button" hidden { "Show all" }
            }
        }
    }
}

fn render_tag_list(tags: &[&TagDef]) -> Markup {
    html! {
        @if !tags.is_empty() {
            ul.tag-list {
                @for tag in tags {
                    li data-tag=(tag.tag_id) { (tag.display_text) }
                }
            }
        }
    }
}

/// A content card. `data-tags` only lists vocabulary tags, so unknown tags
/// can never be matched by the filter.
fn render_card(item: &ContentItem, vocab: &TagVocabulary) -> Markup {
    let meta = item.metadata();
    let tags = vocab.known(&meta.tag_ids);
    let data_tags = tags
        .iter()
        .map(|t| t.tag_id.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    html! {
        a.card href=(meta.card_page_link) data-tags=(data_tags) data-id=(item.id()) {
            img src=(meta.image_path) alt=(meta.title) loading="lazy";
            div.card-body {
                h3.card-title { (meta.title) }
                p.card-description { (meta.card_description) }
                (render_tag_list(&tags))
            }
        }
    }
}

fn render_card_grid(items: &[ContentItem], vocab: &TagVocabulary) -> Markup {
    html! {
        @if items.is_empty() {
            p.card-empty { "Nothing here yet." }
        } @else {
            div.card-grid {
                @for item in items {
                    (render_card(item, vocab))
                }
            }
        }
    }
}

/// Share links for an item page, or `None` without a usable `base_url`.
fn render_share_links(base_url: &str, item_path: &str, title: &str) -> Option<Markup> {
    let page_url = match Url::parse(&format!("{}{item_path}/", base_url.trim_end_matches('/'))) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(base_url, error = %e, "site.base_url is not a valid URL, skipping share links");
            return None;
        }
    };
    let encode = |pairs: &[(&str, &str)]| {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish()
    };
    let page = page_url.as_str();
    let x = format!(
        "https://twitter.com/intent/tweet?{}",
        encode(&[("url", page), ("text", title)])
    );
    let linkedin = format!(
        "https://www.linkedin.com/sharing/share-offsite/?{}",
        encode(&[("url", page)])
    );
    // mailto wants %20, not the form encoding's '+'
    let email = format!(
        "mailto:?{}",
        encode(&[("subject", title), ("body", page)]).replace('+', "%20")
    );

    Some(html! {
        nav.share-links aria-label="Share" {
            a href=(x) target="_blank" rel="noopener noreferrer" { "Share on X" }
            a href=(linkedin) target="_blank" rel="noopener noreferrer" { "Share on LinkedIn" }
            a href=(email) { "Share by email" }
        }
    })
}

// ============================================================================
// Page Renderers
// ============================================================================

/// Renders the home page: filter bar and one card section per collection
fn render_index(site: &Site) -> Markup {
    let content = html! {
        (site_header(site, None))
        main.index-page {
            @if !site.meta().description.is_empty() {
                p.site-description { (site.meta().description) }
            }
            (render_filter_bar(&site.vocab))
            @for collection in &site.manifest.collections {
                section.collection-section data-collection=(collection.name) {
                    h2 {
                        a href={ (collection.route) "/" } { (collection.title) }
                    }
                    (render_card_grid(&collection.items, &site.vocab))
                }
            }
        }
        script { (PreEscaped(FILTER_JS)) }
    };

    base_document(
        &site.meta().title,
        &site.meta().description,
        None,
        None,
        content,
    )
}

/// Renders a collection listing page
fn render_listing_page(site: &Site, collection: &CollectionManifest) -> Markup {
    let content = html! {
        (site_header(site, Some(collection.route.as_str())))
        main.listing-page {
            h1 { (collection.title) }
            (render_filter_bar(&site.vocab))
            (render_card_grid(&collection.items, &site.vocab))
        }
        script { (PreEscaped(FILTER_JS)) }
    };

    base_document(
        &site.page_title(&collection.title),
        &site.meta().description,
        None,
        Some("listing"),
        content,
    )
}

/// Renders an item page. Optional metadata is left out when absent.
fn render_item_page(site: &Site, collection: &CollectionManifest, item: &ContentItem) -> Markup {
    let meta = item.metadata();
    let robots = (!site.registry.should_allow_search_indexing(item.id()))
        .then_some("noindex, nofollow");
    let author = meta
        .author
        .as_deref()
        .or_else(|| Some(site.meta().author.as_str()).filter(|a| !a.is_empty()));
    let has_byline =
        author.is_some() || meta.date_written.is_some() || meta.date_last_updated.is_some();
    let tags = site.vocab.known(&meta.tag_ids);
    let share = site
        .meta()
        .base_url
        .as_deref()
        .and_then(|base| render_share_links(base, &collection.item_path(item.id()), &meta.title));

    let content = html! {
        (site_header(site, Some(collection.route.as_str())))
        main {
            article.article data-id=(item.id()) {
                header.article-header {
                    @if let Some(kind) = meta.article_type {
                        p.article-kind { (kind.label()) }
                    }
                    h1 { (meta.title) }
                    @if let Some(sub_title) = &meta.sub_title {
                        p.article-subtitle { (sub_title) }
                    }
                    @if has_byline {
                        p.article-meta {
                            @if let Some(author) = author {
                                span.article-author { "By " (author) }
                            }
                            @if let Some(date) = &meta.date_written {
                                span.article-written { "Written " time datetime=(date) { (date) } }
                            }
                            @if let Some(date) = &meta.date_last_updated {
                                span.article-updated { "Updated " time datetime=(date) { (date) } }
                            }
                        }
                    }
                    (render_tag_list(&tags))
                }
                div.article-body {
                    (PreEscaped(item.rendered_body()))
                }
                @if let Some(share) = share {
                    (share)
                }
            }
        }
    };

    base_document(
        &site.page_title(&meta.title),
        &meta.card_description,
        robots,
        Some("item"),
        content,
    )
}

/// Renders the challenge page the gate serves to unverified visitors
fn render_challenge_page(site: &Site) -> Markup {
    let gate = &site.manifest.config.gate;
    let content = html! {
        main.verify-page {
            h1 { (site.meta().title) }
            p { "Please confirm you're a person to continue." }
            form.verify-form id="verify-form"
                data-verified-param=(gate.verified_param)
                data-intended-param=(gate.intended_param)
                data-item-param=(gate.item_param)
                data-challenge-path=(gate.challenge_path) {
                label {
                    input id="human-check" type="checkbox";
                    " I'm not a robot"
                }
                button type="submit" disabled { "Continue" }
            }
        }
        script { (PreEscaped(VERIFY_JS)) }
    };

    base_document(
        &site.page_title("Verify"),
        "",
        Some("noindex, nofollow"),
        Some("verify"),
        content,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::scan;
    use crate::test_helpers::*;
    use tempfile::TempDir;

    /// Scan the fixtures and generate into a sibling temp dir.
    fn build_fixture_site() -> (TempDir, TempDir, Manifest, GenerateSummary) {
        let content = setup_fixtures();
        let output = TempDir::new().unwrap();
        let manifest = scan(content.path()).unwrap();
        let summary = render_site(&manifest, content.path(), output.path()).unwrap();
        (content, output, manifest, summary)
    }

    fn read(dir: &TempDir, rel: &str) -> String {
        fs::read_to_string(dir.path().join(rel))
            .unwrap_or_else(|e| panic!("failed to read {rel}: {e}"))
    }

    #[test]
    fn writes_expected_pages() {
        let (_content, output, _manifest, summary) = build_fixture_site();
        for rel in [
            "index.html",
            "verify.html",
            "articles/index.html",
            "articles/rust-ownership/index.html",
            "articles/building-a-gate/index.html",
            "articles/open-letter/index.html",
            "blogs/index.html",
            "blogs/first-post/index.html",
        ] {
            assert!(output.path().join(rel).is_file(), "missing {rel}");
        }
        assert!(!output.path().join("articles/not-listed").exists());
        assert!(!output.path().join("articles/unwritten-draft").exists());

        assert_eq!(summary.count(PageKind::Home), 1);
        assert_eq!(summary.count(PageKind::Listing), 2);
        assert_eq!(summary.count(PageKind::Item), 4);
        assert_eq!(summary.count(PageKind::Challenge), 1);
    }

    #[test]
    fn copies_assets() {
        let (_content, output, _manifest, summary) = build_fixture_site();
        assert_eq!(summary.assets_copied, 1);
        assert!(output.path().join("assets/ownership.svg").is_file());
    }

    #[test]
    fn gated_items_are_noindex() {
        let (_content, output, _manifest, _summary) = build_fixture_site();
        let html = read(&output, "articles/rust-ownership/index.html");
        assert!(html.contains(r#"<meta name="robots" content="noindex, nofollow">"#));
    }

    #[test]
    fn indexing_exception_drops_robots_meta() {
        let (_content, output, _manifest, _summary) = build_fixture_site();
        let html = read(&output, "articles/open-letter/index.html");
        assert!(!html.contains(r#"name="robots""#));
    }

    #[test]
    fn item_page_shows_metadata_when_present() {
        let (_content, output, _manifest, _summary) = build_fixture_site();
        let html = read(&output, "articles/rust-ownership/index.html");
        assert!(html.contains("<h1>Ownership Without Tears</h1>"));
        assert!(html.contains("How the borrow checker stops being scary"));
        assert!(html.contains("By Sam Rivera"));
        assert!(html.contains(r#"<time datetime="2024-03-02">"#));
        assert!(html.contains("Updated "));
        assert!(html.contains(r#"<h2 id="moves">"#));
        assert!(html.contains("<title>Ownership Without Tears · Test Portfolio</title>"));
    }

    #[test]
    fn item_page_omits_absent_metadata() {
        let (_content, output, _manifest, _summary) = build_fixture_site();
        let html = read(&output, "articles/building-a-gate/index.html");
        assert!(!html.contains(r#"class="article-subtitle""#));
        assert!(!html.contains(r#"class="article-updated""#));
        // Falls back to the site author
        assert!(html.contains("By Sam Rivera"));
    }

    #[test]
    fn item_tags_exclude_unknown_ids() {
        let (_content, output, _manifest, _summary) = build_fixture_site();
        let html = read(&output, "blogs/first-post/index.html");
        assert!(html.contains(r#"<li data-tag="web">Web</li>"#));
        assert!(!html.contains("misc"));
    }

    #[test]
    fn cards_carry_vocabulary_tags_only() {
        let (_content, output, _manifest, _summary) = build_fixture_site();
        let html = read(&output, "index.html");
        // Vocabulary order, unknown "misc" dropped
        assert!(html.contains(r#"data-tags="web career""#));
        assert!(html.contains(r#"data-tags="rust web""#));
        assert!(html.contains(r#"href="/articles/rust-ownership""#));
    }

    #[test]
    fn filter_buttons_follow_vocabulary_order() {
        let (_content, output, _manifest, _summary) = build_fixture_site();
        let html = read(&output, "articles/index.html");
        let rust = html.find(r#"data-tag="rust" aria-pressed"#).unwrap();
        let web = html.find(r#"data-tag="web" aria-pressed"#).unwrap();
        let career = html.find(r#"data-tag="career" aria-pressed"#).unwrap();
        assert!(rust < web && web < career);
        assert!(html.contains(r#"class="tag-filter""#));
    }

    #[test]
    fn listing_keeps_inclusion_order() {
        let (_content, output, _manifest, _summary) = build_fixture_site();
        let html = read(&output, "articles/index.html");
        let first = html.find(r#"data-id="rust-ownership""#).unwrap();
        let second = html.find(r#"data-id="building-a-gate""#).unwrap();
        let third = html.find(r#"data-id="open-letter""#).unwrap();
        assert!(first < second && second < third);
    }

    #[test]
    fn share_links_use_base_url() {
        let (_content, output, _manifest, _summary) = build_fixture_site();
        let html = read(&output, "articles/open-letter/index.html");
        assert!(html.contains(r#"class="share-links""#));
        assert!(html.contains("https%3A%2F%2Ffolio.example%2Farticles%2Fopen-letter%2F"));
        assert!(html.contains("mailto:?subject=An%20Open%20Letter%20to%20Hiring%20Managers"));
    }

    #[test]
    fn share_links_need_base_url() {
        let content = setup_fixtures();
        let output = TempDir::new().unwrap();
        let mut manifest = scan(content.path()).unwrap();
        manifest.config.site.base_url = None;
        render_site(&manifest, content.path(), output.path()).unwrap();
        let html = read(&output, "articles/open-letter/index.html");
        assert!(!html.contains(r#"class="share-links""#));
    }

    #[test]
    fn invalid_base_url_skips_share_links() {
        assert!(render_share_links("not a url", "/articles/x", "X").is_none());
        assert!(render_share_links("https://folio.example/", "/articles/x", "X").is_some());
    }

    #[test]
    fn challenge_page_carries_gate_params() {
        let (_content, output, _manifest, _summary) = build_fixture_site();
        let html = read(&output, "verify.html");
        assert!(html.contains(r#"data-verified-param="verified""#));
        assert!(html.contains(r#"data-intended-param="intended""#));
        assert!(html.contains(r#"data-item-param="article""#));
        assert!(html.contains(r#"data-challenge-path="/verify""#));
        assert!(html.contains("noindex, nofollow"));
    }

    #[test]
    fn static_paths_list_item_routes() {
        let (_content, _output, manifest, _summary) = build_fixture_site();
        assert_eq!(
            static_paths(&manifest),
            vec![
                "/articles/rust-ownership",
                "/articles/building-a-gate",
                "/articles/open-letter",
                "/blogs/first-post",
            ]
        );
    }

    #[test]
    fn item_pages_written_at_static_paths() {
        let (_content, output, manifest, summary) = build_fixture_site();
        let written: Vec<&str> = summary
            .pages
            .iter()
            .filter(|p| p.kind == PageKind::Item)
            .map(|p| p.path.as_str())
            .collect();
        let expected: Vec<String> = static_paths(&manifest)
            .iter()
            .map(|route| format!("{}/index.html", route.trim_start_matches('/')))
            .collect();
        assert_eq!(written, expected);
        for path in &expected {
            assert!(output.path().join(path).is_file(), "{path}");
        }
    }

    #[test]
    fn empty_collection_renders_placeholder() {
        let content = setup_fixtures();
        fs::remove_dir_all(content.path().join("blogs")).unwrap();
        let output = TempDir::new().unwrap();
        let manifest = scan(content.path()).unwrap();
        render_site(&manifest, content.path(), output.path()).unwrap();
        let html = read(&output, "blogs/index.html");
        assert!(html.contains("Nothing here yet."));
    }

    #[test]
    fn generate_reads_manifest_file() {
        let content = setup_fixtures();
        let output = TempDir::new().unwrap();
        let manifest = scan(content.path()).unwrap();
        let manifest_path = content.path().join(".folio-temp/manifest.json");
        manifest.save(&manifest_path).unwrap();

        let summary = generate(&manifest_path, content.path(), output.path()).unwrap();
        assert_eq!(summary.count(PageKind::Item), 4);
    }

    #[test]
    fn no_vocabulary_means_no_filter_bar() {
        let html = render_filter_bar(&TagVocabulary::default()).into_string();
        assert!(html.is_empty());
    }

    #[test]
    fn base_document_includes_doctype() {
        let content = html! { p { "test" } };
        let doc = base_document("Test", "", None, None, content).into_string();
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(!doc.contains("name=\"description\""));
    }

    #[test]
    fn challenge_file_follows_config() {
        let gate = GateConfig {
            challenge_path: "/human-check".to_string(),
            ..GateConfig::default()
        };
        assert_eq!(challenge_file(&gate), "human-check.html");
        assert_eq!(challenge_file(&GateConfig::default()), "verify.html");
    }
}
