//! Markdown → HTML rendering with site-specific element rules.
//!
//! Bodies go through pulldown-cmark, but a handful of elements are swapped for
//! the site's own markup before serialization:
//!
//! | Markdown            | Output                                                        |
//! |---------------------|---------------------------------------------------------------|
//! | `## Heading`        | `<h2 id="heading">` (slug ids, de-duplicated with `-1`, `-2`) |
//! | `[x](https://…)`    | `<a … target="_blank" rel="noopener noreferrer">`             |
//! | `![alt](src "cap")` | `<figure class="content-figure"><img loading="lazy"><figcaption>` |
//! | fenced code         | `<pre class="code-block" data-lang="…"><code class="language-…">` |
//!
//! Rendering is a pure function of the input text, which is what lets the
//! generate stage treat rendered bodies as cacheable build output.

use maud::{PreEscaped, html};
use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, html as md_html};
use std::collections::HashMap;

fn options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_FOOTNOTES
}

/// Render a markdown body to HTML.
pub fn render_markdown(source: &str) -> String {
    let events: Vec<Event> = Parser::new_ext(source, options()).collect();
    let mut slugs = SlugSet::default();
    let events = transform(events, &mut slugs);
    let mut out = String::with_capacity(source.len() * 3 / 2);
    md_html::push_html(&mut out, events.into_iter());
    out
}

fn transform<'a>(events: Vec<Event<'a>>, slugs: &mut SlugSet) -> Vec<Event<'a>> {
    let mut out = Vec::with_capacity(events.len());
    let mut iter = events.into_iter();

    while let Some(event) = iter.next() {
        match event {
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                let inner = take_until_end(&mut iter);
                let id = id.unwrap_or_else(|| CowStr::from(slugs.claim(&plain_text(&inner))));
                out.push(Event::Start(Tag::Heading {
                    level,
                    id: Some(id),
                    classes,
                    attrs,
                }));
                out.extend(transform(inner, slugs));
                out.push(Event::End(TagEnd::Heading(level)));
            }
            Event::Start(Tag::Link {
                dest_url, title, ..
            }) if is_external(&dest_url) => {
                let inner = transform(take_until_end(&mut iter), slugs);
                out.push(Event::InlineHtml(CowStr::from(external_link(
                    &dest_url, &title, inner,
                ))));
            }
            Event::Start(Tag::Image {
                dest_url, title, ..
            }) => {
                let alt = plain_text(&take_until_end(&mut iter));
                out.push(Event::InlineHtml(CowStr::from(figure(&dest_url, &title, &alt))));
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                let code = plain_text(&take_until_end(&mut iter));
                let lang = match &kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                out.push(Event::Html(CowStr::from(code_block(lang.as_deref(), &code))));
            }
            other => out.push(other),
        }
    }
    out
}

/// Drain events up to (not including) the `End` that closes the current tag.
fn take_until_end<'a>(iter: &mut impl Iterator<Item = Event<'a>>) -> Vec<Event<'a>> {
    let mut depth = 1usize;
    let mut inner = Vec::new();
    for event in iter.by_ref() {
        match &event {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            _ => {}
        }
        inner.push(event);
    }
    inner
}

fn plain_text(events: &[Event]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            _ => {}
        }
    }
    text
}

fn is_external(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn external_link(dest: &str, title: &str, inner: Vec<Event>) -> String {
    let mut inner_html = String::new();
    md_html::push_html(&mut inner_html, inner.into_iter());
    let title = (!title.is_empty()).then_some(title);
    html! {
        a href=(dest) title=[title] target="_blank" rel="noopener noreferrer" {
            (PreEscaped(inner_html))
        }
    }
    .into_string()
}

fn figure(src: &str, title: &str, alt: &str) -> String {
    let caption = [title, alt].into_iter().find(|s| !s.is_empty());
    html! {
        figure.content-figure {
            img src=(src) alt=(alt) loading="lazy";
            @if let Some(caption) = caption {
                figcaption { (caption) }
            }
        }
    }
    .into_string()
}

fn code_block(lang: Option<&str>, code: &str) -> String {
    let class = lang.map(|l| format!("language-{l}"));
    let markup = html! {
        pre.code-block data-lang=[lang] {
            code class=[class] { (code) }
        }
    };
    format!("{}\n", markup.into_string())
}

/// Heading slugs handed out so far, for de-duplication.
#[derive(Default)]
struct SlugSet {
    seen: HashMap<String, usize>,
}

impl SlugSet {
    fn claim(&mut self, text: &str) -> String {
        let base = slugify(text);
        let count = self.seen.entry(base.clone()).or_insert(0);
        let slug = if *count == 0 {
            base
        } else {
            format!("{base}-{count}")
        };
        *count += 1;
        slug
    }
}

/// Lowercase alphanumerics joined by single dashes.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}
