//! Shared content types.
//!
//! These types are serialized to the JSON manifest between the scan and
//! generate stages and must stay identical on both sides.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Front matter of a content file.
///
/// Keys are camelCase in the file (`cardDescription`, `tagIds`, ...). The
/// first five fields are required; everything else degrades to "not shown".
/// Unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub title: String,
    pub card_description: String,
    pub card_page_link: String,
    pub image_path: String,
    pub tag_ids: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_written: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_type: Option<ArticleType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleType {
    Article,
    Blog,
}

impl ArticleType {
    pub fn label(self) -> &'static str {
        match self {
            ArticleType::Article => "Article",
            ArticleType::Blog => "Blog",
        }
    }
}

/// A published markdown file.
///
/// Built once by the content loader and immutable afterwards. The rendered
/// body is derived from `body` at construction; there are no setters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    id: String,
    raw_source: String,
    body: String,
    rendered_body: String,
    metadata: Metadata,
}

impl ContentItem {
    pub(crate) fn new(
        id: String,
        raw_source: String,
        body: String,
        rendered_body: String,
        metadata: Metadata,
    ) -> Self {
        Self {
            id,
            raw_source,
            body,
            rendered_body,
            metadata,
        }
    }

    /// Filename stem, unique within the collection.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Full file text, front matter included.
    pub fn raw_source(&self) -> &str {
        &self.raw_source
    }

    /// Markdown text with the front matter removed.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// HTML rendering of [`body`](Self::body).
    pub fn rendered_body(&self) -> &str {
        &self.rendered_body
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}
