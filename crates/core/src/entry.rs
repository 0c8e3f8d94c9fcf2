//! Stored article state.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// A label attached to entries.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Tag {
    pub label: String,
}

impl Tag {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into() }
    }
}

/// A saved article.
///
/// An entry is created by the caller with the URL a user submitted, then
/// mutated in place by [`crate::ContentProxy::update_entry`].
///
/// # Example
///
/// ```rust
/// use shelfmark_core::{Entry, Tag};
///
/// let mut entry = Entry::new("https://example.com/post");
/// entry.add_tag(Tag::new("rust"));
/// entry.add_tag(Tag::new("rust"));
/// assert_eq!(entry.tags().len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Entry {
    /// Canonical URL.
    pub url: String,
    /// First URL the entry was submitted under, before a redirect.
    pub origin_url: Option<String>,
    pub title: Option<String>,
    /// Stored article HTML.
    pub content: Option<String>,
    /// Estimated reading time in minutes.
    pub reading_time: u32,
    pub domain_name: Option<String>,
    pub language: Option<String>,
    pub preview_picture: Option<String>,
    /// HTTP status code as text.
    pub http_status: Option<String>,
    pub published_at: Option<DateTime<FixedOffset>>,
    pub published_by: Option<Vec<String>>,
    pub headers: Option<BTreeMap<String, String>>,
    pub mimetype: Option<String>,
    tags: Vec<Tag>,
}

impl Entry {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), ..Default::default() }
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn has_tag(&self, label: &str) -> bool {
        self.tags.iter().any(|tag| tag.label == label)
    }

    /// Adds a tag unless one with the same label is already attached.
    pub fn add_tag(&mut self, tag: Tag) {
        if !self.has_tag(&tag.label) {
            self.tags.push(tag);
        }
    }

    pub fn remove_tag(&mut self, label: &str) {
        self.tags.retain(|tag| tag.label != label);
    }

    pub fn remove_all_tags(&mut self) {
        self.tags.clear();
    }
}
