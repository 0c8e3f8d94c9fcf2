//! Transient content records.
//!
//! A [`ContentRecord`] is what a fetch produced, or what a caller (an importer,
//! a browser extension) already had in hand. It lives for one ingestion call.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer};

/// Article body carried by a record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Option<String>")]
pub enum Body {
    /// HTML markup, possibly empty.
    Html(String),
    /// The fetcher could not retrieve the document.
    FetchFailed,
}

impl Body {
    /// Returns the markup, or `None` for a failed fetch.
    pub fn as_html(&self) -> Option<&str> {
        match self {
            Body::Html(html) => Some(html),
            Body::FetchFailed => None,
        }
    }

    /// True for a failed fetch or an empty document.
    pub fn is_empty(&self) -> bool {
        self.as_html().is_none_or(str::is_empty)
    }
}

impl Default for Body {
    fn default() -> Self {
        Body::Html(String::new())
    }
}

impl From<Option<String>> for Body {
    fn from(value: Option<String>) -> Self {
        Body::Html(value.unwrap_or_default())
    }
}

impl From<String> for Body {
    fn from(html: String) -> Self {
        Body::Html(html)
    }
}

impl From<&str> for Body {
    fn from(html: &str) -> Self {
        Body::Html(html.to_string())
    }
}

/// Publication date in whichever shape the source provided it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PublishedDate {
    /// Seconds since the Unix epoch.
    Timestamp(i64),
    /// An already parsed date.
    DateTime(DateTime<FixedOffset>),
    /// Free-form text, parsed later.
    Text(String),
}

/// Open Graph values found on the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OpenGraph {
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_image: Option<String>,
}

impl OpenGraph {
    pub fn title(&self) -> Option<&str> {
        non_empty(&self.og_title)
    }

    pub fn description(&self) -> Option<&str> {
        non_empty(&self.og_description)
    }

    pub fn image(&self) -> Option<&str> {
        non_empty(&self.og_image)
    }
}

/// Extracted or supplied article data consumed by one ingestion call.
///
/// Deserializes from the JSON shape importers produce, where `html` is a plain
/// string. Only a [`crate::ContentFetcher`] produces [`Body::FetchFailed`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContentRecord {
    pub title: Option<String>,

    /// Title bytes as found in the document, before any charset decoding.
    #[serde(skip)]
    pub raw_title: Option<Vec<u8>>,

    pub html: Body,

    pub url: String,

    pub content_type: Option<String>,

    pub language: Option<String>,

    pub date: Option<PublishedDate>,

    /// Authors; a non-list value in the source is dropped.
    #[serde(deserialize_with = "list_or_none")]
    pub authors: Option<Vec<String>>,

    /// HTTP status code as text (`"200"`).
    pub status: Option<String>,

    pub all_headers: Option<BTreeMap<String, String>>,

    pub open_graph: Option<OpenGraph>,
}

impl ContentRecord {
    /// Creates a record holding only a URL.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self { url: url.into(), ..Default::default() }
    }

    /// True when the caller supplied nothing at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// A record with a title, a body and a URL can be stored without fetching.
    pub fn is_usable(&self) -> bool {
        self.title().is_some() && !self.html.is_empty() && !self.url.is_empty()
    }

    /// True when the body signals a failed fetch.
    ///
    /// `marker` covers fetchers that still report failure by returning the
    /// configured error message as the document.
    pub fn is_fetch_failure(&self, marker: &str) -> bool {
        match &self.html {
            Body::FetchFailed => true,
            Body::Html(html) => html == marker,
        }
    }

    pub fn title(&self) -> Option<&str> {
        non_empty(&self.title)
    }

    pub fn content_type(&self) -> Option<&str> {
        non_empty(&self.content_type)
    }

    pub fn language(&self) -> Option<&str> {
        non_empty(&self.language)
    }

    pub fn status(&self) -> Option<&str> {
        non_empty(&self.status)
    }

    pub fn authors(&self) -> Option<&[String]> {
        self.authors.as_deref().filter(|authors| !authors.is_empty())
    }

    pub fn all_headers(&self) -> Option<&BTreeMap<String, String>> {
        self.all_headers.as_ref().filter(|headers| !headers.is_empty())
    }

    pub fn date(&self) -> Option<&PublishedDate> {
        self.date.as_ref().filter(|date| !matches!(date, PublishedDate::Text(text) if text.is_empty()))
    }

    pub fn open_graph(&self) -> Option<&OpenGraph> {
        self.open_graph.as_ref()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn list_or_none<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_record_is_empty() {
        let record = ContentRecord::default();
        assert!(record.is_empty());
        assert!(!record.is_usable());
        assert!(!ContentRecord::with_url("https://example.com").is_empty());
    }

    #[test]
    fn test_usable_requires_title_html_and_url() {
        let mut record = ContentRecord {
            title: Some("Title".to_string()),
            html: Body::Html("<p>Body</p>".to_string()),
            url: "https://example.com".to_string(),
            ..Default::default()
        };
        assert!(record.is_usable());

        record.title = Some(String::new());
        assert!(!record.is_usable());

        record.title = Some("Title".to_string());
        record.html = Body::FetchFailed;
        assert!(!record.is_usable());
    }

    #[test]
    fn test_fetch_failure_detection() {
        let marker = "could not fetch";
        let failed = ContentRecord { html: Body::FetchFailed, ..Default::default() };
        let legacy = ContentRecord { html: Body::Html(marker.to_string()), ..Default::default() };
        let fine = ContentRecord { html: Body::Html("<p>ok</p>".to_string()), ..Default::default() };

        assert!(failed.is_fetch_failure(marker));
        assert!(legacy.is_fetch_failure(marker));
        assert!(!fine.is_fetch_failure(marker));
    }

    #[test]
    fn test_deserialize_import_payload() {
        let json = r#"{
            "title": "Imported",
            "html": "<p>Saved earlier</p>",
            "url": "https://example.com/post",
            "date": 1514764800,
            "authors": ["Ada", "Grace"],
            "open_graph": {"og_image": "https://example.com/cover.png"}
        }"#;

        let record: ContentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.title(), Some("Imported"));
        assert_eq!(record.html, Body::Html("<p>Saved earlier</p>".to_string()));
        assert_eq!(record.date, Some(PublishedDate::Timestamp(1514764800)));
        assert_eq!(record.authors().map(<[String]>::len), Some(2));
        assert_eq!(record.open_graph().and_then(OpenGraph::image), Some("https://example.com/cover.png"));
        assert!(record.is_usable());
    }

    #[test]
    fn test_non_list_authors_are_dropped() {
        let record: ContentRecord = serde_json::from_str(r#"{"authors": "Ada"}"#).unwrap();
        assert!(record.authors.is_none());
    }

    #[test]
    fn test_null_html_is_empty_body() {
        let record: ContentRecord = serde_json::from_str(r#"{"html": null, "date": "yesterday"}"#).unwrap();
        assert!(record.html.is_empty());
        assert_eq!(record.date, Some(PublishedDate::Text("yesterday".to_string())));
    }
}
