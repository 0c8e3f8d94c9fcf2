pub mod canonical;
pub mod cleanup;
pub mod config;
pub mod document;
pub mod entry;
pub mod error;
pub mod fetch;
pub mod metadata;
pub mod proxy;
pub mod record;
pub mod sanitize;
pub mod tagger;
pub mod validate;

pub use canonical::{Component, UrlChange, UrlParts, canonicalize};
pub use cleanup::cleanup_html;
pub use config::{
    ConfigFile, DEFAULT_FETCH_ERROR_MESSAGE, DEFAULT_READING_SPEED, FetchSection, IgnoreList, ProxyConfig,
    ProxyConfigBuilder, ProxySection,
};
pub use document::PageMetadata;
pub use entry::{Entry, Tag};
pub use error::{Result, ShelfmarkError};
pub use fetch::ContentFetcher;
#[cfg(feature = "fetch")]
pub use fetch::{FetchConfig, HttpFetcher};
pub use metadata::{parse_published_date, reading_time, word_count};
pub use proxy::ContentProxy;
pub use record::{Body, ContentRecord, OpenGraph, PublishedDate};
pub use sanitize::sanitize_title;
pub use tagger::{NoopTagger, RuleBasedTagger, Tagger, TaggingRule};
pub use validate::{DefaultValidator, Validator};
