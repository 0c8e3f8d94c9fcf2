//! The ingestion pipeline.
//!
//! [`ContentProxy::update_entry`] decides between supplied and fetched content,
//! then copies what the winning [`ContentRecord`] carries onto an [`Entry`].
//! Nothing in here fails the caller: bad field values are logged and skipped.

use url::Url;

use crate::canonical::{UrlChange, canonicalize};
use crate::config::ProxyConfig;
use crate::entry::Entry;
use crate::fetch::ContentFetcher;
use crate::metadata::{domain_name, image_extension, parse_published_date, reading_time};
use crate::record::{ContentRecord, PublishedDate};
use crate::sanitize::sanitize_title;
use crate::tagger::{NoopTagger, Tagger};
use crate::validate::{DefaultValidator, Validator};
use crate::{Result, ShelfmarkError};

/// Appended after the fetch error message when the page still had a description.
const SHORT_DESCRIPTION_LABEL: &str = "<p><i>But we found a short description: </i></p>";

/// Fills entries from fetched or supplied content.
///
/// # Example
///
/// ```rust
/// use shelfmark_core::{ContentFetcher, ContentProxy, ContentRecord, Entry};
///
/// struct Offline;
///
/// impl ContentFetcher for Offline {
///     fn fetch_content(&self, url: &str) -> ContentRecord {
///         ContentRecord::with_url(url)
///     }
/// }
///
/// let proxy = ContentProxy::new(Offline);
/// let mut entry = Entry::new("https://example.com/post");
/// let supplied = ContentRecord {
///     title: Some("Imported".to_string()),
///     html: "<p>Saved earlier</p>".into(),
///     url: "https://example.com/post".to_string(),
///     ..Default::default()
/// };
///
/// proxy.update_entry(&mut entry, "https://example.com/post", supplied, false);
/// assert_eq!(entry.title.as_deref(), Some("Imported"));
/// assert_eq!(entry.domain_name.as_deref(), Some("example.com"));
/// ```
#[derive(Debug, Clone)]
pub struct ContentProxy<F, T = NoopTagger, V = DefaultValidator> {
    fetcher: F,
    tagger: T,
    validator: V,
    config: ProxyConfig,
}

impl<F: ContentFetcher> ContentProxy<F> {
    /// A proxy with the default configuration, no tagging and the built-in validator.
    pub fn new(fetcher: F) -> Self {
        Self { fetcher, tagger: NoopTagger, validator: DefaultValidator, config: ProxyConfig::default() }
    }
}

impl<F: ContentFetcher, T: Tagger, V: Validator> ContentProxy<F, T, V> {
    pub fn with_config(mut self, config: ProxyConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_tagger<U: Tagger>(self, tagger: U) -> ContentProxy<F, U, V> {
        ContentProxy { fetcher: self.fetcher, tagger, validator: self.validator, config: self.config }
    }

    pub fn with_validator<W: Validator>(self, validator: W) -> ContentProxy<F, T, W> {
        ContentProxy { fetcher: self.fetcher, tagger: self.tagger, validator, config: self.config }
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn tagger(&self) -> &T {
        &self.tagger
    }

    /// Updates `entry` from `content`, fetching `url` when `content` is not
    /// enough to stand on its own and `disable_fetch` is false.
    pub fn update_entry(&self, entry: &mut Entry, url: &str, content: ContentRecord, disable_fetch: bool) {
        let record = self.resolve(entry, url, content, disable_fetch);
        self.populate(entry, &record);
    }

    /// Picks the record an entry is populated from.
    ///
    /// Supplied HTML is cleaned first. A supplied record with a title, a body
    /// and a URL is used as is; otherwise `url` is fetched unless
    /// `disable_fetch` is set. A failed fetch never replaces content the
    /// caller supplied. The returned record always has a URL.
    pub fn resolve(&self, entry: &mut Entry, url: &str, mut content: ContentRecord, disable_fetch: bool) -> ContentRecord {
        // Cleanup may empty the body; the caller still supplied it.
        let supplied = !content.is_empty();
        if let Some(html) = content.html.as_html()
            && !html.is_empty()
        {
            content.html = self.fetcher.cleanup_html(html, url).into();
        }

        if !content.is_usable() && !disable_fetch {
            tracing::debug!(url, "supplied content unusable, fetching");
            let mut fetched = self.fetcher.fetch_content(url);
            sanitize_fetched_title(&mut fetched);

            if !supplied || !fetched.is_fetch_failure(&self.config.fetch_error_message) {
                content = fetched;
            } else {
                tracing::debug!(url, "fetch failed, keeping supplied content");
            }
        }

        if content.url.is_empty() {
            content.url = url.to_string();
        }

        if entry.url.is_empty() && !url.is_empty() {
            entry.url = url.to_string();
        }

        content
    }

    /// Copies the fields of `record` onto `entry`, then runs the tagger.
    pub fn populate(&self, entry: &mut Entry, record: &ContentRecord) {
        self.update_origin_url(entry, &record.url);
        self.set_entry_domain_name(entry);

        if let Some(title) = record.title() {
            entry.title = Some(title.to_string());
        } else if let Some(og_title) = record.open_graph().and_then(|og| og.title()) {
            entry.title = Some(og_title.to_string());
        }

        let html = if record.is_fetch_failure(&self.config.fetch_error_message) {
            let mut html = self.config.fetch_error_message.clone();
            if let Some(description) = record.open_graph().and_then(|og| og.description()) {
                html.push_str(SHORT_DESCRIPTION_LABEL);
                html.push_str(description);
            }
            html
        } else {
            record.html.as_html().unwrap_or_default().to_string()
        };
        entry.reading_time = reading_time(&html, self.config.reading_speed);
        entry.content = Some(html);

        if let Some(status) = record.status() {
            entry.http_status = Some(status.to_string());
        }

        if let Some(authors) = record.authors() {
            entry.published_by = Some(authors.to_vec());
        }

        if self.config.store_article_headers
            && let Some(headers) = record.all_headers()
        {
            entry.headers = Some(headers.clone());
        }

        if let Some(date) = record.date()
            && let Err(e) = self.update_published_at(entry, date)
        {
            tracing::warn!(url = %entry.url, error = %e, "error while defining date");
        }

        if let Some(language) = record.language()
            && let Err(e) = self.update_language(entry, language)
        {
            tracing::warn!(url = %entry.url, error = %e, "language validation failed");
        }

        if let Some(image) = record.open_graph().and_then(|og| og.image()) {
            if let Err(e) = self.update_preview_picture(entry, image) {
                tracing::warn!(url = %entry.url, error = %e, "preview picture validation failed");
            }
        } else if record.content_type().and_then(image_extension).is_some() {
            entry.preview_picture = Some(record.url.clone());
        }

        if let Some(content_type) = record.content_type() {
            entry.mimetype = Some(content_type.to_string());
        }

        if let Err(e) = self.tagger.tag(entry) {
            tracing::error!(
                entry_url = %record.url,
                error_msg = %e,
                "error while trying to automatically tag an entry"
            );
        }
    }

    /// Moves `entry` to `url` when it is the canonical form of the stored URL.
    pub fn update_origin_url(&self, entry: &mut Entry, url: &str) -> UrlChange {
        let change = canonicalize(entry, url, &self.config.ignore);
        if change != UrlChange::Unchanged {
            tracing::debug!(url = %entry.url, origin_url = ?entry.origin_url, ?change, "entry url updated");
        }
        change
    }

    /// Stores `value` as the entry language once hyphens are turned into
    /// underscores and the result is a valid locale.
    ///
    /// # Errors
    ///
    /// [`ShelfmarkError::InvalidLocale`]; the entry is left untouched.
    pub fn update_language(&self, entry: &mut Entry, value: &str) -> Result<()> {
        let value = value.replace('-', "_");
        let reasons = self.validator.validate_locale(&value);
        if !reasons.is_empty() {
            return Err(ShelfmarkError::InvalidLocale { value, reasons });
        }
        entry.language = Some(value);
        Ok(())
    }

    /// # Errors
    ///
    /// [`ShelfmarkError::InvalidPreviewPicture`] when `value` is not a valid URL.
    pub fn update_preview_picture(&self, entry: &mut Entry, value: &str) -> Result<()> {
        let reasons = self.validator.validate_url(value);
        if !reasons.is_empty() {
            return Err(ShelfmarkError::InvalidPreviewPicture { value: value.to_string(), reasons });
        }
        entry.preview_picture = Some(value.to_string());
        Ok(())
    }

    /// Integers are Unix timestamps; anything else goes through the date parser.
    ///
    /// # Errors
    ///
    /// [`ShelfmarkError::InvalidDate`]; the entry keeps its previous date.
    pub fn update_published_at(&self, entry: &mut Entry, date: &PublishedDate) -> Result<()> {
        entry.published_at = Some(parse_published_date(date)?);
        Ok(())
    }

    /// Sets the domain name from the host of `entry.url`.
    pub fn set_entry_domain_name(&self, entry: &mut Entry) {
        if let Some(host) = domain_name(&entry.url) {
            entry.domain_name = Some(host.to_string());
        }
    }

    /// Titles an entry after the last path segment of its URL, or its host.
    pub fn set_default_entry_title(&self, entry: &mut Entry) {
        let basename = Url::parse(&entry.url)
            .ok()
            .and_then(|url| url.path_segments().and_then(|mut segments| segments.rfind(|s| !s.is_empty())).map(str::to_string));

        let title = basename
            .map(|name| urlencoding::decode(&name).map(|decoded| decoded.into_owned()).unwrap_or_else(|_| name.clone()))
            .or_else(|| domain_name(&entry.url).map(str::to_string));

        if let Some(title) = title {
            entry.title = Some(title);
        }
    }
}

/// Repairs the fetched title, preferring the undecoded bytes when the
/// fetcher kept them.
fn sanitize_fetched_title(record: &mut ContentRecord) {
    let content_type = record.content_type.clone();
    let raw = record.raw_title.take().or_else(|| record.title.take().map(String::into_bytes));
    record.title = raw.map(|bytes| sanitize_title(&bytes, content_type.as_deref()));
}
