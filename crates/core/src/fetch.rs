//! Content fetching.
//!
//! [`ContentFetcher`] is the seam between the ingestion pipeline and whatever
//! retrieves pages. [`HttpFetcher`] is the built-in blocking implementation:
//! it downloads a URL, follows redirects and turns the response into a
//! [`ContentRecord`]. Transport failures never surface as errors; they come
//! back as a record whose body is [`Body::FetchFailed`].

use crate::cleanup;
use crate::record::ContentRecord;
#[cfg(feature = "fetch")]
pub use http::{FetchConfig, HttpFetcher};

#[cfg(doc)]
use crate::record::Body;

/// Retrieves and cleans article content.
pub trait ContentFetcher {
    /// Fetches `url`. Failure is reported through the record's body.
    fn fetch_content(&self, url: &str) -> ContentRecord;

    /// Cleans caller-supplied HTML as if it had been fetched from `url`.
    fn cleanup_html(&self, html: &str, url: &str) -> String {
        cleanup::cleanup_html(html, url)
    }
}

#[cfg(feature = "fetch")]
mod http {
    use std::collections::BTreeMap;
    use std::sync::LazyLock;
    use std::time::Duration;

    use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
    use regex::bytes::Regex as BytesRegex;
    use reqwest::blocking::Client;
    use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
    use url::Url;

    use super::ContentFetcher;
    use crate::cleanup::cleanup_html;
    use crate::config::FetchSection;
    use crate::document::PageMetadata;
    use crate::record::{Body, ContentRecord, OpenGraph};
    use crate::sanitize::PDF_MIME;
    use crate::{Result, ShelfmarkError};

    static PDF_TITLE: LazyLock<BytesRegex> = LazyLock::new(|| {
        BytesRegex::new(r"(?s-u)/Title\s*(?:\(((?:\\.|[^\\)])*)\)|<([0-9A-Fa-f\s]*)>)").expect("valid PDF title pattern")
    });

    static META_CHARSET: LazyLock<BytesRegex> = LazyLock::new(|| {
        BytesRegex::new(r#"(?i-u)<meta[^>]+charset\s*=\s*["']?\s*([a-z0-9_\-:.]+)"#).expect("valid charset pattern")
    });

    /// HTTP client configuration for fetching web pages.
    #[derive(Debug, Clone)]
    pub struct FetchConfig {
        /// Request timeout in seconds.
        pub timeout: u64,
        /// Custom User-Agent string.
        pub user_agent: String,
    }

    impl Default for FetchConfig {
        fn default() -> Self {
            Self {
                timeout: 30,
                user_agent: "Mozilla/5.0 (compatible; Shelfmark/0.1; +https://github.com/shelfmark/shelfmark)"
                    .to_string(),
            }
        }
    }

    impl FetchConfig {
        /// Defaults overridden by whatever the `[fetch]` table sets.
        pub fn from_section(section: &FetchSection) -> Self {
            let defaults = Self::default();
            Self {
                timeout: section.timeout.unwrap_or(defaults.timeout),
                user_agent: section.user_agent.clone().unwrap_or(defaults.user_agent),
            }
        }
    }

    /// Blocking HTTP fetcher.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use shelfmark_core::{ContentFetcher, FetchConfig, HttpFetcher};
    ///
    /// let fetcher = HttpFetcher::new(FetchConfig::default()).unwrap();
    /// let record = fetcher.fetch_content("https://example.com/article");
    /// println!("{:?} -> {}", record.status, record.url);
    /// ```
    #[derive(Debug, Clone)]
    pub struct HttpFetcher {
        client: Client,
        config: FetchConfig,
    }

    impl HttpFetcher {
        /// # Errors
        ///
        /// Returns [`ShelfmarkError::HttpError`] when the client cannot be built.
        pub fn new(config: FetchConfig) -> Result<Self> {
            let client = Client::builder()
                .timeout(Duration::from_secs(config.timeout))
                .user_agent(config.user_agent.as_str())
                .build()?;

            Ok(Self { client, config })
        }

        fn try_fetch(&self, url: &str) -> Result<ContentRecord> {
            let parsed_url = Url::parse(url).map_err(|e| ShelfmarkError::InvalidUrl(e.to_string()))?;

            let response = self
                .client
                .get(parsed_url)
                .header(ACCEPT, "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
                .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
                .send()
                .map_err(|e| {
                    if e.is_timeout() {
                        ShelfmarkError::Timeout { timeout: self.config.timeout }
                    } else {
                        ShelfmarkError::HttpError(e)
                    }
                })?;

            let status = response.status();
            let final_url = response.url().to_string();
            let raw_content_type =
                response.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()).unwrap_or_default().to_string();
            let all_headers: BTreeMap<String, String> = response
                .headers()
                .iter()
                .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
                .collect();

            let mut record = ContentRecord {
                url: final_url,
                status: Some(status.as_str().to_string()),
                content_type: mime_essence(&raw_content_type),
                all_headers: Some(all_headers),
                ..Default::default()
            };

            if !status.is_success() {
                tracing::debug!(url, status = status.as_u16(), "non-success response");
                record.html = Body::FetchFailed;
                return Ok(record);
            }

            let body = response.bytes()?;
            fill_from_body(&mut record, &body, &raw_content_type);
            Ok(record)
        }
    }

    impl ContentFetcher for HttpFetcher {
        fn fetch_content(&self, url: &str) -> ContentRecord {
            match self.try_fetch(url) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(url, error = %e, "fetching content failed");
                    ContentRecord { html: Body::FetchFailed, url: url.to_string(), ..Default::default() }
                }
            }
        }
    }

    /// Populates title, body and page metadata according to the content type.
    fn fill_from_body(record: &mut ContentRecord, body: &[u8], raw_content_type: &str) {
        let content_type = record.content_type.clone().unwrap_or_default();
        let url = record.url.clone();

        if content_type.starts_with("image/") {
            let name = file_name(&url);
            record.html = Body::Html(format!("<a href=\"{url}\"><img src=\"{url}\" alt=\"{name}\" /></a>"));
            record.title = Some(name);
            return;
        }

        if content_type == PDF_MIME {
            record.raw_title = pdf_title(body);
            record.html = Body::Html(format!("<p><a href=\"{url}\">{}</a></p>", file_name(&url)));
            return;
        }

        let html = decode_text(body, raw_content_type);
        if content_type.starts_with("text/plain") {
            record.html = Body::Html(format!("<pre>{}</pre>", escape_html(&html)));
            return;
        }

        let page = PageMetadata::extract(&html);
        record.title = page.title;
        record.language = page.language;
        record.date = page.date;
        record.authors = page.authors;
        record.open_graph = (page.open_graph != OpenGraph::default()).then_some(page.open_graph);
        record.html = if page.content.trim().is_empty() {
            Body::FetchFailed
        } else {
            Body::Html(cleanup_html(&page.content, &url))
        };
    }

    fn mime_essence(content_type: &str) -> Option<String> {
        let essence = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        (!essence.is_empty()).then_some(essence)
    }

    /// Decodes a text body using the header charset, a `<meta charset>` in the
    /// first kilobyte, or UTF-8 with a Windows-1252 fallback.
    fn decode_text(body: &[u8], raw_content_type: &str) -> String {
        let from_header = raw_content_type
            .split(';')
            .filter_map(|param| param.trim().strip_prefix("charset="))
            .find_map(|label| Encoding::for_label(label.trim_matches('"').as_bytes()));

        let from_meta = || {
            META_CHARSET
                .captures(&body[..body.len().min(1024)])
                .and_then(|caps| caps.get(1))
                .and_then(|m| Encoding::for_label(m.as_bytes()))
        };

        let encoding = from_header.or_else(from_meta).unwrap_or_else(|| {
            if std::str::from_utf8(body).is_ok() { UTF_8 } else { WINDOWS_1252 }
        });

        let (text, _, _) = encoding.decode(body);
        text.into_owned()
    }

    /// Raw bytes of the `/Title` entry of a PDF document's info dictionary.
    fn pdf_title(body: &[u8]) -> Option<Vec<u8>> {
        let caps = PDF_TITLE.captures(body)?;
        let title = match (caps.get(1), caps.get(2)) {
            (Some(literal), _) => unescape_pdf_literal(literal.as_bytes()),
            (None, Some(hex)) => decode_hex(hex.as_bytes()),
            (None, None) => return None,
        };
        (!title.is_empty()).then_some(title)
    }

    fn unescape_pdf_literal(raw: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(raw.len());
        let mut iter = raw.iter().copied().peekable();

        while let Some(byte) = iter.next() {
            if byte != b'\\' {
                out.push(byte);
                continue;
            }
            match iter.next() {
                Some(b'n') => out.push(b'\n'),
                Some(b'r') => out.push(b'\r'),
                Some(b't') => out.push(b'\t'),
                Some(b'b') => out.push(0x08),
                Some(b'f') => out.push(0x0C),
                Some(d @ b'0'..=b'7') => {
                    let mut value = u32::from(d - b'0');
                    for _ in 0..2 {
                        match iter.peek() {
                            Some(&next @ b'0'..=b'7') => {
                                value = value * 8 + u32::from(next - b'0');
                                iter.next();
                            }
                            _ => break,
                        }
                    }
                    out.push((value & 0xFF) as u8);
                }
                Some(other) => out.push(other),
                None => {}
            }
        }

        out
    }

    fn decode_hex(raw: &[u8]) -> Vec<u8> {
        let digits: Vec<u8> = raw
            .iter()
            .filter_map(|b| (*b as char).to_digit(16))
            .map(|d| d as u8)
            .collect();
        digits.chunks(2).map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0)).collect()
    }

    fn file_name(url: &str) -> String {
        Url::parse(url)
            .ok()
            .and_then(|u| u.path_segments().and_then(|mut s| s.next_back()).map(str::to_string))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| url.to_string())
    }

    fn escape_html(text: &str) -> String {
        text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_fetch_config_default() {
            let config = FetchConfig::default();
            assert_eq!(config.timeout, 30);
            assert!(config.user_agent.contains("Shelfmark"));
        }

        #[test]
        fn test_fetch_config_from_section() {
            let section = FetchSection { timeout: Some(5), user_agent: None };
            let config = FetchConfig::from_section(&section);
            assert_eq!(config.timeout, 5);
            assert!(config.user_agent.contains("Shelfmark"));
        }

        #[test]
        fn test_invalid_url_is_fetch_failure() {
            let fetcher = HttpFetcher::new(FetchConfig::default()).unwrap();
            let record = fetcher.fetch_content("not-a-url");
            assert_eq!(record.html, Body::FetchFailed);
            assert_eq!(record.url, "not-a-url");
            assert!(record.status.is_none());
        }

        #[test]
        fn test_fill_html_body() {
            let mut record = ContentRecord {
                url: "https://example.com/blog/post".to_string(),
                content_type: Some("text/html".to_string()),
                ..Default::default()
            };
            let html = br#"<html lang="en"><head><title>Post</title>
                <meta property="og:image" content="https://example.com/i.png"></head>
                <body><article><p>Hello <a href="/about">there</a></p><script>x()</script></article></body></html>"#;

            fill_from_body(&mut record, html, "text/html; charset=utf-8");

            assert_eq!(record.title.as_deref(), Some("Post"));
            assert_eq!(record.language.as_deref(), Some("en"));
            assert_eq!(record.open_graph.as_ref().and_then(OpenGraph::image), Some("https://example.com/i.png"));
            let body = record.html.as_html().unwrap();
            assert!(body.contains("https://example.com/about"));
            assert!(!body.contains("<script"));
        }

        #[test]
        fn test_fill_empty_page_is_failure() {
            let mut record = ContentRecord { content_type: Some("text/html".to_string()), ..Default::default() };
            fill_from_body(&mut record, b"<html><body>   </body></html>", "text/html");
            assert_eq!(record.html, Body::FetchFailed);
        }

        #[test]
        fn test_fill_image_body() {
            let mut record = ContentRecord {
                url: "https://example.com/cat.png".to_string(),
                content_type: Some("image/png".to_string()),
                ..Default::default()
            };
            fill_from_body(&mut record, b"\x89PNG", "image/png");
            assert_eq!(record.title.as_deref(), Some("cat.png"));
            assert!(record.html.as_html().unwrap().contains("<img src=\"https://example.com/cat.png\""));
        }

        #[test]
        fn test_pdf_title_literal_and_hex() {
            assert_eq!(pdf_title(b"1 0 obj << /Title (Annual \\(draft\\) report) >>"), Some(b"Annual (draft) report".to_vec()));
            assert_eq!(pdf_title(b"<< /Title <FEFF00410042> >>"), Some(vec![0xFE, 0xFF, 0x00, 0x41, 0x00, 0x42]));
            assert_eq!(pdf_title(b"<< /Title (caf\\351) >>"), Some(b"caf\xe9".to_vec()));
            assert_eq!(pdf_title(b"<< /Author (nobody) >>"), None);
        }

        #[test]
        fn test_decode_text_charsets() {
            assert_eq!(decode_text(b"caf\xe9", "text/html; charset=ISO-8859-1"), "café");
            assert_eq!(decode_text("café".as_bytes(), "text/html"), "café");
            assert_eq!(decode_text(b"<meta charset=\"windows-1252\">caf\xe9", "text/html"), "<meta charset=\"windows-1252\">café");
            assert_eq!(decode_text(b"caf\xe9", ""), "café");
        }

        #[test]
        fn test_mime_essence() {
            assert_eq!(mime_essence("Text/HTML; charset=UTF-8").as_deref(), Some("text/html"));
            assert_eq!(mime_essence(""), None);
        }
    }
}
