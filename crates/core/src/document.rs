//! Metadata extraction from fetched HTML pages.
//!
//! Fills the fields of a [`crate::ContentRecord`] that the page itself can provide:
//! title, language, publication date, authors, Open Graph values and the
//! article markup.

use scraper::{ElementRef, Html, Selector};

use crate::record::{OpenGraph, PublishedDate};

/// Values pulled out of a parsed page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub language: Option<String>,
    pub date: Option<PublishedDate>,
    pub authors: Option<Vec<String>>,
    pub open_graph: OpenGraph,
    /// Inner HTML of the main article container.
    pub content: String,
}

impl PageMetadata {
    /// Parses `html` and extracts every field.
    ///
    /// # Example
    ///
    /// ```rust
    /// use shelfmark_core::PageMetadata;
    ///
    /// let html = r#"<html lang="fr-FR"><head><title>Bonjour</title></head>
    ///     <body><article><p>Texte</p></article></body></html>"#;
    /// let page = PageMetadata::extract(html);
    /// assert_eq!(page.title.as_deref(), Some("Bonjour"));
    /// assert_eq!(page.language.as_deref(), Some("fr-FR"));
    /// assert_eq!(page.content.trim(), "<p>Texte</p>");
    /// ```
    pub fn extract(html: &str) -> Self {
        let page = Page { html: Html::parse_document(html) };
        let open_graph = page.open_graph();

        Self {
            title: page.title(&open_graph),
            language: page.language(),
            date: page.date(),
            authors: page.authors(),
            content: page.content(),
            open_graph,
        }
    }
}

struct Page {
    html: Html,
}

impl Page {
    fn select(&self, selector: &str) -> Vec<ElementRef<'_>> {
        match Selector::parse(selector) {
            Ok(sel) => self.html.select(&sel).collect(),
            Err(_) => Vec::new(),
        }
    }

    fn first_text(&self, selector: &str) -> Option<String> {
        self.select(selector).into_iter().map(text_of).find(|text| !text.is_empty())
    }

    /// Title with priority fallback:
    /// 1. Open Graph `og:title`
    /// 2. `<title>` element
    /// 3. First `<h1>` element
    fn title(&self, open_graph: &OpenGraph) -> Option<String> {
        if let Some(title) = open_graph.title() {
            return Some(title.to_string());
        }
        self.first_text("title").or_else(|| self.first_text("h1"))
    }

    fn language(&self) -> Option<String> {
        if let Some(html) = self.select("html[lang]").first()
            && let Some(lang) = html.value().attr("lang")
            && !lang.trim().is_empty()
        {
            return Some(lang.trim().to_string());
        }
        self.meta_content("http-equiv", "content-language")
    }

    /// Date with priority fallback:
    /// 1. JSON-LD `datePublished`
    /// 2. Meta `article:published_time`
    /// 3. `<time datetime="">` element
    /// 4. Meta `date` / `DC.date`
    fn date(&self) -> Option<PublishedDate> {
        if let Some(json_ld) = self.json_ld()
            && let Some(value) = json_ld.get("datePublished").and_then(|d| d.as_str())
        {
            return Some(PublishedDate::Text(value.to_string()));
        }

        if let Some(date) = self.meta("article:published_time") {
            return Some(PublishedDate::Text(date));
        }

        if let Some(time) = self.select("time[datetime]").first()
            && let Some(datetime) = time.value().attr("datetime")
        {
            return Some(PublishedDate::Text(datetime.to_string()));
        }

        self.meta("date").or_else(|| self.meta("DC.date")).map(PublishedDate::Text)
    }

    /// Authors from JSON-LD (a name, an object, or a list of either), then
    /// every meta `author` tag.
    fn authors(&self) -> Option<Vec<String>> {
        if let Some(json_ld) = self.json_ld()
            && let Some(author) = json_ld.get("author")
        {
            let names = authors_from_json_ld(author);
            if !names.is_empty() {
                return Some(names);
            }
        }

        let names: Vec<String> = self
            .select("meta[name=\"author\"]")
            .iter()
            .filter_map(|el| el.value().attr("content"))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        (!names.is_empty()).then_some(names)
    }

    fn open_graph(&self) -> OpenGraph {
        OpenGraph {
            og_title: self.meta("og:title"),
            og_description: self.meta("og:description"),
            og_image: self.meta("og:image"),
        }
    }

    /// Inner HTML of `<article>`, `<main>` or `<body>`, whichever comes first.
    fn content(&self) -> String {
        ["article", "main", "[role=\"main\"]", "body"]
            .iter()
            .find_map(|selector| self.select(selector).first().map(|el| el.inner_html()))
            .unwrap_or_default()
    }

    /// Meta tag content by `name` or `property`, compared case-insensitively.
    fn meta(&self, key: &str) -> Option<String> {
        self.meta_content("name", key).or_else(|| self.meta_content("property", key))
    }

    fn meta_content(&self, attr: &str, key: &str) -> Option<String> {
        self.select(&format!("meta[{attr}]"))
            .iter()
            .filter(|el| el.value().attr(attr).is_some_and(|v| v.eq_ignore_ascii_case(key)))
            .filter_map(|el| el.value().attr("content"))
            .map(|s| s.trim().to_string())
            .find(|s| !s.is_empty())
    }

    fn json_ld(&self) -> Option<serde_json::Value> {
        self.select("script[type=\"application/ld+json\"]").iter().find_map(|el| {
            let text: String = el.text().collect();
            match serde_json::from_str::<serde_json::Value>(text.trim()).ok()? {
                serde_json::Value::Array(items) => items.into_iter().find(|item| item.is_object()),
                value => Some(value),
            }
        })
    }
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
}

fn authors_from_json_ld(author: &serde_json::Value) -> Vec<String> {
    match author {
        serde_json::Value::String(name) => vec![name.trim().to_string()],
        serde_json::Value::Object(obj) => {
            obj.get("name").and_then(|n| n.as_str()).map(|n| vec![n.trim().to_string()]).unwrap_or_default()
        }
        serde_json::Value::Array(items) => items.iter().flat_map(authors_from_json_ld).collect(),
        _ => Vec::new(),
    }
    .into_iter()
    .filter(|name| !name.is_empty())
    .collect()
}
