//! HTML cleanup applied to article bodies before they are stored.

use lol_html::html_content::Element;
use url::Url;

/// Elements dropped together with their content.
const REMOVED_ELEMENTS: [&str; 9] = ["script", "style", "noscript", "iframe", "form", "object", "embed", "frame", "frameset"];

/// Elements whose `src` points at media.
const MEDIA_ELEMENTS: [&str; 4] = ["img[src]", "source[src]", "video[src]", "audio[src]"];

/// Cleans article HTML for storage.
///
/// Removes scripting and embedding elements, comments and inline event
/// handlers, neutralizes `javascript:` links, and resolves relative `href` and
/// `src` attributes against `url`. A `url` that does not parse leaves links
/// as they are. Input the rewriter rejects is returned unchanged.
///
/// # Example
///
/// ```rust
/// use shelfmark_core::cleanup_html;
///
/// let html = r#"<p onclick="x()">Hi <a href="/about">about</a></p><script>track()</script>"#;
/// let cleaned = cleanup_html(html, "https://example.com/post");
/// assert_eq!(cleaned, r#"<p>Hi <a href="https://example.com/about">about</a></p>"#);
/// ```
pub fn cleanup_html(html: &str, url: &str) -> String {
    let base_url = Url::parse(url).ok();

    let mut element_content_handlers: Vec<_> = REMOVED_ELEMENTS
        .iter()
        .map(|tag| {
            lol_html::element!(*tag, |el| {
                el.remove();
                Ok(())
            })
        })
        .collect();

    element_content_handlers.push(lol_html::element!("*", |el| {
        strip_event_handlers(el);
        Ok(())
    }));
    element_content_handlers.push(lol_html::element!("a[href]", |el| {
        rewrite_link(el, "href", base_url.as_ref());
        Ok(())
    }));
    element_content_handlers.extend(MEDIA_ELEMENTS.iter().map(|selector| {
        lol_html::element!(*selector, |el| {
            rewrite_link(el, "src", base_url.as_ref());
            Ok(())
        })
    }));
    element_content_handlers.push(lol_html::comments!("*", |c| {
        c.remove();
        Ok(())
    }));

    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings { element_content_handlers, ..Default::default() },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    if rewriter.write(html.as_bytes()).is_err() || rewriter.end().is_err() {
        return html.to_string();
    }

    output
}

fn strip_event_handlers(el: &mut Element) {
    let handlers: Vec<String> = el
        .attributes()
        .iter()
        .map(|attr| attr.name())
        .filter(|name| name.starts_with("on"))
        .collect();

    for name in handlers {
        el.remove_attribute(&name);
    }
}

fn rewrite_link(el: &mut Element, attr: &str, base_url: Option<&Url>) {
    let Some(value) = el.get_attribute(attr) else {
        return;
    };

    if value.trim_start().to_ascii_lowercase().starts_with("javascript:") {
        el.remove_attribute(attr);
        return;
    }

    if let Some(base) = base_url
        && let Ok(absolute) = base.join(&value)
    {
        el.set_attribute(attr, absolute.as_str()).ok();
    }
}
