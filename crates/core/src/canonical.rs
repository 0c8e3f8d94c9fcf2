//! Redirect reconciliation between an entry's stored URL and the URL its
//! content was actually served from.
//!
//! URLs are compared component by component on their raw text, without the
//! normalization a full URL parser applies, so that `/caf%C3%A9` and `/café`
//! stay distinguishable.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::IgnoreList;
use crate::entry::Entry;

/// RFC 3986, appendix B.
static URI_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:([^:/?#]+):)?(?://([^/?#]*))?([^?#]*)(?:\?([^#]*))?(?:#(.*))?$").expect("valid URI pattern")
});

/// A named part of a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Component {
    Scheme,
    User,
    Pass,
    Host,
    Port,
    Path,
    Query,
    Fragment,
}

/// Raw, undecoded pieces of a URL. Empty pieces are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParts<'a> {
    pub scheme: Option<&'a str>,
    pub user: Option<&'a str>,
    pub pass: Option<&'a str>,
    pub host: Option<&'a str>,
    pub port: Option<&'a str>,
    pub path: Option<&'a str>,
    pub query: Option<&'a str>,
    pub fragment: Option<&'a str>,
}

impl<'a> UrlParts<'a> {
    /// Splits a URL into its components.
    ///
    /// # Example
    ///
    /// ```rust
    /// use shelfmark_core::UrlParts;
    ///
    /// let parts = UrlParts::parse("https://user@example.com:8443/a/b?q=1#top");
    /// assert_eq!(parts.host, Some("example.com"));
    /// assert_eq!(parts.port, Some("8443"));
    /// assert_eq!(parts.path, Some("/a/b"));
    /// assert_eq!(parts.fragment, Some("top"));
    /// ```
    pub fn parse(url: &'a str) -> Self {
        let Some(caps) = URI_PATTERN.captures(url) else {
            return Self::default();
        };
        let group = |i: usize| caps.get(i).map(|m| m.as_str()).filter(|s| !s.is_empty());

        let mut parts = Self {
            scheme: group(1),
            path: group(3),
            query: group(4),
            fragment: group(5),
            ..Default::default()
        };

        if let Some(authority) = group(2) {
            parts.split_authority(authority);
        }

        parts
    }

    fn split_authority(&mut self, authority: &'a str) {
        let host_port = match authority.rsplit_once('@') {
            Some((userinfo, rest)) => {
                match userinfo.split_once(':') {
                    Some((user, pass)) => {
                        self.user = Some(user).filter(|s| !s.is_empty());
                        self.pass = Some(pass).filter(|s| !s.is_empty());
                    }
                    None => self.user = Some(userinfo).filter(|s| !s.is_empty()),
                }
                rest
            }
            None => authority,
        };

        let (host, port) = if host_port.starts_with('[') {
            match host_port.find(']') {
                Some(end) => (&host_port[..=end], host_port[end + 1..].strip_prefix(':')),
                None => (host_port, None),
            }
        } else {
            match host_port.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (host_port, None),
            }
        };

        self.host = Some(host).filter(|s| !s.is_empty());
        self.port = port.filter(|s| !s.is_empty());
    }

    fn get(&self, component: Component) -> Option<&'a str> {
        match component {
            Component::Scheme => self.scheme,
            Component::User => self.user,
            Component::Pass => self.pass,
            Component::Host => self.host,
            Component::Port => self.port,
            Component::Path => self.path,
            Component::Query => self.query,
            Component::Fragment => self.fragment,
        }
    }

    /// Components whose values differ between the two URLs, in either
    /// direction, in a stable order.
    pub fn diff(&self, other: &UrlParts<'_>) -> Vec<Component> {
        const ALL: [Component; 8] = [
            Component::Scheme,
            Component::User,
            Component::Pass,
            Component::Host,
            Component::Port,
            Component::Path,
            Component::Query,
            Component::Fragment,
        ];
        ALL.into_iter().filter(|&c| self.get(c) != other.get(c)).collect()
    }
}

/// What [`canonicalize`] did to the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlChange {
    /// Nothing changed.
    Unchanged,
    /// The URL was swapped for an equivalent one; no provenance recorded.
    Replaced,
    /// A real redirect: the URL moved and the origin is on record.
    Redirected,
}

/// Reconciles `entry.url` with `new_url`, the URL the content was served from.
///
/// - trailing-slash or percent-decoding differences in the path replace the URL;
/// - a scheme-only difference replaces the URL;
/// - a fragment-only difference is ignored;
/// - anything else is a redirect: the current URL is kept as `origin_url`
///   (only if none was recorded before) and the URL moves to `new_url`.
///
/// Entries whose URL points at a tracking redirector listed in `ignore` take
/// `new_url` unconditionally.
///
/// # Example
///
/// ```rust
/// use shelfmark_core::{Entry, IgnoreList, UrlChange, canonicalize};
///
/// let ignore = IgnoreList::default();
/// let mut entry = Entry::new("http://a.com/x");
///
/// assert_eq!(canonicalize(&mut entry, "http://b.com/y", &ignore), UrlChange::Redirected);
/// assert_eq!(entry.url, "http://b.com/y");
/// assert_eq!(entry.origin_url.as_deref(), Some("http://a.com/x"));
/// ```
pub fn canonicalize(entry: &mut Entry, new_url: &str, ignore: &IgnoreList) -> UrlChange {
    if new_url.is_empty() || entry.url == new_url {
        return UrlChange::Unchanged;
    }

    if ignore.is_ignored(&entry.url) {
        entry.url = new_url.to_string();
        return UrlChange::Replaced;
    }

    let current = UrlParts::parse(&entry.url);
    let candidate = UrlParts::parse(new_url);

    match current.diff(&candidate).as_slice() {
        [Component::Path] => {
            let trailing_slash = format!("{}/", current.path.unwrap_or_default()) == candidate.path.unwrap_or_default();
            if trailing_slash || new_url == url_decode(&entry.url) {
                entry.url = new_url.to_string();
                UrlChange::Replaced
            } else {
                UrlChange::Unchanged
            }
        }
        [Component::Scheme] => {
            entry.url = new_url.to_string();
            UrlChange::Replaced
        }
        [Component::Fragment] => UrlChange::Unchanged,
        _ => {
            if entry.origin_url.as_deref().is_none_or(str::is_empty) {
                entry.origin_url = Some(entry.url.clone());
            }
            entry.url = new_url.to_string();
            UrlChange::Redirected
        }
    }
}

/// Percent-decodes a URL, reading `+` as a space.
fn url_decode(url: &str) -> String {
    let bytes = urlencoding::decode_binary(url.replace('+', " ").as_bytes()).into_owned();
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn run(from: &str, to: &str) -> Entry {
        let mut entry = Entry::new(from);
        canonicalize(&mut entry, to, &IgnoreList::default());
        entry
    }

    #[test]
    fn test_parse_parts() {
        let parts = UrlParts::parse("http://user:secret@[::1]:8080/p?q#f");
        assert_eq!(parts.scheme, Some("http"));
        assert_eq!(parts.user, Some("user"));
        assert_eq!(parts.pass, Some("secret"));
        assert_eq!(parts.host, Some("[::1]"));
        assert_eq!(parts.port, Some("8080"));
        assert_eq!(parts.path, Some("/p"));
        assert_eq!(parts.query, Some("q"));
        assert_eq!(parts.fragment, Some("f"));
    }

    #[test]
    fn test_parse_without_path() {
        let parts = UrlParts::parse("https://example.com");
        assert_eq!(parts.host, Some("example.com"));
        assert_eq!(parts.path, None);
        assert_eq!(parts.query, None);
    }

    #[test]
    fn test_diff_is_symmetric() {
        let a = UrlParts::parse("http://a.com/x?q=1");
        let b = UrlParts::parse("https://a.com/x");
        assert_eq!(a.diff(&b), vec![Component::Scheme, Component::Query]);
        assert_eq!(b.diff(&a), a.diff(&b));
    }

    #[rstest]
    #[case("http://a.com/x", "")]
    #[case("http://a.com/x", "http://a.com/x")]
    #[case("http://a.com/x#top", "http://a.com/x#bottom")]
    #[case("http://a.com/x", "http://a.com/other")]
    fn test_unchanged(#[case] from: &str, #[case] to: &str) {
        let entry = run(from, to);
        assert_eq!(entry.url, from);
        assert_eq!(entry.origin_url, None);
    }

    #[rstest]
    #[case("http://a.com/x", "http://a.com/x/")]
    #[case("http://a.com", "http://a.com/")]
    #[case("http://a.com/x", "https://a.com/x")]
    #[case("https://a.com/x", "http://a.com/x")]
    #[case("http://a.com/caf%C3%A9", "http://a.com/café")]
    #[case("http://a.com/a%20b", "http://a.com/a b")]
    fn test_replaced_without_origin(#[case] from: &str, #[case] to: &str) {
        let mut entry = Entry::new(from);
        assert_eq!(canonicalize(&mut entry, to, &IgnoreList::default()), UrlChange::Replaced);
        assert_eq!(entry.url, to);
        assert_eq!(entry.origin_url, None);
    }

    #[rstest]
    #[case("http://a.com/x", "http://b.com/y")]
    #[case("http://a.com/x", "http://a.com/y?id=2")]
    #[case("http://a.com/x", "https://a.com/x/")]
    #[case("http://a.com/x", "http://a.com:8080/x")]
    #[case("http://a.com/x?utm=1", "http://a.com/x")]
    fn test_redirect_records_origin(#[case] from: &str, #[case] to: &str) {
        let entry = run(from, to);
        assert_eq!(entry.url, to);
        assert_eq!(entry.origin_url.as_deref(), Some(from));
    }

    #[test]
    fn test_origin_is_sticky() {
        let ignore = IgnoreList::default();
        let mut entry = Entry::new("http://a.com/x");

        canonicalize(&mut entry, "http://b.com/y", &ignore);
        canonicalize(&mut entry, "http://c.com/z", &ignore);

        assert_eq!(entry.url, "http://c.com/z");
        assert_eq!(entry.origin_url.as_deref(), Some("http://a.com/x"));
    }

    #[test]
    fn test_same_url_is_noop() {
        let mut entry = Entry::new("http://a.com/x");
        entry.origin_url = Some("http://old.com".to_string());
        let url = entry.url.clone();
        let before = entry.clone();

        assert_eq!(canonicalize(&mut entry, &url, &IgnoreList::default()), UrlChange::Unchanged);
        assert_eq!(entry, before);
    }

    #[rstest]
    #[case("http://feedproxy.google.com/~r/site/~3/abc", "http://site.com/article")]
    #[case("http://feeds.reuters.com/~r/news/1", "https://reuters.com/x")]
    #[case("https://www.lemonde.fr/tiny/1234", "https://www.lemonde.fr/article/1")]
    #[case("HTTPS://WWW.LEMONDE.FR/TINY/1234", "https://www.lemonde.fr/article/1")]
    fn test_ignored_hosts_replace_without_origin(#[case] from: &str, #[case] to: &str) {
        let mut entry = Entry::new(from);
        assert_eq!(canonicalize(&mut entry, to, &IgnoreList::default()), UrlChange::Replaced);
        assert_eq!(entry.url, to);
        assert_eq!(entry.origin_url, None);
    }

    #[test]
    fn test_custom_ignore_list() {
        let ignore = IgnoreList::new(vec!["t.co".to_string()], Vec::<String>::new()).unwrap();
        let mut entry = Entry::new("https://t.co/abc");
        canonicalize(&mut entry, "https://blog.example/post", &ignore);
        assert_eq!(entry.url, "https://blog.example/post");
        assert_eq!(entry.origin_url, None);

        let mut entry = Entry::new("http://feedproxy.google.com/~r/x");
        canonicalize(&mut entry, "https://blog.example/post", &ignore);
        assert_eq!(entry.origin_url.as_deref(), Some("http://feedproxy.google.com/~r/x"));
    }
}
