//! Automatic tagging of freshly populated entries.

use regex::Regex;
use serde::Deserialize;

use crate::entry::{Entry, Tag};
use crate::{Result, ShelfmarkError};

/// Applies tags to an entry once its fields are populated.
pub trait Tagger {
    /// # Errors
    ///
    /// Implementations report internal failures; the ingestion pipeline logs
    /// them and carries on without the tags.
    fn tag(&self, entry: &mut Entry) -> Result<()>;
}

/// Tags nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTagger;

impl Tagger for NoopTagger {
    fn tag(&self, _entry: &mut Entry) -> Result<()> {
        Ok(())
    }
}

/// A user-defined rule: when every condition that is set holds, `tags` are
/// added to the entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TaggingRule {
    /// Exact match on the entry's domain name.
    pub domain: Option<String>,
    /// Regex searched in the title.
    pub title_pattern: Option<String>,
    /// Exact match on the MIME type.
    pub mimetype: Option<String>,
    /// Exact match on the language.
    pub language: Option<String>,
    /// Lower bound (inclusive) on reading time, in minutes.
    pub min_reading_time: Option<u32>,
    pub tags: Vec<String>,
}

impl TaggingRule {
    fn matches(&self, entry: &Entry) -> Result<bool> {
        if let Some(domain) = &self.domain
            && entry.domain_name.as_ref() != Some(domain)
        {
            return Ok(false);
        }
        if let Some(mimetype) = &self.mimetype
            && entry.mimetype.as_ref() != Some(mimetype)
        {
            return Ok(false);
        }
        if let Some(language) = &self.language
            && entry.language.as_ref() != Some(language)
        {
            return Ok(false);
        }
        if let Some(min) = self.min_reading_time
            && entry.reading_time < min
        {
            return Ok(false);
        }
        if let Some(pattern) = &self.title_pattern {
            let re = Regex::new(pattern)
                .map_err(|e| ShelfmarkError::Tagging(format!("invalid title pattern {pattern:?}: {e}")))?;
            if !entry.title.as_deref().is_some_and(|t| re.is_match(t)) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Evaluates a list of [`TaggingRule`]s in order.
///
/// # Example
///
/// ```rust
/// use shelfmark_core::{Entry, RuleBasedTagger, Tagger, TaggingRule};
///
/// let tagger = RuleBasedTagger::new(vec![TaggingRule {
///     domain: Some("github.com".to_string()),
///     tags: vec!["code".to_string()],
///     ..Default::default()
/// }]);
///
/// let mut entry = Entry::new("https://github.com/rust-lang/rust");
/// entry.domain_name = Some("github.com".to_string());
/// tagger.tag(&mut entry).unwrap();
/// assert!(entry.has_tag("code"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RuleBasedTagger {
    rules: Vec<TaggingRule>,
}

impl RuleBasedTagger {
    pub fn new(rules: Vec<TaggingRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[TaggingRule] {
        &self.rules
    }
}

impl Tagger for RuleBasedTagger {
    /// Rules before a failing one have already been applied when an error is
    /// returned.
    fn tag(&self, entry: &mut Entry) -> Result<()> {
        for rule in &self.rules {
            if rule.matches(entry)? {
                for label in &rule.tags {
                    entry.add_tag(Tag::new(label.as_str()));
                }
            }
        }
        Ok(())
    }
}
