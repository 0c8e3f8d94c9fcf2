//! Field derivations used while populating an entry.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use scraper::Html;

use crate::canonical::UrlParts;
use crate::record::PublishedDate;
use crate::{Result, ShelfmarkError};

/// Formats carrying an explicit UTC offset, tried after RFC 3339 and RFC 2822.
const OFFSET_FORMATS: [&str; 4] =
    ["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%d %H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%.f%z"];

/// Formats without an offset; read as UTC.
const NAIVE_DATETIME_FORMATS: [&str; 7] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

const NAIVE_DATE_FORMATS: [&str; 8] =
    ["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%m/%d/%Y", "%d %B %Y", "%d %b %Y", "%B %d, %Y", "%b %d, %Y"];

/// Counts whitespace-delimited words in the text of an HTML fragment.
///
/// Tag boundaries separate words, so `<p>one</p><p>two</p>` counts two.
pub fn word_count(html: &str) -> usize {
    let fragment = Html::parse_fragment(html);
    fragment.root_element().text().flat_map(str::split_whitespace).count()
}

/// Reading time in whole minutes at `words_per_minute`, rounded to nearest.
///
/// # Example
///
/// ```rust
/// use shelfmark_core::reading_time;
///
/// let html = format!("<p>{}</p>", "word ".repeat(450));
/// assert_eq!(reading_time(&html, 200.0), 2);
/// assert_eq!(reading_time("", 200.0), 0);
/// ```
pub fn reading_time(html: &str, words_per_minute: f64) -> u32 {
    if words_per_minute.is_nan() || words_per_minute <= 0.0 {
        return 0;
    }
    (word_count(html) as f64 / words_per_minute).round() as u32
}

/// File extension for a content type, limited to the raster image types an
/// entry may use directly as its preview picture.
pub fn image_extension(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    match essence.as_str() {
        "image/jpeg" | "image/pjpeg" => Some("jpeg"),
        "image/jpg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/png" | "image/x-png" => Some("png"),
        _ => None,
    }
}

/// Host component of a URL.
pub fn domain_name(url: &str) -> Option<&str> {
    UrlParts::parse(url).host
}

/// Interprets a publication date.
///
/// Integers, or text that parses as one, are Unix timestamps. Other text is
/// tried against RFC 3339, RFC 2822 and a set of common layouts; values
/// without an offset are taken as UTC.
///
/// # Errors
///
/// Returns [`ShelfmarkError::InvalidDate`] when nothing matches or the
/// timestamp is out of range.
pub fn parse_published_date(date: &PublishedDate) -> Result<DateTime<FixedOffset>> {
    match date {
        PublishedDate::DateTime(dt) => Ok(*dt),
        PublishedDate::Timestamp(ts) => from_timestamp(*ts, &ts.to_string()),
        PublishedDate::Text(text) => {
            let text = text.trim();
            match text.parse::<i64>() {
                Ok(ts) => from_timestamp(ts, text),
                Err(_) => parse_date_text(text),
            }
        }
    }
}

fn from_timestamp(ts: i64, raw: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::from_timestamp(ts, 0).map(|dt| dt.fixed_offset()).ok_or_else(|| ShelfmarkError::InvalidDate {
        value: raw.to_string(),
        reason: "timestamp out of range".to_string(),
    })
}

fn parse_date_text(text: &str) -> Result<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Ok(dt);
    }
    if let Some(dt) = OFFSET_FORMATS.iter().find_map(|f| DateTime::parse_from_str(text, f).ok()) {
        return Ok(dt);
    }
    if let Some(dt) = NAIVE_DATETIME_FORMATS.iter().find_map(|f| NaiveDateTime::parse_from_str(text, f).ok()) {
        return Ok(dt.and_utc().fixed_offset());
    }
    if let Some(date) = NAIVE_DATE_FORMATS.iter().find_map(|f| NaiveDate::parse_from_str(text, f).ok())
        && let Some(dt) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(dt.and_utc().fixed_offset());
    }

    Err(ShelfmarkError::InvalidDate { value: text.to_string(), reason: "unrecognized date format".to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_word_count() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("<p>Hello world</p>"), 2);
        assert_eq!(word_count("<p>one</p><p>two</p>"), 2);
        assert_eq!(word_count("<div>  spaced \n\t out   words </div>"), 3);
        assert_eq!(word_count("plain text only"), 3);
    }

    #[test]
    fn test_reading_time_rounds() {
        let words = |n: usize| format!("<p>{}</p>", "w ".repeat(n));
        assert_eq!(reading_time(&words(99), 200.0), 0);
        assert_eq!(reading_time(&words(100), 200.0), 1);
        assert_eq!(reading_time(&words(299), 200.0), 1);
        assert_eq!(reading_time(&words(300), 200.0), 2);
        assert_eq!(reading_time(&words(300), 100.0), 3);
    }

    #[test]
    fn test_reading_time_is_monotonic() {
        let mut previous = 0;
        for n in (0..2000).step_by(37) {
            let current = reading_time(&"a ".repeat(n), 200.0);
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn test_reading_time_with_invalid_speed() {
        assert_eq!(reading_time("<p>a b c</p>", 0.0), 0);
        assert_eq!(reading_time("<p>a b c</p>", -5.0), 0);
        assert_eq!(reading_time("<p>a b c</p>", f64::NAN), 0);
    }

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension("image/jpeg"), Some("jpeg"));
        assert_eq!(image_extension("image/png; charset=binary"), Some("png"));
        assert_eq!(image_extension("IMAGE/GIF"), Some("gif"));
        assert_eq!(image_extension("image/svg+xml"), None);
        assert_eq!(image_extension("text/html"), None);
    }

    #[test]
    fn test_domain_name() {
        assert_eq!(domain_name("https://www.example.com:443/path"), Some("www.example.com"));
        assert_eq!(domain_name("not a url"), None);
    }

    #[test]
    fn test_parse_timestamp() {
        let dt = parse_published_date(&PublishedDate::Timestamp(1514764800)).unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2018, 1, 1));

        let dt = parse_published_date(&PublishedDate::Text(" 1514764800 ".to_string())).unwrap();
        assert_eq!(dt.year(), 2018);
    }

    #[test]
    fn test_parse_text_formats() {
        let cases = [
            ("2016-09-08T11:55:58+0200", 2016, 9, 8, 11),
            ("2016-09-08T11:55:58+02:00", 2016, 9, 8, 11),
            ("2017-10-24T08:15:00Z", 2017, 10, 24, 8),
            ("Thu, 08 Sep 2016 11:55:58 +0000", 2016, 9, 8, 11),
            ("2016-09-08 11:55:58", 2016, 9, 8, 11),
            ("2016-09-08", 2016, 9, 8, 0),
            ("8 September 2016", 2016, 9, 8, 0),
            ("September 8, 2016", 2016, 9, 8, 0),
        ];

        for (text, year, month, day, hour) in cases {
            let dt = parse_published_date(&PublishedDate::Text(text.to_string()))
                .unwrap_or_else(|e| panic!("{text}: {e}"));
            assert_eq!((dt.year(), dt.month(), dt.day(), dt.hour()), (year, month, day, hour), "{text}");
        }
    }

    #[test]
    fn test_parse_invalid_date() {
        let result = parse_published_date(&PublishedDate::Text("01 02 2016 24:30:00".to_string()));
        assert!(matches!(result, Err(ShelfmarkError::InvalidDate { .. })));

        let result = parse_published_date(&PublishedDate::Timestamp(i64::MAX));
        assert!(matches!(result, Err(ShelfmarkError::InvalidDate { .. })));
    }
}
