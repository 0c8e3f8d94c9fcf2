//! Value constraints checked before a field is stored.

use url::Url;

/// ISO 639-1 language codes.
const ISO_639_1: &str = "aa ab ae af ak am an ar as av ay az ba be bg bh bi bm bn bo br bs ca ce ch co cr cs cu cv \
cy da de dv dz ee el en eo es et eu fa ff fi fj fo fr fy ga gd gl gn gu gv ha he hi ho hr ht hu hy hz ia id ie ig \
ii ik io is it iu ja jv ka kg ki kj kk kl km kn ko kr ks ku kv kw ky la lb lg li ln lo lt lu lv mg mh mi mk ml mn \
mr ms mt my na nb nd ne ng nl nn no nr nv ny oc oj om or os pa pi pl ps pt qu rm rn ro ru rw sa sc sd se sg si sk \
sl sm sn so sq sr ss st su sv sw ta te tg th ti tk tl tn to tr ts tt tw ty ug uk ur uz ve vi vo wa wo xh yi yo za \
zh zu";

const URL_SCHEMES: [&str; 2] = ["http", "https"];

/// Checks values against named constraints.
///
/// Each method returns the list of violations; an empty list means the value
/// is acceptable.
pub trait Validator {
    /// Locale identifiers such as `en`, `fr_FR` or `zh_Hans_CN`.
    fn validate_locale(&self, value: &str) -> Vec<String>;

    /// Absolute web URLs.
    fn validate_url(&self, value: &str) -> Vec<String>;
}

/// Built-in constraint checks.
///
/// Locales are `language[_Script][_REGION]` with an ISO 639-1 language (or a
/// three-letter ISO 639-2/3 code), a four-letter title-case script and a
/// two-letter or three-digit region. URLs must parse, use http or https, and
/// name a host.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValidator;

impl Validator for DefaultValidator {
    fn validate_locale(&self, value: &str) -> Vec<String> {
        let mut violations = Vec::new();
        let mut subtags = value.split('_');

        let language = subtags.next().unwrap_or_default();
        if !is_language(language) {
            violations.push(format!("{language:?} is not a known language code"));
        }

        let rest: Vec<&str> = subtags.collect();
        let (script, region) = match rest.as_slice() {
            [] => (None, None),
            [one] if one.len() == 4 => (Some(*one), None),
            [one] => (None, Some(*one)),
            [script, region] => (Some(*script), Some(*region)),
            _ => {
                violations.push(format!("{value:?} has too many subtags"));
                (None, None)
            }
        };

        if let Some(script) = script
            && !is_script(script)
        {
            violations.push(format!("{script:?} is not a valid script subtag"));
        }
        if let Some(region) = region
            && !is_region(region)
        {
            violations.push(format!("{region:?} is not a valid region subtag"));
        }

        violations
    }

    fn validate_url(&self, value: &str) -> Vec<String> {
        let url = match Url::parse(value) {
            Ok(url) => url,
            Err(e) => return vec![format!("{value:?} is not a valid URL: {e}")],
        };

        let mut violations = Vec::new();
        if !URL_SCHEMES.contains(&url.scheme()) {
            violations.push(format!("scheme {:?} is not allowed", url.scheme()));
        }
        if url.host_str().is_none_or(str::is_empty) {
            violations.push("URL has no host".to_string());
        }
        violations
    }
}

fn is_language(code: &str) -> bool {
    match code.len() {
        2 => ISO_639_1.split_whitespace().any(|c| c == code),
        3 => code.bytes().all(|b| b.is_ascii_lowercase()),
        _ => false,
    }
}

fn is_script(code: &str) -> bool {
    let mut chars = code.chars();
    code.len() == 4
        && chars.next().is_some_and(|c| c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_lowercase())
}

fn is_region(code: &str) -> bool {
    (code.len() == 2 && code.bytes().all(|b| b.is_ascii_uppercase()))
        || (code.len() == 3 && code.bytes().all(|b| b.is_ascii_digit()))
}
