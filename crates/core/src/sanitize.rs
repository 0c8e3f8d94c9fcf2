//! Title charset detection and UTF-8 repair.
//!
//! Titles pulled out of PDF metadata are frequently not UTF-8: PDF text strings
//! are either UTF-16BE (with a byte-order mark) or a single-byte encoding close
//! to Windows-1252. Everything else is assumed to be UTF-8 that may contain
//! stray invalid sequences.

use encoding_rs::{UTF_16BE, WINDOWS_1252};

pub const PDF_MIME: &str = "application/pdf";

/// Bytes Windows-1252 leaves undefined.
const CP1252_UNDEFINED: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];

/// Returns a valid UTF-8 title.
///
/// For PDF documents the bytes are tried as UTF-8, then UTF-16BE, then
/// Windows-1252, and the first encoding they are valid in wins. Any invalid
/// UTF-8 sequences left afterwards are dropped.
///
/// # Example
///
/// ```rust
/// use shelfmark_core::sanitize_title;
///
/// assert_eq!(sanitize_title("Caf\u{e9}".as_bytes(), Some("text/html")), "Caf\u{e9}");
/// assert_eq!(sanitize_title(b"Caf\xe9s", Some("application/pdf")), "Caf\u{e9}s");
/// assert_eq!(sanitize_title(b"ok\xff", Some("text/html")), "ok");
/// ```
pub fn sanitize_title(title: &[u8], content_type: Option<&str>) -> String {
    if content_type == Some(PDF_MIME) {
        return strip_invalid_utf8(&decode_pdf_title(title));
    }
    strip_invalid_utf8(title)
}

/// Converts a PDF title to UTF-8 bytes, or hands back the input when no
/// candidate encoding accepts it.
fn decode_pdf_title(title: &[u8]) -> Vec<u8> {
    if std::str::from_utf8(title).is_ok() {
        return title.to_vec();
    }

    if title.len() % 2 == 0
        && let Some(decoded) = UTF_16BE.decode_without_bom_handling_and_without_replacement(strip_utf16_bom(title))
    {
        return decoded.into_owned().into_bytes();
    }

    if !title.iter().any(|b| CP1252_UNDEFINED.contains(b)) {
        let (decoded, _) = WINDOWS_1252.decode_without_bom_handling(title);
        return decoded.into_owned().into_bytes();
    }

    title.to_vec()
}

fn strip_utf16_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(&[0xFE, 0xFF]).unwrap_or(bytes)
}

/// Drops every invalid UTF-8 sequence, keeping the valid text around it.
fn strip_invalid_utf8(bytes: &[u8]) -> String {
    let mut output = String::with_capacity(bytes.len());
    let mut rest = bytes;

    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                output.push_str(valid);
                return output;
            }
            Err(err) => {
                let (valid, invalid) = rest.split_at(err.valid_up_to());
                output.push_str(&String::from_utf8_lossy(valid));
                match err.error_len() {
                    Some(len) => rest = &invalid[len..],
                    None => return output,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_utf8_is_unchanged() {
        let title = "Ünïcödé – “quoted” 日本語";
        assert_eq!(sanitize_title(title.as_bytes(), Some("text/html")), title);
        assert_eq!(sanitize_title(title.as_bytes(), None), title);
        assert_eq!(sanitize_title(title.as_bytes(), Some(PDF_MIME)), title);
    }

    #[test]
    fn test_invalid_sequences_are_dropped() {
        assert_eq!(sanitize_title(b"a\xffb\xfe\xfdc", Some("text/html")), "abc");
        assert_eq!(sanitize_title(b"truncated \xe2\x82", None), "truncated ");
    }

    #[test]
    fn test_pdf_utf16be_with_bom() {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in "Résumé".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(sanitize_title(&bytes, Some(PDF_MIME)), "Résumé");
    }

    #[test]
    fn test_pdf_windows_1252() {
        assert_eq!(sanitize_title(b"\x93Quoted\x94 na\xefve", Some(PDF_MIME)), "\u{201c}Quoted\u{201d} na\u{ef}ve");
    }

    #[test]
    fn test_pdf_undecodable_passes_through_repaired() {
        // odd length rules out UTF-16BE, 0x81 rules out Windows-1252
        assert_eq!(sanitize_title(b"ab\x81", Some(PDF_MIME)), "ab");
    }

    #[test]
    fn test_non_pdf_is_not_reinterpreted() {
        assert_eq!(sanitize_title(b"Caf\xe9", Some("text/html")), "Caf");
    }
}
