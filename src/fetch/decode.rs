//! Charset detection and text decoding
//!
//! Remote documents arrive as raw bytes with unreliable encoding metadata.
//! This module resolves the encoding in a fixed priority order and always
//! produces text:
//!
//! 1. The transport-declared charset (Content-Type header parameter)
//! 2. An in-document meta declaration (`<meta charset>` or an
//!    `http-equiv=content-type` meta carrying `charset=`)
//! 3. A fallback ordering of common encodings: UTF-8, GBK, Latin-1, ISO-8859-1
//! 4. Forced UTF-8 with replacement characters, which cannot fail

use encoding_rs::Encoding;
use scraper::{Html, Selector};

/// Fallback encodings tried when no charset is declared or the declared one
/// does not decode cleanly. Order matters: UTF-8 first, then the encodings
/// the crawled sites actually serve.
const FALLBACK_ENCODINGS: [&str; 4] = ["utf-8", "gbk", "latin-1", "iso-8859-1"];

/// Decodes raw document bytes into text
///
/// `declared` is the charset from the transport layer, if any. The function
/// never fails and never panics: for arbitrary byte input the final forced
/// UTF-8 step substitutes U+FFFD for undecodable sequences.
pub fn decode(raw: &[u8], declared: Option<&str>) -> String {
    let mut candidates: Vec<String> = Vec::new();

    if let Some(charset) = declared {
        candidates.push(charset.to_string());
    } else if let Some(charset) = sniff_meta_charset(raw) {
        candidates.push(charset);
    }

    candidates.extend(FALLBACK_ENCODINGS.iter().map(|s| s.to_string()));

    for label in &candidates {
        // Unknown labels are skipped, mirroring a failed charset lookup
        let Some(encoding) = Encoding::for_label(label.as_bytes()) else {
            continue;
        };
        let (text, _, had_errors) = encoding.decode(raw);
        if !had_errors {
            return text.into_owned();
        }
    }

    // Final guarantee: lossy UTF-8
    String::from_utf8_lossy(raw).into_owned()
}

/// Extracts a charset declared inside the document itself
///
/// The bytes are parsed lossily as a best-effort ASCII superset; meta
/// declarations are ASCII in practice, so a wrong guess about the body
/// encoding does not affect the sniff.
pub fn sniff_meta_charset(raw: &[u8]) -> Option<String> {
    let ascii = String::from_utf8_lossy(raw);
    let document = Html::parse_document(&ascii);

    // <meta charset="...">
    if let Ok(selector) = Selector::parse("meta[charset]") {
        if let Some(element) = document.select(&selector).next() {
            if let Some(charset) = element.value().attr("charset") {
                let charset = charset.trim();
                if !charset.is_empty() {
                    return Some(charset.to_string());
                }
            }
        }
    }

    // <meta http-equiv="Content-Type" content="text/html; charset=...">
    if let Ok(selector) = Selector::parse("meta[http-equiv]") {
        for element in document.select(&selector) {
            let is_content_type = element
                .value()
                .attr("http-equiv")
                .map(|v| v.trim().eq_ignore_ascii_case("content-type"))
                .unwrap_or(false);
            if !is_content_type {
                continue;
            }

            if let Some(content) = element.value().attr("content") {
                if let Some(charset) = charset_from_content_type(content) {
                    return Some(charset);
                }
            }
        }
    }

    None
}

/// Pulls the `charset=` parameter out of a content-type value, if present
pub fn charset_from_content_type(content_type: &str) -> Option<String> {
    let lower = content_type.to_ascii_lowercase();
    let start = lower.find("charset=")? + "charset=".len();

    let charset: String = content_type[start..]
        .trim_start_matches(['"', '\''])
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();

    if charset.is_empty() {
        None
    } else {
        Some(charset)
    }
}
