//! HTML `<title>` extraction.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title\s*>").expect("valid title regex"));
static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});").expect("valid entity regex")
});
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Extracts the first `<title>` of an HTML document.
///
/// Entities are decoded and whitespace runs collapse to one space. Returns an
/// empty string when the document has no title.
pub fn extract_title(html: &str) -> String {
    let Some(raw) = TITLE_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
    else {
        return String::new();
    };

    let decoded = ENTITY_RE.replace_all(raw, |caps: &Captures<'_>| decode_entity(caps));
    WHITESPACE_RE
        .replace_all(&decoded, " ")
        .trim()
        .to_string()
}

fn decode_entity(caps: &Captures<'_>) -> String {
    let body = &caps[1];
    let decoded = if let Some(numeric) = body.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => numeric.parse::<u32>().ok(),
        };
        code.and_then(char::from_u32)
    } else {
        match body {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some(' '),
            "ndash" => Some('\u{2013}'),
            "mdash" => Some('\u{2014}'),
            "hellip" => Some('\u{2026}'),
            _ => None,
        }
    };

    decoded.map_or_else(|| caps[0].to_string(), String::from)
}

#[cfg(test)]
mod tests {
    use super::extract_title;

    #[test]
    fn extracts_and_collapses_whitespace() {
        let html = "<html><head><TITLE lang=\"en\">\n  Rust \t Book\n</TITLE></head></html>";
        assert_eq!(extract_title(html), "Rust Book");
    }

    #[test]
    fn decodes_named_and_numeric_entities() {
        let html = "<title>Tom &amp; Jerry &#8211; &#x41;&lt;b&gt; &bogus;</title>";
        assert_eq!(extract_title(html), "Tom & Jerry \u{2013} A<b> &bogus;");
    }

    #[test]
    fn missing_title_is_empty() {
        assert_eq!(extract_title("<html><body>no head</body></html>"), "");
        assert_eq!(extract_title("<title></title>"), "");
    }
}
