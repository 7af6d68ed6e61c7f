//! Regex patterns shared by the extraction heuristics.

use regex::Regex;
use std::sync::LazyLock;

use crate::document::normalize_ws;
use crate::types::facts::ClassFacts;

/// Class names the heuristics recognize: "Medelsvår 4 Dam", "H21", "Öppen 3".
static RE_CLASS_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\p{L}+ \d (?:Dam|Herr)|[HD]\d+|Öppen \d+)$").unwrap()
});

/// Same shapes, anchored only at the start of the text.
static RE_CLASS_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\p{L}+ \d (?:Dam|Herr)|[HD]\d+|Öppen \d+)(?:$|[^\p{L}\p{N}])").unwrap()
});

/// "4 160 m, 24 startande"
static RE_LENGTH_AND_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{1,3}(?:[ \u{a0}]\d{3})+|\d+)\s*m\s*,\s*(\d+)\s*startande").unwrap()
});

/// Start of a running time, "45:10" or "1:05:30".
pub(crate) static RE_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+:\d+").unwrap());

static RE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

pub(crate) const HEADINGS: &str = "h1, h2, h3, h4, h5, h6";

/// Whether `text` is exactly one of the recognized class-name shapes.
pub fn is_class_heading(text: &str) -> bool {
    RE_CLASS_HEADING.is_match(&normalize_ws(text))
}

/// The recognized class name at the start of `text`, if any.
pub fn class_name_prefix(text: &str) -> Option<String> {
    let text = normalize_ws(text);
    RE_CLASS_PREFIX
        .captures(&text)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}

/// Parse the first "<meters> m, <count> startande" in `text`.
pub fn parse_length_and_count(text: &str) -> Option<ClassFacts> {
    let cap = RE_LENGTH_AND_COUNT.captures(text)?;
    let meters: String = cap[1].chars().filter(|c| c.is_ascii_digit()).collect();
    let length = meters.parse::<u32>().ok()?;
    let participants = cap[2].parse::<u32>().ok()?;
    Some(ClassFacts::new(length, participants))
}

/// Replace tags with spaces, decode the entities the site uses and collapse
/// whitespace.
pub fn strip_tags(markup: &str) -> String {
    let text = RE_TAG.replace_all(markup, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">");
    normalize_ws(&text)
}

/// Byte offset just past the first occurrence of `needle` in `haystack` that
/// is not glued to surrounding letters or digits.
pub fn find_word_end(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    let mut from = 0;
    while let Some(rel) = haystack[from..].find(needle) {
        let start = from + rel;
        let end = start + needle.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return Some(end);
        }
        from = start + needle.chars().next().map_or(1, char::len_utf8);
    }
    None
}

/// At most `max_chars` characters from the start of `text`.
pub fn take_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_heading_shapes() {
        assert!(is_class_heading("Medelsvår 4 Dam"));
        assert!(is_class_heading("Svår 5 Herr"));
        assert!(is_class_heading("H21"));
        assert!(is_class_heading("D16"));
        assert!(is_class_heading("Öppen 3"));
        assert!(is_class_heading("  H21 "));

        assert!(!is_class_heading("H21E"));
        assert!(!is_class_heading("Medelsvår 4"));
        assert!(!is_class_heading("Inskolning"));
        assert!(!is_class_heading("Resultat"));
    }

    #[test]
    fn test_class_name_prefix() {
        assert_eq!(class_name_prefix("H21 - 10,5 km").as_deref(), Some("H21"));
        assert_eq!(
            class_name_prefix("Lätt 2 Dam, 2 400 m").as_deref(),
            Some("Lätt 2 Dam")
        );
        assert_eq!(class_name_prefix("H21E"), None);
    }

    #[test]
    fn test_parse_length_and_count() {
        assert_eq!(
            parse_length_and_count("4 160 m, 24 startande"),
            Some(ClassFacts::new(4160, 24))
        );
        assert_eq!(
            parse_length_and_count("Bana 2: 10\u{a0}570 m , 66 Startande"),
            Some(ClassFacts::new(10570, 66))
        );
        assert_eq!(
            parse_length_and_count("2800 m, 7 startande"),
            Some(ClassFacts::new(2800, 7))
        );
        assert_eq!(parse_length_and_count("4 160 m"), None);
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(
            strip_tags("<span>4&nbsp;160 m,</span> <b>24</b> startande"),
            "4 160 m, 24 startande"
        );
    }

    #[test]
    fn test_find_word_end() {
        assert_eq!(find_word_end("H21E H21 x", "H21"), Some(8));
        assert_eq!(find_word_end("H210", "H21"), None);
        assert_eq!(find_word_end("Öppen 3", "Öppen 3"), Some("Öppen 3".len()));
    }

    #[test]
    fn test_take_chars() {
        assert_eq!(take_chars("åäö", 2), "åä");
        assert_eq!(take_chars("ab", 5), "ab");
    }
}
