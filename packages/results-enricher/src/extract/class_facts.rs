//! Course length and starter count for one class.
//!
//! The results page groups runners by class. Each group starts with a header
//! such as `<h3>H21</h3>10 570 m, 66 startande`, but the markup around it
//! varies between page versions, so several strategies are tried in order and
//! the first hit wins.

use regex::Regex;
use tracing::debug;

use super::patterns::{
    find_word_end, is_class_heading, parse_length_and_count, strip_tags, take_chars, HEADINGS,
};
use crate::document::{normalize_ws, HtmlDocument, QueryableDocument};
use crate::types::facts::ClassFacts;

/// Characters after the class name searched by the text-window strategy.
pub const TEXT_WINDOW_CHARS: usize = 100;

/// Characters of heading follow-up text considered by the heading strategies.
const FOLLOWING_CHARS: usize = 200;

/// A pure class-facts matcher.
pub type ClassStrategy<D> = fn(&D, &str) -> Option<ClassFacts>;

/// The strategies in the order they are tried.
pub fn class_strategies<D: QueryableDocument>() -> [(&'static str, ClassStrategy<D>); 4] {
    [
        ("class_header", class_header::<D> as ClassStrategy<D>),
        ("flexible_heading", flexible_heading::<D> as ClassStrategy<D>),
        ("table_caption", table_caption::<D> as ClassStrategy<D>),
        ("text_window", text_window::<D> as ClassStrategy<D>),
    ]
}

/// Course length and starter count of `class_name` on a results page.
///
/// Never fails: a class that cannot be found yields `ClassFacts::default()`.
pub fn extract_class_facts(html: &str, class_name: &str) -> ClassFacts {
    let document = HtmlDocument::parse(html);
    class_facts_in(&document, class_name)
}

/// [`extract_class_facts`] over an already parsed document.
pub fn class_facts_in<D: QueryableDocument>(document: &D, class_name: &str) -> ClassFacts {
    let class_name = normalize_ws(class_name);
    if class_name.is_empty() {
        return ClassFacts::default();
    }

    for (name, strategy) in class_strategies::<D>() {
        match strategy(document, &class_name) {
            Some(facts) => {
                debug!(
                    strategy = name,
                    class = %class_name,
                    length = facts.length,
                    participants = facts.participants,
                    "class facts matched"
                );
                return facts;
            }
            None => debug!(strategy = name, class = %class_name, "class facts strategy missed"),
        }
    }

    ClassFacts::default()
}

/// A heading whose text is exactly the class name, followed by the
/// "<m> m, <n> startande" line. Only applies to recognized class-name shapes.
pub fn class_header<D: QueryableDocument>(document: &D, class_name: &str) -> Option<ClassFacts> {
    if !is_class_heading(class_name) {
        return None;
    }

    for heading in document.select(HEADINGS) {
        if document.text(heading) != class_name {
            continue;
        }

        let following = document.following_text(heading);
        if let Some(facts) = parse_length_and_count(take_chars(&following, FOLLOWING_CHARS)) {
            return Some(facts);
        }

        // Header blocks that keep the summary in the next sibling block.
        if let Some(block) = document.parent(heading) {
            let following = document.following_text(block);
            if let Some(facts) = parse_length_and_count(take_chars(&following, FOLLOWING_CHARS)) {
                return Some(facts);
            }
        }
    }

    None
}

/// A heading in the raw markup that contains the class name with arbitrary
/// tags or entities between its words.
pub fn flexible_heading<D: QueryableDocument>(
    document: &D,
    class_name: &str,
) -> Option<ClassFacts> {
    let filler = r"(?:\s|&nbsp;|&#160;|<[^>]*>)";
    let name_pattern = class_name
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(&format!("{}+", filler));
    let pattern = format!(
        r"(?is)<h[1-6][^>]*>{filler}*{name}{filler}*</h[1-6]\s*>(.{{0,{following}}})",
        filler = filler,
        name = name_pattern,
        following = FOLLOWING_CHARS * 2,
    );
    let re = Regex::new(&pattern).ok()?;

    let found = re.captures_iter(document.source()).find_map(|cap| {
        let following = strip_tags(cap.get(1)?.as_str());
        parse_length_and_count(take_chars(&following, FOLLOWING_CHARS))
    });
    found
}

/// A table whose caption, or the element right before it, names the class and
/// carries the summary line.
pub fn table_caption<D: QueryableDocument>(document: &D, class_name: &str) -> Option<ClassFacts> {
    for table in document.select("table") {
        let caption = document
            .select_in(table, "caption")
            .into_iter()
            .next()
            .map(|c| document.text(c));
        let preceding = document
            .previous_siblings(table)
            .into_iter()
            .next()
            .map(|p| document.text(p));

        for text in [caption, preceding].into_iter().flatten() {
            if let Some(end) = find_word_end(&text, class_name) {
                if let Some(facts) = parse_length_and_count(&text[end..]) {
                    return Some(facts);
                }
            }
        }
    }

    None
}

/// Scan the document text: the summary line must start within
/// [`TEXT_WINDOW_CHARS`] characters after an occurrence of the class name.
pub fn text_window<D: QueryableDocument>(document: &D, class_name: &str) -> Option<ClassFacts> {
    let text = document.full_text();
    let mut offset = 0;

    while let Some(rel_end) = find_word_end(&text[offset..], class_name) {
        let end = offset + rel_end;
        let window = take_chars(&text[end..], TEXT_WINDOW_CHARS);
        if let Some(facts) = parse_length_and_count(window) {
            return Some(facts);
        }
        offset = end;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(html: &str, class: &str) -> ClassFacts {
        extract_class_facts(html, class)
    }

    #[test]
    fn test_class_header_block() {
        let html = r#"<div class="eventClassHeader"><div><h3>Medelsvår 4 Dam</h3>4 160 m, 24 startande</div></div>"#;
        assert_eq!(facts(html, "Medelsvår 4 Dam"), ClassFacts::new(4160, 24));
    }

    #[test]
    fn test_class_header_summary_in_next_block() {
        let html = r#"
            <div class="eventClassHeader"><h3>H21</h3></div>
            <div class="classInfo">10 570 m, 66 startande</div>
        "#;
        let doc = HtmlDocument::parse(html);
        assert_eq!(class_header(&doc, "H21"), Some(ClassFacts::new(10570, 66)));
    }

    #[test]
    fn test_unknown_class_defaults() {
        let html = r#"<div class="eventClassHeader"><div><h3>Medelsvår 4 Dam</h3>4 160 m, 24 startande</div></div>"#;
        assert_eq!(facts(html, "Non-existent class"), ClassFacts::default());
        assert_eq!(facts(html, ""), ClassFacts::default());
        assert_eq!(facts("", "H21"), ClassFacts::default());
    }

    #[test]
    fn test_flexible_heading_with_interleaved_markup() {
        let html = r#"<h2><a name="c1"></a><span>Motion</span>&nbsp;<em>kort</em></h2>
                      <p><span>2&nbsp;400 m,</span> 11 startande</p>"#;
        let doc = HtmlDocument::parse(html);
        // Not one of the recognized class shapes, so the header strategy passes.
        assert_eq!(class_header(&doc, "Motion kort"), None);
        assert_eq!(
            flexible_heading(&doc, "Motion kort"),
            Some(ClassFacts::new(2400, 11))
        );
        assert_eq!(facts(html, "Motion kort"), ClassFacts::new(2400, 11));
    }

    #[test]
    fn test_class_header_tolerates_inline_markup() {
        let html = r#"<h2><span>Lätt</span>&nbsp;2 <em>Herr</em></h2><p>2 400 m, 11 startande</p>"#;
        let doc = HtmlDocument::parse(html);
        assert_eq!(class_header(&doc, "Lätt 2 Herr"), Some(ClassFacts::new(2400, 11)));
    }

    #[test]
    fn test_table_caption() {
        let html = r#"
            <table><caption>Inskolning, 1 500 m, 9 startande</caption>
              <tr><td>1</td><td>Olle</td></tr>
            </table>
        "#;
        let doc = HtmlDocument::parse(html);
        assert_eq!(table_caption(&doc, "Inskolning"), Some(ClassFacts::new(1500, 9)));
    }

    #[test]
    fn test_table_preceding_sibling() {
        let html = r#"
            <p>U1 - 2 100 m, 14 startande</p>
            <table><tr><td>1</td><td>Stina</td></tr></table>
        "#;
        assert_eq!(facts(html, "U1"), ClassFacts::new(2100, 14));
    }

    #[test]
    fn test_text_window_bounds() {
        let near = "<div>Klass Motion kort: 3 200 m, 40 startande</div>";
        let doc = HtmlDocument::parse(near);
        assert_eq!(text_window(&doc, "Motion kort"), Some(ClassFacts::new(3200, 40)));

        let far = format!(
            "<div>Motion kort {} 3 200 m, 40 startande</div>",
            "x".repeat(TEXT_WINDOW_CHARS + 20)
        );
        let doc = HtmlDocument::parse(&far);
        assert_eq!(text_window(&doc, "Motion kort"), None);
    }

    #[test]
    fn test_exact_match_independent_of_order() {
        let html = r#"
            <div class="eventClassHeader"><div><h3>H21</h3>10 570 m, 66 startande</div></div>
            <div class="eventClassHeader"><div><h3>Medelsvår 4 Dam</h3>4 160 m, 24 startande</div></div>
            <div class="eventClassHeader"><div><h3>D21</h3>8 230 m, 41 startande</div></div>
        "#;
        assert_eq!(facts(html, "D21"), ClassFacts::new(8230, 41));
        assert_eq!(facts(html, "H21"), ClassFacts::new(10570, 66));
        assert_eq!(facts(html, "Medelsvår 4 Dam"), ClassFacts::new(4160, 24));
    }
}
