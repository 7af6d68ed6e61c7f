//! Queryable document capability used by the extraction engine.
//!
//! Extraction code only talks to [`QueryableDocument`]; [`HtmlDocument`] is
//! the implementation backed by the `scraper` crate.

use scraper::{ElementRef, Html, Node, Selector};

/// The small set of tree queries the extraction heuristics need.
///
/// Text returned by these methods is whitespace-normalized: runs of
/// whitespace (including non-breaking spaces) collapse to one space and the
/// result is trimmed.
pub trait QueryableDocument {
    /// Handle to an element in the document.
    type Node<'a>: Copy + PartialEq
    where
        Self: 'a;

    /// The markup the document was parsed from.
    fn source(&self) -> &str;

    /// All elements matching a CSS selector, in document order.
    /// Invalid selectors match nothing.
    fn select<'a>(&'a self, selector: &str) -> Vec<Self::Node<'a>>;

    /// Descendants of `scope` matching a CSS selector.
    fn select_in<'a>(&'a self, scope: Self::Node<'a>, selector: &str) -> Vec<Self::Node<'a>>;

    /// Text content of an element and its descendants.
    fn text<'a>(&'a self, node: Self::Node<'a>) -> String;

    /// Lowercase tag name.
    fn tag_name<'a>(&'a self, node: Self::Node<'a>) -> String;

    /// Nearest ancestor-or-self matching a selector.
    fn closest<'a>(&'a self, node: Self::Node<'a>, selector: &str) -> Option<Self::Node<'a>>;

    fn parent<'a>(&'a self, node: Self::Node<'a>) -> Option<Self::Node<'a>>;

    /// Element siblings before `node`, nearest first.
    fn previous_siblings<'a>(&'a self, node: Self::Node<'a>) -> Vec<Self::Node<'a>>;

    /// Text of everything after `node` inside its parent.
    fn following_text<'a>(&'a self, node: Self::Node<'a>) -> String;

    /// Text content of the whole document.
    fn full_text(&self) -> String;
}

/// An HTML document parsed with `scraper`.
pub struct HtmlDocument {
    source: String,
    html: Html,
}

impl HtmlDocument {
    pub fn parse(html: &str) -> Self {
        Self {
            source: html.to_string(),
            html: Html::parse_document(html),
        }
    }

    fn selector(selector: &str) -> Option<Selector> {
        Selector::parse(selector).ok()
    }
}

impl std::fmt::Debug for HtmlDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlDocument")
            .field("bytes", &self.source.len())
            .finish()
    }
}

impl QueryableDocument for HtmlDocument {
    type Node<'a> = ElementRef<'a>;

    fn source(&self) -> &str {
        &self.source
    }

    fn select<'a>(&'a self, selector: &str) -> Vec<ElementRef<'a>> {
        match Self::selector(selector) {
            Some(sel) => self.html.select(&sel).collect(),
            None => Vec::new(),
        }
    }

    fn select_in<'a>(&'a self, scope: ElementRef<'a>, selector: &str) -> Vec<ElementRef<'a>> {
        match Self::selector(selector) {
            Some(sel) => scope.select(&sel).collect(),
            None => Vec::new(),
        }
    }

    fn text<'a>(&'a self, node: ElementRef<'a>) -> String {
        normalize_ws(&node.text().collect::<Vec<_>>().join(" "))
    }

    fn tag_name<'a>(&'a self, node: ElementRef<'a>) -> String {
        node.value().name().to_ascii_lowercase()
    }

    fn closest<'a>(&'a self, node: ElementRef<'a>, selector: &str) -> Option<ElementRef<'a>> {
        let sel = Self::selector(selector)?;
        if sel.matches(&node) {
            return Some(node);
        }
        node.ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| sel.matches(el))
    }

    fn parent<'a>(&'a self, node: ElementRef<'a>) -> Option<ElementRef<'a>> {
        node.parent().and_then(ElementRef::wrap)
    }

    fn previous_siblings<'a>(&'a self, node: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        node.prev_siblings().filter_map(ElementRef::wrap).collect()
    }

    fn following_text<'a>(&'a self, node: ElementRef<'a>) -> String {
        let mut parts: Vec<String> = Vec::new();
        for sibling in node.next_siblings() {
            match sibling.value() {
                Node::Text(text) => parts.push(text.to_string()),
                Node::Element(_) => {
                    if let Some(el) = ElementRef::wrap(sibling) {
                        parts.push(el.text().collect::<Vec<_>>().join(" "));
                    }
                }
                _ => {}
            }
        }
        normalize_ws(&parts.join(" "))
    }

    fn full_text(&self) -> String {
        let root = self.html.root_element();
        let skip = Self::selector("script, style");
        let mut parts: Vec<&str> = Vec::new();
        for node in root.descendants() {
            if let Node::Text(text) = node.value() {
                let inside_skipped = node
                    .ancestors()
                    .filter_map(ElementRef::wrap)
                    .any(|el| skip.as_ref().is_some_and(|s| s.matches(&el)));
                if !inside_skipped {
                    parts.push(text);
                }
            }
        }
        normalize_ws(&parts.join(" "))
    }
}

/// Collapse whitespace runs (including `&nbsp;`) into single spaces and trim.
pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><head><title>Resultat</title><script>var x = "H21";</script></head>
        <body>
          <div class="eventClassHeader"><div><h3>H21</h3>10 570 m, 66 startande</div></div>
          <p>Intro</p>
          <table id="results"><caption>H21</caption>
            <tr><th>Plac</th><th>Namn</th></tr>
            <tr><td>1</td><td>Erik</td></tr>
          </table>
        </body></html>
    "#;

    #[test]
    fn test_following_text() {
        let doc = HtmlDocument::parse(PAGE);
        let h3 = doc.select("h3")[0];
        assert_eq!(doc.text(h3), "H21");
        assert_eq!(doc.following_text(h3), "10 570 m, 66 startande");
    }

    #[test]
    fn test_closest_and_previous_siblings() {
        let doc = HtmlDocument::parse(PAGE);
        let cell = doc.select("td")[1];
        let table = doc.closest(cell, "table").unwrap();
        assert_eq!(doc.tag_name(table), "table");

        let before: Vec<String> = doc
            .previous_siblings(table)
            .into_iter()
            .map(|n| doc.tag_name(n))
            .collect();
        assert_eq!(before, vec!["p", "div"]);
    }

    #[test]
    fn test_full_text_skips_scripts() {
        let doc = HtmlDocument::parse(PAGE);
        let text = doc.full_text();
        assert!(text.contains("10 570 m, 66 startande"));
        assert!(!text.contains("var x"));
    }

    #[test]
    fn test_invalid_selector_matches_nothing() {
        let doc = HtmlDocument::parse(PAGE);
        assert!(doc.select("[[[").is_empty());
    }

    #[test]
    fn test_normalize_ws() {
        assert_eq!(normalize_ws("  4\u{a0}160  m,\n 24 "), "4 160 m, 24");
    }
}
