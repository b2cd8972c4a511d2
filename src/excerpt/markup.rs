// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parsed-markup collaborator for the sentence extractor
//!
//! The extractor only needs three things from a markup parser: a repaired
//! serialization of a (possibly unbalanced) HTML piece, its text content, and
//! the smallest element containing a given text. `ScraperMarkup` provides them
//! on top of the `scraper` HTML5 parser.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};

static PUNCTUATION_ENDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\W+|\W+$").expect("valid punctuation regex"));

/// Strip leading and trailing non-word characters.
pub fn strip_punctuation_ends(text: &str) -> String {
    PUNCTUATION_ENDS.replace_all(text, "").into_owned()
}

/// The element found to enclose some text, with the names of its ancestors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnclosingElement {
    pub name: String,
    /// Ancestor element names, innermost first
    pub ancestors: Vec<String>,
}

impl EnclosingElement {
    /// True when the element or one of its ancestors renders in italics.
    pub fn is_emphasized(&self) -> bool {
        is_emphasis_tag(&self.name) || self.ancestors.iter().any(|name| is_emphasis_tag(name))
    }
}

fn is_emphasis_tag(name: &str) -> bool {
    matches!(name, "em" | "i")
}

/// A parsed HTML fragment.
pub trait MarkupTree {
    /// Concatenated text of every text node.
    fn text(&self) -> String;

    /// Serialized, tag-balanced HTML of the fragment.
    fn to_html(&self) -> String;

    /// Smallest element whose punctuation-stripped text contains `needle`.
    fn find_smallest_containing(&self, needle: &str) -> Option<EnclosingElement>;
}

/// Parser producing [`MarkupTree`]s.
pub trait Markup {
    type Tree: MarkupTree;

    fn parse(&self, html: &str) -> Self::Tree;
}

/// `scraper`-backed markup parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScraperMarkup;

pub struct ScraperTree {
    html: Html,
}

impl Markup for ScraperMarkup {
    type Tree = ScraperTree;

    fn parse(&self, html: &str) -> ScraperTree {
        ScraperTree {
            html: Html::parse_fragment(html),
        }
    }
}

impl MarkupTree for ScraperTree {
    fn text(&self) -> String {
        self.html.root_element().text().collect()
    }

    fn to_html(&self) -> String {
        self.html.root_element().inner_html()
    }

    fn find_smallest_containing(&self, needle: &str) -> Option<EnclosingElement> {
        let mut best: Option<(usize, ElementRef<'_>)> = None;

        // Document order: on equal text length the later (deeper) element wins.
        for node in self.html.root_element().descendants() {
            let Some(element) = ElementRef::wrap(node) else {
                continue;
            };
            let text: String = element.text().collect();
            let stripped = strip_punctuation_ends(&text);
            if !stripped.contains(needle) {
                continue;
            }
            let len = stripped.len();
            if best.map_or(true, |(best_len, _)| len <= best_len) {
                best = Some((len, element));
            }
        }

        best.map(|(_, element)| EnclosingElement {
            name: element.value().name().to_string(),
            ancestors: element
                .ancestors()
                .filter_map(ElementRef::wrap)
                .map(|ancestor| ancestor.value().name().to_string())
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_only_the_ends() {
        assert_eq!(strip_punctuation_ends("“Hello, world.”"), "Hello, world");
        assert_eq!(strip_punctuation_ends("...plain"), "plain");
        assert_eq!(strip_punctuation_ends("!!!"), "");
    }

    #[test]
    fn repairs_unbalanced_pieces() {
        let tree = ScraperMarkup.parse("<p><em>Hello there. ");
        assert_eq!(tree.to_html(), "<p><em>Hello there. </em></p>");

        let tree = ScraperMarkup.parse("How are you.</em> ");
        assert_eq!(tree.to_html(), "How are you. ");
    }

    #[test]
    fn text_drops_tags() {
        let tree = ScraperMarkup.parse("<p>a <strong class=\"match term0\">cat</strong> sat</p>");
        assert_eq!(tree.text(), "a cat sat");
    }

    #[test]
    fn finds_the_smallest_enclosing_element() {
        let tree = ScraperMarkup.parse("<p>Plain start. <em>An italic <strong>cat</strong> line.</em></p>");

        let found = tree
            .find_smallest_containing("An italic cat line")
            .expect("enclosing element");
        assert_eq!(found.name, "em");
        assert!(found.is_emphasized());

        let found = tree.find_smallest_containing("Plain start").expect("paragraph");
        assert_eq!(found.name, "p");
        assert!(!found.is_emphasized());
    }

    #[test]
    fn ancestors_count_towards_emphasis() {
        let tree = ScraperMarkup.parse("<p><em>so <strong class=\"match term0\">cat</strong></em> then</p>");
        let found = tree.find_smallest_containing("cat").expect("strong");
        assert_eq!(found.name, "strong");
        assert_eq!(found.ancestors.first().map(String::as_str), Some("em"));
        assert!(found.is_emphasized());
    }

    #[test]
    fn missing_text_is_not_found() {
        let tree = ScraperMarkup.parse("<p>nothing here</p>");
        assert!(tree.find_smallest_containing("elsewhere").is_none());
    }
}
