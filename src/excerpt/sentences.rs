// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sentence extraction from a highlighted paragraph
//!
//! A paragraph rendered by the formatter is cut into sentences; only sentences
//! holding a match marker survive. Runs of adjacent surviving sentences are
//! merged so no elision marker separates them, and a sentence lifted out of an
//! italic passage is re-wrapped in `<em>` so the emphasis does not get lost at
//! the excerpt edge.

use super::format::MATCH_MARKER;
use super::markup::{strip_punctuation_ends, Markup, MarkupTree};
use crate::errors::ExcerptError;

/// Title abbreviations that never end a sentence.
const TITLE_ABBREVIATIONS: &[&str] = &["dr", "sr", "jr", "mr", "ms", "mrs"];

const CLOSING_QUOTE: char = '\u{201D}';

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SentenceOptions {
    /// Emit empty leading/trailing entries when the paragraph edges were cut
    pub elision_placeholders: bool,
}

/// One matched sentence, rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceFragment {
    pub html: String,
    /// The sentence directly follows the previous matched sentence
    pub adjacent_to_previous: bool,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Whether the period at byte `idx` ends a sentence.
fn period_ends_sentence(text: &str, idx: usize) -> bool {
    let word: String = text[..idx]
        .chars()
        .rev()
        .take_while(|&c| is_word_char(c))
        .collect();
    let len = word.chars().count();
    if len == 1 {
        // an initial, as in "J. Smith"
        return false;
    }
    let word = word.chars().rev().collect::<String>().to_lowercase();
    !TITLE_ABBREVIATIONS.contains(&word.as_str())
}

fn is_terminal(text: &str, idx: usize, c: char) -> bool {
    match c {
        '?' | '!' => true,
        '.' => period_ends_sentence(text, idx),
        CLOSING_QUOTE => text[..idx].ends_with('.'),
        _ => false,
    }
}

/// Cut rendered HTML into sentence pieces.
///
/// A piece ends after a terminal followed by whitespace (the whitespace stays
/// with the piece) or at the end of the text. Empty pieces are dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if !is_terminal(text, idx, c) {
            continue;
        }
        match chars.peek() {
            Some(&(ws_idx, ws)) if ws.is_whitespace() => {
                let end = ws_idx + ws.len_utf8();
                pieces.push(&text[start..end]);
                start = end;
                chars.next();
            }
            None => {
                pieces.push(&text[start..]);
                start = text.len();
            }
            _ => {}
        }
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }

    pieces.retain(|piece| !piece.is_empty());
    pieces
}

/// Drop paragraph and list-item wrappers left over from re-parsing a piece.
fn strip_block_wrappers(html: &str) -> &str {
    let mut html = html;
    for (open, close) in [("<p>", "</p>"), ("<li>", "</li>")] {
        html = html.strip_prefix(open).unwrap_or(html);
        html = html.strip_suffix(close).unwrap_or(html);
    }
    html
}

/// Matched sentences of `paragraph`, each flagged with its adjacency.
pub fn sentence_fragments<M: Markup>(
    markup: &M,
    paragraph: &str,
) -> Result<Vec<SentenceFragment>, ExcerptError> {
    let paragraph_tree = markup.parse(paragraph);
    let mut fragments = Vec::new();
    let mut last_match_idx: Option<usize> = None;

    // A dangling `</p>` re-parses as an empty paragraph, so cut the wrapper first.
    let inner = strip_block_wrappers(paragraph.trim());
    for (s_idx, raw) in split_sentences(inner).into_iter().enumerate() {
        let raw = raw.trim_matches('\n');
        if !raw.contains(MATCH_MARKER) {
            continue;
        }

        let sentence_tree = markup.parse(raw);
        let needle = strip_punctuation_ends(&sentence_tree.text());
        let enclosing = paragraph_tree
            .find_smallest_containing(&needle)
            .ok_or(ExcerptError::EnclosingElementNotFound { needle })?;

        let serialized = sentence_tree.to_html();
        let mut html = strip_block_wrappers(&serialized).to_string();
        if enclosing.is_emphasized() && !html.starts_with("<em>") {
            html = format!("<em>{html}</em>");
        }

        fragments.push(SentenceFragment {
            html,
            adjacent_to_previous: s_idx > 0 && last_match_idx == Some(s_idx - 1),
        });
        last_match_idx = Some(s_idx);
    }

    tracing::trace!(sentences = fragments.len(), "extracted matched sentences");
    Ok(fragments)
}

/// Concatenate runs of adjacent sentence fragments.
pub fn merge_adjacent(fragments: Vec<SentenceFragment>) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(fragments.len());
    for fragment in fragments {
        match merged.last_mut() {
            Some(last) if fragment.adjacent_to_previous => last.push_str(&fragment.html),
            _ => merged.push(fragment.html),
        }
    }
    merged
}

/// Matched sentences of `paragraph`, adjacent runs merged into one entry.
pub fn extract_sentences<M: Markup>(
    markup: &M,
    paragraph: &str,
    options: SentenceOptions,
) -> Result<Vec<String>, ExcerptError> {
    let pieces = split_sentences(strip_block_wrappers(paragraph.trim()));
    let fragments = sentence_fragments(markup, paragraph)?;

    if !options.elision_placeholders {
        return Ok(merge_adjacent(fragments));
    }
    let starts_matched = pieces.first().is_some_and(|piece| piece.contains(MATCH_MARKER));
    let ends_matched = pieces.last().is_some_and(|piece| piece.contains(MATCH_MARKER));

    // a paragraph without matches is cut at both edges
    let mut sentences = Vec::with_capacity(fragments.len() + 2);
    if !starts_matched {
        sentences.push(String::new());
    }
    sentences.extend(merge_adjacent(fragments));
    if !ends_matched {
        sentences.push(String::new());
    }
    Ok(sentences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::excerpt::markup::ScraperMarkup;

    fn mark(word: &str) -> String {
        format!("<strong class=\"match term0\">{word}</strong>")
    }

    #[test]
    fn splits_on_terminals_followed_by_space() {
        let pieces = split_sentences("One. Two? Three! Four");
        assert_eq!(pieces, vec!["One. ", "Two? ", "Three! ", "Four"]);
    }

    #[test]
    fn abbreviations_and_initials_do_not_split() {
        let pieces = split_sentences("Dr. Smith met mrs. Jones and J. Doe. Then left.");
        assert_eq!(pieces, vec!["Dr. Smith met mrs. Jones and J. Doe. ", "Then left."]);
    }

    #[test]
    fn quoted_sentence_ends_after_the_quote() {
        let pieces = split_sentences("He said “stop.” She did.");
        assert_eq!(pieces, vec!["He said “stop.” ", "She did."]);
    }

    #[test]
    fn period_inside_a_word_does_not_split() {
        assert_eq!(split_sentences("version 1.5 ships"), vec!["version 1.5 ships"]);
    }

    #[test]
    fn abbreviation_does_not_cause_a_false_split() {
        let paragraph = format!("<p>Dr. Smith {}. The cat {}!</p>", mark("won"), mark("won"));
        let fragments = sentence_fragments(&ScraperMarkup, &paragraph).expect("extract");

        assert_eq!(fragments.len(), 2);
        assert!(fragments[0].html.starts_with("Dr. Smith "));
        assert!(!fragments[0].adjacent_to_previous);
        assert!(fragments[1].adjacent_to_previous);

        let merged = merge_adjacent(fragments);
        assert_eq!(merged.len(), 1);
        assert_eq!(
            merged[0],
            format!("Dr. Smith {}. The cat {}!", mark("won"), mark("won"))
        );
    }

    #[test]
    fn unmatched_sentences_are_dropped_and_gaps_kept() {
        let paragraph = format!(
            "<p>A {} here. Nothing to see. Another {} there. Filler.</p>",
            mark("cat"),
            mark("cat")
        );
        let sentences =
            extract_sentences(&ScraperMarkup, &paragraph, SentenceOptions::default()).expect("extract");

        assert_eq!(sentences.len(), 2);
        assert!(sentences.iter().all(|s| s.contains(MATCH_MARKER)));
        assert!(sentences[0].starts_with("A "));
        assert!(sentences[1].starts_with("Another "));
    }

    #[test]
    fn no_match_yields_nothing() {
        let sentences =
            extract_sentences(&ScraperMarkup, "<p>Plain. Text.</p>", SentenceOptions::default())
                .expect("extract");
        assert!(sentences.is_empty());
    }

    #[test]
    fn placeholders_mark_cut_edges() {
        let options = SentenceOptions {
            elision_placeholders: true,
        };
        let paragraph = format!("<p>Lead in. A {} here. Trailing.</p>", mark("cat"));
        let sentences = extract_sentences(&ScraperMarkup, &paragraph, options).expect("extract");
        assert_eq!(sentences.len(), 3);
        assert!(sentences[0].is_empty());
        assert!(sentences[2].is_empty());

        let none = extract_sentences(&ScraperMarkup, "<p>Plain.</p>", options).expect("extract");
        assert_eq!(none, vec![String::new(), String::new()]);
    }

    #[test]
    fn dangling_close_tags_are_repaired_away() {
        let paragraph = format!(
            "<p><em>First line. A {} in italics.</em> Plain {} after.</p>",
            mark("cat"),
            mark("dog")
        );
        let sentences =
            extract_sentences(&ScraperMarkup, &paragraph, SentenceOptions::default()).expect("extract");

        // the sentence straddles the italic run, so no single element wraps it in <em>
        assert_eq!(
            sentences,
            vec![format!("A {} in italics. Plain {} after.", mark("cat"), mark("dog"))]
        );
    }

    #[test]
    fn lifted_italic_sentence_is_rewrapped() {
        let paragraph = format!(
            "<p><em>Opening words. Middle {} words. Closing words.</em></p>",
            mark("cat")
        );
        let sentences =
            extract_sentences(&ScraperMarkup, &paragraph, SentenceOptions::default()).expect("extract");

        assert_eq!(sentences, vec![format!("<em>Middle {} words. </em>", mark("cat"))]);
    }

    #[test]
    fn every_returned_sentence_holds_a_match() {
        let paragraph = format!(
            "<p>Zero. One {}. Two. Three {}? Four {}! Five.</p>",
            mark("a"),
            mark("b"),
            mark("c")
        );
        let fragments = sentence_fragments(&ScraperMarkup, &paragraph).expect("extract");
        assert_eq!(fragments.len(), 3);
        assert!(fragments.iter().all(|f| f.html.contains(MATCH_MARKER)));
        assert!(!fragments[1].adjacent_to_previous);
        assert!(fragments[2].adjacent_to_previous);
    }
}
