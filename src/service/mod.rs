// SPDX-License-Identifier: MIT OR Apache-2.0

//! Index Service boundary
//!
//! The pipeline never talks to the search engine directly. Everything it needs
//! from an index goes through [`IndexService`], so the excerpt logic can be
//! exercised against the tantivy engine or a test double alike.

pub mod engine;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::correction::CorrectionToken;
use crate::errors::ServiceResult;
use crate::excerpt::{format_fragment, select_top, split_fragments, HighlightOrder, MatchSpan, TermClasses};
use crate::ranking::SortMode;

pub use engine::TantivyService;

static NON_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w’]+").expect("valid non-word regex"));
static LEADING_SESSION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^session ").expect("valid session prefix regex"));

/// Words of a label with punctuation turned into single spaces.
fn clean_label(label: &str) -> String {
    NON_WORD_RE.replace_all(label, " ").trim().to_string()
}

/// One ranked document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit {
    pub id: String,
    pub book_abbr: String,
    pub book_name: String,
    pub heading: String,
    pub short: String,
    pub long: String,
    pub session: String,
    pub date: Option<NaiveDate>,
    /// Most distinctive words of the document, best first
    pub key_terms: Vec<String>,
    /// Engine relevance score
    pub base_score: f64,
    /// Sort key under the requested sort mode
    pub score: f64,
    /// Full document body
    #[serde(skip)]
    pub text: String,
}

impl Hit {
    /// Heading shown for the hit: book abbreviation and short label.
    pub fn title(&self) -> String {
        let label = if self.short.is_empty() {
            &self.heading
        } else {
            &self.short
        };
        format!("{} {}", self.book_abbr, label).trim().to_string()
    }

    /// `query` narrowed to this hit's session, or to its book and heading when it has none.
    pub fn narrowing_query(&self, query: &str) -> String {
        if self.session.is_empty() {
            let heading = clean_label(if self.heading.is_empty() { &self.short } else { &self.heading });
            format!("book:{} heading:\"{}\" {}", self.book_abbr.to_lowercase(), heading, query)
        } else {
            let session = clean_label(&self.session);
            let session = LEADING_SESSION_RE.replace(&session, "");
            format!("session:\"{session}\" {query}")
        }
    }
}

/// One page of ranked hits.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchPage {
    pub hits: Vec<Hit>,
    /// Matches across all pages
    pub total: usize,
    pub offset: usize,
    /// Whether the query targets document content rather than metadata
    pub is_content_search: bool,
}

pub trait IndexService {
    /// Ranked hits for `query`, `limit` of them starting at `offset`.
    fn search(&self, query: &str, sort: SortMode, limit: usize, offset: usize) -> ServiceResult<SearchPage>;

    /// Matched term occurrences of `query` in the hit's body, in text order.
    fn match_spans(&self, query: &str, hit: &Hit) -> ServiceResult<Vec<MatchSpan>>;

    /// The `top_n` best paragraphs of the hit as highlighted HTML.
    fn highlights(
        &self,
        query: &str,
        hit: &Hit,
        top_n: usize,
        order: HighlightOrder,
    ) -> ServiceResult<Vec<String>> {
        let spans = self.match_spans(query, hit)?;
        let classes = TermClasses::from_spans(&spans);
        let fragments = split_fragments(&hit.text, spans);

        select_top(fragments, top_n, order)
            .iter()
            .map(|scored| format_fragment(&hit.text, &scored.fragment, &classes).map_err(Into::into))
            .collect()
    }

    /// Number of paragraphs of the hit's body with at least one match.
    fn matched_paragraphs(&self, query: &str, hit: &Hit) -> ServiceResult<usize> {
        Ok(split_fragments(&hit.text, self.match_spans(query, hit)?).count())
    }

    /// Per-token spelling corrections for `query`. `None` when the corrector failed.
    fn correct_query(&self, query: &str) -> Option<Vec<CorrectionToken>>;

    /// Number of documents containing the (unstemmed, lowercase) term.
    fn document_frequency(&self, term: &str) -> u64;

    /// Whether both strings parse to the same effective query.
    fn same_query(&self, a: &str, b: &str) -> bool;

    /// Documents resembling the hit. Empty when none can be found.
    fn similar(&self, hit: &Hit, limit: usize) -> Vec<Hit>;

    /// Look a document up by its id.
    fn document(&self, id: &str) -> ServiceResult<Option<Hit>>;
}


#[cfg(test)]
mod tests {
    use super::testing::{hit, FakeService};
    use super::*;

    #[test]
    fn default_highlights_render_best_paragraphs() {
        let service = FakeService::default();
        let doc = hit("1", "Para one about cats.\n\nPara two about dogs and cats.\n\nNo match.");

        let by_score = service
            .highlights("cats", &doc, 1, HighlightOrder::Score)
            .expect("highlights");
        assert_eq!(
            by_score,
            vec!["<p>Para one about <strong class=\"match term0\">cats</strong>.</p>".to_string()]
        );

        let all = service
            .highlights("cats", &doc, 5, HighlightOrder::Position)
            .expect("highlights");
        assert_eq!(all.len(), 2);
        assert!(all[1].contains("dogs and"));
        assert_eq!(service.matched_paragraphs("cats", &doc).expect("count"), 2);
    }

    #[test]
    fn hit_title_prefers_the_short_label() {
        let mut doc = hit("7", "text");
        assert_eq!(doc.title(), "TB Short 7");
        doc.short.clear();
        assert_eq!(doc.title(), "TB Heading 7");
    }

    #[test]
    fn narrowing_query_targets_the_session() {
        let mut doc = hit("1", "text");
        doc.session = "Session 906, March 6, 1980".to_string();
        assert_eq!(doc.narrowing_query("cats"), r#"session:"906 March 6 1980" cats"#);

        doc.session = "Deleted session: May 1".to_string();
        assert_eq!(doc.narrowing_query("cats"), r#"session:"Deleted session May 1" cats"#);
    }

    #[test]
    fn narrowing_query_falls_back_to_book_and_heading() {
        let mut doc = hit("1", "text");
        doc.heading = "Chapter 3: The Dream-Body".to_string();
        assert_eq!(
            doc.narrowing_query("dreams"),
            r#"book:tb heading:"Chapter 3 The Dream Body" dreams"#
        );
    }
}
