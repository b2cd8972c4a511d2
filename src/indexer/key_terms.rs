// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key terms: the most distinctive words of each document
//!
//! Words are weighted by tf-idf over the whole corpus. A session's own number
//! never counts, and words sharing an English stem keep only their
//! best-weighted form.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use tantivy::tokenizer::{
    Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, Stemmer, StopWordFilter, TextAnalyzer,
};

use excerpta::corpus::CorpusDocument;

/// Key terms kept per document
pub const KEY_TERMS_PER_DOCUMENT: usize = 10;

static SESSION_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)session (\d+)").expect("valid session number regex"));

/// Lowercased words without English stop words.
fn word_analyzer() -> TextAnalyzer {
    let stop_words = StopWordFilter::new(Language::English).unwrap_or_else(|| StopWordFilter::remove(Vec::new()));
    TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(40))
        .filter(LowerCaser)
        .filter(stop_words)
        .build()
}

fn stem_analyzer() -> TextAnalyzer {
    TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(LowerCaser)
        .filter(Stemmer::new(Language::English))
        .build()
}

fn is_candidate(word: &str) -> bool {
    word.chars().count() >= 3 && word.chars().any(char::is_alphabetic)
}

fn term_counts(analyzer: &mut TextAnalyzer, text: &str) -> HashMap<String, u32> {
    let mut counts = HashMap::new();
    let mut stream = analyzer.token_stream(text);
    stream.process(&mut |token| {
        if is_candidate(&token.text) {
            *counts.entry(token.text.clone()).or_insert(0) += 1;
        }
    });
    counts
}

/// `906`, `906th` and friends for a session numbered 906.
fn is_session_number(term: &str, number: &str) -> bool {
    term.strip_prefix(number)
        .is_some_and(|suffix| matches!(suffix, "" | "st" | "nd" | "rd" | "th"))
}

fn stem_of(stems: &mut TextAnalyzer, term: &str) -> String {
    let mut stem = None;
    stems.token_stream(term).process(&mut |token| {
        stem.get_or_insert_with(|| token.text.clone());
    });
    stem.unwrap_or_else(|| term.to_string())
}

fn pick(
    counts: &HashMap<String, u32>,
    doc_freq: &HashMap<&str, u32>,
    documents: f64,
    session: &str,
    stems: &mut TextAnalyzer,
) -> Vec<String> {
    let session_number = SESSION_NUMBER_RE
        .captures(session)
        .and_then(|caps| caps.get(1))
        .map(|number| number.as_str());

    let mut weighted: Vec<(f64, &str)> = counts
        .iter()
        .filter(|(term, _)| !session_number.is_some_and(|number| is_session_number(term, number)))
        .map(|(term, &tf)| {
            let df = doc_freq.get(term.as_str()).copied().unwrap_or(1).max(1);
            let idf = (1.0 + documents / f64::from(df)).ln();
            (f64::from(tf) * idf, term.as_str())
        })
        .collect();
    weighted.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));

    let mut seen_stems = HashSet::new();
    let mut terms = Vec::with_capacity(KEY_TERMS_PER_DOCUMENT);
    for (_, term) in weighted {
        if terms.len() == KEY_TERMS_PER_DOCUMENT {
            break;
        }
        if seen_stems.insert(stem_of(stems, term)) {
            terms.push(term.to_string());
        }
    }
    terms
}

/// Fill in `key_terms` for every document of the corpus.
pub fn assign(documents: &mut [CorpusDocument]) {
    let counts: Vec<HashMap<String, u32>> = documents
        .par_iter()
        .map_init(word_analyzer, |analyzer, document| term_counts(analyzer, &document.text))
        .collect();

    let mut doc_freq: HashMap<&str, u32> = HashMap::new();
    for term in counts.iter().flat_map(HashMap::keys) {
        *doc_freq.entry(term.as_str()).or_insert(0) += 1;
    }

    let total = documents.len() as f64;
    documents
        .par_iter_mut()
        .zip(counts.par_iter())
        .for_each_init(stem_analyzer, |stems, (document, counts)| {
            document.key_terms = pick(counts, &doc_freq, total, &document.session, stems);
        });
    tracing::debug!(documents = documents.len(), terms = doc_freq.len(), "key terms assigned");
}
