// SPDX-License-Identifier: MIT OR Apache-2.0

//! tantivy-backed Index Service
//!
//! Schema:
//! - `text`: document body, English-stemmed, stored; the default query field
//! - `exact`: document body, lowercased but unstemmed
//! - `heading`, `session`: tokenized and stored
//! - `book`: lowercase book abbreviation, untokenized
//! - `date_secs`: document date as Unix seconds, absent when undated
//! - `key_terms`: stored only, one value per term

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{MoreLikeThisQuery, Query, QueryParser, TermQuery};
use tantivy::schema::{
    Field, FieldType, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, Value, FAST,
    INDEXED, STORED, STRING, TEXT,
};
use tantivy::{DocAddress, Index, IndexReader, IndexWriter, ReloadPolicy, Searcher, TantivyDocument, Term};

use super::{Hit, IndexService, SearchPage};
use crate::corpus::CorpusDocument;
use crate::correction::CorrectionToken;
use crate::errors::{ServiceError, ServiceResult};
use crate::excerpt::MatchSpan;
use crate::ranking::{composite_score, SortMode};

const WRITER_HEAP_BYTES: usize = 50_000_000;

/// File tantivy writes at the root of every index directory
pub const INDEX_META_FILE: &str = "meta.json";

static QUERY_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]+").expect("valid query word regex"));

const QUERY_OPERATORS: &[&str] = &["AND", "OR", "NOT", "IN", "TO"];

#[derive(Debug, Clone, Copy)]
struct Fields {
    id: Field,
    book: Field,
    book_abbr: Field,
    book_name: Field,
    heading: Field,
    short: Field,
    long: Field,
    session: Field,
    date_secs: Field,
    text: Field,
    exact: Field,
    key_terms: Field,
}

impl Fields {
    fn from_schema(schema: &Schema) -> ServiceResult<Self> {
        let get = |name: &'static str| schema.get_field(name).map_err(|_| ServiceError::MissingField(name));
        Ok(Self {
            id: get("id")?,
            book: get("book")?,
            book_abbr: get("book_abbr")?,
            book_name: get("book_name")?,
            heading: get("heading")?,
            short: get("short")?,
            long: get("long")?,
            session: get("session")?,
            date_secs: get("date_secs")?,
            text: get("text")?,
            exact: get("exact")?,
            key_terms: get("key_terms")?,
        })
    }

    fn content(&self) -> [Field; 2] {
        [self.text, self.exact]
    }
}

/// Schema of a corpus index.
pub fn build_schema() -> Schema {
    let mut builder = Schema::builder();

    let stemmed = TextOptions::default()
        .set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer("en_stem")
                .set_index_option(IndexRecordOption::WithFreqsAndPositions),
        )
        .set_stored();
    let unstemmed = TextOptions::default().set_indexing_options(
        TextFieldIndexing::default()
            .set_tokenizer("default")
            .set_index_option(IndexRecordOption::WithFreqsAndPositions),
    );

    builder.add_text_field("id", STRING | STORED);
    builder.add_text_field("book", STRING | STORED);
    builder.add_text_field("book_abbr", STORED);
    builder.add_text_field("book_name", STORED);
    builder.add_text_field("heading", TEXT | STORED);
    builder.add_text_field("short", STORED);
    builder.add_text_field("long", STORED);
    builder.add_text_field("session", TEXT | STORED);
    builder.add_i64_field("date_secs", INDEXED | STORED | FAST);
    builder.add_text_field("text", stemmed);
    builder.add_text_field("exact", unstemmed);
    builder.add_text_field("key_terms", STORED);
    builder.build()
}

/// Corpus index on disk.
pub struct TantivyService {
    index: Index,
    reader: IndexReader,
    fields: Fields,
}

impl TantivyService {
    /// Create an empty index in `dir`, replacing an index already there.
    ///
    /// A directory holding anything but a search index is left alone.
    pub fn create(dir: &Path) -> ServiceResult<Self> {
        if dir.exists() {
            let holds_index = dir.join(INDEX_META_FILE).exists();
            if !holds_index && std::fs::read_dir(dir)?.next().is_some() {
                return Err(ServiceError::NotAnIndex(dir.to_path_buf()));
            }
            std::fs::remove_dir_all(dir)?;
        }
        std::fs::create_dir_all(dir)?;
        let index = Index::create_in_dir(dir, build_schema())?;
        Self::from_index(index)
    }

    /// Open an existing index.
    pub fn open(dir: &Path) -> ServiceResult<Self> {
        let index = Index::open_in_dir(dir)?;
        Self::from_index(index)
    }

    /// In-memory index, for tests.
    pub fn in_memory() -> ServiceResult<Self> {
        Self::from_index(Index::create_in_ram(build_schema()))
    }

    fn from_index(index: Index) -> ServiceResult<Self> {
        let fields = Fields::from_schema(&index.schema())?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        Ok(Self { index, reader, fields })
    }

    /// Add documents and commit them.
    pub fn add_documents(&self, documents: &[CorpusDocument]) -> ServiceResult<()> {
        let mut writer: IndexWriter = self.index.writer(WRITER_HEAP_BYTES)?;
        for document in documents {
            writer.add_document(self.to_tantivy(document))?;
        }
        writer.commit()?;
        self.reader.reload()?;
        tracing::info!(documents = documents.len(), "committed corpus documents");
        Ok(())
    }

    fn to_tantivy(&self, document: &CorpusDocument) -> TantivyDocument {
        let f = &self.fields;
        let mut doc = TantivyDocument::default();
        doc.add_text(f.id, &document.id);
        doc.add_text(f.book, document.book_abbr.to_lowercase());
        doc.add_text(f.book_abbr, &document.book_abbr);
        doc.add_text(f.book_name, &document.book_name);
        doc.add_text(f.heading, &document.heading);
        doc.add_text(f.short, &document.short);
        doc.add_text(f.long, &document.long);
        doc.add_text(f.session, &document.session);
        if let Some(secs) = document.date_secs() {
            doc.add_i64(f.date_secs, secs);
        }
        doc.add_text(f.text, &document.text);
        doc.add_text(f.exact, &document.text);
        for term in &document.key_terms {
            doc.add_text(f.key_terms, term);
        }
        doc
    }

    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    fn query_parser(&self) -> QueryParser {
        let mut parser = QueryParser::for_index(&self.index, vec![self.fields.text]);
        parser.set_conjunction_by_default();
        parser
    }

    fn parse(&self, query: &str) -> ServiceResult<Box<dyn Query>> {
        Ok(self.query_parser().parse_query(query)?)
    }

    fn to_hit(&self, searcher: &Searcher, address: DocAddress, base_score: f64, sort: SortMode) -> ServiceResult<Hit> {
        let doc: TantivyDocument = searcher.doc(address)?;
        let f = &self.fields;
        let text_of = |field: Field| {
            doc.get_first(field)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        let date_secs = doc.get_first(f.date_secs).and_then(|v| v.as_i64());
        let heading = text_of(f.heading);
        let key_terms = doc
            .get_all(f.key_terms)
            .filter_map(|v| v.as_str())
            .map(str::to_string)
            .collect();

        Ok(Hit {
            id: text_of(f.id),
            book_abbr: text_of(f.book_abbr),
            book_name: text_of(f.book_name),
            short: text_of(f.short),
            long: text_of(f.long),
            session: text_of(f.session),
            date: date_secs.and_then(secs_to_date),
            base_score,
            score: composite_score(base_score, date_secs, &heading, sort),
            heading,
            key_terms,
            text: text_of(f.text),
        })
    }

    fn address_of(&self, searcher: &Searcher, id: &str) -> ServiceResult<Option<DocAddress>> {
        let term = Term::from_field_text(self.fields.id, id);
        let query = TermQuery::new(term, IndexRecordOption::Basic);
        let top = searcher.search(&query, &TopDocs::with_limit(1))?;
        Ok(top.first().map(|(_, address)| *address))
    }

    /// Tokenize `text` with the analyzer `field` is indexed with.
    fn tokens_for_field(&self, field: Field, text: &str) -> Vec<(usize, usize, String)> {
        let schema = self.index.schema();
        let tokenizer_name = match schema.get_field_entry(field).field_type() {
            FieldType::Str(options) => options
                .get_indexing_options()
                .map(|indexing| indexing.tokenizer().to_string()),
            _ => None,
        };
        let Some(mut analyzer) = tokenizer_name.and_then(|name| self.index.tokenizers().get(&name)) else {
            return Vec::new();
        };

        let mut tokens = Vec::new();
        let mut stream = analyzer.token_stream(text);
        stream.process(&mut |token| tokens.push((token.offset_from, token.offset_to, token.text.clone())));
        tokens
    }

    fn doc_freq(&self, searcher: &Searcher, term: &str) -> u64 {
        let term = Term::from_field_text(self.fields.exact, term);
        searcher.doc_freq(&term).unwrap_or_else(|e| {
            tracing::warn!("document frequency lookup failed: {}", e);
            0
        })
    }

    /// Most frequent indexed word one edit away from `word`.
    fn best_candidate(&self, searcher: &Searcher, word: &str) -> Option<String> {
        let mut best: Option<(u64, String)> = None;
        for candidate in edits1(word) {
            let freq = self.doc_freq(searcher, &candidate);
            if freq == 0 {
                continue;
            }
            let better = match &best {
                None => true,
                Some((best_freq, best_word)) => freq > *best_freq || (freq == *best_freq && candidate < *best_word),
            };
            if better {
                best = Some((freq, candidate));
            }
        }
        best.map(|(_, word)| word)
    }
}

fn secs_to_date(secs: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(secs, 0).map(|dt| dt.date_naive())
}

/// Every string one deletion, transposition, replacement or insertion away.
fn edits1(word: &str) -> Vec<String> {
    const LETTERS: &str = "abcdefghijklmnopqrstuvwxyz";
    let chars: Vec<char> = word.chars().collect();
    let n = chars.len();
    let mut out = Vec::with_capacity(54 * n + 25);

    for i in 0..n {
        let mut deleted = chars.clone();
        deleted.remove(i);
        out.push(deleted.into_iter().collect());
    }
    for i in 0..n.saturating_sub(1) {
        let mut swapped = chars.clone();
        swapped.swap(i, i + 1);
        out.push(swapped.into_iter().collect());
    }
    for i in 0..n {
        for c in LETTERS.chars() {
            if chars[i] != c {
                let mut replaced = chars.clone();
                replaced[i] = c;
                out.push(replaced.into_iter().collect());
            }
        }
    }
    for i in 0..=n {
        for c in LETTERS.chars() {
            let mut inserted = chars.clone();
            inserted.insert(i, c);
            out.push(inserted.into_iter().collect());
        }
    }

    let mut seen = HashSet::new();
    out.retain(|candidate: &String| candidate != word && seen.insert(candidate.clone()));
    out
}

fn match_case(model: &str, word: &str) -> String {
    if model.chars().next().is_some_and(char::is_uppercase) {
        let mut chars = word.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    } else {
        word.to_string()
    }
}

impl IndexService for TantivyService {
    fn search(&self, query: &str, sort: SortMode, limit: usize, offset: usize) -> ServiceResult<SearchPage> {
        let parsed = self.parse(query)?;
        let content_fields = self.fields.content();
        let mut is_content_search = false;
        parsed.query_terms(&mut |term, _| {
            if content_fields.contains(&term.field()) {
                is_content_search = true;
            }
        });

        let searcher = self.reader.searcher();
        let total = searcher.search(&parsed, &Count)?;

        let hits = if sort == SortMode::Relevance {
            let top = searcher.search(&parsed, &TopDocs::with_limit(limit.max(1)).and_offset(offset))?;
            top.into_iter()
                .take(limit)
                .map(|(score, address)| self.to_hit(&searcher, address, f64::from(score), sort))
                .collect::<ServiceResult<Vec<_>>>()?
        } else {
            // the date composite needs every match before a page can be cut
            let top = searcher.search(&parsed, &TopDocs::with_limit(total.max(1)))?;
            let mut ranked = top
                .into_iter()
                .map(|(score, address)| Ok((address, self.to_hit(&searcher, address, f64::from(score), sort)?)))
                .collect::<ServiceResult<Vec<_>>>()?;
            ranked.sort_by(|(addr_a, a), (addr_b, b)| b.score.total_cmp(&a.score).then_with(|| addr_a.cmp(addr_b)));
            ranked.into_iter().skip(offset).take(limit).map(|(_, hit)| hit).collect()
        };

        tracing::debug!(
            query,
            total,
            returned = hits.len(),
            is_content_search,
            "search finished"
        );
        Ok(SearchPage {
            hits,
            total,
            offset,
            is_content_search,
        })
    }

    fn match_spans(&self, query: &str, hit: &Hit) -> ServiceResult<Vec<MatchSpan>> {
        let parsed = self.parse(query)?;
        let content_fields = self.fields.content();
        let mut terms: HashSet<Term> = HashSet::new();
        parsed.query_terms(&mut |term, _| {
            if content_fields.contains(&term.field()) {
                terms.insert(term.clone());
            }
        });

        let mut spans = Vec::new();
        for field in content_fields {
            for (start, end, token) in self.tokens_for_field(field, &hit.text) {
                if terms.contains(&Term::from_field_text(field, &token)) {
                    spans.push(MatchSpan::new(start, end, token));
                }
            }
        }
        spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
        spans.dedup_by_key(|span| span.start);
        Ok(spans)
    }

    fn correct_query(&self, query: &str) -> Option<Vec<CorrectionToken>> {
        let searcher = self.reader.searcher();
        let mut tokens = Vec::new();

        for word in QUERY_WORD_RE.find_iter(query) {
            let (start, end) = (word.start(), word.end());
            let is_field_name = query[end..].starts_with(':');
            let is_field_value = query[..start].ends_with(':');
            if is_field_name || is_field_value || QUERY_OPERATORS.contains(&word.as_str()) {
                continue;
            }

            let lower = word.as_str().to_lowercase();
            if self.doc_freq(&searcher, &lower) > 0 {
                continue;
            }
            if let Some(candidate) = self.best_candidate(&searcher, &lower) {
                tokens.push(CorrectionToken::new(
                    word.as_str(),
                    match_case(word.as_str(), &candidate),
                    start,
                    end,
                ));
            }
        }

        tracing::debug!(query, corrections = tokens.len(), "spelling corrections");
        Some(tokens)
    }

    fn document_frequency(&self, term: &str) -> u64 {
        self.doc_freq(&self.reader.searcher(), term)
    }

    fn same_query(&self, a: &str, b: &str) -> bool {
        match (self.parse(a), self.parse(b)) {
            (Ok(a), Ok(b)) => format!("{a:?}") == format!("{b:?}"),
            _ => false,
        }
    }

    fn similar(&self, hit: &Hit, limit: usize) -> Vec<Hit> {
        let searcher = self.reader.searcher();
        let address = match self.address_of(&searcher, &hit.id) {
            Ok(Some(address)) => address,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("similar: document lookup failed: {}", e);
                return Vec::new();
            }
        };

        let query = MoreLikeThisQuery::builder()
            .with_min_doc_frequency(1)
            .with_min_term_frequency(1)
            .with_min_word_length(3)
            .with_document(address);
        let top = match searcher.search(&query, &TopDocs::with_limit(limit + 1)) {
            Ok(top) => top,
            Err(e) => {
                tracing::warn!("similar: search failed: {}", e);
                return Vec::new();
            }
        };

        top.into_iter()
            .filter(|(_, candidate)| *candidate != address)
            .take(limit)
            .filter_map(|(score, candidate)| {
                self.to_hit(&searcher, candidate, f64::from(score), SortMode::Relevance)
                    .map_err(|e| tracing::debug!("similar: skipping unreadable document: {}", e))
                    .ok()
            })
            .collect()
    }

    fn document(&self, id: &str) -> ServiceResult<Option<Hit>> {
        let searcher = self.reader.searcher();
        self.address_of(&searcher, id)?
            .map(|address| self.to_hit(&searcher, address, 0.0, SortMode::Relevance))
            .transpose()
    }
}
