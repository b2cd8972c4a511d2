// SPDX-License-Identifier: MIT OR Apache-2.0

//! "Did you mean" normalization
//!
//! The engine's corrector proposes replacements per query token. Before a
//! suggestion is shown, a token with a British/American spelling variant that
//! actually occurs in the corpus is replaced by that variant, and the tokens
//! are spliced back into the user's query text.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::service::IndexService;

/// One corrected token of a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrectionToken {
    /// Query text the correction replaces
    pub original: String,
    /// Text to put in its place
    pub replacement: String,
    /// Byte offsets of `original` in the query
    pub start: usize,
    pub end: usize,
}

impl CorrectionToken {
    pub fn new(original: impl Into<String>, replacement: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            original: original.into(),
            replacement: replacement.into(),
            start,
            end,
        }
    }
}

const BUILTIN_VARIANTS: &[(&str, &str)] = &[
    ("analyse", "analyze"),
    ("behaviour", "behavior"),
    ("catalogue", "catalog"),
    ("centre", "center"),
    ("civilisation", "civilization"),
    ("colour", "color"),
    ("defence", "defense"),
    ("endeavour", "endeavor"),
    ("favour", "favor"),
    ("fulfil", "fulfill"),
    ("grey", "gray"),
    ("harbour", "harbor"),
    ("honour", "honor"),
    ("humour", "humor"),
    ("jewellery", "jewelry"),
    ("judgement", "judgment"),
    ("labour", "labor"),
    ("licence", "license"),
    ("metre", "meter"),
    ("neighbour", "neighbor"),
    ("offence", "offense"),
    ("organisation", "organization"),
    ("organise", "organize"),
    ("programme", "program"),
    ("realise", "realize"),
    ("recognise", "recognize"),
    ("rumour", "rumor"),
    ("sceptic", "skeptic"),
    ("theatre", "theater"),
    ("travelled", "traveled"),
    ("vapour", "vapor"),
    ("vigour", "vigor"),
];

/// Case-insensitive, two-way spelling variant lookup.
#[derive(Debug, Clone, Default)]
pub struct VariantTable {
    variants: HashMap<String, String>,
}

impl VariantTable {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut table = Self::default();
        for (uk, us) in pairs {
            table.insert(uk, us);
        }
        table
    }

    /// The built-in British/American pairs.
    pub fn builtin() -> Self {
        Self::from_pairs(BUILTIN_VARIANTS.iter().copied())
    }

    /// Built-in pairs extended with a tab-separated file, one pair per line.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut table = Self::builtin();
        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.split_once('\t') {
                Some((uk, us)) if !uk.trim().is_empty() && !us.trim().is_empty() => {
                    table.insert(uk.trim(), us.trim());
                }
                _ => tracing::warn!(
                    path = %path.display(),
                    line = line_no + 1,
                    "skipping malformed variant line"
                ),
            }
        }
        Ok(table)
    }

    fn insert(&mut self, a: &str, b: &str) {
        let (a, b) = (a.to_lowercase(), b.to_lowercase());
        self.variants.insert(a.clone(), b.clone());
        self.variants.insert(b, a);
    }

    pub fn len(&self) -> usize {
        self.variants.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// The registered variant of `word`, in `word`'s capitalisation.
    pub fn variant_of(&self, word: &str) -> Option<String> {
        let variant = self.variants.get(&word.to_lowercase())?;
        Some(match_case(word, variant))
    }
}

fn match_case(model: &str, word: &str) -> String {
    let has_letters = model.chars().any(char::is_alphabetic);
    if has_letters && model.chars().filter(|c| c.is_alphabetic()).all(char::is_uppercase) && model.chars().count() > 1 {
        return word.to_uppercase();
    }
    if model.chars().next().is_some_and(char::is_uppercase) {
        let mut chars = word.chars();
        return match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
    }
    word.to_string()
}

static VARIANTS: OnceCell<VariantTable> = OnceCell::new();

/// Install the process-wide variant table. Later calls keep the first table.
pub fn init_variants(extra: Option<&Path>) -> &'static VariantTable {
    VARIANTS.get_or_init(|| match extra {
        Some(path) => VariantTable::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to read variants file {}: {}", path.display(), e);
            VariantTable::builtin()
        }),
        None => VariantTable::builtin(),
    })
}

/// The process-wide variant table, built-in pairs unless initialized otherwise.
pub fn variants() -> &'static VariantTable {
    init_variants(None)
}

/// Replace each token's range of `query` with its replacement.
///
/// Tokens are applied left to right; `None` when they overlap or do not fall
/// on character boundaries of the query.
pub fn splice(query: &str, tokens: &[CorrectionToken]) -> Option<String> {
    let mut ordered: Vec<&CorrectionToken> = tokens.iter().collect();
    ordered.sort_by_key(|token| token.start);

    let mut out = String::with_capacity(query.len());
    let mut cursor = 0;
    for token in ordered {
        if token.start < cursor || token.start > token.end {
            return None;
        }
        out.push_str(query.get(cursor..token.start)?);
        query.get(token.start..token.end)?;
        out.push_str(&token.replacement);
        cursor = token.end;
    }
    out.push_str(query.get(cursor..)?);
    Some(out)
}

/// Apply spelling variants to corrector output and splice it into the query.
///
/// `None` when a token's offsets do not point at its recorded original text.
pub fn normalize(
    query: &str,
    tokens: &[CorrectionToken],
    table: &VariantTable,
    doc_freq: impl Fn(&str) -> u64,
) -> Option<String> {
    let mut normalized = Vec::with_capacity(tokens.len());
    for token in tokens {
        if query.get(token.start..token.end) != Some(token.original.as_str()) {
            tracing::debug!(
                original = %token.original,
                start = token.start,
                end = token.end,
                "correction offsets do not match the query"
            );
            return None;
        }

        let replacement = table
            .variant_of(&token.original)
            .filter(|variant| doc_freq(&variant.to_lowercase()) > 0)
            .unwrap_or_else(|| token.replacement.clone());
        normalized.push(CorrectionToken {
            replacement,
            ..token.clone()
        });
    }
    splice(query, &normalized)
}

/// A "did you mean" suggestion for `query`, if one would change the search.
pub fn suggest<S: IndexService + ?Sized>(service: &S, query: &str, table: &VariantTable) -> Option<String> {
    let tokens = service.correct_query(query)?;
    if tokens.is_empty() {
        return None;
    }
    let corrected = normalize(query, &tokens, table, |term| service.document_frequency(term))?;
    if corrected == query || service.same_query(query, &corrected) {
        return None;
    }
    Some(corrected)
}
