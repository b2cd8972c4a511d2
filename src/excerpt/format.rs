// SPDX-License-Identifier: MIT OR Apache-2.0

//! Paragraph formatter: plain corpus text to highlighted HTML
//!
//! Matched spans become `<strong class="match termN">` elements and the
//! transcription's `*emphasis*` runs become `<em>` elements. Everything else
//! is HTML-escaped.

use std::collections::BTreeMap;

use htmlescape::encode_minimal;

use super::splitter::{Fragment, MatchSpan};
use crate::errors::ExcerptError;

/// Attribute prefix every match marker carries; the sentence extractor keys on it.
pub const MATCH_MARKER: &str = "class=\"match ";

/// Stable `termN` numbering: terms are numbered in order of first appearance.
#[derive(Debug, Default, Clone)]
pub struct TermClasses {
    classes: BTreeMap<String, usize>,
}

impl TermClasses {
    pub fn from_spans<'a>(spans: impl IntoIterator<Item = &'a MatchSpan>) -> Self {
        let mut classes = BTreeMap::new();
        for span in spans {
            let next = classes.len();
            classes.entry(span.term.clone()).or_insert(next);
        }
        Self { classes }
    }

    pub fn class_of(&self, term: &str) -> usize {
        self.classes.get(term).copied().unwrap_or(0)
    }
}

/// Append plain text, turning odd-length asterisk runs into emphasis toggles.
fn push_with_emphasis(out: &mut String, text: &str, emphasis_open: &mut bool) {
    let mut rest = text;
    while let Some(star) = rest.find('*') {
        out.push_str(&encode_minimal(&rest[..star]));
        let run = rest[star..].chars().take_while(|&c| c == '*').count();
        if run % 2 == 1 {
            out.push_str(if *emphasis_open { "</em>" } else { "<em>" });
            *emphasis_open = !*emphasis_open;
        }
        rest = &rest[star + run..];
    }
    out.push_str(&encode_minimal(rest));
}

fn check_span(document: &str, fragment: &Fragment, span: &MatchSpan) -> Result<(), ExcerptError> {
    let valid = span.start <= span.end
        && span.start >= fragment.paragraph_start
        && span.end <= fragment.paragraph_end
        && document.is_char_boundary(span.start)
        && document.is_char_boundary(span.end);
    if valid {
        Ok(())
    } else {
        Err(ExcerptError::InvalidSpan {
            start: span.start,
            end: span.end,
            len: document.len(),
        })
    }
}

/// Render one fragment's paragraph as `<p>…</p>` with its matches marked.
pub fn format_fragment(
    document: &str,
    fragment: &Fragment,
    classes: &TermClasses,
) -> Result<String, ExcerptError> {
    if document.get(fragment.paragraph_start..fragment.paragraph_end).is_none() {
        return Err(ExcerptError::InvalidSpan {
            start: fragment.paragraph_start,
            end: fragment.paragraph_end,
            len: document.len(),
        });
    }

    let mut out = String::from("<p>");
    let mut emphasis_open = false;
    let mut cursor = fragment.paragraph_start;

    for span in &fragment.spans {
        check_span(document, fragment, span)?;
        if span.start < cursor {
            // overlapping spans: the earlier marker already covers this text
            continue;
        }
        push_with_emphasis(&mut out, &document[cursor..span.start], &mut emphasis_open);
        out.push_str(&format!(
            "<strong class=\"match term{}\">",
            classes.class_of(&span.term)
        ));
        out.push_str(&encode_minimal(&document[span.start..span.end]));
        out.push_str("</strong>");
        cursor = span.end;
    }

    push_with_emphasis(
        &mut out,
        &document[cursor..fragment.paragraph_end],
        &mut emphasis_open,
    );
    if emphasis_open {
        out.push_str("</em>");
    }
    out.push_str("</p>");
    Ok(out)
}
