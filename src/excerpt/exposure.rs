// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exposure guard
//!
//! A long document whose highlights cover most of its paragraphs would be
//! reproduced nearly verbatim. The guard measures coverage and tells the
//! caller how to curtail the page; it never renders anything itself.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::config::{ExposureConfig, LimitsConfig};
use crate::request::ExcerptOrdering;

static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{2,}").expect("valid paragraph break regex"));

/// Coverage measurement for one document under one ordering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExposureVerdict {
    pub is_exposed: bool,
    pub highlighted_paragraphs: usize,
    pub total_paragraphs: usize,
    pub coverage_ratio: f64,
}

/// Non-blank paragraphs of a document body.
pub fn count_paragraphs(text: &str) -> usize {
    PARAGRAPH_BREAK
        .split(text)
        .filter(|paragraph| !paragraph.trim().is_empty())
        .count()
}

/// Measure how much of `full_text` the highlights disclose.
pub fn assess(
    full_text: &str,
    highlights: &[String],
    config: &ExposureConfig,
    single_hit_limit: usize,
) -> ExposureVerdict {
    let highlighted_paragraphs = highlights.iter().filter(|h| !h.trim().is_empty()).count();
    let total_paragraphs = count_paragraphs(full_text);
    let coverage_ratio = if total_paragraphs == 0 {
        0.0
    } else {
        highlighted_paragraphs as f64 / total_paragraphs as f64
    };

    let is_long = full_text.chars().count() > config.min_chars;
    let is_exposed = is_long
        && (coverage_ratio > config.coverage_ratio || highlighted_paragraphs == single_hit_limit);

    ExposureVerdict {
        is_exposed,
        highlighted_paragraphs,
        total_paragraphs,
        coverage_ratio,
    }
}

/// What the caller must do with a hit after the guard has looked at it.
#[derive(Debug, Clone, PartialEq)]
pub enum Composition {
    /// Render the highlights as fetched
    Rendered,
    /// Re-issue the whole request with explicit relevance ordering
    RequiresReorder(ExposureVerdict),
    /// Render at most `limit` highlights and tell the reader why
    RequiresTruncation { limit: usize, verdict: ExposureVerdict },
}

/// Turn a verdict into a composition under the request's ordering.
pub fn decide(verdict: ExposureVerdict, ordering: ExcerptOrdering, limits: &LimitsConfig) -> Composition {
    if !verdict.is_exposed {
        Composition::Rendered
    } else if ordering.is_explicit() {
        Composition::RequiresTruncation {
            limit: limits.single_result_exposed_excerpts,
            verdict,
        }
    } else {
        Composition::RequiresReorder(verdict)
    }
}

/// Reader-facing explanation attached to a curtailed hit: `shown` of the
/// document's `matched` paragraphs are on the page.
pub fn truncation_notice(shown: usize, matched: usize) -> String {
    if shown >= matched {
        format!(
            "All {matched} matching paragraphs are shown best first, as this search matches much of the document."
        )
    } else {
        format!(
            "Only the {shown} best of {matched} matching paragraphs are shown, as this search matches much of the document."
        )
    }
}
