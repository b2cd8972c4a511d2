// SPDX-License-Identifier: MIT OR Apache-2.0

//! Date-biased document ranking
//!
//! In the date sort modes a document's composite score is dominated by its
//! effective instant (stored date plus the chapter number in seconds), with
//! the engine's relevance squeezed into the fractional part so it only breaks
//! ties between documents dated to the same second.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// 1800-01-01T00:00:00Z as Unix seconds.
pub const EARLIEST_INSTANT: i64 = -5_364_662_400;
/// 2200-01-01T00:00:00Z as Unix seconds.
pub const LATEST_INSTANT: i64 = 7_258_118_400;
/// Divisor applied to the composite so it stays a small float.
pub const DATE_SCALE: f64 = 1e9;

static CHAPTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)chapter\W*(\d+)").expect("valid chapter regex"));

/// Document ordering requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortMode {
    #[default]
    Relevance,
    AscendingDate,
    DescendingDate,
}

impl SortMode {
    pub fn is_date_mode(self) -> bool {
        !matches!(self, SortMode::Relevance)
    }
}

/// Chapter number named in a heading, or 0.
pub fn chapter_offset(heading: &str) -> i64 {
    CHAPTER_RE
        .captures(heading)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Map an unbounded positive relevance score into `[0, 1)`.
fn date_band_relevance(score: f64) -> f64 {
    if !score.is_finite() || score <= 0.0 {
        return 0.0;
    }
    (1.0 - 1.0 / score).clamp(0.0, 1.0 - f64::EPSILON)
}

/// Composite sort key for a document. Higher sorts first.
pub fn composite_score(
    base_score: f64,
    date_secs: Option<i64>,
    heading: &str,
    mode: SortMode,
) -> f64 {
    if mode == SortMode::Relevance {
        return base_score;
    }

    let relevance = date_band_relevance(base_score);
    let Some(date_secs) = date_secs else {
        return relevance / DATE_SCALE;
    };

    let instant = date_secs
        .saturating_add(chapter_offset(heading))
        .clamp(EARLIEST_INSTANT, LATEST_INSTANT);
    let key = match mode {
        SortMode::DescendingDate => instant - EARLIEST_INSTANT,
        SortMode::AscendingDate => LATEST_INSTANT - instant,
        SortMode::Relevance => 0,
    };

    (key as f64 + 1.0 + relevance) / DATE_SCALE
}
