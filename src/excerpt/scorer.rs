// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic fragment scoring
//!
//! A fragment's score is its base relevance plus a positional bonus of
//! `1 / start_offset`, so equally relevant fragments sort earliest-first and
//! repeated searches order fragments identically.

use std::cmp::Ordering;

use super::splitter::Fragment;

/// Order in which selected fragments are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HighlightOrder {
    /// Reading order
    #[default]
    Position,
    /// Best fragment first
    Score,
}

/// Score a fragment from its base relevance and start offset.
pub fn score(base_relevance: f64, start_offset: usize) -> f64 {
    if start_offset > 0 {
        base_relevance + 1.0 / start_offset as f64
    } else {
        base_relevance
    }
}

/// Base relevance of a fragment: every matched occurrence weighs one.
pub fn base_relevance(fragment: &Fragment) -> f64 {
    fragment.spans.len() as f64
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredFragment {
    pub fragment: Fragment,
    pub score: f64,
}

impl ScoredFragment {
    pub fn new(fragment: Fragment) -> Self {
        let score = score(base_relevance(&fragment), fragment.start_offset());
        Self { fragment, score }
    }
}

fn by_score_then_position(a: &ScoredFragment, b: &ScoredFragment) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.fragment.start_offset().cmp(&b.fragment.start_offset()))
}

/// Keep the `top_n` best fragments, returned in the requested order.
pub fn select_top(
    fragments: impl IntoIterator<Item = Fragment>,
    top_n: usize,
    order: HighlightOrder,
) -> Vec<ScoredFragment> {
    let mut scored: Vec<ScoredFragment> = fragments.into_iter().map(ScoredFragment::new).collect();
    scored.sort_by(by_score_then_position);
    scored.truncate(top_n);

    if order == HighlightOrder::Position {
        scored.sort_by_key(|scored| scored.fragment.start_offset());
    }
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::excerpt::splitter::{split_fragments, MatchSpan};

    fn fragment_at(start: usize, matches: usize) -> Fragment {
        Fragment {
            spans: (0..matches)
                .map(|i| MatchSpan::new(start + i * 4, start + i * 4 + 3, "cat"))
                .collect(),
            paragraph_start: start,
            paragraph_end: start + matches * 4,
        }
    }

    #[test]
    fn earlier_offsets_never_score_lower() {
        for base in [0.0, 0.5, 1.0, 7.25] {
            assert!(score(base, 10) >= score(base, 10_000));
            assert!(score(base, 1) > score(base, 2));
        }
    }

    #[test]
    fn zero_offset_gets_no_bonus() {
        assert_eq!(score(2.0, 0), 2.0);
        assert_eq!(score(2.0, 4), 2.25);
    }

    #[test]
    fn bonus_never_beats_a_whole_unit_of_relevance() {
        assert!(score(2.0, 2_000) > score(1.0, 1));
        assert!(score(2.0, 1) > score(1.0, 1));
    }

    #[test]
    fn first_paragraph_wins_on_equal_relevance() {
        let text = "Para one about cats.\n\nPara two about dogs and cats.";
        let spans: Vec<MatchSpan> = text
            .match_indices("cats")
            .map(|(start, _)| MatchSpan::new(start, start + 4, "cats"))
            .collect();
        let fragments: Vec<Fragment> = split_fragments(text, spans).collect();
        assert_eq!(fragments.len(), 2);

        let top = select_top(fragments, 2, HighlightOrder::Score);
        assert_eq!(top[0].fragment.text(text), "Para one about cats.");
        assert!(top[0].score > top[1].score);
    }

    #[test]
    fn more_matches_outrank_position() {
        let top = select_top(
            vec![fragment_at(5, 1), fragment_at(500, 3)],
            1,
            HighlightOrder::Score,
        );
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].fragment.paragraph_start, 500);
    }

    #[test]
    fn position_order_restores_reading_order_after_selection() {
        let fragments = vec![fragment_at(10, 2), fragment_at(100, 3), fragment_at(300, 2)];

        let by_position = select_top(fragments.clone(), 2, HighlightOrder::Position);
        let starts: Vec<usize> = by_position
            .iter()
            .map(|s| s.fragment.paragraph_start)
            .collect();
        assert_eq!(starts, vec![10, 100]);

        let by_score = select_top(fragments, 2, HighlightOrder::Score);
        let starts: Vec<usize> = by_score.iter().map(|s| s.fragment.paragraph_start).collect();
        assert_eq!(starts, vec![100, 10]);
    }

    #[test]
    fn repeated_selection_is_identical() {
        let fragments: Vec<Fragment> = (0..20).map(|i| fragment_at(i * 37 + 1, 1 + i % 3)).collect();
        let first = select_top(fragments.clone(), 7, HighlightOrder::Score);
        let second = select_top(fragments, 7, HighlightOrder::Score);
        assert_eq!(first, second);
    }
}
