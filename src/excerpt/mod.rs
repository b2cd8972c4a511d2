// SPDX-License-Identifier: MIT OR Apache-2.0

//! Excerpt composition: matched spans in, bounded sentence-accurate HTML out

pub mod assemble;
pub mod exposure;
pub mod format;
pub mod markup;
pub mod scorer;
pub mod sentences;
pub mod splitter;

pub use assemble::{assemble_hit, AssembleOptions, ExcerptBlock, HitExcerpts};
pub use exposure::{assess, decide, Composition, ExposureVerdict};
pub use format::{format_fragment, TermClasses, MATCH_MARKER};
pub use markup::{Markup, MarkupTree, ScraperMarkup};
pub use scorer::{select_top, HighlightOrder, ScoredFragment};
pub use sentences::{extract_sentences, SentenceFragment, SentenceOptions};
pub use splitter::{split_fragments, Fragment, MatchSpan};
