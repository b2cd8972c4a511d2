// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-request state threaded through the result pipeline.

use serde::Serialize;

use crate::config::LimitsConfig;
use crate::excerpt::HighlightOrder;
use crate::ranking::SortMode;

/// How excerpt paragraphs of a hit are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExcerptOrdering {
    /// Nothing requested: reading order, but an exposed document is re-requested by relevance
    #[default]
    Default,
    /// Explicit reading order
    Position,
    /// Explicit best-first order
    Relevance,
}

impl ExcerptOrdering {
    pub fn is_explicit(self) -> bool {
        !matches!(self, ExcerptOrdering::Default)
    }

    pub fn highlight_order(self) -> HighlightOrder {
        match self {
            ExcerptOrdering::Relevance => HighlightOrder::Score,
            ExcerptOrdering::Default | ExcerptOrdering::Position => HighlightOrder::Position,
        }
    }
}

/// Shape of a result page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultType {
    /// Metadata-only search: headings, no excerpts
    Listing,
    /// Content search with exactly one hit
    Single,
    /// Content search with several hits
    Multiple,
}

impl ResultType {
    pub fn classify(is_content_search: bool, total_hits: usize) -> Self {
        match (is_content_search, total_hits) {
            (false, _) => ResultType::Listing,
            (true, 1) => ResultType::Single,
            (true, _) => ResultType::Multiple,
        }
    }
}

/// Immutable request state; stages never mutate it, a re-issue builds a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    pub query: String,
    pub sort: SortMode,
    pub ordering: ExcerptOrdering,
    /// 1-based page number
    pub page: usize,
    pub limits: LimitsConfig,
}

impl RequestContext {
    pub fn new(query: impl Into<String>, limits: LimitsConfig) -> Self {
        Self {
            query: query.into(),
            sort: SortMode::default(),
            ordering: ExcerptOrdering::default(),
            page: 1,
            limits,
        }
    }

    pub fn with_sort(self, sort: SortMode) -> Self {
        Self { sort, ..self }
    }

    pub fn with_ordering(self, ordering: ExcerptOrdering) -> Self {
        Self { ordering, ..self }
    }

    pub fn with_page(self, page: usize) -> Self {
        Self {
            page: page.max(1),
            ..self
        }
    }

    /// Hits per page for the given kind of search.
    pub fn page_size(&self, is_content_search: bool) -> usize {
        if is_content_search {
            self.limits.hits_per_content_page
        } else {
            self.limits.hits_per_listing_page
        }
    }

    /// Offset of the first hit on this page. Listings always show page 1.
    pub fn offset(&self, is_content_search: bool) -> usize {
        if is_content_search {
            (self.page - 1).saturating_mul(self.limits.hits_per_content_page)
        } else {
            0
        }
    }

    /// Highlight paragraphs to request per hit.
    pub fn excerpt_limit(&self, result_type: ResultType) -> usize {
        match result_type {
            ResultType::Single => self.limits.single_result_excerpts,
            ResultType::Multiple | ResultType::Listing => self.limits.multiple_result_excerpts,
        }
    }
}
