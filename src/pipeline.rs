// SPDX-License-Identifier: MIT OR Apache-2.0

//! Result pipeline: one request from query to assembled page
//!
//! The exposure guard can refuse a page rendered under the implicit excerpt
//! ordering; [`run_page`] then hands back a re-issue context instead of a page
//! and [`run`] follows it once.

use htmlescape::encode_minimal;
use serde::Serialize;

use crate::config::Config;
use crate::correction;
use crate::errors::ServiceResult;
use crate::excerpt::exposure::truncation_notice;
use crate::excerpt::{assemble_hit, assess, decide, AssembleOptions, Composition, ExcerptBlock, HitExcerpts, Markup, SentenceOptions};
use crate::ranking::SortMode;
use crate::request::{ExcerptOrdering, RequestContext, ResultType};
use crate::service::{Hit, IndexService};

/// A hit with its excerpts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedHit {
    #[serde(flatten)]
    pub hit: Hit,
    /// The query narrowed to this hit's session or heading
    pub link: String,
    pub excerpts: HitExcerpts,
    /// Excerpts as an HTML list
    pub html: Vec<String>,
}

impl RenderedHit {
    fn new(hit: Hit, query: &str, excerpts: HitExcerpts) -> Self {
        Self {
            link: hit.narrowing_query(query),
            html: excerpts.to_html(),
            hit,
            excerpts,
        }
    }
}

/// A fully assembled result page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedPage {
    pub query: String,
    pub result_type: ResultType,
    pub sort: SortMode,
    pub ordering: ExcerptOrdering,
    pub page: usize,
    pub offset: usize,
    pub total: usize,
    pub hits: Vec<RenderedHit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl RenderedPage {
    pub fn has_next_page(&self) -> bool {
        self.total > self.offset + self.hits.len()
    }
}

/// Outcome of one pass over a request.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Rendered(RenderedPage),
    /// The exposure guard asked for the request to be run again as given
    Reissue(RequestContext),
}

fn first_paragraph(text: &str) -> Option<&str> {
    text.split("\n\n").map(str::trim).find(|p| !p.is_empty())
}

fn fallback_excerpts(hit: &Hit) -> HitExcerpts {
    HitExcerpts {
        blocks: first_paragraph(&hit.text)
            .map(|p| vec![ExcerptBlock::FullParagraph(format!("<p>{}</p>", encode_minimal(p)))])
            .unwrap_or_default(),
        ..HitExcerpts::default()
    }
}

/// Run one pass of the request.
pub fn run_page<S, M>(service: &S, markup: &M, ctx: &RequestContext, config: &Config) -> ServiceResult<PageOutcome>
where
    S: IndexService + ?Sized,
    M: Markup,
{
    let is_content_search = service.search(&ctx.query, ctx.sort, 1, 0)?.is_content_search;
    let page_size = ctx.page_size(is_content_search);
    let offset = ctx.offset(is_content_search);
    let results = service.search(&ctx.query, ctx.sort, page_size, offset)?;
    let result_type = ResultType::classify(is_content_search, results.total);

    tracing::debug!(
        query = %ctx.query,
        ?result_type,
        total = results.total,
        page = ctx.page,
        "classified request"
    );

    let excerpt_limit = ctx.excerpt_limit(result_type);
    let order = ctx.ordering.highlight_order();
    let sentences = SentenceOptions {
        elision_placeholders: config.excerpts.elision_placeholders,
    };

    let mut hits = Vec::with_capacity(results.hits.len());
    for (hit_idx, hit) in results.hits.into_iter().enumerate() {
        if result_type == ResultType::Listing {
            hits.push(RenderedHit::new(hit, &ctx.query, HitExcerpts::default()));
            continue;
        }

        let mut highlights = service.highlights(&ctx.query, &hit, excerpt_limit, order)?;
        if highlights.is_empty() {
            let excerpts = fallback_excerpts(&hit);
            hits.push(RenderedHit::new(hit, &ctx.query, excerpts));
            continue;
        }

        let verdict = assess(&hit.text, &highlights, &config.exposure, ctx.limits.single_result_excerpts);
        let mut notice = None;
        match decide(verdict, ctx.ordering, &ctx.limits) {
            Composition::Rendered => {}
            Composition::RequiresReorder(verdict) => {
                tracing::warn!(
                    id = %hit.id,
                    coverage = verdict.coverage_ratio,
                    "exposed document, re-issuing with relevance ordering"
                );
                return Ok(PageOutcome::Reissue(
                    ctx.clone().with_ordering(ExcerptOrdering::Relevance),
                ));
            }
            Composition::RequiresTruncation { limit, verdict } => {
                // never more than the page shape allows
                let limit = limit.min(excerpt_limit);
                tracing::warn!(
                    id = %hit.id,
                    coverage = verdict.coverage_ratio,
                    limit,
                    "exposed document, truncating excerpts"
                );
                highlights = service.highlights(&ctx.query, &hit, limit, order)?;
                let shown = highlights.iter().filter(|h| !h.trim().is_empty()).count();
                let matched = service.matched_paragraphs(&ctx.query, &hit)?;
                notice = Some(truncation_notice(shown, matched));
            }
        }

        let link = format!("?q={}", hit.narrowing_query(&ctx.query));
        let options = AssembleOptions {
            omission: &config.excerpts.omission,
            hit_link: Some(&link),
            sentences,
        };
        let mut excerpts = assemble_hit(markup, &highlights, hit_idx, ctx, result_type, &options)?;
        excerpts.is_exposed = verdict.is_exposed;
        excerpts.notice = notice;
        hits.push(RenderedHit::new(hit, &ctx.query, excerpts));
    }

    let description = hits.first().and_then(|h| h.excerpts.description.clone());
    let suggestion = correction::suggest(service, &ctx.query, correction::variants());

    Ok(PageOutcome::Rendered(RenderedPage {
        query: ctx.query.clone(),
        result_type,
        sort: ctx.sort,
        ordering: ctx.ordering,
        page: ctx.page,
        offset,
        total: results.total,
        hits,
        description,
        suggestion,
    }))
}

/// Run the request, following a single exposure re-issue.
pub fn run<S, M>(service: &S, markup: &M, ctx: &RequestContext, config: &Config) -> ServiceResult<RenderedPage>
where
    S: IndexService + ?Sized,
    M: Markup,
{
    let mut ctx = ctx.clone();
    loop {
        match run_page(service, markup, &ctx, config)? {
            PageOutcome::Rendered(page) => return Ok(page),
            PageOutcome::Reissue(next) => {
                // an explicit ordering never asks for a reorder, so this ends
                debug_assert!(next.ordering.is_explicit());
                ctx = next;
            }
        }
    }
}
