// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-hit excerpt assembly
//!
//! The first hit of the first page leads with its opening highlighted
//! paragraphs in full; every other highlight is cut down to its matched
//! sentences, joined with an omission marker.

use htmlescape::encode_minimal;
use serde::Serialize;

use super::markup::{Markup, MarkupTree};
use super::sentences::{extract_sentences, SentenceOptions};
use crate::errors::ExcerptError;
use crate::request::{RequestContext, ResultType};

/// One rendered excerpt of a hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "html", rename_all = "kebab-case")]
pub enum ExcerptBlock {
    /// A whole highlighted paragraph
    FullParagraph(String),
    /// Matched sentences of one paragraph, omissions marked
    Sentences(String),
}

impl ExcerptBlock {
    pub fn html(&self) -> &str {
        match self {
            ExcerptBlock::FullParagraph(html) | ExcerptBlock::Sentences(html) => html,
        }
    }
}

/// Everything the renderer needs for one hit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HitExcerpts {
    pub blocks: Vec<ExcerptBlock>,
    /// Plain text of the first full paragraph, used as the page description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Shown when the exposure guard curtailed this hit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    pub is_exposed: bool,
}

impl HitExcerpts {
    /// Render as an HTML excerpt list, full paragraphs split from sentence excerpts by a rule.
    pub fn to_html(&self) -> Vec<String> {
        if self.blocks.is_empty() {
            return Vec::new();
        }

        let mut lines = vec![r#"<ul class="excerpts">"#.to_string()];
        let mut after_full = false;
        for block in &self.blocks {
            match block {
                ExcerptBlock::FullParagraph(html) => {
                    lines.push(format!("<li>{html}</li>"));
                    after_full = true;
                }
                ExcerptBlock::Sentences(html) => {
                    if after_full {
                        lines.push("</ul><hr>".to_string());
                        lines.push(r#"<ul class="excerpts">"#.to_string());
                        after_full = false;
                    }
                    lines.push(format!("<li><p>{html}</p></li>"));
                }
            }
        }
        lines.push("</ul>".to_string());
        if let Some(notice) = &self.notice {
            lines.push(format!(r#"<p class="notice">{}</p>"#, encode_minimal(notice)));
        }
        lines
    }
}

/// Presentation settings for one hit.
#[derive(Debug, Clone, Copy)]
pub struct AssembleOptions<'a> {
    /// Plain omission marker, used when the search has a single hit
    pub omission: &'a str,
    /// Link target for the omission marker when the page has several hits
    pub hit_link: Option<&'a str>,
    pub sentences: SentenceOptions,
}

fn omission_marker(options: &AssembleOptions<'_>, result_type: ResultType) -> String {
    match (result_type, options.hit_link) {
        (ResultType::Multiple, Some(link)) => format!(
            r#"<a href="{}" class="omission">{}</a>"#,
            encode_minimal(link),
            options.omission
        ),
        _ => options.omission.to_string(),
    }
}

/// Assemble the excerpts of the `hit_idx`-th hit on the page.
pub fn assemble_hit<M: Markup>(
    markup: &M,
    highlights: &[String],
    hit_idx: usize,
    ctx: &RequestContext,
    result_type: ResultType,
    options: &AssembleOptions<'_>,
) -> Result<HitExcerpts, ExcerptError> {
    let marker = omission_marker(options, result_type);
    let full_paragraphs = ctx.limits.multiple_result_excerpts;
    let mut excerpts = HitExcerpts::default();

    let paragraphs = highlights.iter().filter(|h| !h.trim().is_empty());
    for (p_idx, paragraph) in paragraphs.enumerate() {
        let is_full = ctx.page == 1 && hit_idx == 0 && p_idx < full_paragraphs;
        if is_full {
            if p_idx == 0 {
                let text = markup.parse(paragraph).text();
                excerpts.description = Some(text.trim().to_string());
            }
            excerpts.blocks.push(ExcerptBlock::FullParagraph(paragraph.clone()));
            continue;
        }

        let sentences = extract_sentences(markup, paragraph, options.sentences)?;
        if sentences.iter().all(|s| s.is_empty()) {
            continue;
        }
        excerpts.blocks.push(ExcerptBlock::Sentences(sentences.join(&marker)));
    }

    tracing::debug!(
        hit = hit_idx,
        blocks = excerpts.blocks.len(),
        "assembled hit excerpts"
    );
    Ok(excerpts)
}
