// SPDX-License-Identifier: MIT OR Apache-2.0

//! Full-text search with excerpt rendering

use anyhow::Result;
use colored::Colorize;
use scraper::{ElementRef, Html, Node};
use std::path::Path;
use std::time::Instant;

use crate::cli::OutputFormat;
use crate::query::open_service;
use excerpta::config::Config;
use excerpta::errors::NoResultsError;
use excerpta::excerpt::{ExcerptBlock, ScraperMarkup};
use excerpta::output::{colorize_match, colorize_meta, colorize_notice, colorize_title, print_json, use_colors};
use excerpta::pipeline::{self, RenderedHit, RenderedPage};
use excerpta::ranking::SortMode;
use excerpta::request::{ExcerptOrdering, RequestContext, ResultType};

/// Search flags after CLI and config merging
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub page: usize,
    pub sort: SortMode,
    pub ordering: ExcerptOrdering,
}

pub fn run(
    query: &str,
    options: &SearchOptions,
    index_dir: &Path,
    config: &Config,
    format: OutputFormat,
    compact: bool,
) -> Result<()> {
    let start = Instant::now();
    let service = open_service(index_dir, config)?;

    let ctx = RequestContext::new(query, config.limits)
        .with_sort(options.sort)
        .with_ordering(options.ordering)
        .with_page(options.page);
    let page = pipeline::run(&service, &ScraperMarkup, &ctx, config)?;
    let elapsed = start.elapsed();

    tracing::debug!(
        total = page.total,
        shown = page.hits.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "search finished"
    );

    match format {
        OutputFormat::Json => print_json(&page, compact)?,
        OutputFormat::Text => {
            print_text(&page, use_colors());
            eprintln!("\n{} documents | {:.2}ms", page.total, elapsed.as_secs_f64() * 1000.0);
        }
    }
    Ok(())
}

fn print_text(page: &RenderedPage, use_color: bool) {
    if page.hits.is_empty() {
        if use_color {
            println!("{} No results found for: {}", "✗".red(), page.query.yellow());
        } else {
            println!("No results found for: {}", page.query);
        }
        match &page.suggestion {
            Some(suggestion) => print_suggestion(suggestion, use_color),
            None => eprintln!("\n{}", NoResultsError { query: page.query.clone() }),
        }
        return;
    }

    let first = page.offset + 1;
    let last = page.offset + page.hits.len();
    if use_color {
        println!(
            "\n{} {} of {} results for: {}\n",
            "✓".green(),
            format!("{}-{}", first, last).cyan(),
            page.total.to_string().cyan(),
            page.query.yellow()
        );
    } else {
        println!("\n{}-{} of {} results for: {}\n", first, last, page.total, page.query);
    }

    for hit in &page.hits {
        print_hit(hit, page.result_type, use_color);
    }

    if let Some(suggestion) = &page.suggestion {
        print_suggestion(suggestion, use_color);
    }
    if page.has_next_page() {
        println!(
            "{}",
            colorize_meta(
                &format!("More results: excerpta search \"{}\" --page {}", page.query, page.page + 1),
                use_color
            )
        );
    }
}

/// Key terms printed under a hit's heading
const KEY_TERMS_SHOWN: usize = 5;

fn print_hit(rendered: &RenderedHit, result_type: ResultType, use_color: bool) {
    let hit = &rendered.hit;
    let mut meta = vec![hit.book_name.clone()];
    if !hit.heading.is_empty() {
        meta.push(hit.heading.clone());
    }
    if let Some(date) = hit.date {
        meta.push(date.format("%B %-d, %Y").to_string());
    }
    println!(
        "{}  {}",
        colorize_title(&hit.title(), use_color),
        colorize_meta(&format!("[{}] {}", hit.id, meta.join(" | ")), use_color)
    );

    if !hit.key_terms.is_empty() {
        let shown: Vec<&str> = hit.key_terms.iter().take(KEY_TERMS_SHOWN).map(String::as_str).collect();
        println!("    {}", colorize_meta(&format!("key terms: {}", shown.join(", ")), use_color));
    }

    if result_type == ResultType::Listing {
        return;
    }

    let mut after_full = false;
    for block in &rendered.excerpts.blocks {
        match block {
            ExcerptBlock::FullParagraph(html) => {
                println!("    {}", terminal_text(html, use_color));
                after_full = true;
            }
            ExcerptBlock::Sentences(html) => {
                if after_full {
                    println!("    {}", colorize_meta("--", use_color));
                    after_full = false;
                }
                println!("    {}", terminal_text(html, use_color));
            }
        }
    }
    if let Some(notice) = &rendered.excerpts.notice {
        println!("    {}", colorize_notice(notice, use_color));
    }
    println!();
}

fn print_suggestion(suggestion: &str, use_color: bool) {
    if use_color {
        println!("Did you mean: {}\n", suggestion.green().bold());
    } else {
        println!("Did you mean: {}\n", suggestion);
    }
}

/// Flatten excerpt HTML to terminal text, marking highlighted terms
pub(crate) fn terminal_text(html: &str, use_color: bool) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::new();
    for node in fragment.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let is_match = node.ancestors().filter_map(ElementRef::wrap).any(|element| {
            element.value().name() == "strong" && element.value().classes().any(|class| class == "match")
        });
        if is_match {
            out.push_str(&colorize_match(text, use_color));
        } else {
            out.push_str(text);
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
