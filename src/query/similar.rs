// SPDX-License-Identifier: MIT OR Apache-2.0

//! Documents resembling a given document

use anyhow::{bail, Result};
use serde::Serialize;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::query::open_service;
use excerpta::config::Config;
use excerpta::output::{colorize_meta, colorize_title, print_json, use_colors};
use excerpta::service::{Hit, IndexService};

#[derive(Debug, Serialize)]
struct SimilarOutput<'a> {
    id: &'a str,
    results: Vec<Hit>,
}

pub fn run(id: &str, limit: usize, index_dir: &Path, config: &Config, format: OutputFormat, compact: bool) -> Result<()> {
    let service = open_service(index_dir, config)?;
    let Some(hit) = service.document(id)? else {
        bail!("No document with id '{}'", id);
    };
    let results = service.similar(&hit, limit);

    match format {
        OutputFormat::Json => print_json(&SimilarOutput { id, results }, compact)?,
        OutputFormat::Text => {
            let use_color = use_colors();
            if results.is_empty() {
                println!("No documents resemble {}", id);
            }
            for result in &results {
                println!(
                    "{}  {}",
                    colorize_title(&result.title(), use_color),
                    colorize_meta(&format!("[{}] {:.3}", result.id, result.base_score), use_color)
                );
            }
        }
    }
    Ok(())
}
