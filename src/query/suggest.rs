// SPDX-License-Identifier: MIT OR Apache-2.0

//! "Did you mean" suggestions for a query

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::query::open_service;
use excerpta::config::Config;
use excerpta::correction;
use excerpta::output::{print_json, use_colors};

#[derive(Debug, Serialize)]
struct SuggestionOutput<'a> {
    query: &'a str,
    suggestion: Option<String>,
}

pub fn run(query: &str, index_dir: &Path, config: &Config, format: OutputFormat, compact: bool) -> Result<()> {
    let service = open_service(index_dir, config)?;
    let suggestion = correction::suggest(&service, query, correction::variants());
    tracing::debug!(query, ?suggestion, "suggestion computed");

    match format {
        OutputFormat::Json => print_json(&SuggestionOutput { query, suggestion }, compact)?,
        OutputFormat::Text => match suggestion {
            Some(suggestion) if use_colors() => println!("Did you mean: {}", suggestion.green().bold()),
            Some(suggestion) => println!("Did you mean: {}", suggestion),
            None => println!("No suggestion for: {}", query),
        },
    }
    Ok(())
}
