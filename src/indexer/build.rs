// SPDX-License-Identifier: MIT OR Apache-2.0

//! Index build: scan, parse in parallel, write the tantivy index

use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::cli::OutputFormat;
use crate::indexer::key_terms;
use crate::indexer::manifest::{corpus_fingerprint, load_metadata, write_metadata, IndexMetadata};
use crate::indexer::scanner::CorpusScanner;
use excerpta::corpus::{self, CorpusDocument};
use excerpta::output::{print_json, use_colors};
use excerpta::service::TantivyService;
use excerpta::METADATA_FILE_NAME;

/// What an index run did
#[derive(Debug, Serialize)]
struct BuildSummary {
    index_dir: String,
    files: usize,
    documents: usize,
    skipped: bool,
    elapsed_ms: u128,
}

fn progress_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {prefix:<8} [{bar:40.cyan/dim}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━━╸")
}

/// Parse every corpus file, keeping file order in the output
fn load_corpus(files: &[PathBuf], progress: &ProgressBar) -> Result<Vec<CorpusDocument>> {
    let per_file: Vec<Vec<CorpusDocument>> = files
        .par_iter()
        .map(|path| {
            let documents = corpus::load_file(path);
            progress.inc(1);
            documents
        })
        .collect::<Result<_, _>>()?;
    let documents: Vec<CorpusDocument> = per_file.into_iter().flatten().collect();
    ensure_unique_ids(&documents)?;
    Ok(documents)
}

/// Lookups by id need every document id to name exactly one document
fn ensure_unique_ids(documents: &[CorpusDocument]) -> Result<()> {
    let mut seen: HashMap<&str, &CorpusDocument> = HashMap::with_capacity(documents.len());
    for document in documents {
        if let Some(previous) = seen.insert(&document.id, document) {
            anyhow::bail!(
                "Duplicate document id '{}' ({} {} and {} {})",
                document.id,
                previous.book_abbr,
                previous.heading,
                document.book_abbr,
                document.heading
            );
        }
    }
    Ok(())
}

pub fn run(
    input: &Path,
    index_dir: &Path,
    force: bool,
    respect_gitignore: bool,
    format: OutputFormat,
    compact: bool,
) -> Result<()> {
    let started = Instant::now();
    let files = CorpusScanner::new(input)
        .with_gitignore(respect_gitignore)
        .list_files()?;
    if files.is_empty() {
        anyhow::bail!("No corpus files (*.jsonl) found under {}", input.display());
    }

    let metadata_path = index_dir.join(METADATA_FILE_NAME);
    let fingerprint = corpus_fingerprint(&files)?;

    let unchanged = load_metadata(&metadata_path).filter(|previous| previous.fingerprint == fingerprint);
    if let (false, Some(previous)) = (force, unchanged) {
        tracing::info!(index = %index_dir.display(), "corpus unchanged, keeping index");
        let summary = BuildSummary {
            index_dir: index_dir.display().to_string(),
            files: previous.files,
            documents: previous.documents,
            skipped: true,
            elapsed_ms: started.elapsed().as_millis(),
        };
        return report(&summary, format, compact);
    }

    let progress = if format == OutputFormat::Text {
        let bar = ProgressBar::new(files.len() as u64);
        bar.set_style(progress_style());
        bar.set_prefix("Loading");
        bar
    } else {
        ProgressBar::hidden()
    };
    let mut documents = load_corpus(&files, &progress)?;
    progress.finish_with_message(format!("loaded {} documents", documents.len()));
    key_terms::assign(&mut documents);

    let service = TantivyService::create(index_dir)
        .with_context(|| format!("failed to create index at {}", index_dir.display()))?;
    service
        .add_documents(&documents)
        .context("failed to write corpus documents")?;

    write_metadata(&metadata_path, &IndexMetadata::new(fingerprint, files.len(), documents.len()))?;
    tracing::info!(
        files = files.len(),
        documents = documents.len(),
        index = %index_dir.display(),
        "index built"
    );

    let summary = BuildSummary {
        index_dir: index_dir.display().to_string(),
        files: files.len(),
        documents: documents.len(),
        skipped: false,
        elapsed_ms: started.elapsed().as_millis(),
    };
    report(&summary, format, compact)
}

fn report(summary: &BuildSummary, format: OutputFormat, compact: bool) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(summary, compact),
        OutputFormat::Text => {
            let use_color = use_colors();
            let mark = if use_color { "✓".green().to_string() } else { "✓".to_string() };
            if summary.skipped {
                println!(
                    "{} Index at {} is up to date ({} documents). Use --force to rebuild.",
                    mark, summary.index_dir, summary.documents
                );
            } else {
                println!(
                    "{} Indexed {} documents from {} files into {} in {}ms",
                    mark, summary.documents, summary.files, summary.index_dir, summary.elapsed_ms
                );
            }
            Ok(())
        }
    }
}
