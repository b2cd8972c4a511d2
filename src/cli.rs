// SPDX-License-Identifier: MIT OR Apache-2.0

//! CLI argument parsing using clap

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use excerpta::config::ConfigOutputFormat;
use excerpta::ranking::SortMode;
use excerpta::request::ExcerptOrdering;

/// excerpta - Copyright-safe excerpts from a searchable book corpus
///
/// Builds a full-text index over book documents and answers searches with
/// highlighted excerpts, curtailing output for documents a query would expose.
#[derive(Parser, Debug)]
#[command(name = "excerpta")]
#[command(
    author,
    version,
    about,
    long_about = None,
    override_usage = "excerpta [OPTIONS] <COMMAND>",
    after_help = "Quickstart:\n  excerpta index --input books/\n  excerpta s \"frame of mind\"\n  excerpta search 'book:tb heading:\"chapter 3\"'\n  excerpta search cats --sort desc-date --page 2"
)]
pub struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,

    /// Compact JSON output (no pretty formatting)
    #[arg(long, global = true)]
    pub compact: bool,

    /// Index directory (defaults to .excerpta/index)
    #[arg(long, global = true)]
    pub index_dir: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl From<ConfigOutputFormat> for OutputFormat {
    fn from(format: ConfigOutputFormat) -> Self {
        match format {
            ConfigOutputFormat::Text => OutputFormat::Text,
            ConfigOutputFormat::Json => OutputFormat::Json,
        }
    }
}

/// Result order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CliSort {
    /// Engine relevance
    #[default]
    Relevance,
    /// Oldest first; undated documents last
    AscDate,
    /// Newest first; undated documents last
    DescDate,
}

impl From<CliSort> for SortMode {
    fn from(sort: CliSort) -> Self {
        match sort {
            CliSort::Relevance => SortMode::Relevance,
            CliSort::AscDate => SortMode::AscendingDate,
            CliSort::DescDate => SortMode::DescendingDate,
        }
    }
}

/// Excerpt order within a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CliOrdering {
    /// Reading order, switching to relevance for documents a query would expose
    #[default]
    Default,
    /// Reading order
    Position,
    /// Best excerpts first
    Relevance,
}

impl From<CliOrdering> for ExcerptOrdering {
    fn from(ordering: CliOrdering) -> Self {
        match ordering {
            CliOrdering::Default => ExcerptOrdering::Default,
            CliOrdering::Position => ExcerptOrdering::Position,
            CliOrdering::Relevance => ExcerptOrdering::Relevance,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the search index from JSON Lines corpus files
    #[command(visible_aliases = ["i", "ix"])]
    Index {
        /// Corpus file or directory of *.jsonl files
        #[arg(short, long)]
        input: PathBuf,

        /// Rebuild even when the corpus is unchanged
        #[arg(short, long)]
        force: bool,

        /// Scan files excluded by .gitignore rules too
        #[arg(long)]
        no_ignore: bool,
    },

    /// Search the corpus and show excerpts
    #[command(visible_aliases = ["s", "find"])]
    Search {
        /// Query (fields: text, exact, heading, book; quotes for phrases)
        query: String,

        /// Result page, starting at 1
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Result order
        #[arg(short = 'S', long, value_enum, default_value = "relevance")]
        sort: CliSort,

        /// Excerpt order within each hit
        #[arg(short, long, value_enum, default_value = "default")]
        order: CliOrdering,
    },

    /// Suggest a spelling-corrected query
    #[command(visible_aliases = ["dym"])]
    Suggest {
        /// Query to correct
        query: String,
    },

    /// List documents similar to a document
    #[command(visible_aliases = ["mlt"])]
    Similar {
        /// Document id
        id: String,

        /// Maximum number of documents to list
        #[arg(short = 'm', long, default_value = "10")]
        limit: usize,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
