//! excerpta - Copyright-safe excerpts from a searchable book corpus
//!
//! Indexes book documents with tantivy and renders search results as
//! highlighted excerpts, guarding against exposing whole documents.

mod cli;
mod indexer;
mod query;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands, OutputFormat};
use excerpta::config::Config;
use query::search::SearchOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging goes to stderr so stdout stays clean for JSON output
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("EXCERPTA_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load();
    let format = cli
        .format
        .or_else(|| config.output_format().map(OutputFormat::from))
        .unwrap_or(OutputFormat::Text);
    let compact = cli.compact;
    let index_dir = config.merge_index_dir(cli.index_dir.as_deref());

    match cli.command {
        Commands::Index { input, force, no_ignore } => {
            indexer::build::run(&input, &index_dir, force, !no_ignore, format, compact)?;
        }
        Commands::Search {
            query,
            page,
            sort,
            order,
        } => {
            let options = SearchOptions {
                page,
                sort: sort.into(),
                ordering: order.into(),
            };
            query::search::run(&query, &options, &index_dir, &config, format, compact)?;
        }
        Commands::Suggest { query } => {
            query::suggest::run(&query, &index_dir, &config, format, compact)?;
        }
        Commands::Similar { id, limit } => {
            query::similar::run(&id, limit, &index_dir, &config, format, compact)?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "excerpta", &mut std::io::stdout());
        }
    }

    Ok(())
}
