// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query commands over a built index

pub mod search;
pub mod similar;
pub mod suggest;

use anyhow::{Context, Result};
use std::path::Path;

use excerpta::config::Config;
use excerpta::correction;
use excerpta::errors::IndexNotFoundError;
use excerpta::service::engine::INDEX_META_FILE;
use excerpta::service::TantivyService;

/// Open the index and install the spelling-variant table for this process
pub(crate) fn open_service(index_dir: &Path, config: &Config) -> Result<TantivyService> {
    if !index_dir.join(INDEX_META_FILE).exists() {
        return Err(IndexNotFoundError {
            index_path: index_dir.display().to_string(),
        }
        .into());
    }
    let table = correction::init_variants(config.variants_file.as_deref());
    tracing::debug!(variants = table.len(), "spelling variants loaded");

    TantivyService::open(index_dir)
        .with_context(|| format!("Failed to open index at {}", index_dir.display()))
}
