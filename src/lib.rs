//! excerpta - copyright-safe excerpts from a searchable book corpus
//!
//! Shared modules for the excerpta CLI: the excerpt pipeline, the Index
//! Service boundary and its tantivy implementation.

pub mod config;
pub mod corpus;
pub mod correction;
pub mod errors;
pub mod excerpt;
pub mod output;
pub mod pipeline;
pub mod ranking;
pub mod request;
pub mod service;

/// Index location, relative to the working directory.
pub const INDEX_DIR: &str = ".excerpta/index";

/// Corpus fingerprint file, kept inside the index directory.
pub const METADATA_FILE_NAME: &str = "excerpta-metadata.json";
