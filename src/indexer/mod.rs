// SPDX-License-Identifier: MIT OR Apache-2.0

//! Indexer module - corpus discovery, fingerprinting, key terms and index builds

pub mod build;
pub mod key_terms;
pub mod manifest;
pub mod scanner;
