// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types with helpful suggestions
//!
//! Pipeline invariant failures and Index Service failures are typed; the
//! index-not-found case keeps a user-facing message with an actionable hint.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of the excerpt pipeline itself.
///
/// These are data-invariant violations: the request that hits one is aborted
/// rather than rendered with content silently missing.
#[derive(Debug, Error)]
pub enum ExcerptError {
    /// No element of the paragraph's markup tree contains the sentence text.
    #[error("no element of the paragraph markup encloses sentence text {needle:?}")]
    EnclosingElementNotFound { needle: String },

    /// A match span points outside the document or splits a UTF-8 character.
    #[error("match span {start}..{end} is not a valid range of a {len}-byte text")]
    InvalidSpan { start: usize, end: usize, len: usize },
}

/// Failures talking to the Index Service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Tantivy(#[from] tantivy::TantivyError),

    #[error(transparent)]
    OpenDirectory(#[from] tantivy::directory::error::OpenDirectoryError),

    #[error(transparent)]
    QueryParser(#[from] tantivy::query::QueryParserError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("index schema is missing field '{0}'")]
    MissingField(&'static str),

    #[error("{} is not empty and holds no search index; refusing to replace it", .0.display())]
    NotAnIndex(PathBuf),

    #[error(transparent)]
    Excerpt(#[from] ExcerptError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failures reading corpus record files.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("failed to read {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: invalid corpus record")]
    Record {
        path: String,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Error indicating the search index was not found
#[derive(Debug)]
pub struct IndexNotFoundError {
    pub index_path: String,
}

impl fmt::Display for IndexNotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Index not found at '{}'\n\n\
             Suggestion: Run 'excerpta index --input <corpus>' to build the search index first.\n\
             Example: excerpta index --input books/",
            self.index_path
        )
    }
}

impl std::error::Error for IndexNotFoundError {}

/// Error indicating a query produced no results
#[derive(Debug)]
pub struct NoResultsError {
    pub query: String,
}

impl fmt::Display for NoResultsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "No results found for query: '{}'\n\n\
             Suggestions:\n\
             - Try a different or broader search query\n\
             - Check the spelling: excerpta suggest \"{}\"",
            self.query, self.query
        )
    }
}

impl std::error::Error for NoResultsError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_not_found_message_names_the_path_and_the_fix() {
        let err = IndexNotFoundError {
            index_path: "/tmp/books/.excerpta/index".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("/tmp/books/.excerpta/index"));
        assert!(message.contains("excerpta index"));
    }

    #[test]
    fn excerpt_error_converts_into_service_error() {
        let err: ServiceError = ExcerptError::EnclosingElementNotFound {
            needle: "lost".to_string(),
        }
        .into();
        assert!(matches!(err, ServiceError::Excerpt(_)));
        assert!(err.to_string().contains("lost"));
    }
}
