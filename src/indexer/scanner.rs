// SPDX-License-Identifier: MIT OR Apache-2.0

//! Corpus file discovery using the ignore crate (same as ripgrep)

use anyhow::{bail, Result};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

const CORPUS_EXTENSION: &str = "jsonl";

const SKIPPED_DIRS: &[&str] = &[".excerpta", ".git", ".hg", ".svn"];

/// Finds corpus record files under a file or directory
pub struct CorpusScanner {
    root: PathBuf,
    respect_git_ignore: bool,
}

impl CorpusScanner {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            respect_git_ignore: true,
        }
    }

    /// Enable or disable respect for git ignore rules
    pub fn with_gitignore(mut self, enabled: bool) -> Self {
        self.respect_git_ignore = enabled;
        self
    }

    fn make_builder(&self) -> WalkBuilder {
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(false)
            .git_ignore(self.respect_git_ignore)
            .git_exclude(self.respect_git_ignore)
            .git_global(self.respect_git_ignore)
            .filter_entry(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .map(|name| !SKIPPED_DIRS.contains(&name))
                    .unwrap_or(true)
            });
        builder
    }

    /// Corpus files, sorted so index builds are reproducible
    pub fn list_files(&self) -> Result<Vec<PathBuf>> {
        if !self.root.exists() {
            bail!("Corpus path not found: {}", self.root.display());
        }
        if self.root.is_file() {
            return Ok(vec![self.root.clone()]);
        }

        let mut files: Vec<PathBuf> = self
            .make_builder()
            .build()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry.into_path()),
                Err(err) => {
                    tracing::warn!("skipping unreadable corpus entry: {}", err);
                    None
                }
            })
            .filter(|path| path.is_file() && is_corpus_file(path))
            .collect();
        files.sort();
        Ok(files)
    }
}

/// True for JSON Lines corpus files
pub fn is_corpus_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(CORPUS_EXTENSION))
}
