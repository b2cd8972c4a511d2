// SPDX-License-Identifier: MIT OR Apache-2.0

//! Corpus fingerprint for skipping rebuilds of an unchanged corpus.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

pub(crate) const METADATA_VERSION: u32 = 2;

/// What the current index was built from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct IndexMetadata {
    pub version: u32,
    /// blake3 over every corpus file's path and content
    pub fingerprint: String,
    pub files: usize,
    pub documents: usize,
    /// Unix seconds
    pub indexed_at: u64,
}

impl IndexMetadata {
    pub fn new(fingerprint: String, files: usize, documents: usize) -> Self {
        Self {
            version: METADATA_VERSION,
            fingerprint,
            files,
            documents,
            indexed_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|duration| duration.as_secs())
                .unwrap_or(0),
        }
    }
}

pub(crate) fn load_metadata(path: &Path) -> Option<IndexMetadata> {
    let content = std::fs::read_to_string(path).ok()?;
    let metadata: IndexMetadata = serde_json::from_str(&content).ok()?;
    (metadata.version == METADATA_VERSION).then_some(metadata)
}

pub(crate) fn write_metadata(path: &Path, metadata: &IndexMetadata) -> Result<()> {
    let content = serde_json::to_string_pretty(metadata)?;
    atomic_write_bytes(path, content.as_bytes())
}

fn hash_file_streaming(hasher: &mut blake3::Hasher, path: &Path) -> Result<()> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut buf = [0u8; 64 * 1024];

    loop {
        let read = reader.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(())
}

/// Fingerprint of a corpus: its file paths and contents, in the given order
pub(crate) fn corpus_fingerprint(files: &[impl AsRef<Path>]) -> Result<String> {
    let mut hasher = blake3::Hasher::new();
    for file in files {
        let file = file.as_ref();
        hasher.update(file.to_string_lossy().as_bytes());
        hasher.update(&[0]);
        hash_file_streaming(&mut hasher, file)?;
        hasher.update(&[0]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

pub(crate) fn atomic_write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    let Some(parent) = path.parent() else {
        anyhow::bail!("cannot atomically write {} without parent", path.display());
    };
    std::fs::create_dir_all(parent)?;

    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_nanos())
        .unwrap_or(0);
    let tmp_name = format!(
        ".{}.tmp-{}-{}",
        path.file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("excerpta"),
        std::process::id(),
        nonce
    );
    let tmp_path = parent.join(tmp_name);

    {
        let mut file = File::create(&tmp_path)
            .with_context(|| format!("failed to create {}", tmp_path.display()))?;
        file.write_all(bytes)
            .with_context(|| format!("failed to write {}", tmp_path.display()))?;
        file.sync_all()
            .with_context(|| format!("failed to sync {}", tmp_path.display()))?;
    }

    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("failed to move {} into place", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn fingerprint_tracks_content_changes() {
        let dir = TempDir::new().expect("tempdir");
        let file = dir.path().join("book.jsonl");
        std::fs::write(&file, "one\n").expect("write");

        let first = corpus_fingerprint(&[&file]).expect("fingerprint");
        assert_eq!(first, corpus_fingerprint(&[&file]).expect("fingerprint"));

        std::fs::write(&file, "two\n").expect("write");
        assert_ne!(first, corpus_fingerprint(&[&file]).expect("fingerprint"));
    }

    #[test]
    fn metadata_round_trips_through_disk() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("nested").join("metadata.json");
        let metadata = IndexMetadata::new("abc".to_string(), 2, 40);

        write_metadata(&path, &metadata).expect("write");
        assert_eq!(load_metadata(&path), Some(metadata));
    }

    #[test]
    fn stale_versions_are_ignored() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("metadata.json");
        std::fs::write(
            &path,
            r#"{"version":0,"fingerprint":"x","files":1,"documents":1,"indexed_at":0}"#,
        )
        .expect("write");
        assert!(load_metadata(&path).is_none());
    }
}
