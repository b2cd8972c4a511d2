// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration file support for excerpta
//!
//! Loads configuration from .excerptarc.toml in current directory or ~/.config/excerpta/config.toml

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Output format for results (mirrored from cli for library use)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigOutputFormat {
    #[default]
    Text,
    Json,
}

/// Page and excerpt limits handed to the pipeline at startup.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Hits per page for searches that target document content
    pub hits_per_content_page: usize,
    /// Hits per page for metadata-only (listing) searches
    pub hits_per_listing_page: usize,
    /// Excerpt paragraphs per hit when a page has several hits
    pub multiple_result_excerpts: usize,
    /// Excerpt paragraphs when the search has exactly one hit
    pub single_result_excerpts: usize,
    /// Excerpt paragraphs for a single hit that tripped the exposure guard
    pub single_result_exposed_excerpts: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            hits_per_content_page: 10,
            hits_per_listing_page: 150,
            multiple_result_excerpts: 3,
            single_result_excerpts: 50,
            single_result_exposed_excerpts: 10,
        }
    }
}

/// Thresholds for the exposure guard.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExposureConfig {
    /// Documents at or below this many characters are never curtailed
    pub min_chars: usize,
    /// Highlighted-to-total paragraph ratio above which a document is exposed
    pub coverage_ratio: f64,
}

impl Default for ExposureConfig {
    fn default() -> Self {
        Self {
            min_chars: 1500,
            coverage_ratio: 0.5,
        }
    }
}

/// Excerpt presentation switches.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExcerptConfig {
    /// Emit empty leading/trailing sentence entries so elision shows at excerpt edges
    pub elision_placeholders: bool,
    /// Marker placed between non-adjacent sentence excerpts
    pub omission: String,
}

impl Default for ExcerptConfig {
    fn default() -> Self {
        Self {
            elision_placeholders: false,
            omission: " [...] ".to_string(),
        }
    }
}

/// Configuration loaded from .excerptarc.toml or ~/.config/excerpta/config.toml
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default output format (text or json)
    pub default_format: Option<String>,
    /// Index location, relative to the working directory
    pub index_dir: Option<PathBuf>,
    /// Extra UK/US spelling pairs, one tab-separated pair per line
    pub variants_file: Option<PathBuf>,
    pub limits: LimitsConfig,
    pub exposure: ExposureConfig,
    pub excerpts: ExcerptConfig,
}

impl Config {
    /// Load configuration from files
    ///
    /// Precedence (highest to lowest):
    /// 1. .excerptarc.toml in current directory
    /// 2. ~/.config/excerpta/config.toml
    pub fn load() -> Self {
        // Try current directory first
        if let Some(config) = Self::load_from_path(Path::new(".excerptarc.toml")) {
            return config;
        }

        // Try home directory config
        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".config").join("excerpta").join("config.toml");
            if let Some(config) = Self::load_from_path(&config_path) {
                return config;
            }
        }

        Self::default()
    }

    pub fn load_from_path(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "loaded configuration");
                Some(config)
            }
            Err(e) => {
                tracing::warn!("Failed to parse {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Get output format from config, parsing the string to ConfigOutputFormat
    pub fn output_format(&self) -> Option<ConfigOutputFormat> {
        self.default_format.as_ref().and_then(|s| match s.to_lowercase().as_str() {
            "json" => Some(ConfigOutputFormat::Json),
            "text" => Some(ConfigOutputFormat::Text),
            _ => None,
        })
    }

    /// Index directory (CLI wins, then config, then `.excerpta/index`)
    pub fn merge_index_dir(&self, cli_value: Option<&Path>) -> PathBuf {
        cli_value
            .map(Path::to_path_buf)
            .or_else(|| self.index_dir.clone())
            .unwrap_or_else(|| PathBuf::from(crate::INDEX_DIR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_the_published_limits() {
        let config = Config::default();
        assert_eq!(config.limits.hits_per_content_page, 10);
        assert_eq!(config.limits.hits_per_listing_page, 150);
        assert_eq!(config.limits.multiple_result_excerpts, 3);
        assert_eq!(config.limits.single_result_excerpts, 50);
        assert_eq!(config.exposure.min_chars, 1500);
        assert!(!config.excerpts.elision_placeholders);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "default_format = \"json\"\n[limits]\nmultiple_result_excerpts = 2\n[exposure]\ncoverage_ratio = 0.75\n",
        )
        .expect("write config");

        let config = Config::load_from_path(&path).expect("config parses");
        assert_eq!(config.output_format(), Some(ConfigOutputFormat::Json));
        assert_eq!(config.limits.multiple_result_excerpts, 2);
        assert_eq!(config.limits.single_result_excerpts, 50);
        assert_eq!(config.exposure.coverage_ratio, 0.75);
        assert_eq!(config.exposure.min_chars, 1500);
    }

    #[test]
    fn malformed_config_is_ignored() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[limits\nbroken").expect("write config");
        assert!(Config::load_from_path(&path).is_none());
    }

    #[test]
    fn cli_index_dir_wins_over_config() {
        let config = Config {
            index_dir: Some(PathBuf::from("from-config")),
            ..Config::default()
        };
        assert_eq!(
            config.merge_index_dir(Some(Path::new("from-cli"))),
            PathBuf::from("from-cli")
        );
        assert_eq!(config.merge_index_dir(None), PathBuf::from("from-config"));
        assert_eq!(
            Config::default().merge_index_dir(None),
            PathBuf::from(crate::INDEX_DIR)
        );
    }
}
