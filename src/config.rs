//! Typed configuration with documented defaults.
//!
//! Configuration is a plain TOML file deserialized into named, typed
//! fields; it is constructed once and handed to the components that need
//! it. Nothing here is global state.
//!
//! # Configuration File Format
//!
//! ```toml
//! [categories]
//! images = ["jpg", "png", "heic"]
//! documents = ["pdf", "docx"]
//!
//! [executor]
//! overwrite = "skip"          # skip | rename-with-suffix | overwrite
//!
//! [duplicates]
//! verify_bytes = false
//!
//! [filters]
//! include_hidden = false
//! exclude_filenames = [".DS_Store", "Thumbs.db"]
//! exclude_patterns = ["*.partial"]
//! exclude_extensions = ["crdownload"]
//! ```
//!
//! Every section is optional; omitted values fall back to the compiled
//! defaults (the fixed category table, `skip` overwrite policy, no byte
//! verification, hidden files excluded).

use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::classify::{Category, Classifier};
use crate::executor::OverwritePolicy;

/// Errors that can occur during configuration loading.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    InvalidGlobPattern(String),
    /// A category name in `[categories]` is not one of the known buckets.
    UnknownCategory(String),
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidGlobPattern(pattern) => {
                write!(f, "Invalid glob pattern '{}'", pattern)
            }
            ConfigError::UnknownCategory(name) => {
                write!(
                    f,
                    "Unknown category '{}': expected images, documents, videos, audio, archives, code, text or other",
                    name
                )
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Category name to extension list; replaces the default table when
    /// present.
    #[serde(default)]
    pub categories: Option<HashMap<String, Vec<String>>>,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub duplicates: DuplicatesConfig,

    #[serde(default)]
    pub filters: FilterRules,
}

/// Executor behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// What to do when a destination already exists. Default: skip.
    #[serde(default)]
    pub overwrite: OverwritePolicy,
}

/// Duplicate finder behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DuplicatesConfig {
    /// Byte-compare members of each hash group before reporting them,
    /// guarding against hash collisions. Default: false.
    #[serde(default)]
    pub verify_bytes: bool,
}

/// Rules for excluding files from scans.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether to include hidden files (names starting with "."). Default
    /// false.
    #[serde(default)]
    pub include_hidden: bool,

    /// Exact filenames to exclude.
    #[serde(default)]
    pub exclude_filenames: Vec<String>,

    /// Glob patterns to exclude.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Extensions to exclude (case-insensitive, no dot).
    #[serde(default)]
    pub exclude_extensions: Vec<String>,
}

impl Config {
    /// Load configuration with fallback to defaults.
    ///
    /// Lookup order:
    /// 1. `config_path` if provided (an error if missing)
    /// 2. `./.tidyfile.toml`
    /// 3. `~/.config/tidyfile/config.toml`
    /// 4. compiled defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".tidyfile.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("tidyfile")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Build the classifier: injected category table when configured,
    /// the fixed defaults otherwise.
    pub fn classifier(&self) -> Result<Classifier, ConfigError> {
        match &self.categories {
            None => Ok(Classifier::default()),
            Some(raw) => {
                let mut table: HashMap<Category, Vec<String>> = HashMap::new();
                for (name, extensions) in raw {
                    let category = Category::from_name(name)
                        .ok_or_else(|| ConfigError::UnknownCategory(name.clone()))?;
                    table
                        .entry(category)
                        .or_default()
                        .extend(extensions.clone());
                }
                Ok(Classifier::from_table(&table))
            }
        }
    }

    /// Compile the filter rules into matchers, validating glob patterns.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(&self.filters)
    }
}

/// Pre-compiled exclusion filters for efficient per-file matching.
#[derive(Debug, Clone)]
pub struct CompiledFilters {
    include_hidden: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = rules
            .exclude_patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            include_hidden: rules.include_hidden,
            exclude_filenames: rules.exclude_filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude_extensions
                .iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
            exclude_patterns,
        })
    }

    /// Check whether a file should be visited by the scanner.
    pub fn should_include(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if !self.include_hidden && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = file_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return false;
            }
        }

        !self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_path(file_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.categories.is_none());
        assert_eq!(config.executor.overwrite, OverwritePolicy::Skip);
        assert!(!config.duplicates.verify_bytes);
        assert!(!config.filters.include_hidden);
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [categories]
            images = ["jpg", "heic"]

            [executor]
            overwrite = "rename-with-suffix"

            [duplicates]
            verify_bytes = true

            [filters]
            include_hidden = true
            exclude_filenames = ["Thumbs.db"]
            exclude_patterns = ["*.partial"]
            exclude_extensions = ["crdownload"]
        "#;
        let config: Config = toml::from_str(toml_str).expect("Failed to parse config");

        assert_eq!(config.executor.overwrite, OverwritePolicy::RenameWithSuffix);
        assert!(config.duplicates.verify_bytes);
        assert!(config.filters.include_hidden);

        let classifier = config.classifier().unwrap();
        assert_eq!(classifier.classify_extension(Some("heic")), Category::Images);
        // injected table replaces the defaults entirely
        assert_eq!(classifier.classify_extension(Some("pdf")), Category::Other);
    }

    #[test]
    fn test_unknown_category_rejected() {
        let toml_str = r#"
            [categories]
            blobs = ["bin"]
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(matches!(
            config.classifier(),
            Err(ConfigError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_hidden_files_excluded_by_default() {
        let filters = Config::default().compile_filters().unwrap();
        assert!(!filters.should_include(Path::new(".DS_Store")));
        assert!(filters.should_include(Path::new("photo.jpg")));
    }

    #[test]
    fn test_exclusion_rules() {
        let config = Config {
            filters: FilterRules {
                include_hidden: true,
                exclude_filenames: vec!["Thumbs.db".to_string()],
                exclude_patterns: vec!["*.partial".to_string()],
                exclude_extensions: vec!["crdownload".to_string()],
            },
            ..Default::default()
        };
        let filters = config.compile_filters().unwrap();

        assert!(!filters.should_include(Path::new("Thumbs.db")));
        assert!(!filters.should_include(Path::new("movie.mkv.partial")));
        assert!(!filters.should_include(Path::new("setup.CRDOWNLOAD")));
        assert!(filters.should_include(Path::new(".hidden")));
        assert!(filters.should_include(Path::new("report.pdf")));
    }

    #[test]
    fn test_invalid_glob_pattern_rejected() {
        let config = Config {
            filters: FilterRules {
                exclude_patterns: vec!["[invalid".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            config.compile_filters(),
            Err(ConfigError::InvalidGlobPattern(_))
        ));
    }

    #[test]
    fn test_load_missing_explicit_path_errors() {
        let result = Config::load(Some(Path::new("/no/such/config.toml")));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }
}
