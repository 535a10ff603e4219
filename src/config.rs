//! Site configuration module.
//!
//! Handles loading and validating `site.toml` from the content root. All
//! fields have defaults; user config files only specify the values they want
//! to override. Unknown keys are rejected to catch typos early.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! title = "pressa site"      # Site title for rendered page headers
//! default_lang = "en"        # Items in this language are canonical candidates
//!
//! [pagination]
//! per_page = 10              # Items per listing page (0 = everything on one page)
//! orphans = 0                # Trailing items folded into the last page
//!
//! # Output-name rules, evaluated in order; the last rule whose min_page is
//! # <= the page number wins. Template variables: {name}, {number},
//! # {number_sep}, {extension}. {number} and {number_sep} are empty on page 1.
//! [[pagination.rules]]
//! min_page = 1
//! url = "{name}{number}{extension}"
//! save_as = "{name}{number}{extension}"
//!
//! [tag_cloud]
//! steps = 4                  # Number of visual-size buckets
//! max_tags = 100             # Keep the N most-used tags
//!
//! [cache]
//! enabled = true             # Store freshly read items in the cache
//! load = true                # Load the persisted cache at startup
//! method = "mtime"           # Staleness stamp: "mtime" or "sha256"
//! dir = ".pressa-cache"      # Cache directory; relative paths live inside the content tree
//!
//! [taxonomy]
//! reverse = false            # Reverse category/author index key order
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse, overriding just the values you want:
//!
//! ```toml
//! # Only override the page size
//! [pagination]
//! per_page = 5
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `site.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site title used in rendered page headers.
    pub title: String,
    /// Items in this language are preferred as canonical for their slug group.
    pub default_lang: String,
    /// Listing pagination settings.
    pub pagination: PaginationConfig,
    /// Tag-cloud settings.
    pub tag_cloud: TagCloudConfig,
    /// Read-cache settings.
    pub cache: CacheConfig,
    /// Taxonomy index settings.
    pub taxonomy: TaxonomyConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "pressa site".to_string(),
            default_lang: "en".to_string(),
            pagination: PaginationConfig::default(),
            tag_cloud: TagCloudConfig::default(),
            cache: CacheConfig::default(),
            taxonomy: TaxonomyConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_lang.is_empty() {
            return Err(ConfigError::Validation(
                "default_lang must not be empty".into(),
            ));
        }
        if self.tag_cloud.steps == 0 {
            return Err(ConfigError::Validation(
                "tag_cloud.steps must be at least 1".into(),
            ));
        }
        if self.pagination.rules.is_empty() {
            return Err(ConfigError::Validation(
                "pagination.rules must not be empty".into(),
            ));
        }
        for rule in &self.pagination.rules {
            if rule.min_page == 0 {
                return Err(ConfigError::Validation(
                    "pagination.rules min_page must be at least 1".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Listing pagination settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaginationConfig {
    /// Items per page. `0` puts everything on a single page.
    pub per_page: usize,
    /// Minimum trailing item count folded into the last page instead of
    /// being stranded alone on their own.
    pub orphans: usize,
    /// Output-name rules, evaluated in order. The last rule whose `min_page`
    /// is `<=` the page number wins.
    pub rules: Vec<PaginationRule>,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            per_page: 10,
            orphans: 0,
            rules: vec![PaginationRule::default()],
        }
    }
}

/// One output-name rule for paginated pages.
///
/// Template variables: `{name}` (output base name without extension),
/// `{number}` (empty on page 1), `{number_sep}` (empty on page 1, else `/`),
/// `{extension}` (with leading dot).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaginationRule {
    /// Lowest page number this rule applies to (1-based).
    pub min_page: usize,
    pub url: String,
    pub save_as: String,
}

impl Default for PaginationRule {
    fn default() -> Self {
        Self {
            min_page: 1,
            url: "{name}{number}{extension}".to_string(),
            save_as: "{name}{number}{extension}".to_string(),
        }
    }
}

/// Tag-cloud settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TagCloudConfig {
    /// Number of discrete visual-size buckets (weight 1 = biggest).
    pub steps: usize,
    /// Keep only the N most-used tags.
    pub max_tags: usize,
}

impl Default for TagCloudConfig {
    fn default() -> Self {
        Self {
            steps: 4,
            max_tags: 100,
        }
    }
}

/// Read-cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Store freshly read items in the cache.
    pub enabled: bool,
    /// Load the persisted cache file at startup.
    pub load: bool,
    /// Staleness stamp method: `"mtime"` or `"sha256"`. An unrecognized name
    /// disables staleness checking (every lookup misses) with a warning.
    pub method: String,
    /// Directory for cache files. Relative paths resolve inside the content
    /// tree; absolute paths are used as-is.
    pub dir: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            load: true,
            method: "mtime".to_string(),
            dir: ".pressa-cache".to_string(),
        }
    }
}

/// Taxonomy index settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TaxonomyConfig {
    /// Reverse the key order of the category/author top-level indexes.
    pub reverse: bool,
}

/// Load `site.toml` from the given directory, falling back to defaults when
/// the file doesn't exist. A present-but-broken file is an error; silently
/// ignoring it would mask typos with stock behavior.
pub fn load_config(dir: &Path) -> Result<SiteConfig, ConfigError> {
    let path = dir.join("site.toml");
    if !path.exists() {
        return Ok(SiteConfig::default());
    }
    let content = fs::read_to_string(&path)?;
    let config: SiteConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Stock `site.toml` with all options documented, printed by `gen-config`.
pub fn stock_config_toml() -> String {
    let header = "\
# pressa site configuration.
# All options are optional - the values below are the defaults.

";
    let body =
        toml::to_string_pretty(&SiteConfig::default()).expect("stock config serializes");
    format!("{header}{body}")
}
