//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Pagination driver limits
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// Description enrichment pacing
    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    /// Client-side result view settings
    #[serde(default)]
    pub view: ViewConfig,

    /// Upstream endpoints
    #[serde(default)]
    pub sources: SourcesConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.pagination.max_pages == 0 {
            return Err(AppError::validation("pagination.max_pages must be > 0"));
        }
        if self.enrichment.batch_size == 0 || self.enrichment.bulk_size == 0 {
            return Err(AppError::validation(
                "enrichment.batch_size and enrichment.bulk_size must be > 0",
            ));
        }
        if self.view.page_size == 0 {
            return Err(AppError::validation("view.page_size must be > 0"));
        }
        if self.sources.rent_page_size == 0 || self.sources.realestate_page_size == 0 {
            return Err(AppError::validation("source page sizes must be > 0"));
        }
        for (name, value) in self.sources.endpoints() {
            url::Url::parse(value).map_err(|e| {
                AppError::validation(format!("sources.{name} is not a valid URL: {e}"))
            })?;
        }
        Ok(())
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Pagination driver limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Hard upper bound on pages requested per search
    #[serde(default = "defaults::max_pages")]
    pub max_pages: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            max_pages: defaults::max_pages(),
        }
    }
}

/// Fixed-window pacing for detail page fetches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Short pause after every this many fetches
    #[serde(default = "defaults::batch_size")]
    pub batch_size: usize,

    #[serde(default = "defaults::batch_pause")]
    pub batch_pause_ms: u64,

    /// Long pause after every this many fetches
    #[serde(default = "defaults::bulk_size")]
    pub bulk_size: usize,

    #[serde(default = "defaults::bulk_pause")]
    pub bulk_pause_ms: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            batch_size: defaults::batch_size(),
            batch_pause_ms: defaults::batch_pause(),
            bulk_size: defaults::bulk_size(),
            bulk_pause_ms: defaults::bulk_pause(),
        }
    }
}

/// Client-side result view settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Listings per result page
    #[serde(default = "defaults::page_size")]
    pub page_size: usize,

    /// Categories excluded by default when they appear in a result set
    #[serde(default = "defaults::type_exclusions")]
    pub default_type_exclusions: Vec<String>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_size: defaults::page_size(),
            default_type_exclusions: defaults::type_exclusions(),
        }
    }
}

/// Upstream endpoints and their page sizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "defaults::domain_url")]
    pub domain_url: String,

    #[serde(default = "defaults::rent_url")]
    pub rent_url: String,

    /// GraphQL endpoint
    #[serde(default = "defaults::realestate_url")]
    pub realestate_url: String,

    /// Public site used to absolutize realestate links
    #[serde(default = "defaults::realestate_site_url")]
    pub realestate_site_url: String,

    #[serde(default = "defaults::flatmates_url")]
    pub flatmates_url: String,

    /// Results per page rent.com.au renders
    #[serde(default = "defaults::rent_page_size")]
    pub rent_page_size: u32,

    #[serde(default = "defaults::realestate_page_size")]
    pub realestate_page_size: u32,
}

impl SourcesConfig {
    fn endpoints(&self) -> [(&'static str, &str); 5] {
        [
            ("domain_url", self.domain_url.as_str()),
            ("rent_url", self.rent_url.as_str()),
            ("realestate_url", self.realestate_url.as_str()),
            ("realestate_site_url", self.realestate_site_url.as_str()),
            ("flatmates_url", self.flatmates_url.as_str()),
        ]
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            domain_url: defaults::domain_url(),
            rent_url: defaults::rent_url(),
            realestate_url: defaults::realestate_url(),
            realestate_site_url: defaults::realestate_site_url(),
            flatmates_url: defaults::flatmates_url(),
            rent_page_size: defaults::rent_page_size(),
            realestate_page_size: defaults::realestate_page_size(),
        }
    }
}

mod defaults {
    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; rental-search/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Pagination defaults
    pub fn max_pages() -> u32 {
        50
    }

    // Enrichment defaults
    pub fn batch_size() -> usize {
        10
    }
    pub fn batch_pause() -> u64 {
        100
    }
    pub fn bulk_size() -> usize {
        100
    }
    pub fn bulk_pause() -> u64 {
        1000
    }

    // View defaults
    pub fn page_size() -> usize {
        10
    }
    pub fn type_exclusions() -> Vec<String> {
        vec![
            "Acreage / Semi-Rural".into(),
            "New House & Land".into(),
            "Retirement Living".into(),
        ]
    }

    // Source defaults
    pub fn domain_url() -> String {
        "https://www.domain.com.au".into()
    }
    pub fn rent_url() -> String {
        "https://www.rent.com.au".into()
    }
    pub fn realestate_url() -> String {
        "https://lexa.realestate.com.au/graphql".into()
    }
    pub fn realestate_site_url() -> String {
        "https://www.realestate.com.au".into()
    }
    pub fn flatmates_url() -> String {
        "https://flatmates.com.au".into()
    }
    pub fn rent_page_size() -> u32 {
        20
    }
    pub fn realestate_page_size() -> u32 {
        25
    }
}
