//! Blog configuration (blog.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable that overrides `cms.access_token`
pub const ACCESS_TOKEN_ENV: &str = "CMS_BLOG_ACCESS_TOKEN";

/// Largest page size the CMS accepts
const MAX_PAGE_SIZE: usize = 100;

/// Main blog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogConfig {
    // Site
    pub title: String,
    pub language: String,
    pub timezone: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub public_dir: String,

    // Reading
    pub words_per_minute: usize,
    pub missing_post: MissingPostPolicy,

    #[serde(default)]
    pub cms: CmsConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            title: "Blog".to_string(),
            language: "pt-BR".to_string(),
            timezone: "America/Sao_Paulo".to_string(),

            url: "http://example.com".to_string(),
            root: "/".to_string(),

            public_dir: "public".to_string(),

            words_per_minute: 200,
            missing_post: MissingPostPolicy::default(),

            cms: CmsConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl BlogConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let mut config: BlogConfig = serde_yaml::from_str(&content)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Pick up overrides from the environment
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            if !token.is_empty() {
                tracing::debug!("Using CMS access token from {}", ACCESS_TOKEN_ENV);
                self.cms.access_token = Some(token);
            }
        }
    }

    /// Reject values the generator cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.words_per_minute == 0 {
            anyhow::bail!("words_per_minute must be greater than zero");
        }
        if self.cms.page_size == 0 || self.cms.page_size > MAX_PAGE_SIZE {
            anyhow::bail!(
                "cms.page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE,
                self.cms.page_size
            );
        }
        if self.cms.endpoint.trim().is_empty() {
            anyhow::bail!("cms.endpoint is required");
        }
        self.tz()?;
        Ok(())
    }

    /// Parsed display timezone
    pub fn tz(&self) -> Result<chrono_tz::Tz> {
        self.timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|e| anyhow::anyhow!("Unknown timezone {:?}: {}", self.timezone, e))
    }
}

/// What to do when a post path points at a document the CMS no longer has
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPostPolicy {
    /// Skip the page; the server answers 404
    #[default]
    NotFound,
    /// Count it as a failed page build; the server answers 500
    Error,
}

/// Headless CMS connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsConfig {
    /// API entry point, e.g. https://my-repo.cdn.prismic.io/api/v2
    pub endpoint: String,
    pub access_token: Option<String>,
    /// Content release ref; the master ref is used when unset
    #[serde(rename = "ref")]
    pub content_ref: Option<String>,
    pub document_type: String,
    pub page_size: usize,
    pub fetch: Vec<String>,
    pub orderings: Option<String>,
    pub timeout_secs: u64,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://example.cdn.prismic.io/api/v2".to_string(),
            access_token: None,
            content_ref: None,
            document_type: "posts".to_string(),
            page_size: 1,
            fetch: vec![
                "posts.slug".to_string(),
                "posts.title".to_string(),
                "posts.subtitle".to_string(),
                "posts.author".to_string(),
                "posts.banner".to_string(),
                "posts.content".to_string(),
            ],
            orderings: None,
            timeout_secs: 30,
        }
    }
}

/// Development server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Generate missing post pages on first request
    pub fallback: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { fallback: true }
    }
}
