//! cms-blog: a static blog generator backed by a headless CMS
//!
//! Posts are fetched from a Prismic-style content API and rendered with
//! Tera templates embedded in the binary. The listing page loads further
//! posts from a static JSON feed, and the preview server generates posts
//! missing from the build on first request.

pub mod cache;
pub mod cms;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod i18n;
pub mod listing;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Name of the config file at the site root
pub const CONFIG_FILE: &str = "blog.yml";

/// The main blog application
#[derive(Debug, Clone)]
pub struct Blog {
    /// Blog configuration
    pub config: config::BlogConfig,
    /// Translations for the configured language
    pub i18n: i18n::I18n,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
}

impl Blog {
    /// Create a new blog instance from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join(CONFIG_FILE);

        let config = if config_path.exists() {
            config::BlogConfig::load(&config_path)?
        } else {
            let mut config = config::BlogConfig::default();
            config.apply_env();
            config.validate()?;
            config
        };

        let mut i18n = i18n::I18n::new(&config.language);
        i18n.load_languages(base_dir.join("languages"))?;

        let public_dir = base_dir.join(&config.public_dir);

        Ok(Self {
            config,
            i18n,
            base_dir,
            public_dir,
        })
    }

    /// Generate the static site
    pub async fn generate(&self, force: bool) -> Result<()> {
        commands::generate::run(self, force).await
    }

    /// Clean the public directory and cache
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
