//! Helper functions shared by the generator, the server and templates

mod date;
mod html;
mod url;

pub use date::*;
pub use html::*;
pub use url::*;

use anyhow::Result;
use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;

use crate::config::BlogConfig;
use crate::i18n::I18n;

/// Helpers bound to one site's configuration and language
#[derive(Debug, Clone)]
pub struct Helpers {
    config: BlogConfig,
    i18n: I18n,
    tz: Tz,
}

impl Helpers {
    /// Create a new helpers instance
    pub fn new(config: BlogConfig, i18n: I18n) -> Result<Self> {
        let tz = config.tz()?;
        Ok(Self { config, i18n, tz })
    }

    /// Get url_for helper
    pub fn url_for(&self, path: &str) -> String {
        url_for(&self.config, path)
    }

    /// Root-relative URL of a post's detail page
    pub fn post_url(&self, uid: &str) -> String {
        url_for(&self.config, &post_path(uid))
    }

    /// Root-relative URL of a pagination feed page
    pub fn feed_url(&self, n: usize) -> String {
        url_for(&self.config, &feed_page_path(n))
    }

    /// Format a publication date for display
    pub fn date(&self, date: Option<&DateTime<FixedOffset>>) -> String {
        format_publication_date(date, &self.i18n, self.tz)
    }

    /// Translated string for the configured language
    pub fn t(&self, key: &str) -> String {
        self.i18n.get(key)
    }

    pub fn i18n(&self) -> &I18n {
        &self.i18n
    }
}
