//! Response envelopes of the CMS REST API

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::helpers::cms_timestamp;

/// `GET <endpoint>`: repository information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiInfo {
    #[serde(default)]
    pub refs: Vec<ApiRef>,
}

/// One content ref (the published master or a release)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiRef {
    pub id: String,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "isMasterRef", default)]
    pub is_master_ref: bool,
}

impl ApiInfo {
    pub fn master_ref(&self) -> Option<&str> {
        self.refs
            .iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference.as_str())
    }
}

/// A page of search results
///
/// The same envelope comes back from a query and from a GET on its
/// `next_page` cursor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse<T> {
    #[serde(default)]
    pub page: usize,
    #[serde(default)]
    pub results_per_page: usize,
    #[serde(default)]
    pub results_size: usize,
    #[serde(default)]
    pub total_results_size: usize,
    #[serde(default)]
    pub total_pages: usize,
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub prev_page: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

impl<T> SearchResponse<T> {
    /// The next-page cursor, with empty strings treated as absent
    pub fn cursor(&self) -> Option<&str> {
        self.next_page.as_deref().filter(|c| !c.trim().is_empty())
    }
}

/// A raw CMS document; `data` is interpreted by the content models
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: String,
    #[serde(with = "cms_timestamp", default)]
    pub first_publication_date: Option<DateTime<FixedOffset>>,
    #[serde(with = "cms_timestamp", default)]
    pub last_publication_date: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub data: serde_json::Value,
}
