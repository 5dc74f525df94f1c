//! HTTP client for the CMS REST API

use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

use super::query::{encode_param, Predicate, Query};
use super::response::{ApiInfo, Document, SearchResponse};
use super::PageSource;
use crate::config::CmsConfig;
use crate::error::CmsError;

/// Page size used when walking every document of a type
const ENUMERATION_PAGE_SIZE: usize = 100;

/// Client for one CMS repository
#[derive(Debug, Clone)]
pub struct CmsClient {
    http: reqwest::Client,
    config: CmsConfig,
    /// Content ref, resolved once per client
    reference: Arc<OnceCell<String>>,
}

impl CmsClient {
    /// Create a client for the configured repository
    pub fn new(config: &CmsConfig) -> Result<Self, CmsError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .user_agent(concat!("cms-blog/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| CmsError::Http {
                url: config.endpoint.clone(),
                source,
            })?;

        Ok(Self {
            http,
            config: config.clone(),
            reference: Arc::new(OnceCell::new()),
        })
    }

    /// Repository information, including the available refs
    pub async fn api_info(&self) -> Result<ApiInfo, CmsError> {
        let mut url = self.config.endpoint.trim_end_matches('/').to_string();
        if let Some(token) = &self.config.access_token {
            url = format!("{}?access_token={}", url, encode_param(token));
        }
        self.get_json(&url).await
    }

    /// The configured ref, or the repository's master ref
    pub async fn content_ref(&self) -> Result<&str, CmsError> {
        let reference = self
            .reference
            .get_or_try_init(|| async {
                if let Some(reference) = &self.config.content_ref {
                    return Ok(reference.clone());
                }
                let info = self.api_info().await?;
                let master = info.master_ref().ok_or(CmsError::NoMasterRef)?;
                tracing::debug!("Using master ref {}", master);
                Ok::<_, CmsError>(master.to_string())
            })
            .await?;
        Ok(reference.as_str())
    }

    /// Run one search and return its first page
    pub async fn query(&self, query: &Query) -> Result<SearchResponse<Document>, CmsError> {
        let reference = self.content_ref().await?;
        let url = query.to_url(
            &self.config.endpoint,
            reference,
            self.config.access_token.as_deref(),
        );
        self.get_json(&url).await
    }

    /// Run a search and follow `next_page` until the results are exhausted
    pub async fn query_all(&self, query: &Query) -> Result<Vec<Document>, CmsError> {
        let query = query.clone().page_size(ENUMERATION_PAGE_SIZE);
        let mut page = self.query(&query).await?;
        let mut documents = std::mem::take(&mut page.results);

        while let Some(cursor) = page.cursor().map(str::to_string) {
            page = self.fetch_page(&cursor).await?;
            if page.results.is_empty() {
                break;
            }
            documents.append(&mut page.results);
        }

        tracing::debug!("Enumerated {} documents", documents.len());
        Ok(documents)
    }

    /// Every document of the configured post type
    pub async fn all_posts(&self) -> Result<Vec<Document>, CmsError> {
        self.query_all(&Query::document_type(&self.config.document_type))
            .await
    }

    /// First page of the listing query
    pub async fn listing_page(&self) -> Result<SearchResponse<Document>, CmsError> {
        let query = Query::document_type(&self.config.document_type)
            .page_size(self.config.page_size)
            .fetch(self.config.fetch.iter().cloned())
            .orderings(self.config.orderings.clone());
        self.query(&query).await
    }

    /// Fetch one document by its uid
    pub async fn get_by_uid(&self, doc_type: &str, uid: &str) -> Result<Document, CmsError> {
        let query = Query::document_type(doc_type)
            .predicate(Predicate::at(format!("my.{}.uid", doc_type), uid))
            .page_size(1);

        let mut page = self.query(&query).await?;
        if page.results.is_empty() {
            return Err(CmsError::NotFound {
                doc_type: doc_type.to_string(),
                uid: uid.to_string(),
            });
        }
        Ok(page.results.swap_remove(0))
    }

    /// Fetch the post with the given uid
    pub async fn get_post(&self, uid: &str) -> Result<Document, CmsError> {
        self.get_by_uid(&self.config.document_type, uid).await
    }

    /// GET on an opaque pagination cursor
    pub async fn fetch_cursor(&self, cursor: &str) -> Result<SearchResponse<Document>, CmsError> {
        if !same_origin(&self.config.endpoint, cursor) {
            return Err(CmsError::InvalidCursor(cursor.to_string()));
        }

        let url = match &self.config.access_token {
            Some(token) if !cursor.contains("access_token=") => {
                let sep = if cursor.contains('?') { '&' } else { '?' };
                format!("{}{}access_token={}", cursor, sep, encode_param(token))
            }
            _ => cursor.to_string(),
        };
        self.get_json(&url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CmsError> {
        let shown = redact_token(url);
        tracing::debug!("GET {}", shown);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| CmsError::Http {
                url: shown.clone(),
                source: source.without_url(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CmsError::Status {
                url: shown,
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| CmsError::Http {
            url: shown.clone(),
            source: source.without_url(),
        })?;

        serde_json::from_str(&body).map_err(|source| CmsError::Decode { url: shown, source })
    }
}

impl PageSource for CmsClient {
    async fn fetch_page(&self, cursor: &str) -> Result<SearchResponse<Document>, CmsError> {
        self.fetch_cursor(cursor).await
    }
}

/// `scheme://host[:port]` of a URL
fn origin(url: &str) -> Option<&str> {
    let scheme_end = url.find("://")? + 3;
    let host_end = url[scheme_end..]
        .find(['/', '?', '#'])
        .map(|i| scheme_end + i)
        .unwrap_or(url.len());
    if host_end == scheme_end {
        return None;
    }
    Some(&url[..host_end])
}

/// Whether a cursor points at the same scheme and host as the endpoint
fn same_origin(endpoint: &str, cursor: &str) -> bool {
    match (origin(endpoint), origin(cursor)) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

/// Hide the access token before a URL reaches logs or error messages
fn redact_token(url: &str) -> String {
    match url.find("access_token=") {
        Some(start) => {
            let value_start = start + "access_token=".len();
            let value_end = url[value_start..]
                .find('&')
                .map(|i| value_start + i)
                .unwrap_or(url.len());
            format!("{}***{}", &url[..value_start], &url[value_end..])
        }
        None => url.to_string(),
    }
}
