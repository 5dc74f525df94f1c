//! Error types for CMS access and pagination

use thiserror::Error;

/// Errors raised while talking to the CMS
#[derive(Error, Debug)]
pub enum CmsError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no {doc_type} document with uid {uid:?}")]
    NotFound { doc_type: String, uid: String },

    #[error("cursor {0:?} does not point at the configured CMS")]
    InvalidCursor(String),

    #[error("the CMS did not advertise a master ref")]
    NoMasterRef,
}

impl CmsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CmsError::NotFound { .. })
    }
}

/// Errors raised by the load-more state machine
#[derive(Error, Debug)]
pub enum PaginationError {
    #[error("there are no more posts to load")]
    Exhausted,

    #[error("a load is already in flight")]
    InFlight,

    #[error(transparent)]
    Fetch(#[from] CmsError),
}
