//! Headless CMS access: queries, response envelopes and the HTTP client

mod client;
#[cfg(test)]
pub(crate) mod fake;
pub mod query;
mod response;

pub use client::CmsClient;
pub use query::{Predicate, Query};
pub use response::{ApiInfo, ApiRef, Document, SearchResponse};

use std::future::Future;

use crate::error::CmsError;

/// Anything that can resolve a pagination cursor into the next page
///
/// The CMS client implements it with a GET on the cursor URL; tests use
/// in-memory fakes.
pub trait PageSource {
    fn fetch_page(
        &self,
        cursor: &str,
    ) -> impl Future<Output = Result<SearchResponse<Document>, CmsError>> + Send;
}
