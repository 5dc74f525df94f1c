//! Listing pagination: the "load more" state machine and the static feed

mod feed;

pub use feed::{FeedItem, FeedPage};

use crate::cms::{Document, PageSource, SearchResponse};
use crate::content::PostSummary;
use crate::error::{CmsError, PaginationError};
use crate::helpers::Helpers;

/// Posts loaded so far and the cursor of the next page
///
/// `posts` only grows, in arrival order, without deduplication. Once the
/// cursor is gone it never comes back, so the load-more control stays
/// hidden for the rest of the session.
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    posts: Vec<PostSummary>,
    next_page: Option<String>,
    in_flight: bool,
    last_error: Option<String>,
}

impl PaginationState {
    pub fn new(posts: Vec<PostSummary>, next_page: Option<String>) -> Self {
        Self {
            posts,
            next_page: normalize_cursor(next_page),
            in_flight: false,
            last_error: None,
        }
    }

    /// State after the first listing query
    pub fn from_page(page: &SearchResponse<Document>, helpers: &Helpers) -> Self {
        Self::new(
            PostSummary::from_documents(&page.results, helpers),
            page.cursor().map(str::to_string),
        )
    }

    pub fn posts(&self) -> &[PostSummary] {
        &self.posts
    }

    pub fn next_page(&self) -> Option<&str> {
        self.next_page.as_deref()
    }

    /// Whether the load-more control should be offered
    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    /// Message of the last failed load, cleared by the next success
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Claim the cursor for a new request
    pub fn begin_load(&mut self) -> Result<String, PaginationError> {
        if self.in_flight {
            return Err(PaginationError::InFlight);
        }
        let cursor = self.next_page.clone().ok_or(PaginationError::Exhausted)?;
        self.in_flight = true;
        Ok(cursor)
    }

    /// Append a fetched page and take over its cursor; returns how many posts were added
    pub fn complete(&mut self, page: SearchResponse<Document>, helpers: &Helpers) -> usize {
        let added = PostSummary::from_documents(&page.results, helpers);
        let count = added.len();
        self.posts.extend(added);
        self.next_page = normalize_cursor(page.next_page);
        self.in_flight = false;
        self.last_error = None;
        count
    }

    /// Record a failed request; the cursor stays so the user can retry
    pub fn fail(&mut self, error: &CmsError) {
        tracing::warn!("Loading more posts failed: {}", error);
        self.in_flight = false;
        self.last_error = Some(error.to_string());
    }

    /// Fetch the next page through `source` and append it
    ///
    /// Dropping the returned future before it resolves applies nothing and
    /// releases the in-flight flag.
    pub async fn load_more<S: PageSource>(
        &mut self,
        source: &S,
        helpers: &Helpers,
    ) -> Result<usize, PaginationError> {
        let cursor = self.begin_load()?;
        let guard = LoadGuard { state: self };

        match source.fetch_page(&cursor).await {
            Ok(page) => Ok(guard.state.complete(page, helpers)),
            Err(e) => {
                guard.state.fail(&e);
                Err(e.into())
            }
        }
    }
}

/// Clears the in-flight flag however the load ends
struct LoadGuard<'a> {
    state: &'a mut PaginationState,
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        self.state.in_flight = false;
    }
}

fn normalize_cursor(cursor: Option<String>) -> Option<String> {
    cursor.filter(|c| !c.trim().is_empty())
}
