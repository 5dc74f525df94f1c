//! In-process CMS serving the search API over HTTP, for tests

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

use super::query::encode_param;
use crate::config::CmsConfig;

/// Largest page the fake hands out, whatever `pageSize` asks for
const MAX_PAGE_SIZE: usize = 2;

const MASTER_REF: &str = "master-ref";

#[derive(Clone)]
struct FakeState {
    endpoint: String,
    documents: Arc<Vec<Value>>,
    searches: Arc<AtomicUsize>,
}

/// A CMS repository on `127.0.0.1`, stopped when dropped
pub struct FakeCms {
    endpoint: String,
    searches: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl FakeCms {
    pub async fn start(documents: Vec<Value>) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/api/v2", listener.local_addr().unwrap());
        let searches = Arc::new(AtomicUsize::new(0));

        let state = FakeState {
            endpoint: endpoint.clone(),
            documents: Arc::new(documents),
            searches: Arc::clone(&searches),
        };
        let app = Router::new()
            .route("/api/v2", get(api_info))
            .route("/api/v2/documents/search", get(search))
            .with_state(state);

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            endpoint,
            searches,
            handle,
        }
    }

    /// CMS settings pointing at this repository
    pub fn config(&self) -> CmsConfig {
        CmsConfig {
            endpoint: self.endpoint.clone(),
            timeout_secs: 5,
            ..CmsConfig::default()
        }
    }

    /// Number of search requests served, cursors included
    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

impl Drop for FakeCms {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A published post document
pub fn post(uid: &str) -> Value {
    json!({
        "id": format!("id-{}", uid),
        "uid": uid,
        "type": "posts",
        "first_publication_date": "2021-03-15T19:25:28+0000",
        "last_publication_date": "2021-03-25T19:25:28+0000",
        "data": {
            "title": format!("Post {}", uid),
            "subtitle": "Subtitle",
            "author": "Joseph Oliveira",
            "banner": {"url": "https://images.cdn/banner.png"},
            "content": [
                {"heading": "Proin et varius", "body": [
                    {"type": "paragraph", "text": "Nullam dolor sapien", "spans": []}
                ]}
            ]
        }
    })
}

async fn api_info() -> Json<Value> {
    Json(json!({
        "refs": [
            {"id": "master", "ref": MASTER_REF, "label": "Master", "isMasterRef": true}
        ]
    }))
}

async fn search(
    State(state): State<FakeState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.searches.fetch_add(1, Ordering::SeqCst);

    let q = params.get("q").cloned().unwrap_or_default();
    let matching: Vec<&Value> = match uid_predicate(&q) {
        Some(uid) => state
            .documents
            .iter()
            .filter(|doc| doc["uid"] == uid.as_str())
            .collect(),
        None => state.documents.iter().collect(),
    };

    let page_size = params
        .get("pageSize")
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(MAX_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let page = params
        .get("page")
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(1)
        .max(1);
    let total_pages = matching.len().div_ceil(page_size).max(1);

    let results: Vec<Value> = matching
        .iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .map(|doc| (*doc).clone())
        .collect();
    let next_page = (page < total_pages).then(|| {
        format!(
            "{}/documents/search?ref={}&q={}&pageSize={}&page={}",
            state.endpoint,
            MASTER_REF,
            encode_param(&q),
            page_size,
            page + 1
        )
    });

    Json(json!({
        "page": page,
        "results_per_page": page_size,
        "results_size": results.len(),
        "total_results_size": matching.len(),
        "total_pages": total_pages,
        "next_page": next_page,
        "prev_page": null,
        "results": results,
    }))
}

/// Value of an `at(my.<type>.uid, "...")` predicate
fn uid_predicate(q: &str) -> Option<String> {
    const MARKER: &str = ".uid, \"";
    let start = q.find(MARKER)? + MARKER.len();
    let end = start + q[start..].find('"')?;
    Some(q[start..end].to_string())
}
