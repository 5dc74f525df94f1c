//! Preview server with on-demand post generation

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinSet;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::generator::{Generator, PostOutcome};
use crate::helpers::is_safe_uid;

/// Where a post generated on demand stands
#[derive(Debug, Clone, PartialEq, Eq)]
enum FallbackStatus {
    Pending,
    Missing,
    Failed(String),
}

/// What a request for an ungenerated post gets
#[derive(Debug, Clone, PartialEq, Eq)]
enum Claim {
    /// First request: start generating
    Spawn,
    /// Already being generated
    Wait,
    /// The CMS has no such post
    Missing,
    /// Generation failed; reported once, then retried
    Failed(String),
}

/// Pending and finished on-demand generations, keyed by uid
#[derive(Debug, Clone, Default)]
struct FallbackTracker {
    statuses: Arc<Mutex<HashMap<String, FallbackStatus>>>,
}

impl FallbackTracker {
    fn claim(&self, uid: &str) -> Claim {
        let mut statuses = self.statuses.lock().unwrap_or_else(PoisonError::into_inner);
        match statuses.get(uid) {
            None => {
                statuses.insert(uid.to_string(), FallbackStatus::Pending);
                Claim::Spawn
            }
            Some(FallbackStatus::Pending) => Claim::Wait,
            Some(FallbackStatus::Missing) => Claim::Missing,
            Some(FallbackStatus::Failed(_)) => match statuses.remove(uid) {
                Some(FallbackStatus::Failed(message)) => Claim::Failed(message),
                _ => Claim::Spawn,
            },
        }
    }

    fn finish(&self, uid: &str, outcome: &Result<PostOutcome>) {
        let mut statuses = self.statuses.lock().unwrap_or_else(PoisonError::into_inner);
        match outcome {
            Ok(PostOutcome::Written(_)) => {
                statuses.remove(uid);
            }
            Ok(PostOutcome::Missing) => {
                statuses.insert(uid.to_string(), FallbackStatus::Missing);
            }
            Err(e) => {
                statuses.insert(uid.to_string(), FallbackStatus::Failed(format!("{:#}", e)));
            }
        }
    }
}

/// Server state
struct ServerState {
    public_dir: PathBuf,
    generator: Arc<Generator>,
    fallback: bool,
    tracker: FallbackTracker,
    tasks: Mutex<JoinSet<()>>,
}

impl ServerState {
    fn new(generator: Generator, fallback: bool) -> Self {
        Self {
            public_dir: generator.public_dir().to_path_buf(),
            generator: Arc::new(generator),
            fallback,
            tracker: FallbackTracker::default(),
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    /// Generate a post in the background
    fn spawn_generation(&self, uid: &str) {
        let generator = Arc::clone(&self.generator);
        let tracker = self.tracker.clone();
        let uid = uid.to_string();

        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        // Reap finished tasks
        while tasks.try_join_next().is_some() {}
        tasks.spawn(async move {
            tracing::info!("Generating post on demand: {}", uid);
            let outcome = generator.generate_post(&uid).await;
            if let Err(e) = &outcome {
                tracing::error!("Failed to generate post {}: {:#}", uid, e);
            }
            tracker.finish(&uid, &outcome);
        });
    }

    /// Abort every in-flight generation
    fn abort_generations(&self) {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .abort_all();
    }
}

/// Start the preview server
pub async fn start(generator: Generator, ip: &str, port: u16, fallback: bool) -> Result<()> {
    let state = Arc::new(ServerState::new(generator, fallback));

    let app = Router::new()
        .route("/post/:slug", get(post_handler))
        .route("/post/:slug/", get(post_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::clone(&state));

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    if fallback {
        println!("Posts missing from the build are generated on first request.");
    }
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.abort_generations();
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
    }
}

/// Serve a post page, generating it if the build did not
async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
) -> Response {
    serve_post(&state, &slug).await
}

async fn serve_post(state: &ServerState, uid: &str) -> Response {
    if !is_safe_uid(uid) {
        return not_found(state);
    }

    let file_path = state.public_dir.join("post").join(uid).join("index.html");
    if let Ok(content) = tokio::fs::read_to_string(&file_path).await {
        return Html(content).into_response();
    }

    if !state.fallback {
        return not_found(state);
    }

    match state.tracker.claim(uid) {
        Claim::Spawn => {
            state.spawn_generation(uid);
            loading(state)
        }
        Claim::Wait => loading(state),
        Claim::Missing => not_found(state),
        Claim::Failed(message) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to generate post {}: {}", uid, message),
        )
            .into_response(),
    }
}

/// Serve everything else straight from the public dir
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    let mut service = ServeDir::new(&state.public_dir).append_index_html_on_directories(true);
    match service.try_call(request).await {
        Ok(response) if response.status() == StatusCode::NOT_FOUND => not_found(&state),
        Ok(response) => response.into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
    }
}

fn loading(state: &ServerState) -> Response {
    match state.generator.render_loading() {
        Ok(html) => Html(html).into_response(),
        Err(e) => render_error(e),
    }
}

fn not_found(state: &ServerState) -> Response {
    match state.generator.render_not_found() {
        Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
        Err(e) => render_error(e),
    }
}

fn render_error(e: anyhow::Error) -> Response {
    tracing::error!("Failed to render page: {:#}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
}
