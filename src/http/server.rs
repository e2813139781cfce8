//! HTTP server setup for the demo application.
//!
//! # Responsibilities
//! - Create the Axum router with the demo pages
//! - Wire up middleware (monitoring, access logs)
//! - Bind server to listener and shut down gracefully

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse},
    routing::get,
    Extension, Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::http::middleware::sentry_middleware;
use crate::http::route::RouteMatch;
use crate::lifecycle::shutdown_signal;
use crate::monitor::{Monitor, MonitorScope};
use crate::snippet::{Snippet, SnippetError, SnippetRenderer, TemplateContext};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub monitor: Monitor,
    pub renderer: Arc<SnippetRenderer>,
}

/// HTTP server for the demo application.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: AppConfig) -> Result<Self, SnippetError> {
        let state = AppState {
            monitor: Monitor::from_config(&config),
            renderer: Arc::new(SnippetRenderer::new()?),
        };
        let router = Self::build_router(state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(state: AppState) -> Router {
        let monitor = state.monitor.clone();
        Router::new()
            .route("/", get(index))
            .route("/health", get(health))
            .route("/boom", get(boom))
            .with_state(state)
            .route_layer(middleware::from_fn_with_state(monitor, sentry_middleware))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

async fn index(
    State(state): State<AppState>,
    Extension(scope): Extension<MonitorScope>,
) -> impl IntoResponse {
    scope.set_route(
        RouteMatch::new("/")
            .url_name("index")
            .view("index", "sentryx::http::server::index"),
    );
    render_page(&state, Snippet::Js, None, "<h1>sentryx</h1>")
}

async fn health() -> &'static str {
    "ok"
}

async fn boom(
    State(state): State<AppState>,
    Extension(scope): Extension<MonitorScope>,
) -> impl IntoResponse {
    let error = std::io::Error::other("demo failure");
    let event_id = scope.capture_error(&error);
    tracing::debug!(%event_id, "Captured demo failure");

    let (_, page) = render_page(
        &state,
        Snippet::Feedback,
        Some(event_id.to_string()),
        "<h1>Something went wrong</h1>",
    );
    (StatusCode::INTERNAL_SERVER_ERROR, page)
}

fn render_page(
    state: &AppState,
    snippet: Snippet,
    last_event_id: Option<String>,
    body: &str,
) -> (StatusCode, Html<String>) {
    let ctx = TemplateContext::Request { user: None };
    let context = snippet.context(state.monitor.settings(), &ctx, last_event_id);
    match state.renderer.render(&context) {
        Ok(head) => (
            StatusCode::OK,
            Html(format!("<!doctype html><html><head>{head}</head><body>{body}</body></html>")),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render monitoring snippet");
            (
                StatusCode::OK,
                Html(format!("<!doctype html><html><body>{body}</body></html>")),
            )
        }
    }
}
