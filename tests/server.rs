//! End-to-end checks of the demo server over a real socket.

mod common;

use std::sync::Arc;

use sentry::protocol::SpanStatus;
use tokio::net::TcpListener;

use common::{capture, events, status, transactions};
use sentryx::http::{AppState, HttpServer};
use sentryx::{Monitor, SentrySettings, SnippetRenderer};

async fn spawn_server() -> String {
    let state = AppState {
        monitor: Monitor::new(SentrySettings {
            dsn: "https://abc123@o1.ingest.example.com/9".to_string(),
            environment: "test".to_string(),
            ..SentrySettings::default()
        }),
        renderer: Arc::new(SnippetRenderer::new().unwrap()),
    };
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = HttpServer::build_router(state);
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

#[test]
fn test_index_renders_loader_snippet() {
    let envelopes = capture(|| async {
        let base = spawn_server().await;
        let page = client()
            .get(format!("{base}/"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(page.contains("https://js.sentry-cdn.com/abc123.min.js"));
        assert!(page.contains("\"environment\":\"test\""));
        assert!(!page.contains("showReportDialog"));
    });

    let txs = transactions(&envelopes);
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].name.as_deref(), Some("route:/"));
    assert_eq!(txs[0].tags["url_name"], "index");
}

#[test]
fn test_failure_page_offers_feedback_dialog() {
    let envelopes = capture(|| async {
        let base = spawn_server().await;
        let response = client().get(format!("{base}/boom")).send().await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        let page = response.text().await.unwrap();
        assert!(page.contains("showReportDialog"));
    });

    let events = events(&envelopes);
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0]
            .request
            .as_ref()
            .and_then(|r| r.method.as_deref()),
        Some("GET")
    );

    let txs = transactions(&envelopes);
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].name.as_deref(), Some("route:/boom"));
    assert_eq!(status(&txs[0]), Some(SpanStatus::InternalError));
}

#[test]
fn test_health_is_traced() {
    let envelopes = capture(|| async {
        let base = spawn_server().await;
        let body = client()
            .get(format!("{base}/health"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "ok");
    });

    let txs = transactions(&envelopes);
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].name.as_deref(), Some("route:/health"));
}
