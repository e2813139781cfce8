//! Request capture for error events.
//!
//! # Responsibilities
//! - Reconstruct the absolute URL the client requested
//! - Snapshot method and query string
//! - Buffer small bodies so events can show them
//!
//! # Design Decisions
//! - Bodies are only buffered with a known Content-Length under the limit;
//!   streaming bodies are never consumed on behalf of monitoring
//! - Body decoding is deferred to event time and is best-effort
//! - A body that cannot be captured is passed on untouched

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Request, Uri};
use futures_util::{future, stream, StreamExt};
use sentry::protocol;
use url::Url;

use crate::monitor::best_effort;

/// What an error event needs to know about the request.
#[derive(Debug, Clone)]
pub struct RequestSnapshot {
    pub url: String,
    pub method: String,
    pub query_string: String,
    pub path: String,
    pub body: Option<Bytes>,
}

impl RequestSnapshot {
    /// Capture everything except the body.
    pub fn capture<B>(req: &Request<B>) -> Self {
        Self {
            url: absolute_url(req.uri(), req.headers()),
            method: req.method().to_string(),
            query_string: req.uri().query().unwrap_or_default().to_string(),
            path: req.uri().path().to_string(),
            body: None,
        }
    }

    /// The SDK request record, body included only when `with_body`.
    pub fn to_request(&self, with_body: bool) -> protocol::Request {
        self.merge_into(protocol::Request::default(), with_body)
    }

    /// Overlay this snapshot on an event's existing request record.
    pub fn merge_into(&self, mut info: protocol::Request, with_body: bool) -> protocol::Request {
        info.url = best_effort("request.url", || Url::parse(&self.url));
        info.method = Some(self.method.clone());
        info.query_string = Some(self.query_string.clone());
        if with_body {
            if let Some(body) = &self.body {
                if let Some(text) = best_effort("request.body", || std::str::from_utf8(body)) {
                    info.data = Some(text.to_string());
                }
            }
        }
        info
    }
}

/// Rebuild `scheme://host/path?query` from the URI and headers.
///
/// Scheme comes from the URI, then `X-Forwarded-Proto`, then `http`; host
/// from the URI authority, then the `Host` header.
pub fn absolute_url(uri: &Uri, headers: &HeaderMap) -> String {
    let scheme = uri
        .scheme_str()
        .or_else(|| header_str(headers, "x-forwarded-proto"))
        .unwrap_or("http");
    let host = uri
        .authority()
        .map(|a| a.as_str())
        .or_else(|| header_str(headers, header::HOST.as_str()))
        .unwrap_or("localhost");
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

    format!("{scheme}://{host}{path_and_query}")
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Buffer the body when it is declared and no larger than `limit`.
///
/// Returns the rebuilt request and the buffered bytes. The request always
/// goes on: a body that fails to read, or turns out larger than declared,
/// is replayed to the handler as received (error included) and is not
/// captured.
pub async fn buffer_body(req: Request<Body>, limit: usize) -> (Request<Body>, Option<Bytes>) {
    let declared = header_str(req.headers(), header::CONTENT_LENGTH.as_str())
        .and_then(|v| v.trim().parse::<usize>().ok());

    match declared {
        Some(len) if len > 0 && len <= limit => {}
        _ => {
            tracing::debug!(declared = ?declared, limit, "Request body not captured");
            return (req, None);
        }
    }

    let (parts, body) = req.into_parts();
    let mut data = body.into_data_stream();
    let mut buffered = Vec::new();

    while let Some(chunk) = data.next().await {
        match chunk {
            Ok(bytes) if buffered.len() + bytes.len() <= limit => {
                buffered.extend_from_slice(&bytes);
            }
            Ok(bytes) => {
                tracing::debug!(limit, "Request body exceeds limit, not captured");
                buffered.extend_from_slice(&bytes);
                let replay = stream::once(future::ready(Ok(Bytes::from(buffered)))).chain(data);
                return (Request::from_parts(parts, Body::from_stream(replay)), None);
            }
            Err(e) => {
                tracing::debug!(error = %e, "Failed to read request body");
                let replay = stream::iter([Ok(Bytes::from(buffered)), Err(e)]);
                return (Request::from_parts(parts, Body::from_stream(replay)), None);
            }
        }
    }

    let bytes = Bytes::from(buffered);
    (Request::from_parts(parts, Body::from(bytes.clone())), Some(bytes))
}
