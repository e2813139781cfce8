//! Request monitoring middleware.
//!
//! Install with `axum::middleware::from_fn_with_state(monitor, sentry_middleware)`
//! through `Router::layer` or `Router::route_layer`. Either way the router's
//! matched pattern names the transaction when the handler reports no route
//! itself; requests that reach the fallback keep their raw path.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use sentry::protocol::Value;
use sentry::{Hub, SentryFutureExt, TransactionOrSpan};

use crate::config::UserContextMode;
use crate::http::request::{buffer_body, RequestSnapshot};
use crate::http::route::RouteMatch;
use crate::monitor::{
    enrichment, object_context, status_for_http, Monitor, MonitorScope, TransactionGuard,
    UserIdentity,
};

/// Transaction operation for inbound requests.
pub const HTTP_SERVER_OP: &str = "http.server";

/// Middleware function wrapping one request in a transaction.
pub async fn sentry_middleware(
    State(monitor): State<Monitor>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let hub = monitor.isolate();
    instrument(monitor, hub.clone(), req, next)
        .bind_hub(hub)
        .await
}

async fn instrument(monitor: Monitor, hub: Arc<Hub>, req: Request<Body>, next: Next) -> Response {
    let settings = monitor.settings();
    let mut snapshot = RequestSnapshot::capture(&req);

    let guard = TransactionGuard::start(&hub, &snapshot.path, HTTP_SERVER_OP);

    let req = if settings.pii_enabled {
        let (req, body) = buffer_body(req, settings.request_body_limit).await;
        snapshot.body = body;
        req
    } else {
        req
    };
    let snapshot = Arc::new(snapshot);

    let user_slot: Arc<ArcSwapOption<UserIdentity>> = Arc::new(ArcSwapOption::empty());
    if let Some(user) = req.extensions().get::<UserIdentity>() {
        user_slot.store(Some(Arc::new(user.clone())));
    }

    register_request_processor(&monitor, &hub, snapshot.clone(), user_slot.clone());

    if let Some(tx) = guard.transaction() {
        tx.set_request(snapshot.to_request(false));
        hub.configure_scope(|scope| scope.set_span(Some(tx.clone().into())));
    }

    let span: Option<TransactionOrSpan> = guard.transaction().cloned().map(Into::into);
    let queries = monitor.query_tracer(&hub, span);
    let scope = MonitorScope::new(hub.clone(), guard.transaction().cloned(), user_slot, queries);

    let matched = req
        .extensions()
        .get::<MatchedPath>()
        .map(|m| RouteMatch::resolve(m.as_str(), &snapshot.path));

    let mut req = req;
    req.extensions_mut().insert(scope.clone());

    let response = next.run(req).await;

    let route = scope.route().map(|r| (*r).clone()).or(matched);
    if let Some(route) = route {
        guard.rename(&route.transaction_name());
        if let Some(tx) = guard.transaction() {
            for (tag, value) in route.tags() {
                tx.set_tag(tag, value);
            }
            tx.set_data("url_params", route.url_params());
        }
        hub.configure_scope(|s| {
            s.set_context("url_params", object_context(route.url_params()))
        });
    }

    let code = response.status().as_u16();
    if let Some(tx) = guard.transaction() {
        tx.set_tag("http.status_code", code);
        tx.set_data("http.response.status_code", Value::from(code));
    }

    if settings.user_context == UserContextMode::Scope {
        if let Some(user) = scope.user() {
            let user = user.to_user(settings.pii_enabled);
            hub.configure_scope(|s| s.set_user(Some(user)));
        }
    }

    guard.finish(status_for_http(code));
    response
}

fn register_request_processor(
    monitor: &Monitor,
    hub: &Hub,
    snapshot: Arc<RequestSnapshot>,
    user_slot: Arc<ArcSwapOption<UserIdentity>>,
) {
    let pii_enabled = monitor.settings().pii_enabled;
    let inline_user = monitor.settings().user_context == UserContextMode::EventProcessor;

    let processor = enrichment("request", move |mut event| {
        let info = event.request.take().unwrap_or_default();
        event.request = Some(snapshot.merge_into(info, pii_enabled));

        if inline_user {
            if let Some(user) = user_slot.load_full() {
                event.user = Some(user.to_user(pii_enabled));
            }
        }
        Some(event)
    });

    hub.configure_scope(|scope| scope.add_event_processor(processor));
}
