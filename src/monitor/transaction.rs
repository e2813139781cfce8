//! Transaction lifecycle helpers.

use std::sync::Arc;

use sentry::protocol::SpanStatus;
use sentry::{Hub, Transaction, TransactionContext};

/// Owns one transaction and finishes it exactly once.
///
/// The transaction is always finished on the hub it was started on, so it
/// picks up that hub's scope whichever task drops the guard. Dropping an
/// unfinished guard still finishes it: with `internal_error` while
/// unwinding, with `cancelled` otherwise (the future that owned it was
/// dropped).
#[must_use = "dropping the guard finishes the transaction immediately"]
pub struct TransactionGuard {
    hub: Arc<Hub>,
    transaction: Option<Transaction>,
}

impl TransactionGuard {
    /// Start a transaction on `hub`.
    pub fn start(hub: &Arc<Hub>, name: &str, op: &str) -> Self {
        let ctx = TransactionContext::new(name, op);
        Self {
            transaction: Some(hub.start_transaction(ctx)),
            hub: hub.clone(),
        }
    }

    /// The live transaction.
    pub fn transaction(&self) -> Option<&Transaction> {
        self.transaction.as_ref()
    }

    pub fn rename(&self, name: &str) {
        if let Some(tx) = &self.transaction {
            tx.set_name(name);
        }
    }

    /// Set `status` and finish.
    pub fn finish(mut self, status: SpanStatus) {
        self.close(status);
    }

    fn close(&mut self, status: SpanStatus) {
        if let Some(tx) = self.transaction.take() {
            tx.set_status(status);
            Hub::run(self.hub.clone(), || tx.finish());
        }
    }
}

impl Drop for TransactionGuard {
    fn drop(&mut self) {
        let status = if std::thread::panicking() {
            SpanStatus::InternalError
        } else {
            SpanStatus::Cancelled
        };
        self.close(status);
    }
}

/// Span status for an HTTP response code.
pub fn status_for_http(code: u16) -> SpanStatus {
    match code {
        100..=399 => SpanStatus::Ok,
        400 => SpanStatus::InvalidArgument,
        401 => SpanStatus::Unauthenticated,
        403 => SpanStatus::PermissionDenied,
        404 => SpanStatus::NotFound,
        409 => SpanStatus::AlreadyExists,
        413 => SpanStatus::FailedPrecondition,
        429 => SpanStatus::ResourceExhausted,
        499 => SpanStatus::Cancelled,
        400..=499 => SpanStatus::InvalidArgument,
        501 => SpanStatus::Unimplemented,
        503 => SpanStatus::Unavailable,
        504 => SpanStatus::DeadlineExceeded,
        500..=599 => SpanStatus::InternalError,
        _ => SpanStatus::UnknownError,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(status_for_http(200), SpanStatus::Ok);
        assert_eq!(status_for_http(302), SpanStatus::Ok);
        assert_eq!(status_for_http(404), SpanStatus::NotFound);
        assert_eq!(status_for_http(418), SpanStatus::InvalidArgument);
        assert_eq!(status_for_http(429), SpanStatus::ResourceExhausted);
        assert_eq!(status_for_http(500), SpanStatus::InternalError);
        assert_eq!(status_for_http(503), SpanStatus::Unavailable);
        assert_eq!(status_for_http(600), SpanStatus::UnknownError);
    }

    #[test]
    fn test_dropped_guard_finishes_once_as_cancelled() {
        let envelopes = sentry::test::with_captured_envelopes_options(
            || {
                let hub = Hub::current();
                let guard = TransactionGuard::start(&hub, "/orders", "http.server");
                guard.rename("route:/orders");
                drop(guard);
            },
            sentry::ClientOptions {
                traces_sample_rate: 1.0,
                ..Default::default()
            },
        );

        let sent: Vec<_> = envelopes
            .iter()
            .flat_map(|e| e.items())
            .filter_map(|item| match item {
                sentry::protocol::EnvelopeItem::Transaction(tx) => Some(tx.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].name.as_deref(), Some("route:/orders"));
        match sent[0].contexts.get("trace") {
            Some(sentry::protocol::Context::Trace(trace)) => {
                assert_eq!(trace.status, Some(SpanStatus::Cancelled));
            }
            other => panic!("missing trace context: {other:?}"),
        }
    }
}
