//! Per-statement spans.

use std::future::Future;
use std::sync::Arc;

use sentry::protocol::{Breadcrumb, Map, SpanStatus, Value};
use sentry::{Hub, Span, TransactionOrSpan};

use crate::db::{ConnectionInfo, Statement};

/// Opens one `db` span per executed statement.
///
/// Handed out by [`MonitorScope::queries`](crate::monitor::MonitorScope::queries)
/// for the duration of one request or job.
#[derive(Clone)]
pub struct QueryTracer {
    hub: Arc<Hub>,
    parent: TransactionOrSpan,
    connection: Arc<ConnectionInfo>,
}

impl QueryTracer {
    pub fn new(hub: Arc<Hub>, parent: TransactionOrSpan, connection: Arc<ConnectionInfo>) -> Self {
        Self {
            hub,
            parent,
            connection,
        }
    }

    pub fn connection(&self) -> &ConnectionInfo {
        &self.connection
    }

    /// Run `execute` inside a span for `statement`.
    ///
    /// The span is closed exactly once, after `execute` returns or unwinds.
    /// The result is returned untouched.
    pub fn trace<T, E, F>(&self, statement: &Statement<'_>, execute: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let span = self.open(statement);
        let result = execute();
        span.close(result.is_ok());
        result
    }

    /// Async form of [`trace`](Self::trace).
    pub async fn trace_async<T, E, Fut>(&self, statement: &Statement<'_>, execute: Fut) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
    {
        let span = self.open(statement);
        let result = execute.await;
        span.close(result.is_ok());
        result
    }

    fn open(&self, statement: &Statement<'_>) -> SpanGuard {
        let data = self.span_data(statement);

        self.hub.add_breadcrumb(Breadcrumb {
            category: Some("query".to_string()),
            message: Some(statement.sql.to_string()),
            data: data.clone(),
            ..Breadcrumb::default()
        });

        let span = self.parent.start_child("db", statement.sql);
        for (key, value) in data {
            span.set_data(&key, value);
        }
        SpanGuard { span: Some(span) }
    }

    fn span_data(&self, statement: &Statement<'_>) -> Map<String, Value> {
        let conn = &self.connection;
        let mut data = Map::new();
        data.insert("db.params".into(), statement.params.clone());
        data.insert("db.executemany".into(), Value::Bool(statement.many));
        data.insert("db.system".into(), Value::from(conn.vendor.clone()));
        data.insert("db.name".into(), Value::from(conn.name.clone()));
        data.insert("db.user".into(), Value::from(conn.user.clone()));
        data.insert("server.address".into(), Value::from(conn.host.clone()));
        data.insert("server.port".into(), Value::from(conn.port));
        data
    }
}

impl std::fmt::Debug for QueryTracer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryTracer")
            .field("connection", &self.connection)
            .finish_non_exhaustive()
    }
}

struct SpanGuard {
    span: Option<Span>,
}

impl SpanGuard {
    fn close(mut self, ok: bool) {
        if let Some(span) = self.span.take() {
            span.set_status(if ok { SpanStatus::Ok } else { SpanStatus::InternalError });
            span.finish();
        }
    }
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        if let Some(span) = self.span.take() {
            let status = if std::thread::panicking() {
                SpanStatus::InternalError
            } else {
                SpanStatus::Cancelled
            };
            span.set_status(status);
            span.finish();
        }
    }
}
