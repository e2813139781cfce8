//! Background job monitoring.
//!
//! # Responsibilities
//! - Give each job its own hub and a cleared scope
//! - Attach the job description to events and to the transaction
//! - Trace the job's queries like a request's
//!
//! # Design Decisions
//! - Jobs carry no user
//! - The job description is serialized once, best-effort
//! - A job returning `Err` marks the transaction `internal_error`

use std::future::Future;
use std::sync::Arc;

use sentry::protocol::{SpanStatus, Value};
use sentry::{Hub, SentryFutureExt, TransactionOrSpan};
use serde_json::json;

use crate::monitor::{
    best_effort, enrichment, object_context, Monitor, MonitorScope, TransactionGuard,
};

/// Transaction operation for job executions.
pub const JOB_OP: &str = "worker.job";

/// Key under the event's `extra` payload holding the job.
pub const WORKER_EXTRA_KEY: &str = "worker";

/// A background job as seen by the monitor.
pub trait Job {
    /// Job class name; names the transaction.
    fn job_class(&self) -> &str;

    /// JSON description attached to events and the transaction.
    fn describe(&self) -> serde_json::Result<Value>;
}

impl Monitor {
    /// Run one job inside a `job:<class>` transaction.
    ///
    /// `run` receives the job's [`MonitorScope`]; its result is returned
    /// unchanged.
    pub async fn run_job<J, F, Fut, T, E>(&self, job: &J, run: F) -> Result<T, E>
    where
        J: Job + ?Sized,
        F: FnOnce(MonitorScope) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let hub = self.isolate();
        self.instrument_job(hub.clone(), job, run)
            .bind_hub(hub)
            .await
    }

    async fn instrument_job<J, F, Fut, T, E>(&self, hub: Arc<Hub>, job: &J, run: F) -> Result<T, E>
    where
        J: Job + ?Sized,
        F: FnOnce(MonitorScope) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let description = best_effort("job.describe", || job.describe());

        if let Some(description) = description.clone() {
            let processor = enrichment("job", move |mut event| {
                event
                    .extra
                    .insert(WORKER_EXTRA_KEY.to_string(), json!({ "job": description.clone() }));
                Some(event)
            });
            hub.configure_scope(|scope| scope.add_event_processor(processor));
        }

        let guard = TransactionGuard::start(&hub, &format!("job:{}", job.job_class()), JOB_OP);
        if let Some(tx) = guard.transaction() {
            tx.set_tag("transaction.source", "task");
            hub.configure_scope(|scope| scope.set_span(Some(tx.clone().into())));
        }

        let span: Option<TransactionOrSpan> = guard.transaction().cloned().map(Into::into);
        let queries = self.query_tracer(&hub, span);
        let scope = MonitorScope::new(
            hub.clone(),
            guard.transaction().cloned(),
            Default::default(),
            queries,
        );

        tracing::debug!(job_class = job.job_class(), "Running job");
        let result = run(scope).await;

        if let Some(description) = description {
            if let Some(tx) = guard.transaction() {
                tx.set_data("job", description.clone());
            }
            hub.configure_scope(|scope| scope.set_context("job", object_context(description)));
        }

        let status = match &result {
            Ok(_) => SpanStatus::Ok,
            Err(_) => SpanStatus::InternalError,
        };
        guard.finish(status);
        result
    }
}
