//! Shared utilities for the integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::sync::Mutex;

use async_trait::async_trait;
use sentry::protocol::{Context, Envelope, EnvelopeItem, Event, SpanStatus, Transaction};
use sentry::ClientOptions;

use sentryx::db::{Execute, Statement};
use sentryx::{Identity, Job};

/// Client options capturing every transaction.
pub fn options() -> ClientOptions {
    ClientOptions {
        traces_sample_rate: 1.0,
        ..ClientOptions::default()
    }
}

/// Run `f` on a current-thread runtime so the test hub stays current.
pub fn block_on<F: Future>(f: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
        .block_on(f)
}

/// Run async `f` against a capturing client and return what it sent.
pub fn capture<F, Fut>(f: F) -> Vec<Envelope>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = ()>,
{
    sentry::test::with_captured_envelopes_options(|| block_on(f()), options())
}

pub fn transactions(envelopes: &[Envelope]) -> Vec<Transaction<'static>> {
    envelopes
        .iter()
        .flat_map(|e| e.items())
        .filter_map(|item| match item {
            EnvelopeItem::Transaction(tx) => Some(tx.clone()),
            _ => None,
        })
        .collect()
}

pub fn events(envelopes: &[Envelope]) -> Vec<Event<'static>> {
    envelopes
        .iter()
        .flat_map(|e| e.items())
        .filter_map(|item| match item {
            EnvelopeItem::Event(event) => Some(event.clone()),
            _ => None,
        })
        .collect()
}

/// Status recorded in the transaction's trace context.
pub fn status(tx: &Transaction<'static>) -> Option<SpanStatus> {
    match tx.contexts.get("trace") {
        Some(Context::Trace(trace)) => trace.status.clone(),
        _ => None,
    }
}

/// Operation recorded in the transaction's trace context.
pub fn op(tx: &Transaction<'static>) -> Option<String> {
    match tx.contexts.get("trace") {
        Some(Context::Trace(trace)) => trace.op.clone(),
        _ => None,
    }
}

/// A signed-in user.
pub struct Member {
    pub pk: u64,
    pub email: &'static str,
    pub username: &'static str,
}

impl Identity for Member {
    fn id(&self) -> String {
        self.pk.to_string()
    }

    fn email(&self) -> Option<&str> {
        Some(self.email)
    }

    fn username(&self) -> Option<&str> {
        Some(self.username)
    }
}

pub fn alice() -> Member {
    Member {
        pk: 7,
        email: "alice@example.com",
        username: "alice",
    }
}

/// In-memory database that records what it was asked to run.
#[derive(Default)]
pub struct FakeDb {
    pub executed: Mutex<Vec<String>>,
}

#[async_trait]
impl Execute for FakeDb {
    type Output = u64;
    type Error = String;

    async fn execute(&self, statement: &Statement<'_>) -> Result<u64, String> {
        self.executed.lock().unwrap().push(statement.sql.to_string());
        if statement.sql.contains("missing_table") {
            Err("relation \"missing_table\" does not exist".to_string())
        } else {
            Ok(1)
        }
    }
}

/// A job whose description can be made to fail.
pub struct SendEmail {
    pub to: &'static str,
    pub describable: bool,
}

impl Job for SendEmail {
    fn job_class(&self) -> &str {
        "app.jobs.SendEmail"
    }

    fn describe(&self) -> serde_json::Result<serde_json::Value> {
        if self.describable {
            Ok(serde_json::json!({ "job_class": self.job_class(), "to": self.to }))
        } else {
            serde_json::from_str("{not json")
        }
    }
}
