//! Job middleware behaviour.

mod common;

use sentry::protocol::{Context, SpanStatus, User};
use sentry::Level;
use serde_json::json;

use common::{capture, events, op, status, transactions, SendEmail};
use sentryx::worker::WORKER_EXTRA_KEY;
use sentryx::{Monitor, SentrySettings};

fn job(describable: bool) -> SendEmail {
    SendEmail {
        to: "bob@example.com",
        describable,
    }
}

#[test]
fn test_successful_job_transaction() {
    let envelopes = capture(|| async {
        let result: Result<u32, String> = Monitor::new(SentrySettings::default())
            .run_job(&job(true), |_scope| async { Ok(3) })
            .await;
        assert_eq!(result, Ok(3));
    });

    let txs = transactions(&envelopes);
    assert_eq!(txs.len(), 1);
    let tx = &txs[0];
    assert_eq!(tx.name.as_deref(), Some("job:app.jobs.SendEmail"));
    assert_eq!(op(tx).as_deref(), Some("worker.job"));
    assert_eq!(status(tx), Some(SpanStatus::Ok));
    assert_eq!(tx.tags["transaction.source"], "task");
}

#[test]
fn test_failed_job_error_passes_through() {
    let envelopes = capture(|| async {
        let result: Result<(), String> = Monitor::new(SentrySettings::default())
            .run_job(&job(true), |_scope| async { Err("smtp timeout".to_string()) })
            .await;
        assert_eq!(result, Err("smtp timeout".to_string()));
    });

    let txs = transactions(&envelopes);
    assert_eq!(txs.len(), 1);
    assert_eq!(status(&txs[0]), Some(SpanStatus::InternalError));
}

#[test]
fn test_events_carry_job_description() {
    let envelopes = capture(|| async {
        let _: Result<(), String> = Monitor::new(SentrySettings::default())
            .run_job(&job(true), |scope| async move {
                scope.capture_message("bounce", Level::Warning);
                Ok(())
            })
            .await;
    });

    let events = events(&envelopes);
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].extra[WORKER_EXTRA_KEY],
        json!({ "job": { "job_class": "app.jobs.SendEmail", "to": "bob@example.com" } })
    );
    assert!(events[0].user.is_none());
}

#[test]
fn test_undescribable_job_still_runs() {
    let envelopes = capture(|| async {
        let result: Result<&str, String> = Monitor::new(SentrySettings::default())
            .run_job(&job(false), |scope| async move {
                scope.capture_message("sent anyway", Level::Info);
                Ok("sent")
            })
            .await;
        assert_eq!(result, Ok("sent"));
    });

    let events = events(&envelopes);
    assert_eq!(events.len(), 1);
    assert!(!events[0].extra.contains_key(WORKER_EXTRA_KEY));
    assert_eq!(transactions(&envelopes).len(), 1);
}

#[test]
fn test_jobs_are_isolated_from_each_other() {
    let envelopes = capture(|| async {
        let monitor = Monitor::new(SentrySettings::default());
        let _: Result<(), String> = monitor
            .run_job(&job(true), |scope| async move {
                scope.hub().configure_scope(|s| s.set_tag("batch", "first"));
                Ok(())
            })
            .await;
        let _: Result<(), String> = monitor
            .run_job(&job(true), |scope| async move {
                scope.capture_message("second", Level::Info);
                Ok(())
            })
            .await;
    });

    let events = events(&envelopes);
    assert_eq!(events.len(), 1);
    assert!(!events[0].tags.contains_key("batch"));
    assert_eq!(transactions(&envelopes).len(), 2);
}

#[test]
fn test_dropped_job_is_finished_as_cancelled() {
    let envelopes = capture(|| async {
        let monitor = Monitor::new(SentrySettings::default());
        let sleeper = job(true);
        let run = monitor.run_job(&sleeper, |_scope| async {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            Ok::<(), String>(())
        });
        let timed_out = tokio::time::timeout(std::time::Duration::from_millis(10), run).await;
        assert!(timed_out.is_err());
    });

    let txs = transactions(&envelopes);
    assert_eq!(txs.len(), 1);
    assert_eq!(status(&txs[0]), Some(SpanStatus::Cancelled));
}

#[test]
fn test_job_transaction_ignores_caller_scope_and_carries_job_context() {
    let envelopes = capture(|| async {
        sentry::configure_scope(|scope| {
            scope.set_tag("ambient", "outer");
            scope.set_user(Some(User {
                id: Some("stale-user".to_string()),
                ..User::default()
            }));
        });

        let _: Result<(), String> = Monitor::new(SentrySettings::default())
            .run_job(&job(true), |_scope| async { Ok(()) })
            .await;
    });

    let txs = transactions(&envelopes);
    assert_eq!(txs.len(), 1);
    let tx = &txs[0];
    assert!(!tx.tags.contains_key("ambient"));
    assert!(tx.user.is_none());
    match tx.contexts.get("job") {
        Some(Context::Other(job)) => {
            assert_eq!(job["job_class"], json!("app.jobs.SendEmail"));
            assert_eq!(job["to"], json!("bob@example.com"));
        }
        other => panic!("expected job context, got {other:?}"),
    }
}
