//! Best-effort combinators for event enrichment.
//!
//! Only enrichment goes through these. Request handlers, jobs and queries
//! are never wrapped: their errors and panics reach the host unchanged.

use std::fmt::Display;
use std::panic::{catch_unwind, AssertUnwindSafe};

use sentry::protocol::Event;

/// Run `f`, logging and discarding its error.
pub fn best_effort<T, E, F>(what: &'static str, f: F) -> Option<T>
where
    E: Display,
    F: FnOnce() -> Result<T, E>,
{
    match f() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(enrichment = what, error = %e, "Enrichment skipped");
            None
        }
    }
}

/// Wrap an event processor so a panic inside it leaves the event as it was.
pub fn enrichment<F>(
    what: &'static str,
    processor: F,
) -> impl Fn(Event<'static>) -> Option<Event<'static>> + Send + Sync + 'static
where
    F: Fn(Event<'static>) -> Option<Event<'static>> + Send + Sync + 'static,
{
    move |event: Event<'static>| {
        let untouched = event.clone();
        match catch_unwind(AssertUnwindSafe(|| processor(event))) {
            Ok(processed) => processed,
            Err(_) => {
                tracing::debug!(enrichment = what, "Event processor panicked");
                Some(untouched)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_effort_passes_values_through() {
        assert_eq!(best_effort("num", || "42".parse::<u32>()), Some(42));
    }

    #[test]
    fn test_best_effort_swallows_errors() {
        assert_eq!(best_effort("num", || "forty-two".parse::<u32>()), None);
    }

    #[test]
    fn test_panicking_processor_returns_original_event() {
        let processor = enrichment("boom", |mut event: Event<'static>| {
            event.message = Some("half-done".to_string());
            panic!("processor bug");
        });

        let event = Event {
            message: Some("original".to_string()),
            ..Event::default()
        };
        let out = processor(event).expect("event must survive");
        assert_eq!(out.message.as_deref(), Some("original"));
    }

    #[test]
    fn test_processor_can_still_drop_events() {
        let processor = enrichment("drop", |_event| None);
        assert!(processor(Event::default()).is_none());
    }
}
