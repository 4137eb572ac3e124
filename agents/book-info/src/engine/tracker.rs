//! Dependency call tracking
//!
//! Brackets external calls with begin/end markers on the monitoring sink.
//! A span is ended exactly once on every path: explicitly through the guard,
//! or by the guard's `Drop` if the call panicked or was cancelled.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use txn_span::{MonitoringSink, SpanHandle, TransactionHandle};

/// Error recorded for a span whose guard was dropped without being ended.
pub const DROPPED_SPAN_ERROR: &str = "span dropped before completion";

/// Opens dependency spans on a monitoring sink
#[derive(Clone)]
pub struct DependencyTracker {
    sink: Arc<dyn MonitoringSink>,
}

impl DependencyTracker {
    pub fn new(sink: Arc<dyn MonitoringSink>) -> Self {
        Self { sink }
    }

    /// Begin a span on `target` inside `transaction`.
    pub fn begin(&self, transaction: &TransactionHandle, target: &str) -> SpanGuard {
        SpanGuard {
            sink: Arc::clone(&self.sink),
            span: Some(self.sink.begin_span(transaction, target)),
        }
    }

    /// Run `call` inside a span on `target`. The span fails with the
    /// call's error, which is then returned unchanged.
    pub async fn track<F, T, E>(
        &self,
        transaction: &TransactionHandle,
        target: &str,
        call: F,
    ) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: Display,
    {
        let guard = self.begin(transaction, target);
        let result = call.await;
        match &result {
            Ok(_) => guard.end(),
            Err(e) => guard.fail(e),
        }
        result
    }
}

/// An open dependency span. Ends the span when consumed or dropped.
#[must_use = "dropping a SpanGuard ends its span as failed"]
pub struct SpanGuard {
    sink: Arc<dyn MonitoringSink>,
    span: Option<SpanHandle>,
}

impl SpanGuard {
    /// End the span successfully.
    pub fn end(mut self) {
        self.finish(None);
    }

    /// End the span as failed.
    pub fn fail(mut self, error: impl Display) {
        self.finish(Some(&error.to_string()));
    }

    fn finish(&mut self, error: Option<&str>) {
        if let Some(span) = self.span.take() {
            self.sink.end_span(span, error);
        }
    }
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        self.finish(Some(DROPPED_SPAN_ERROR));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use txn_span::{InMemorySink, SinkEvent, SpanStatus};

    fn setup() -> (Arc<InMemorySink>, DependencyTracker) {
        let sink = Arc::new(InMemorySink::default());
        let tracker = DependencyTracker::new(sink.clone());
        (sink, tracker)
    }

    fn span_ends(sink: &InMemorySink) -> Vec<bool> {
        sink.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::SpanEnded { failed, .. } => Some(failed),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_track_success_ends_span_once() {
        let (sink, tracker) = setup();
        let txn = sink.begin_transaction("t", None);

        let value: Result<u32, String> = tracker.track(&txn, "db", async { Ok(7) }).await;
        assert_eq!(value.unwrap(), 7);

        let finished = sink.end_transaction(txn, None).unwrap();
        assert_eq!(finished.children.len(), 1);
        assert_eq!(finished.children[0].status, SpanStatus::Completed);
        assert_eq!(span_ends(&sink), vec![false]);
    }

    #[tokio::test]
    async fn test_track_error_fails_span_and_returns_error() {
        let (sink, tracker) = setup();
        let txn = sink.begin_transaction("t", None);

        let value: Result<(), String> = tracker
            .track(&txn, "Penguin Books", async { Err("connection refused".to_string()) })
            .await;
        assert_eq!(value.unwrap_err(), "connection refused");

        let finished = sink.end_transaction(txn, None).unwrap();
        assert_eq!(finished.children[0].status, SpanStatus::Failed);
        assert_eq!(finished.children[0].error.as_deref(), Some("connection refused"));
        assert_eq!(span_ends(&sink), vec![true]);
    }

    #[tokio::test]
    async fn test_dropped_guard_ends_span_as_failed() {
        let (sink, tracker) = setup();
        let txn = sink.begin_transaction("t", None);

        {
            let _guard = tracker.begin(&txn, "db");
        }

        let finished = sink.end_transaction(txn, None).unwrap();
        assert_eq!(finished.children[0].error.as_deref(), Some(DROPPED_SPAN_ERROR));
        assert_eq!(span_ends(&sink), vec![true]);
    }

    #[tokio::test]
    async fn test_cancelled_call_still_ends_span() {
        let (sink, tracker) = setup();
        let txn = sink.begin_transaction("t", None);

        let pending = tracker.track(&txn, "db", async {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            Ok::<(), String>(())
        });
        let timed_out = tokio::time::timeout(std::time::Duration::from_millis(10), pending).await;
        assert!(timed_out.is_err());

        let finished = sink.end_transaction(txn, None).unwrap();
        assert_eq!(finished.children.len(), 1);
        assert_eq!(finished.children[0].status, SpanStatus::Failed);
        assert_eq!(span_ends(&sink), vec![true]);
    }
}
