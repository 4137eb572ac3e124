//! Span tree builder for one transaction and its dependency spans.
//!
//! Enforces that every dependency span is closed before the transaction
//! that owns it.

use uuid::Uuid;

use crate::context::{SpanHandle, TransactionHandle};
use crate::span::{DependencySpan, SpanStatus, TransactionSpan};

/// Builder for the span tree of a single open transaction.
///
/// Dependency spans are kept in start order. On finalization any span that
/// is still running is closed as failed and the transaction fails with it.
#[derive(Debug)]
pub struct TransactionTreeBuilder {
    root: TransactionSpan,
}

impl TransactionTreeBuilder {
    /// Create a builder with a running transaction span.
    pub fn new(
        handle: &TransactionHandle,
        correlation_hint: Option<&str>,
        snapshotting: bool,
    ) -> Self {
        Self {
            root: TransactionSpan::start(handle, correlation_hint, snapshotting),
        }
    }

    pub fn is_snapshotting(&self) -> bool {
        self.root.snapshotting
    }

    /// Start a dependency span parented to this transaction.
    pub fn start_span(&mut self, handle: &SpanHandle) {
        self.root.add_child(DependencySpan::start(handle));
    }

    /// End a running dependency span. Returns false if no running span has
    /// this id.
    pub fn end_span(&mut self, span_id: Uuid, error: Option<&str>) -> bool {
        let span = self
            .root
            .children
            .iter_mut()
            .find(|s| s.span_id == span_id && s.is_running());

        match span {
            Some(span) => {
                match error {
                    Some(e) => span.fail(e.to_string()),
                    None => span.complete(),
                }
                true
            }
            None => false,
        }
    }

    pub fn attach_metadata(&mut self, key: &str, value: &str) {
        self.root.attach_metadata(key, value);
    }

    /// Number of dependency spans that have started but not ended.
    pub fn open_spans(&self) -> usize {
        self.root.children.iter().filter(|s| s.is_running()).count()
    }

    /// Finalize the tree, enforcing all invariants.
    ///
    /// - Dependency spans still running are failed.
    /// - If `error` is set or any span was left open, the transaction is FAILED.
    /// - Otherwise, the transaction is Completed.
    pub fn finalize(mut self, error: Option<&str>) -> TransactionSpan {
        let mut left_open = 0;
        for span in self.root.children.iter_mut().filter(|s| s.is_running()) {
            span.fail("transaction closed before span ended".to_string());
            left_open += 1;
        }

        match (error, left_open) {
            (Some(e), _) => self.root.fail(e.to_string()),
            (None, 0) => self.root.complete(),
            (None, n) => self
                .root
                .fail(format!("{} dependency span(s) left open", n)),
        }

        debug_assert!(self.root.status != SpanStatus::Running);
        self.root
    }
}
