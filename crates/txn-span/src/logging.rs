//! Sink decorator that reports every monitoring call through `tracing`.

use tracing::{debug, error, info, warn};

use crate::context::{SpanHandle, TransactionHandle};
use crate::sink::{MonitoringSink, SinkError};
use crate::span::{SpanStatus, TransactionSpan};
use crate::target::Target;

/// Wraps another sink and logs each call before delegating to it.
///
/// Finished transaction trees returned by the inner sink are logged as JSON.
#[derive(Debug)]
pub struct LoggingSink<S> {
    inner: S,
}

impl<S: MonitoringSink> LoggingSink<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn log_finished(span: &TransactionSpan) {
        let tree = match serde_json::to_string(span) {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "Failed to serialize transaction tree");
                return;
            }
        };

        match span.status {
            SpanStatus::Failed => warn!(
                transaction_id = %span.transaction_id,
                duration_ms = span.duration_ms(),
                error = span.error.as_deref().unwrap_or_default(),
                tree = %tree,
                "Transaction failed"
            ),
            _ => info!(
                transaction_id = %span.transaction_id,
                duration_ms = span.duration_ms(),
                spans = span.children.len(),
                tree = %tree,
                "Transaction completed"
            ),
        }
    }
}

impl<S: MonitoringSink> MonitoringSink for LoggingSink<S> {
    fn declare_target(&self, target: Target) -> Result<(), SinkError> {
        info!(
            target_name = %target.name,
            kind = %target.kind,
            properties = ?target.properties,
            resolve = target.resolve,
            "Declaring target"
        );
        self.inner.declare_target(target)
    }

    fn begin_transaction(&self, name: &str, correlation_hint: Option<&str>) -> TransactionHandle {
        let handle = self.inner.begin_transaction(name, correlation_hint);
        debug!(
            transaction = name,
            transaction_id = %handle.transaction_id(),
            correlation_id = %handle.correlation_id(),
            "Transaction started"
        );
        handle
    }

    fn end_transaction(
        &self,
        transaction: TransactionHandle,
        error: Option<&str>,
    ) -> Option<TransactionSpan> {
        let transaction_id = transaction.transaction_id();
        let finished = self.inner.end_transaction(transaction, error);
        match &finished {
            Some(span) => Self::log_finished(span),
            None => debug!(%transaction_id, failed = error.is_some(), "Transaction ended"),
        }
        finished
    }

    fn is_snapshotting(&self, transaction: &TransactionHandle) -> bool {
        self.inner.is_snapshotting(transaction)
    }

    fn attach_metadata(&self, transaction: &TransactionHandle, key: &str, value: &str) {
        debug!(transaction_id = %transaction.transaction_id(), key, value, "Attaching metadata");
        self.inner.attach_metadata(transaction, key, value)
    }

    fn begin_span(&self, transaction: &TransactionHandle, target: &str) -> SpanHandle {
        let span = self.inner.begin_span(transaction, target);
        debug!(
            transaction_id = %transaction.transaction_id(),
            span_id = %span.span_id(),
            dependency = target,
            "Dependency call started"
        );
        span
    }

    fn end_span(&self, span: SpanHandle, error: Option<&str>) {
        match error {
            Some(e) => warn!(
                span_id = %span.span_id(),
                dependency = span.target(),
                error = e,
                "Dependency call failed"
            ),
            None => debug!(
                span_id = %span.span_id(),
                dependency = span.target(),
                "Dependency call ended"
            ),
        }
        self.inner.end_span(span, error)
    }

    fn shutdown(&self) {
        info!("Shutting down monitoring sink");
        self.inner.shutdown()
    }
}
