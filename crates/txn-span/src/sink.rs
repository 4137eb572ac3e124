//! The capability set a monitoring collaborator exposes to the harness.

use thiserror::Error;

use crate::context::{SpanHandle, TransactionHandle};
use crate::span::TransactionSpan;
use crate::target::Target;

/// Errors raised by a monitoring sink.
#[derive(Error, Debug)]
pub enum SinkError {
    /// The sink could not be initialised
    #[error("Monitoring sink initialisation failed: {0}")]
    Init(String),

    /// A target declaration was rejected
    #[error("Invalid target {target:?}: {reason}")]
    InvalidTarget { target: String, reason: String },

    /// A target with this name was already declared
    #[error("Target already declared: {0}")]
    DuplicateTarget(String),
}

/// Operations the harness calls on the monitoring collaborator.
///
/// Implementations are injected (`Arc<dyn MonitoringSink>`), never reached
/// through globals. Transaction and span handles are consumed when they are
/// closed, so each is closed at most once.
pub trait MonitoringSink: Send + Sync {
    /// Declare an external target. Called once per target at startup.
    fn declare_target(&self, target: Target) -> Result<(), SinkError>;

    /// Open a transaction. `correlation_hint` carries upstream correlation,
    /// if any; the returned handle always has a fresh correlation id.
    fn begin_transaction(&self, name: &str, correlation_hint: Option<&str>) -> TransactionHandle;

    /// Close a transaction, failed if `error` is set. Recording sinks return
    /// the finished span tree.
    fn end_transaction(
        &self,
        transaction: TransactionHandle,
        error: Option<&str>,
    ) -> Option<TransactionSpan>;

    /// Whether the transaction is under detailed sampling.
    fn is_snapshotting(&self, transaction: &TransactionHandle) -> bool;

    /// Attach a named string value to the transaction.
    fn attach_metadata(&self, transaction: &TransactionHandle, key: &str, value: &str);

    /// Open a dependency span against a declared target.
    fn begin_span(&self, transaction: &TransactionHandle, target: &str) -> SpanHandle;

    /// Close a dependency span, failed if `error` is set.
    fn end_span(&self, span: SpanHandle, error: Option<&str>);

    /// Flush and release the sink. Called once at process exit.
    fn shutdown(&self) {}
}
