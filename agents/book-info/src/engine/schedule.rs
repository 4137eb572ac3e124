//! Transaction loop
//!
//! Drives transactions strictly one after another, opening and closing a
//! transaction boundary around each and pacing them with a fixed delay.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};
use txn_span::MonitoringSink;

use super::TransactionRunner;
use crate::contracts::TRANSACTION_NAME;
use crate::error::Result;

/// What the loop does when a transaction body fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Close the failed transaction and stop, returning the error
    #[default]
    Abort,
    /// Close the failed transaction and carry on with the next one
    Skip,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Abort => f.write_str("abort"),
            FailurePolicy::Skip => f.write_str("skip"),
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "abort" => Ok(FailurePolicy::Abort),
            "skip" => Ok(FailurePolicy::Skip),
            other => Err(format!("unknown failure policy: {}", other)),
        }
    }
}

/// Loop settings
#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub transaction_name: String,
    pub count: u64,
    pub delay: Duration,
    pub on_error: FailurePolicy,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            transaction_name: TRANSACTION_NAME.to_string(),
            count: 1000,
            delay: Duration::from_secs(10),
            on_error: FailurePolicy::Abort,
        }
    }
}

/// Outcome of a loop run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoopSummary {
    pub attempted: u64,
    pub completed: u64,
    pub failed: u64,
    pub cancelled: bool,
}

/// Sequential driver of monitored transactions
pub struct TransactionLoop {
    runner: TransactionRunner,
    sink: Arc<dyn MonitoringSink>,
    config: LoopConfig,
}

impl TransactionLoop {
    pub fn new(
        runner: TransactionRunner,
        sink: Arc<dyn MonitoringSink>,
        config: LoopConfig,
    ) -> Self {
        Self { runner, sink, config }
    }

    /// Run `config.count` transactions in sequence.
    ///
    /// Cancellation is honoured between transactions and during the pacing
    /// delay; a transaction that has started always runs to completion and
    /// is closed.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<LoopSummary> {
        let mut summary = LoopSummary::default();
        let count = self.config.count;

        for index in 0..count {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let transaction = self.sink.begin_transaction(&self.config.transaction_name, None);
            let span = info_span!(
                "transaction",
                index,
                transaction_id = %transaction.transaction_id(),
                correlation_id = %transaction.correlation_id(),
            );
            let outcome = self.runner.run_once(&transaction).instrument(span).await;
            summary.attempted += 1;

            match outcome {
                Ok(_) => {
                    self.sink.end_transaction(transaction, None);
                    summary.completed += 1;
                }
                Err(err) => {
                    self.sink.end_transaction(transaction, Some(&err.to_string()));
                    summary.failed += 1;
                    match self.config.on_error {
                        FailurePolicy::Abort => {
                            warn!(
                                index,
                                transport = err.is_transport(),
                                error = %err,
                                "Transaction failed, stopping"
                            );
                            return Err(err);
                        }
                        FailurePolicy::Skip => {
                            warn!(
                                index,
                                transport = err.is_transport(),
                                error = %err,
                                "Transaction failed, continuing"
                            );
                        }
                    }
                }
            }

            if index + 1 < count && !self.config.delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        summary.cancelled = true;
                        break;
                    }
                    _ = tokio::time::sleep(self.config.delay) => {}
                }
            }
        }

        info!(
            attempted = summary.attempted,
            completed = summary.completed,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "Transaction loop finished"
        );
        Ok(summary)
    }
}
