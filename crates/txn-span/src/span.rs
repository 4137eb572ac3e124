//! Recorded span types for monitored transactions.
//!
//! Defines `TransactionSpan`, `DependencySpan`, and `SpanStatus` used to
//! build one tree per transaction: Transaction -> Dependency calls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use uuid::Uuid;

use crate::context::{SpanHandle, TransactionHandle};

/// Status of a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanStatus {
    Running,
    Completed,
    Failed,
}

/// Wall-clock bounds of a span plus a monotonic clock for its duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Timing {
    started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ended_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_ms: Option<u64>,
    #[serde(skip)]
    clock: Option<Instant>,
}

impl Timing {
    fn start() -> Self {
        Self {
            started_at: Utc::now(),
            ended_at: None,
            duration_ms: None,
            clock: Some(Instant::now()),
        }
    }

    fn stop(&mut self) {
        let now = Utc::now();
        self.ended_at = Some(now);
        self.duration_ms = Some(match self.clock {
            Some(clock) => clock.elapsed().as_millis() as u64,
            None => (now - self.started_at).num_milliseconds().max(0) as u64,
        });
    }
}

/// A timed record of one external call made inside a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencySpan {
    pub span_id: Uuid,
    pub transaction_id: Uuid,
    pub target: String,
    pub status: SpanStatus,
    #[serde(flatten)]
    timing: Timing,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DependencySpan {
    /// Start a span for the call identified by `handle`.
    pub fn start(handle: &SpanHandle) -> Self {
        Self {
            span_id: handle.span_id(),
            transaction_id: handle.transaction_id(),
            target: handle.target().to_string(),
            status: SpanStatus::Running,
            timing: Timing::start(),
            error: None,
        }
    }

    /// Mark the span as completed.
    pub fn complete(&mut self) {
        self.status = SpanStatus::Completed;
        self.timing.stop();
    }

    /// Mark the span as failed with an error message.
    pub fn fail(&mut self, error: String) {
        self.status = SpanStatus::Failed;
        self.timing.stop();
        self.error = Some(error);
    }

    pub fn is_running(&self) -> bool {
        self.status == SpanStatus::Running
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.timing.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.timing.ended_at
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.timing.duration_ms
    }
}

/// The root span of one business transaction.
///
/// Children are the dependency spans opened while the transaction ran, in
/// the order they were started. Metadata is only ever attached while the
/// transaction is being snapshotted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionSpan {
    pub transaction_id: Uuid,
    pub correlation_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_hint: Option<String>,
    pub name: String,
    pub status: SpanStatus,
    pub snapshotting: bool,
    #[serde(flatten)]
    timing: Timing,
    pub metadata: BTreeMap<String, String>,
    pub children: Vec<DependencySpan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TransactionSpan {
    /// Start the root span for `handle`.
    pub fn start(
        handle: &TransactionHandle,
        correlation_hint: Option<&str>,
        snapshotting: bool,
    ) -> Self {
        Self {
            transaction_id: handle.transaction_id(),
            correlation_id: handle.correlation_id(),
            correlation_hint: correlation_hint
                .filter(|hint| !hint.is_empty())
                .map(str::to_string),
            name: handle.name().to_string(),
            status: SpanStatus::Running,
            snapshotting,
            timing: Timing::start(),
            metadata: BTreeMap::new(),
            children: Vec::new(),
            error: None,
        }
    }

    /// Mark the transaction as completed.
    pub fn complete(&mut self) {
        self.status = SpanStatus::Completed;
        self.timing.stop();
    }

    /// Mark the transaction as failed with an error message.
    pub fn fail(&mut self, error: String) {
        self.status = SpanStatus::Failed;
        self.timing.stop();
        self.error = Some(error);
    }

    /// Attach a metadata entry; later values for the same key win.
    pub fn attach_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Add a child dependency span.
    pub fn add_child(&mut self, child: DependencySpan) {
        self.children.push(child);
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.timing.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.timing.ended_at
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.timing.duration_ms
    }
}
