//! In-memory monitoring sink.
//!
//! Builds a span tree per transaction and keeps a bounded history of
//! finished trees and sink calls. Used as the process sink and as the fake
//! sink in tests.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::context::{SpanHandle, TransactionHandle};
use crate::sampling::{Sampler, SamplingPolicy};
use crate::sink::{MonitoringSink, SinkError};
use crate::span::TransactionSpan;
use crate::target::Target;
use crate::tree::TransactionTreeBuilder;

/// Default number of finished transactions (and 8x as many events) kept.
pub const DEFAULT_RETAINED: usize = 256;

/// One call observed by the sink, in call order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SinkEvent {
    TransactionBegan { transaction_id: Uuid, name: String },
    TransactionEnded { transaction_id: Uuid, failed: bool },
    SpanBegan { span_id: Uuid, transaction_id: Uuid, target: String },
    SpanEnded { span_id: Uuid, failed: bool },
    MetadataAttached { transaction_id: Uuid, key: String },
}

#[derive(Debug, Default)]
struct State {
    targets: BTreeMap<String, Target>,
    open: HashMap<Uuid, TransactionTreeBuilder>,
    finished: VecDeque<TransactionSpan>,
    events: VecDeque<SinkEvent>,
}

/// Monitoring sink that records everything in memory.
#[derive(Debug)]
pub struct InMemorySink {
    sampler: Sampler,
    retained: usize,
    state: Mutex<State>,
}

impl Default for InMemorySink {
    fn default() -> Self {
        Self::new(SamplingPolicy::default())
    }
}

impl InMemorySink {
    pub fn new(policy: SamplingPolicy) -> Self {
        Self::with_retention(policy, DEFAULT_RETAINED)
    }

    /// Keep at most `retained` finished transactions.
    pub fn with_retention(policy: SamplingPolicy, retained: usize) -> Self {
        Self {
            sampler: Sampler::new(policy),
            retained: retained.max(1),
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, state: &mut State, event: SinkEvent) {
        if state.events.len() >= self.retained * 8 {
            state.events.pop_front();
        }
        state.events.push_back(event);
    }

    /// Declared targets, ordered by name.
    pub fn targets(&self) -> Vec<Target> {
        self.state().targets.values().cloned().collect()
    }

    /// Finished transactions, oldest first.
    pub fn finished(&self) -> Vec<TransactionSpan> {
        self.state().finished.iter().cloned().collect()
    }

    /// Recorded sink calls, oldest first.
    pub fn events(&self) -> Vec<SinkEvent> {
        self.state().events.iter().cloned().collect()
    }

    /// Number of transactions opened but not yet closed.
    pub fn open_transactions(&self) -> usize {
        self.state().open.len()
    }
}

impl MonitoringSink for InMemorySink {
    fn declare_target(&self, target: Target) -> Result<(), SinkError> {
        target.validate()?;

        let mut state = self.state();
        if state.targets.contains_key(&target.name) {
            return Err(SinkError::DuplicateTarget(target.name));
        }
        state.targets.insert(target.name.clone(), target);
        Ok(())
    }

    fn begin_transaction(&self, name: &str, correlation_hint: Option<&str>) -> TransactionHandle {
        let handle = TransactionHandle::new(name);
        let snapshotting = self.sampler.decide();

        let mut state = self.state();
        state.open.insert(
            handle.transaction_id(),
            TransactionTreeBuilder::new(&handle, correlation_hint, snapshotting),
        );
        self.record(
            &mut state,
            SinkEvent::TransactionBegan {
                transaction_id: handle.transaction_id(),
                name: name.to_string(),
            },
        );
        handle
    }

    fn end_transaction(
        &self,
        transaction: TransactionHandle,
        error: Option<&str>,
    ) -> Option<TransactionSpan> {
        let mut state = self.state();
        let Some(tree) = state.open.remove(&transaction.transaction_id()) else {
            warn!(transaction_id = %transaction.transaction_id(), "Ending unknown transaction");
            return None;
        };

        let span = tree.finalize(error);
        self.record(
            &mut state,
            SinkEvent::TransactionEnded {
                transaction_id: span.transaction_id,
                failed: span.error.is_some(),
            },
        );
        if state.finished.len() >= self.retained {
            state.finished.pop_front();
        }
        state.finished.push_back(span.clone());
        Some(span)
    }

    fn is_snapshotting(&self, transaction: &TransactionHandle) -> bool {
        self.state()
            .open
            .get(&transaction.transaction_id())
            .map(TransactionTreeBuilder::is_snapshotting)
            .unwrap_or(false)
    }

    fn attach_metadata(&self, transaction: &TransactionHandle, key: &str, value: &str) {
        let mut state = self.state();
        match state.open.get_mut(&transaction.transaction_id()) {
            Some(tree) => tree.attach_metadata(key, value),
            None => {
                warn!(
                    transaction_id = %transaction.transaction_id(),
                    key,
                    "Metadata for unknown transaction dropped"
                );
                return;
            }
        }
        self.record(
            &mut state,
            SinkEvent::MetadataAttached {
                transaction_id: transaction.transaction_id(),
                key: key.to_string(),
            },
        );
    }

    fn begin_span(&self, transaction: &TransactionHandle, target: &str) -> SpanHandle {
        let handle = SpanHandle::new(transaction, target);

        let mut state = self.state();
        if !state.targets.contains_key(target) {
            warn!(dependency = target, "Span started against undeclared target");
        }
        match state.open.get_mut(&transaction.transaction_id()) {
            Some(tree) => tree.start_span(&handle),
            None => {
                warn!(
                    transaction_id = %transaction.transaction_id(),
                    dependency = target,
                    "Span started outside an open transaction"
                );
            }
        }
        self.record(
            &mut state,
            SinkEvent::SpanBegan {
                span_id: handle.span_id(),
                transaction_id: handle.transaction_id(),
                target: target.to_string(),
            },
        );
        handle
    }

    fn end_span(&self, span: SpanHandle, error: Option<&str>) {
        let mut state = self.state();
        let ended = state
            .open
            .get_mut(&span.transaction_id())
            .map(|tree| tree.end_span(span.span_id(), error))
            .unwrap_or(false);
        if !ended {
            warn!(
                span_id = %span.span_id(),
                dependency = span.target(),
                "Ending span with no running record"
            );
        }
        self.record(
            &mut state,
            SinkEvent::SpanEnded {
                span_id: span.span_id(),
                failed: error.is_some(),
            },
        );
    }

    fn shutdown(&self) {
        let mut state = self.state();
        let open: Vec<_> = state.open.drain().collect();
        for (transaction_id, tree) in open {
            warn!(%transaction_id, "Transaction still open at shutdown");
            let span = tree.finalize(Some("sink shut down before transaction ended"));
            if state.finished.len() >= self.retained {
                state.finished.pop_front();
            }
            state.finished.push_back(span);
        }
    }
}
