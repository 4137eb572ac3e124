//! Monitoring model for business transactions and their dependency calls.
//!
//! This crate provides the types shared by every instrumented agent to
//! report transactions, and the external calls made while they run, to a
//! monitoring sink.
//!
//! # Span Hierarchy
//!
//! ```text
//! Transaction ("Frobulate Book Info")
//!   ├─ Dependency span (content service)
//!   └─ Dependency span (persistence store)
//! ```
//!
//! # Usage
//!
//! 1. Declare every external target once with [`MonitoringSink::declare_target`].
//! 2. Open a transaction with [`MonitoringSink::begin_transaction`] and pass the
//!    returned [`TransactionHandle`] explicitly to whatever does the work.
//! 3. Bracket each external call with [`MonitoringSink::begin_span`] /
//!    [`MonitoringSink::end_span`].
//! 4. Close the transaction; recording sinks hand back the finished
//!    [`TransactionSpan`] tree.

pub mod context;
pub mod logging;
pub mod memory;
pub mod sampling;
pub mod sink;
pub mod span;
pub mod target;
pub mod tree;

pub use context::{SpanHandle, TransactionHandle};
pub use logging::LoggingSink;
pub use memory::{InMemorySink, SinkEvent};
pub use sampling::{Sampler, SamplingPolicy};
pub use sink::{MonitoringSink, SinkError};
pub use span::{DependencySpan, SpanStatus, TransactionSpan};
pub use target::{Target, TargetKind};
pub use tree::TransactionTreeBuilder;
