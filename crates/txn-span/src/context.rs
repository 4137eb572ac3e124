//! Handles passed between the harness and a monitoring sink.

use uuid::Uuid;

/// Identity of an open transaction.
///
/// Handles are deliberately not `Clone`: closing a transaction consumes its
/// handle, so a transaction can only be closed once.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct TransactionHandle {
    transaction_id: Uuid,
    correlation_id: Uuid,
    name: String,
}

impl TransactionHandle {
    /// Create a handle with a fresh transaction id and correlation id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            transaction_id: Uuid::new_v4(),
            correlation_id: Uuid::new_v4(),
            name: name.into(),
        }
    }

    pub fn transaction_id(&self) -> Uuid {
        self.transaction_id
    }

    /// Correlation id generated when the transaction was opened.
    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Identity of an open dependency span. Consumed when the span ends.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct SpanHandle {
    span_id: Uuid,
    transaction_id: Uuid,
    target: String,
}

impl SpanHandle {
    /// Create a handle for a span opened inside `transaction`.
    pub fn new(transaction: &TransactionHandle, target: impl Into<String>) -> Self {
        Self {
            span_id: Uuid::new_v4(),
            transaction_id: transaction.transaction_id,
            target: target.into(),
        }
    }

    pub fn span_id(&self) -> Uuid {
        self.span_id
    }

    pub fn transaction_id(&self) -> Uuid {
        self.transaction_id
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}
