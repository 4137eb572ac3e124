//! Book Info Agent Contracts
//!
//! Work items, parsed work records, and the names the agent reports to its
//! monitoring sink.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Exclusive upper bound of work identifiers.
pub const WORK_ID_LIMIT: u32 = 10_000;

/// Name of the transaction the agent runs.
pub const TRANSACTION_NAME: &str = "Frobulate Book Info";

/// Target name for the book content service.
pub const CONTENT_TARGET: &str = "Penguin Books";

/// Target name for the simulated persistence store.
pub const PERSISTENCE_TARGET: &str = "A Real DB That Doesn't Not Exist";

/// Metadata keys attached to snapshotted transactions.
pub mod metadata_keys {
    pub const TITLE: &str = "Title";
    pub const AUTHOR: &str = "Author";
    pub const ISBN: &str = "ISBN";
}

/// Identifier of one work in the content service, in `[0, WORK_ID_LIMIT)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct WorkId(u32);

impl WorkId {
    /// Create a work id, rejecting values outside the valid range.
    pub fn new(id: u32) -> Option<Self> {
        (id < WORK_ID_LIMIT).then_some(Self(id))
    }

    /// Create a work id, reducing `id` into the valid range.
    pub fn wrapping(id: u32) -> Self {
        Self(id % WORK_ID_LIMIT)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for WorkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for WorkId {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        WorkId::new(value)
            .ok_or_else(|| format!("work id {} outside [0, {})", value, WORK_ID_LIMIT))
    }
}

impl From<WorkId> for u32 {
    fn from(id: WorkId) -> Self {
        id.0
    }
}

impl FromStr for WorkId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u32 = s
            .trim()
            .parse()
            .map_err(|_| format!("invalid work id: {:?}", s))?;
        WorkId::try_from(value)
    }
}

/// Fields extracted from a work document. Absent fields are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkRecord {
    pub author: String,
    pub title: String,
    pub identifier: String,
}

impl WorkRecord {
    /// True when no field was extracted.
    pub fn is_empty(&self) -> bool {
        self.author.is_empty() && self.title.is_empty() && self.identifier.is_empty()
    }
}
