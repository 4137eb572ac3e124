//! Detailed-sampling ("snapshot") decisions.
//!
//! The decision is made once per transaction, when it opens. Harness code
//! never decides locally; it asks the sink.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Which transactions are snapshotted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingPolicy {
    #[default]
    Always,
    Never,
    /// Snapshot the 1st, (n+1)th, (2n+1)th... transaction. `0` never samples.
    EveryNth(u64),
}

impl SamplingPolicy {
    /// Build a policy from a sampling interval (`1` = always, `0` = never).
    pub fn every(n: u64) -> Self {
        match n {
            0 => SamplingPolicy::Never,
            1 => SamplingPolicy::Always,
            n => SamplingPolicy::EveryNth(n),
        }
    }
}

impl fmt::Display for SamplingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplingPolicy::Always => f.write_str("always"),
            SamplingPolicy::Never => f.write_str("never"),
            SamplingPolicy::EveryNth(n) => write!(f, "every {}", n),
        }
    }
}

impl FromStr for SamplingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(SamplingPolicy::Always),
            "never" => Ok(SamplingPolicy::Never),
            other => other
                .parse::<u64>()
                .map(SamplingPolicy::every)
                .map_err(|_| format!("invalid sampling policy: {}", s)),
        }
    }
}

/// Applies a [`SamplingPolicy`] to a stream of opened transactions.
#[derive(Debug)]
pub struct Sampler {
    policy: SamplingPolicy,
    seen: AtomicU64,
}

impl Sampler {
    pub fn new(policy: SamplingPolicy) -> Self {
        Self {
            policy,
            seen: AtomicU64::new(0),
        }
    }

    /// Decide for the next transaction.
    pub fn decide(&self) -> bool {
        let index = self.seen.fetch_add(1, Ordering::Relaxed);
        match self.policy {
            SamplingPolicy::Always => true,
            SamplingPolicy::Never => false,
            SamplingPolicy::EveryNth(0) => false,
            SamplingPolicy::EveryNth(n) => index % n == 0,
        }
    }
}
