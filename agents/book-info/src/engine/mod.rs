//! Transaction engine
//!
//! One transaction: choose a work, fetch it as a tracked dependency call,
//! parse it, attach its fields when snapshotting, then record a simulated
//! persistence call.

mod schedule;
mod tracker;

pub use schedule::*;
pub use tracker::*;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use txn_span::{MonitoringSink, TransactionHandle};

use crate::client::ContentClient;
use crate::contracts::{
    metadata_keys, WorkId, WorkRecord, CONTENT_TARGET, PERSISTENCE_TARGET, WORK_ID_LIMIT,
};
use crate::error::Result;
use crate::parser;

/// Default duration of the simulated persistence call.
pub const DEFAULT_PERSISTENCE_DELAY: Duration = Duration::from_millis(137);

/// Runner settings
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Target name for the content fetch span
    pub content_target: String,

    /// Target name for the persistence span
    pub persistence_target: String,

    /// How long the simulated persistence call takes
    pub persistence_delay: Duration,

    /// Fixed seed for work selection; seeded from entropy when unset
    pub seed: Option<u64>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            content_target: CONTENT_TARGET.to_string(),
            persistence_target: PERSISTENCE_TARGET.to_string(),
            persistence_delay: DEFAULT_PERSISTENCE_DELAY,
            seed: None,
        }
    }
}

/// Runs the body of one monitored transaction
pub struct TransactionRunner {
    client: ContentClient,
    sink: Arc<dyn MonitoringSink>,
    tracker: DependencyTracker,
    rng: StdRng,
    config: RunnerConfig,
}

impl TransactionRunner {
    /// Create a runner. The random source is seeded once, here.
    pub fn new(client: ContentClient, sink: Arc<dyn MonitoringSink>, config: RunnerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            client,
            tracker: DependencyTracker::new(Arc::clone(&sink)),
            sink,
            rng,
            config,
        }
    }

    /// Pick a work uniformly from `[0, WORK_ID_LIMIT)`.
    pub fn choose_work(&mut self) -> WorkId {
        WorkId::wrapping(self.rng.gen_range(0..WORK_ID_LIMIT))
    }

    /// Run one transaction body on a randomly chosen work.
    pub async fn run_once(&mut self, transaction: &TransactionHandle) -> Result<WorkRecord> {
        let work_id = self.choose_work();
        self.run_work(transaction, work_id).await
    }

    /// Run one transaction body on `work_id`.
    ///
    /// Only a failed fetch is an error. The fetch span is closed before the
    /// error is returned.
    pub async fn run_work(
        &self,
        transaction: &TransactionHandle,
        work_id: WorkId,
    ) -> Result<WorkRecord> {
        info!(
            transaction_id = %transaction.transaction_id(),
            %work_id,
            url = %self.client.work_url(work_id),
            "Fetching work"
        );

        let body = self
            .tracker
            .track(transaction, &self.config.content_target, self.client.fetch_work(work_id))
            .await?;
        debug!(%work_id, body = %body, "Work document received");

        let (record, decoded) = parser::decode(&body);
        if !decoded {
            debug!(%work_id, "Continuing with empty work record");
        }
        info!(
            %work_id,
            title = %record.title,
            author = %record.author,
            isbn = %record.identifier,
            "Parsed work"
        );

        if self.sink.is_snapshotting(transaction) {
            self.sink.attach_metadata(transaction, metadata_keys::TITLE, &record.title);
            self.sink.attach_metadata(transaction, metadata_keys::AUTHOR, &record.author);
            self.sink.attach_metadata(transaction, metadata_keys::ISBN, &record.identifier);
        }

        let persist = self.tracker.begin(transaction, &self.config.persistence_target);
        tokio::time::sleep(self.config.persistence_delay).await;
        persist.end();

        Ok(record)
    }
}
