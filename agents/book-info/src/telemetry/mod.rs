//! Monitoring setup for the Book Info Agent
//!
//! Validates the monitoring identity, builds the process sink, and declares
//! the agent's dependency targets. Any failure here is fatal and happens
//! before the first transaction.

use std::sync::Arc;
use tracing::info;
use txn_span::{
    InMemorySink, LoggingSink, MonitoringSink, SamplingPolicy, SinkError, Target, TargetKind,
};

use crate::contracts::{CONTENT_TARGET, PERSISTENCE_TARGET};
use crate::error::{ConfigError, Result};

/// Host of the simulated persistence store.
pub const PERSISTENCE_HOST: &str = "Imaginationland.imagine";

/// Monitoring identity and controller connection
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub app_name: String,
    pub tier_name: String,
    pub node_name: String,

    /// Controller host (`APPD_CONT`)
    pub controller_host: String,
    pub controller_port: u16,
    pub use_ssl: bool,

    /// Account name (`APPD_ACC`)
    pub account: String,

    /// Access key (`APPD_KEY`)
    pub access_key: String,

    /// Initialisation timeout: `0` = don't wait, `-1` = wait indefinitely
    pub init_timeout_ms: i64,

    /// Which transactions are snapshotted
    pub sampling: SamplingPolicy,

    /// Finished transactions kept in memory
    pub retained: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            app_name: "Example App Instrumentation - Rust".to_string(),
            tier_name: "Rust-Example-InfoGatherer".to_string(),
            node_name: "rs-01".to_string(),
            controller_host: String::new(),
            controller_port: 443,
            use_ssl: true,
            account: String::new(),
            access_key: String::new(),
            init_timeout_ms: 1000,
            sampling: SamplingPolicy::Always,
            retained: txn_span::memory::DEFAULT_RETAINED,
        }
    }
}

impl MonitorConfig {
    /// Check every field the sink needs before it starts.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let required = [
            ("app_name", &self.app_name),
            ("tier_name", &self.tier_name),
            ("node_name", &self.node_name),
            ("controller_host", &self.controller_host),
            ("account", &self.account),
            ("access_key", &self.access_key),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ConfigError::Missing(*field));
        }

        if self.controller_port == 0 {
            return Err(ConfigError::invalid("controller_port", "must be non-zero"));
        }
        if self.init_timeout_ms < -1 {
            return Err(ConfigError::invalid(
                "init_timeout_ms",
                format!("{} is below -1", self.init_timeout_ms),
            ));
        }
        Ok(())
    }

    /// Controller URL derived from host, port and SSL flag.
    pub fn controller_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.controller_host, self.controller_port)
    }
}

/// Target for the content service, identified by the host and port of
/// `base_url`.
pub fn content_target(base_url: &str) -> std::result::Result<Target, ConfigError> {
    let url = reqwest::Url::parse(base_url)
        .map_err(|e| ConfigError::invalid("base_url", e.to_string()))?;
    let host = url
        .host_str()
        .ok_or_else(|| ConfigError::invalid("base_url", "URL has no host"))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| ConfigError::invalid("base_url", "URL has no port"))?;

    Ok(Target::new(CONTENT_TARGET, TargetKind::Http)
        .with_property("HOST", host)
        .with_property("PORT", port.to_string()))
}

/// Target for the simulated persistence store.
pub fn persistence_target() -> Target {
    Target::new(PERSISTENCE_TARGET, TargetKind::Db)
        .with_property("HOST", PERSISTENCE_HOST)
        .with_property("PORT", "443")
}

/// Both targets the agent calls.
pub fn agent_targets(base_url: &str) -> std::result::Result<Vec<Target>, ConfigError> {
    Ok(vec![content_target(base_url)?, persistence_target()])
}

/// Declare each target on `sink`, stopping at the first rejection.
pub fn declare_targets(sink: &dyn MonitoringSink, targets: Vec<Target>) -> Result<()> {
    for target in targets {
        sink.declare_target(target)?;
    }
    Ok(())
}

/// Build the process sink and declare `targets` on it.
pub fn init_sink(config: &MonitorConfig, targets: Vec<Target>) -> Result<Arc<dyn MonitoringSink>> {
    config
        .validate()
        .map_err(|e| SinkError::Init(e.to_string()))?;

    let sink = LoggingSink::new(InMemorySink::with_retention(config.sampling, config.retained));
    declare_targets(&sink, targets)?;

    info!(
        app = %config.app_name,
        tier = %config.tier_name,
        node = %config.node_name,
        controller = %config.controller_url(),
        account = %config.account,
        sampling = %config.sampling,
        "Monitoring initialised"
    );
    Ok(Arc::new(sink))
}
