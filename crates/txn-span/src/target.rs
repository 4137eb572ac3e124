//! External targets (backends) that dependency spans are recorded against.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::sink::SinkError;

/// Kind of external system a target represents.
///
/// Each kind accepts a fixed set of identifying properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    #[serde(rename = "CACHE")]
    Cache,
    #[serde(rename = "DB")]
    Db,
    #[serde(rename = "HTTP")]
    Http,
    #[serde(rename = "JMS")]
    Jms,
    #[serde(rename = "RABBITMQ")]
    RabbitMq,
    #[serde(rename = "WEBSERVICE")]
    WebService,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Cache => "CACHE",
            TargetKind::Db => "DB",
            TargetKind::Http => "HTTP",
            TargetKind::Jms => "JMS",
            TargetKind::RabbitMq => "RABBITMQ",
            TargetKind::WebService => "WEBSERVICE",
        }
    }

    /// Property keys a target of this kind may declare.
    pub fn allowed_properties(&self) -> &'static [&'static str] {
        match self {
            TargetKind::Cache => &["SERVER POOL", "VENDOR"],
            TargetKind::Db => &["HOST", "PORT", "DATABASE", "VENDOR", "VERSION"],
            TargetKind::Http => &["HOST", "PORT", "URL", "QUERY STRING"],
            TargetKind::Jms => &["DESTINATION", "DESTINATIONTYPE", "VENDOR"],
            TargetKind::RabbitMq => &["HOST", "PORT", "ROUTING KEY", "EXCHANGE"],
            TargetKind::WebService => &["SERVICE", "URL", "OPERATION", "SOAP ACTION", "VENDOR"],
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named external system declared once and referenced by every span
/// recorded against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    pub kind: TargetKind,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    /// Whether the target is itself a monitored application. Usually false.
    #[serde(default)]
    pub resolve: bool,
}

impl Target {
    pub fn new(name: impl Into<String>, kind: TargetKind) -> Self {
        Self {
            name: name.into(),
            kind,
            properties: BTreeMap::new(),
            resolve: false,
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Check the name is non-empty and every property is allowed for the kind.
    pub fn validate(&self) -> Result<(), SinkError> {
        if self.name.trim().is_empty() {
            return Err(SinkError::InvalidTarget {
                target: self.name.clone(),
                reason: "target name must not be empty".to_string(),
            });
        }

        let allowed = self.kind.allowed_properties();
        if let Some(key) = self
            .properties
            .keys()
            .find(|key| !allowed.contains(&key.as_str()))
        {
            return Err(SinkError::InvalidTarget {
                target: self.name.clone(),
                reason: format!("property {:?} is not valid for {} targets", key, self.kind),
            });
        }

        Ok(())
    }
}
