//! Loading the dashboard document.
//!
//! ```yaml
//! title: Production
//! poll-interval: 10
//! metrics:
//!   memory:
//!   disk: df -Pk /data
//! hosts:
//!   children:
//!     web-1:
//!       alias: frontend
//!     db:
//!       connection: { type: ssh, username: ops, private_key_path: ~/.ssh/id_ed25519 }
//!       children:
//!         db-1:
//!         db-2:
//! ```
//!
//! Checks run in a fixed order: poll interval, metrics, then hosts. The first
//! failing stage stops loading.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde_yaml::Value;
use tracing::info;

use crate::error::ConfigError;
use crate::inspector::MetricRegistry;
use crate::inventory::tree::scalar_to_string;
use crate::inventory::{resolve, ConnectionSpec, Host, Node};

/// Lowest accepted `poll-interval`, in seconds.
pub const MIN_POLL_INTERVAL: u64 = 5;

/// Title shown when the document has none.
pub const DEFAULT_TITLE: &str = "Saido";

/// Raw shape of the document, before validation.
#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    title: Option<String>,

    #[serde(rename = "poll-interval", default)]
    poll_interval: i64,

    #[serde(default)]
    metrics: Value,

    #[serde(default)]
    hosts: Value,
}

/// Everything the dashboard needs, validated.
#[derive(Debug, Clone)]
pub struct DashboardInfo {
    /// Hosts in inventory traversal order.
    pub hosts: Vec<Host>,
    /// Metric name to custom command; `None` uses the built-in command.
    pub metrics: BTreeMap<String, Option<String>>,
    pub title: String,
    pub poll_interval: Duration,
}

impl DashboardInfo {
    /// Addresses of all hosts, in display order.
    pub fn host_addresses(&self) -> Vec<&str> {
        self.hosts.iter().map(|h| h.address.as_str()).collect()
    }

    /// Metric names in display order.
    pub fn metric_names(&self) -> Vec<String> {
        self.metrics.keys().cloned().collect()
    }
}

/// Read and validate the document at `path`.
pub fn load(path: &Path) -> Result<DashboardInfo, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let info = from_str(&contents)?;
    info!(
        path = %path.display(),
        hosts = info.hosts.len(),
        metrics = info.metrics.len(),
        "Loaded configuration"
    );
    Ok(info)
}

/// Validate a document held in memory.
pub fn from_str(contents: &str) -> Result<DashboardInfo, ConfigError> {
    let document: Document =
        serde_yaml::from_str(contents).map_err(|e| ConfigError::Malformed(e.to_string()))?;

    let poll_interval = check_poll_interval(document.poll_interval)?;
    let metrics = parse_metrics(&document.metrics)?;

    let tree = Node::decode_root(&document.hosts)?;
    let hosts = resolve(&tree, &ConnectionSpec::local())?;
    if hosts.is_empty() {
        return Err(ConfigError::NoHosts);
    }

    let title = document
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    Ok(DashboardInfo {
        hosts,
        metrics,
        title,
        poll_interval,
    })
}

fn check_poll_interval(seconds: i64) -> Result<Duration, ConfigError> {
    match u64::try_from(seconds) {
        Ok(secs) if secs >= MIN_POLL_INTERVAL => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::PollInterval {
            got: seconds,
            min: MIN_POLL_INTERVAL,
        }),
    }
}

fn parse_metrics(value: &Value) -> Result<BTreeMap<String, Option<String>>, ConfigError> {
    let map = match value {
        Value::Null => return Ok(BTreeMap::new()),
        Value::Mapping(map) => map,
        _ => {
            return Err(ConfigError::Malformed(
                "`metrics` must be a mapping of metric names to commands".to_string(),
            ))
        }
    };

    let registry = MetricRegistry::new();
    let mut metrics = BTreeMap::new();

    for (key, command) in map {
        let name = scalar_to_string(key)
            .ok_or_else(|| ConfigError::Malformed(format!("invalid metric name {:?}", key)))?;
        let command = match command {
            Value::Null => None,
            other => Some(scalar_to_string(other).ok_or_else(|| {
                ConfigError::Malformed(format!("command for metric `{}` must be a string", name))
            })?),
        };

        // Also rejects unknown names and `custom` without a command.
        registry.inspector(&name, command.as_deref())?;
        metrics.insert(name, command);
    }

    Ok(metrics)
}
