//! Metric inspectors: which command to run for a metric and how to read it.
//!
//! The registry knows a fixed set of metric names. Each one maps to a shell
//! command and a parser; the command can be replaced per metric from the
//! configuration document (`metrics: { disk: "df -Pk /data" }`).

mod parser;

use std::fmt::Debug;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::error::ConfigError;

/// Failure to interpret a command's output.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Failed to parse {metric} output: {reason}")]
pub struct InspectError {
    pub metric: String,
    pub reason: String,
}

/// One parsed sample of a metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    /// Short text shown in the host table cell.
    pub summary: String,
    /// Numeric value tracked over time (percentages or load), if any.
    pub gauge: Option<f64>,
    /// Labelled values shown in the detail view.
    pub fields: Vec<(String, String)>,
}

impl Reading {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            gauge: None,
            fields: Vec::new(),
        }
    }

    pub fn with_gauge(mut self, gauge: f64) -> Self {
        self.gauge = Some(gauge);
        self
    }

    pub fn with_field(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((label.into(), value.into()));
        self
    }
}

/// Interprets a metric: supplies its command and parses the output.
pub trait Inspector: Send + Sync + Debug {
    /// Metric name as written in the configuration.
    fn name(&self) -> &str;

    /// Shell command that produces the raw output.
    fn command(&self) -> &str;

    /// Turn the command's output into a reading.
    fn parse(&self, output: &str) -> Result<Reading, InspectError>;
}

/// Metrics known to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Memory,
    Disk,
    LoadAvg,
    Uptime,
    Custom,
}

impl MetricKind {
    pub const ALL: [MetricKind; 5] = [
        MetricKind::Memory,
        MetricKind::Disk,
        MetricKind::LoadAvg,
        MetricKind::Uptime,
        MetricKind::Custom,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            MetricKind::Memory => "memory",
            MetricKind::Disk => "disk",
            MetricKind::LoadAvg => "loadavg",
            MetricKind::Uptime => "uptime",
            MetricKind::Custom => "custom",
        }
    }

    /// Command used when the configuration does not supply one.
    pub fn default_command(&self) -> Option<&'static str> {
        match self {
            MetricKind::Memory => Some(
                "grep -E '^(MemTotal|MemAvailable|MemFree|SwapTotal|SwapFree):' /proc/meminfo",
            ),
            MetricKind::Disk => Some("df -Pk"),
            MetricKind::LoadAvg => Some("cat /proc/loadavg"),
            MetricKind::Uptime => Some("cat /proc/uptime"),
            MetricKind::Custom => None,
        }
    }
}

/// Inspector for one of the built-in metric kinds.
#[derive(Debug, Clone)]
pub struct BuiltinInspector {
    kind: MetricKind,
    command: String,
}

impl BuiltinInspector {
    pub fn kind(&self) -> MetricKind {
        self.kind
    }
}

impl Inspector for BuiltinInspector {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn command(&self) -> &str {
        &self.command
    }

    fn parse(&self, output: &str) -> Result<Reading, InspectError> {
        let parsed = match self.kind {
            MetricKind::Memory => parser::parse_meminfo(output),
            MetricKind::Disk => parser::parse_df(output),
            MetricKind::LoadAvg => parser::parse_loadavg(output),
            MetricKind::Uptime => parser::parse_uptime(output),
            MetricKind::Custom => Ok(parser::parse_custom(output)),
        };
        parsed.map_err(|reason| InspectError {
            metric: self.kind.name().to_string(),
            reason,
        })
    }
}

/// Lookup of metric names to inspectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricRegistry;

impl MetricRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Whether `name` is a known metric.
    pub fn valid(&self, name: &str) -> bool {
        MetricKind::from_name(name).is_some()
    }

    /// Names of all known metrics.
    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        MetricKind::ALL.into_iter().map(|kind| kind.name())
    }

    /// Build the inspector for `name`, using `command` instead of the
    /// default when it is given and not blank.
    pub fn inspector(
        &self,
        name: &str,
        command: Option<&str>,
    ) -> Result<Arc<dyn Inspector>, ConfigError> {
        let kind = MetricKind::from_name(name)
            .ok_or_else(|| ConfigError::UnknownMetric(name.to_string()))?;

        let command = command
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .or_else(|| kind.default_command())
            .ok_or_else(|| ConfigError::MissingCommand(name.to_string()))?;

        Ok(Arc::new(BuiltinInspector {
            kind,
            command: command.to_string(),
        }))
    }
}
