//! Gauge history per (host, metric) for sparklines.

use std::collections::{HashMap, VecDeque};

use crate::poll::CellSnapshot;

/// Maximum number of samples kept per cell.
const MAX_HISTORY_SIZE: usize = 60;

#[derive(Debug, Clone, Default)]
struct Series {
    values: VecDeque<f64>,
    /// Sequence number of the last recorded sample.
    last_sequence: u64,
}

/// Tracks recent gauge values for trending and sparklines.
///
/// Each successful sample is recorded once, however often the dashboard
/// redraws in between.
#[derive(Debug, Clone, Default)]
pub struct History {
    series: HashMap<(String, String), Series>,
}

/// Summary statistics over a series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub latest: f64,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the cell's value if it is a sample not seen before.
    ///
    /// Returns true when a value was recorded.
    pub fn record(&mut self, address: &str, metric: &str, snapshot: &CellSnapshot) -> bool {
        let Some(gauge) = snapshot.last_value.as_ref().and_then(|r| r.gauge) else {
            return false;
        };

        let series = self
            .series
            .entry((address.to_string(), metric.to_string()))
            .or_default();
        if snapshot.sequence <= series.last_sequence {
            return false;
        }

        series.last_sequence = snapshot.sequence;
        series.values.push_back(gauge);
        if series.values.len() > MAX_HISTORY_SIZE {
            series.values.pop_front();
        }
        true
    }

    /// Number of samples kept for a cell.
    pub fn len(&self, address: &str, metric: &str) -> usize {
        self.get(address, metric).map_or(0, |s| s.values.len())
    }

    /// Values for a ratatui sparkline, scaled by 100 so fractional loads
    /// keep their shape.
    ///
    /// Returns an empty Vec if there's not enough history.
    pub fn sparkline(&self, address: &str, metric: &str) -> Vec<u64> {
        let Some(series) = self.get(address, metric) else {
            return Vec::new();
        };
        if series.values.len() < 2 {
            return Vec::new();
        }
        series
            .values
            .iter()
            .map(|v| (v.max(0.0) * 100.0).round() as u64)
            .collect()
    }

    pub fn stats(&self, address: &str, metric: &str) -> Option<GaugeStats> {
        let values = &self.get(address, metric)?.values;
        let latest = *values.back()?;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        Some(GaugeStats {
            min,
            max,
            mean,
            latest,
        })
    }

    fn get(&self, address: &str, metric: &str) -> Option<&Series> {
        self.series.get(&(address.to_string(), metric.to_string()))
    }
}
