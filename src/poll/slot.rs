//! Per-(host, metric) result slots shared between pollers and the UI.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use parking_lot::RwLock;

use crate::inspector::Reading;

/// Display state of one dashboard cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CellStatus {
    /// No attempt has completed yet.
    Pending,
    /// The latest attempt succeeded.
    Fresh,
    /// The latest attempt failed; an older value is still shown.
    Stale,
    /// Every attempt so far has failed.
    Failed,
}

impl CellStatus {
    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            CellStatus::Pending => "…",
            CellStatus::Fresh => "OK",
            CellStatus::Stale => "STALE",
            CellStatus::Failed => "ERR",
        }
    }
}

/// Everything known about one (host, metric) pair at a point in time.
#[derive(Debug, Clone, Default)]
pub struct CellSnapshot {
    pub last_value: Option<Reading>,
    pub last_error: Option<String>,
    pub last_updated_at: Option<Instant>,
    /// Wall-clock time of the last successful sample, for export.
    pub last_updated_wall: Option<SystemTime>,
    pub last_attempt_at: Option<Instant>,
    pub attempts: u64,
    pub failures: u64,
    /// Increments on every successful sample.
    pub sequence: u64,
}

impl CellSnapshot {
    pub fn status(&self) -> CellStatus {
        match (&self.last_value, &self.last_error) {
            (_, None) if self.attempts == 0 => CellStatus::Pending,
            (Some(_), None) => CellStatus::Fresh,
            (Some(_), Some(_)) => CellStatus::Stale,
            (None, _) => CellStatus::Failed,
        }
    }
}

/// Result slot for a single polling task.
///
/// Writers replace the whole state under the lock, so readers only ever see
/// the state before or after a complete update.
#[derive(Debug, Default)]
pub struct ResultSlot {
    state: RwLock<CellSnapshot>,
}

impl ResultSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful sample.
    pub fn record_success(&self, reading: Reading) {
        let now = Instant::now();
        let mut state = self.state.write();
        state.attempts += 1;
        state.sequence += 1;
        state.last_value = Some(reading);
        state.last_error = None;
        state.last_updated_at = Some(now);
        state.last_updated_wall = Some(SystemTime::now());
        state.last_attempt_at = Some(now);
    }

    /// Record a failed sample. The previous value is kept.
    pub fn record_failure(&self, error: String) {
        let mut state = self.state.write();
        state.attempts += 1;
        state.failures += 1;
        state.last_error = Some(error);
        state.last_attempt_at = Some(Instant::now());
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> CellSnapshot {
        self.state.read().clone()
    }
}

/// All result slots of a polling session, keyed by (address, metric).
///
/// The set of keys is fixed when the engine starts.
#[derive(Debug, Default)]
pub struct ResultBoard {
    slots: HashMap<(String, String), Arc<ResultSlot>>,
}

impl ResultBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or return the existing) slot for a pair.
    pub fn insert(&mut self, address: &str, metric: &str) -> Arc<ResultSlot> {
        self.slots
            .entry((address.to_string(), metric.to_string()))
            .or_insert_with(|| Arc::new(ResultSlot::new()))
            .clone()
    }

    pub fn slot(&self, address: &str, metric: &str) -> Option<&Arc<ResultSlot>> {
        self.slots.get(&(address.to_string(), metric.to_string()))
    }

    /// Snapshot of one cell; pairs that are not polled read as pending.
    pub fn snapshot(&self, address: &str, metric: &str) -> CellSnapshot {
        self.slot(address, metric).map(|slot| slot.snapshot()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        let slot = ResultSlot::new();
        assert_eq!(slot.snapshot().status(), CellStatus::Pending);

        slot.record_failure("unreachable".to_string());
        assert_eq!(slot.snapshot().status(), CellStatus::Failed);

        slot.record_success(Reading::new("ok"));
        let snap = slot.snapshot();
        assert_eq!(snap.status(), CellStatus::Fresh);
        assert_eq!(snap.sequence, 1);
        assert!(snap.last_error.is_none());

        slot.record_failure("timeout".to_string());
        let snap = slot.snapshot();
        assert_eq!(snap.status(), CellStatus::Stale);
        assert_eq!(snap.last_value.unwrap().summary, "ok");
        assert_eq!(snap.attempts, 3);
        assert_eq!(snap.failures, 2);
    }

    #[test]
    fn test_board_lookup() {
        let mut board = ResultBoard::new();
        let slot = board.insert("web", "memory");
        assert!(Arc::ptr_eq(&slot, &board.insert("web", "memory")));
        assert_eq!(board.len(), 1);

        slot.record_success(Reading::new("42%"));
        assert_eq!(board.snapshot("web", "memory").sequence, 1);
        assert_eq!(board.snapshot("db", "memory").status(), CellStatus::Pending);
    }

    #[test]
    fn test_concurrent_readers_see_complete_state() {
        let slot = Arc::new(ResultSlot::new());
        let writer = {
            let slot = slot.clone();
            std::thread::spawn(move || {
                for i in 0..1000 {
                    slot.record_success(Reading::new(i.to_string()).with_gauge(i as f64));
                }
            })
        };

        for _ in 0..1000 {
            let snap = slot.snapshot();
            if let Some(value) = snap.last_value {
                assert_eq!(value.summary, format!("{}", value.gauge.unwrap() as u64));
                assert_eq!(snap.sequence, value.gauge.unwrap() as u64 + 1);
            }
        }
        writer.join().unwrap();
    }
}
