//! Task-per-pair polling with cooperative cancellation.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::sampler::Sampler;
use super::slot::{ResultBoard, ResultSlot};
use crate::inventory::Host;

/// Some polling tasks did not stop within the grace period and were aborted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error(
    "{abandoned} polling task(s) did not stop within {}ms and were aborted",
    .grace.as_millis()
)]
pub struct EngineShutdownError {
    pub abandoned: usize,
    pub grace: Duration,
}

/// Start one polling task per (host, metric) pair.
///
/// `sampler_for` is called once per pair, hosts in order and metrics in order
/// within each host. Every task samples immediately and then once per
/// `interval`. A failure is recorded in the pair's slot and the task keeps
/// its schedule.
///
/// Must be called from within a tokio runtime.
pub fn start<F>(
    hosts: &[Host],
    metrics: &[String],
    mut sampler_for: F,
    interval: Duration,
) -> PollHandle
where
    F: FnMut(&Host, &str) -> Arc<dyn Sampler>,
{
    let (stop_tx, stop_rx) = watch::channel(false);
    let mut board = ResultBoard::new();
    let mut tasks = Vec::with_capacity(hosts.len() * metrics.len());

    for host in hosts {
        for metric in metrics {
            let slot = board.insert(&host.address, metric);
            let sampler = sampler_for(host, metric);
            let label = format!("{}/{}", host.address, metric);
            tasks.push(tokio::spawn(poll_loop(
                label,
                sampler,
                slot,
                interval,
                stop_rx.clone(),
            )));
        }
    }

    info!(tasks = tasks.len(), interval_secs = interval.as_secs(), "Polling started");

    PollHandle {
        board: Arc::new(board),
        stop_tx,
        tasks,
    }
}

async fn poll_loop(
    label: String,
    sampler: Arc<dyn Sampler>,
    slot: Arc<ResultSlot>,
    interval: Duration,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // A closed channel also means stop.
        tokio::select! {
            biased;
            _ = stop_rx.changed() => break,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            biased;
            _ = stop_rx.changed() => break,
            result = sampler.sample() => result,
        };

        match result {
            Ok(reading) => slot.record_success(reading),
            Err(e) => {
                debug!(task = %label, error = %e, "Sample failed");
                slot.record_failure(e.to_string());
            }
        }
    }

    debug!(task = %label, "Polling task stopped");
}

/// Running polling session.
///
/// Dropping the handle also signals every task to stop, without waiting.
#[derive(Debug)]
pub struct PollHandle {
    board: Arc<ResultBoard>,
    stop_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl PollHandle {
    /// Shared view of every task's latest result.
    pub fn board(&self) -> Arc<ResultBoard> {
        self.board.clone()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Signal every task to stop and wait for them.
    ///
    /// Tasks still running after `grace` are aborted. Once this returns, no
    /// slot is written again.
    pub async fn stop(self, grace: Duration) -> Result<(), EngineShutdownError> {
        let _ = self.stop_tx.send(true);
        let abandoned = join_within(self.tasks, grace).await;

        if abandoned == 0 {
            info!("Polling stopped");
            Ok(())
        } else {
            let err = EngineShutdownError { abandoned, grace };
            warn!("{}", err);
            Err(err)
        }
    }
}

/// Wait for `tasks` until `grace` has passed, then abort the rest.
/// Returns how many had to be aborted.
async fn join_within(tasks: Vec<JoinHandle<()>>, grace: Duration) -> usize {
    let deadline = tokio::time::Instant::now() + grace;
    let mut abandoned = 0;

    for mut task in tasks {
        if tokio::time::timeout_at(deadline, &mut task).await.is_err() {
            task.abort();
            // Resolves once the task has been dropped.
            let _ = task.await;
            abandoned += 1;
        }
    }
    abandoned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverError;
    use crate::inspector::Reading;
    use crate::inventory::ConnectionSpec;
    use crate::poll::{CellStatus, PollError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, Ordering};

    const INTERVAL: Duration = Duration::from_secs(5);
    const GRACE: Duration = Duration::from_secs(1);

    fn host(address: &str) -> Host {
        Host {
            address: address.to_string(),
            alias: None,
            connection: ConnectionSpec::local(),
        }
    }

    fn metrics(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[derive(Debug, Default)]
    struct Counting {
        calls: AtomicU64,
    }

    #[async_trait]
    impl Sampler for Counting {
        async fn sample(&self) -> Result<Reading, PollError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(Reading::new(n.to_string()).with_gauge(n as f64))
        }
    }

    #[derive(Debug)]
    struct Unreachable;

    #[async_trait]
    impl Sampler for Unreachable {
        async fn sample(&self) -> Result<Reading, PollError> {
            Err(PollError::Driver(DriverError::Failed {
                status: "exit status: 255".to_string(),
                stderr: "Connection refused".to_string(),
            }))
        }
    }

    #[derive(Debug)]
    struct Hanging;

    #[async_trait]
    impl Sampler for Hanging {
        async fn sample(&self) -> Result<Reading, PollError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Reading::new("late"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_samples_every_interval() {
        let handle = start(
            &[host("web")],
            &metrics(&["memory"]),
            |_, _| Arc::new(Counting::default()),
            INTERVAL,
        );
        let board = handle.board();

        // Ticks at 0s, 5s and 10s.
        tokio::time::sleep(Duration::from_secs(12)).await;
        let snap = board.snapshot("web", "memory");
        assert_eq!(snap.attempts, 3);
        assert_eq!(snap.sequence, 3);
        assert_eq!(snap.last_value.unwrap().summary, "3");

        handle.stop(GRACE).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_isolated_per_pair() {
        let handle = start(
            &[host("web"), host("db")],
            &metrics(&["memory", "uptime"]),
            |host, metric| -> Arc<dyn Sampler> {
                if host.address == "db" && metric == "memory" {
                    Arc::new(Unreachable)
                } else {
                    Arc::new(Counting::default())
                }
            },
            INTERVAL,
        );
        assert_eq!(handle.task_count(), 4);
        let board = handle.board();

        tokio::time::sleep(Duration::from_secs(7)).await;

        let failed = board.snapshot("db", "memory");
        assert_eq!(failed.status(), CellStatus::Failed);
        assert_eq!(failed.failures, 2);
        assert!(failed.last_error.unwrap().contains("Connection refused"));

        for (address, metric) in [("web", "memory"), ("web", "uptime"), ("db", "uptime")] {
            let snap = board.snapshot(address, metric);
            assert_eq!(snap.status(), CellStatus::Fresh, "{address}/{metric}");
            assert_eq!(snap.sequence, 2);
        }

        handle.stop(GRACE).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sampler_for_called_in_order() {
        let mut calls = Vec::new();
        let handle = start(
            &[host("a"), host("b")],
            &metrics(&["disk", "memory"]),
            |host, metric| -> Arc<dyn Sampler> {
                calls.push(format!("{}/{}", host.address, metric));
                Arc::new(Counting::default())
            },
            INTERVAL,
        );
        assert_eq!(calls, ["a/disk", "a/memory", "b/disk", "b/memory"]);
        assert_eq!(handle.board().len(), 4);
        handle.stop(GRACE).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_writes_after_stop() {
        let handle = start(
            &[host("web")],
            &metrics(&["memory"]),
            |_, _| Arc::new(Counting::default()),
            INTERVAL,
        );
        let board = handle.board();
        tokio::time::sleep(Duration::from_secs(6)).await;

        handle.stop(GRACE).await.unwrap();
        let before = board.snapshot("web", "memory");

        tokio::time::sleep(Duration::from_secs(60)).await;
        let after = board.snapshot("web", "memory");
        assert_eq!(before.attempts, after.attempts);
        assert_eq!(before.sequence, after.sequence);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_interrupts_in_flight_sample() {
        let handle = start(
            &[host("web")],
            &metrics(&["memory"]),
            |_, _| Arc::new(Hanging),
            INTERVAL,
        );
        let board = handle.board();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(handle.stop(Duration::from_millis(100)).await, Ok(()));
        assert_eq!(board.snapshot("web", "memory").status(), CellStatus::Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_stops_tasks() {
        let handle = start(
            &[host("web")],
            &metrics(&["memory"]),
            |_, _| Arc::new(Counting::default()),
            INTERVAL,
        );
        let board = handle.board();
        tokio::time::sleep(Duration::from_secs(1)).await;
        drop(handle);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(board.snapshot("web", "memory").attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stragglers_are_aborted() {
        let stubborn = tokio::spawn(async {
            loop {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
        });
        let quick = tokio::spawn(async {});

        assert_eq!(join_within(vec![quick, stubborn], GRACE).await, 1);
    }

    #[test]
    fn test_shutdown_error_message() {
        let err = EngineShutdownError {
            abandoned: 2,
            grace: Duration::from_millis(1500),
        };
        assert_eq!(
            err.to_string(),
            "2 polling task(s) did not stop within 1500ms and were aborted"
        );
    }
}
