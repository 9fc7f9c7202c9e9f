//! Application state and navigation logic.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant, UNIX_EPOCH};

use anyhow::Result;
use tracing::info;

use crate::config::DashboardInfo;
use crate::data::{History, PageState};
use crate::inventory::Host;
use crate::poll::{CellSnapshot, CellStatus, ResultBoard};
use crate::ui::Theme;

/// Lines kept in the log pane.
const MAX_LOG_LINES: usize = 200;

/// How long a status bar message stays visible.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// The current screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Paged table of hosts with one column per metric.
    Hosts,
    /// A single host and metric.
    Detail,
}

/// Main application state.
///
/// Owned by the UI loop; input handlers take it by `&mut` and renderers by
/// reference. Polled values are read from the shared [`ResultBoard`].
pub struct App {
    pub running: bool,
    pub view: View,
    pub show_help: bool,

    pub title: String,
    pub hosts: Vec<Host>,
    pub metrics: Vec<String>,
    pub poll_interval: Duration,

    // Navigation state
    pub page: PageState,
    /// Row within the current page.
    pub selected_row: usize,
    pub selected_metric: usize,

    // Polled data
    board: Arc<ResultBoard>,
    pub history: History,
    last_status: HashMap<(String, String), CellStatus>,
    pub last_refresh: Option<Instant>,

    // UI
    pub theme: Theme,
    pub log: VecDeque<String>,
    pub status_message: Option<(String, Instant)>,
}

impl App {
    pub fn new(
        info: &DashboardInfo,
        board: Arc<ResultBoard>,
        page_size: usize,
        theme: Theme,
    ) -> Self {
        let mut app = Self {
            running: true,
            view: View::Hosts,
            show_help: false,
            title: info.title.clone(),
            hosts: info.hosts.clone(),
            metrics: info.metric_names(),
            poll_interval: info.poll_interval,
            page: PageState::new(info.hosts.len(), page_size),
            selected_row: 0,
            selected_metric: 0,
            board,
            history: History::new(),
            last_status: HashMap::new(),
            last_refresh: None,
            theme,
            log: VecDeque::new(),
            status_message: None,
        };
        app.push_log(format!(
            "Watching {} hosts, {} metrics every {}s",
            app.hosts.len(),
            app.metrics.len(),
            app.poll_interval.as_secs()
        ));
        app
    }

    /// Append a line to the log pane.
    pub fn push_log(&mut self, line: String) {
        self.log.push_back(line);
        if self.log.len() > MAX_LOG_LINES {
            self.log.pop_front();
        }
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        match &self.status_message {
            Some((msg, time)) if time.elapsed() < STATUS_MESSAGE_TTL => Some(msg),
            _ => None,
        }
    }

    /// Hosts on the current page.
    pub fn visible_hosts(&self) -> &[Host] {
        &self.hosts[self.page.range()]
    }

    pub fn selected_host(&self) -> Option<&Host> {
        self.visible_hosts().get(self.selected_row)
    }

    pub fn selected_metric_name(&self) -> Option<&str> {
        self.metrics.get(self.selected_metric).map(String::as_str)
    }

    pub fn snapshot(&self, address: &str, metric: &str) -> CellSnapshot {
        self.board.snapshot(address, metric)
    }

    /// Pull new samples from the board into history and the log pane.
    ///
    /// Returns the number of new samples recorded.
    pub fn refresh(&mut self) -> usize {
        let mut recorded = 0;
        let mut lines = Vec::new();

        for host in &self.hosts {
            for metric in &self.metrics {
                let snap = self.board.snapshot(&host.address, metric);
                if self.history.record(&host.address, metric, &snap) {
                    recorded += 1;
                }

                let status = snap.status();
                let key = (host.address.clone(), metric.clone());
                let previous = self.last_status.insert(key, status);
                if previous == Some(status) {
                    continue;
                }
                match status {
                    CellStatus::Failed | CellStatus::Stale => lines.push(format!(
                        "{} - {}: {}",
                        host.address,
                        metric,
                        snap.last_error.as_deref().unwrap_or("failed")
                    )),
                    CellStatus::Fresh
                        if matches!(previous, Some(CellStatus::Failed | CellStatus::Stale)) =>
                    {
                        lines.push(format!("{} - {}: recovered", host.address, metric))
                    }
                    _ => {}
                }
            }
        }

        for line in lines {
            self.push_log(line);
        }
        self.last_refresh = Some(Instant::now());
        recorded
    }

    /// Show the next page of hosts, wrapping to the first.
    pub fn next_page(&mut self) {
        if self.page.page_count() == 0 {
            return;
        }
        self.page.next();
        self.selected_row = 0;
        self.push_log(format!("Moving on to next page {}", self.page.index() + 1));
    }

    /// Show the previous page of hosts, wrapping to the last.
    pub fn prev_page(&mut self) {
        if self.page.page_count() == 0 {
            return;
        }
        self.page.prev();
        self.selected_row = 0;
        self.push_log(format!("Moving on to previous page {}", self.page.index() + 1));
    }

    /// Open the detail view for one host and metric.
    ///
    /// Returns false (and changes nothing) if either is unknown.
    pub fn select_host(&mut self, address: &str, metric: &str) -> bool {
        let Some(position) = self.hosts.iter().position(|h| h.address == address) else {
            return false;
        };
        let Some(metric_index) = self.metrics.iter().position(|m| m == metric) else {
            return false;
        };

        self.page.show_position(position);
        self.selected_row = position - self.page.range().start;
        self.selected_metric = metric_index;
        self.view = View::Detail;
        self.push_log(format!("View {} - {}", address, metric));
        info!(host = address, metric, "Opened detail view");
        true
    }

    /// Open the detail view for the current selection.
    pub fn enter_detail(&mut self) {
        let Some(address) = self.selected_host().map(|h| h.address.clone()) else {
            return;
        };
        let Some(metric) = self.selected_metric_name().map(str::to_string) else {
            self.set_status_message("No metrics configured".to_string());
            return;
        };
        self.select_host(&address, &metric);
    }

    /// Move selection down one row on the current page.
    pub fn select_next(&mut self) {
        let max = self.visible_hosts().len().saturating_sub(1);
        self.selected_row = (self.selected_row + 1).min(max);
    }

    /// Move selection up one row on the current page.
    pub fn select_prev(&mut self) {
        self.selected_row = self.selected_row.saturating_sub(1);
    }

    pub fn next_metric(&mut self) {
        if !self.metrics.is_empty() {
            self.selected_metric = (self.selected_metric + 1) % self.metrics.len();
        }
    }

    pub fn prev_metric(&mut self) {
        if !self.metrics.is_empty() {
            self.selected_metric =
                (self.selected_metric + self.metrics.len() - 1) % self.metrics.len();
        }
    }

    /// Leave the detail view.
    pub fn go_back(&mut self) {
        self.view = View::Hosts;
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Current state of every cell as JSON.
    pub fn export_value(&self) -> serde_json::Value {
        let hosts: Vec<serde_json::Value> = self
            .hosts
            .iter()
            .map(|host| {
                let mut metrics = serde_json::Map::new();
                for metric in &self.metrics {
                    let snap = self.board.snapshot(&host.address, metric);
                    let updated = snap
                        .last_updated_wall
                        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                        .map(|d| d.as_secs());
                    metrics.insert(
                        metric.clone(),
                        serde_json::json!({
                            "status": format!("{:?}", snap.status()),
                            "value": snap.last_value,
                            "error": snap.last_error,
                            "attempts": snap.attempts,
                            "failures": snap.failures,
                            "last_updated": updated,
                        }),
                    );
                }
                serde_json::json!({
                    "address": host.address,
                    "alias": host.alias,
                    "driver": host.connection.strategy.label(),
                    "metrics": metrics,
                })
            })
            .collect();

        serde_json::json!({
            "title": self.title,
            "poll_interval_secs": self.poll_interval.as_secs(),
            "hosts": hosts,
        })
    }

    /// Export current state to a file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.export_value())?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspector::Reading;
    use crate::inventory::ConnectionSpec;
    use std::collections::BTreeMap;

    fn info(n: usize) -> DashboardInfo {
        let hosts = (0..n)
            .map(|i| Host {
                address: format!("host-{i}"),
                alias: None,
                connection: ConnectionSpec::local(),
            })
            .collect();
        let mut metrics = BTreeMap::new();
        metrics.insert("memory".to_string(), None);
        metrics.insert("loadavg".to_string(), None);
        DashboardInfo {
            hosts,
            metrics,
            title: "Test".to_string(),
            poll_interval: Duration::from_secs(5),
        }
    }

    fn board_for(info: &DashboardInfo) -> Arc<ResultBoard> {
        let mut board = ResultBoard::new();
        for host in &info.hosts {
            for metric in info.metrics.keys() {
                board.insert(&host.address, metric);
            }
        }
        Arc::new(board)
    }

    fn app(n: usize) -> (App, Arc<ResultBoard>) {
        let info = info(n);
        let board = board_for(&info);
        (App::new(&info, board.clone(), 5, Theme::dark()), board)
    }

    #[test]
    fn test_page_navigation_logs() {
        let (mut app, _) = app(12);
        assert_eq!(app.visible_hosts().len(), 5);

        app.select_next();
        app.next_page();
        assert_eq!(app.page.index(), 1);
        assert_eq!(app.selected_row, 0);
        assert_eq!(app.log.back().unwrap(), "Moving on to next page 2");

        app.prev_page();
        app.prev_page();
        assert_eq!(app.page.index(), 2);
        assert_eq!(app.visible_hosts().len(), 2);
        assert_eq!(app.log.back().unwrap(), "Moving on to previous page 3");
    }

    #[test]
    fn test_select_host_opens_detail() {
        let (mut app, _) = app(12);
        assert!(app.select_host("host-7", "memory"));
        assert_eq!(app.view, View::Detail);
        assert_eq!(app.page.index(), 1);
        assert_eq!(app.selected_host().unwrap().address, "host-7");
        assert_eq!(app.selected_metric_name(), Some("memory"));
        assert_eq!(app.log.back().unwrap(), "View host-7 - memory");

        app.go_back();
        assert_eq!(app.view, View::Hosts);
    }

    #[test]
    fn test_select_unknown_host_changes_nothing() {
        let (mut app, _) = app(3);
        assert!(!app.select_host("nope", "memory"));
        assert!(!app.select_host("host-1", "cpu"));
        assert_eq!(app.view, View::Hosts);
    }

    #[test]
    fn test_selection_clamped_to_page() {
        let (mut app, _) = app(2);
        for _ in 0..5 {
            app.select_next();
        }
        assert_eq!(app.selected_row, 1);
        app.select_prev();
        app.select_prev();
        assert_eq!(app.selected_row, 0);
    }

    #[test]
    fn test_metric_cycling() {
        let (mut app, _) = app(1);
        assert_eq!(app.selected_metric_name(), Some("loadavg"));
        app.next_metric();
        assert_eq!(app.selected_metric_name(), Some("memory"));
        app.next_metric();
        assert_eq!(app.selected_metric_name(), Some("loadavg"));
        app.prev_metric();
        assert_eq!(app.selected_metric_name(), Some("memory"));
    }

    #[test]
    fn test_refresh_records_history_and_transitions() {
        let (mut app, board) = app(1);
        let slot = board.slot("host-0", "loadavg").unwrap().clone();

        slot.record_failure("Connection refused".to_string());
        app.refresh();
        assert_eq!(app.log.back().unwrap(), "host-0 - loadavg: Connection refused");

        slot.record_success(Reading::new("0.5").with_gauge(0.5));
        assert_eq!(app.refresh(), 1);
        assert_eq!(app.log.back().unwrap(), "host-0 - loadavg: recovered");

        let lines = app.log.len();
        assert_eq!(app.refresh(), 0);
        assert_eq!(app.log.len(), lines);
        assert_eq!(app.history.len("host-0", "loadavg"), 1);
    }

    #[test]
    fn test_log_is_bounded() {
        let (mut app, _) = app(1);
        for i in 0..(MAX_LOG_LINES + 20) {
            app.push_log(i.to_string());
        }
        assert_eq!(app.log.len(), MAX_LOG_LINES);
        assert_eq!(app.log.back().unwrap(), &(MAX_LOG_LINES + 19).to_string());
    }

    #[test]
    fn test_export() {
        let (app, board) = app(2);
        board
            .slot("host-1", "memory")
            .unwrap()
            .record_success(Reading::new("42% of 8.0G").with_gauge(42.0));

        let value = app.export_value();
        assert_eq!(value["title"], "Test");
        assert_eq!(value["hosts"][0]["driver"], "local");
        let cell = &value["hosts"][1]["metrics"]["memory"];
        assert_eq!(cell["status"], "Fresh");
        assert_eq!(cell["value"]["gauge"], 42.0);
        assert_eq!(value["hosts"][0]["metrics"]["memory"]["status"], "Pending");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        app.export_state(&path).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, value);
    }

    #[test]
    fn test_status_message_expires() {
        let (mut app, _) = app(1);
        app.set_status_message("hello".to_string());
        assert_eq!(app.get_status_message(), Some("hello"));
        app.status_message = Some(("old".to_string(), Instant::now() - STATUS_MESSAGE_TTL));
        assert_eq!(app.get_status_message(), None);
    }
}
