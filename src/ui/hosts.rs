//! Host page rendering.
//!
//! One row per host on the current page, one column per metric, plus a
//! short trend of the selected metric.

use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    text::Span,
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::poll::{CellSnapshot, CellStatus};

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Width of the trend column, in samples.
const TREND_WIDTH: usize = 8;

/// Render the current page of hosts.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let hosts = app.visible_hosts();
    let selected_metric = app.selected_metric_name();

    let mut header_cells = vec![
        Cell::from("Host"),
        Cell::from("Alias"),
        Cell::from("Driver"),
    ];
    for metric in &app.metrics {
        let style = if Some(metric.as_str()) == selected_metric {
            app.theme.column_active
        } else {
            app.theme.header
        };
        header_cells.push(Cell::from(Span::styled(metric.clone(), style)));
    }
    header_cells.push(Cell::from("Trend"));
    let header = Row::new(header_cells).height(1).style(app.theme.header);

    let rows: Vec<Row> = hosts
        .iter()
        .map(|host| {
            let mut cells = vec![
                Cell::from(host.address.clone()),
                Cell::from(host.display_alias().to_string()),
                Cell::from(host.connection.strategy.label()),
            ];
            for metric in &app.metrics {
                let snap = app.snapshot(&host.address, metric);
                cells.push(metric_cell(app, &snap));
            }
            let trend = selected_metric
                .map(|m| render_trend(&app.history.sparkline(&host.address, m)))
                .unwrap_or_default();
            cells.push(Cell::from(trend).style(Style::default().fg(app.theme.highlight)));
            Row::new(cells)
        })
        .collect();

    let mut widths = vec![
        Constraint::Fill(2), // Host
        Constraint::Fill(1), // Alias
        Constraint::Length(6),
    ];
    widths.extend(app.metrics.iter().map(|_| Constraint::Fill(2)));
    widths.push(Constraint::Length(TREND_WIDTH as u16));

    let selected = app.selected_row.min(hosts.len().saturating_sub(1));
    let position_info = if !hosts.is_empty() {
        format!(" [{}/{}]", app.page.range().start + selected + 1, app.hosts.len())
    } else {
        String::new()
    };
    let title = format!(
        " Hosts (page {}/{}){} ",
        app.page.index() + 1,
        app.page.page_count().max(1),
        position_info
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(selected));

    frame.render_stateful_widget(table, area, &mut state);
}

fn metric_cell(app: &App, snap: &CellSnapshot) -> Cell<'static> {
    let status = snap.status();
    let text = cell_text(snap);
    let style = match (status, snap.last_value.as_ref().and_then(|v| v.gauge)) {
        // Percent-valued metrics are colored by level when fresh.
        (CellStatus::Fresh, Some(gauge)) if is_percent(snap) => app.theme.percent_style(gauge),
        _ => app.theme.status_style(status),
    };
    Cell::from(text).style(style)
}

/// Text shown in a metric cell.
pub fn cell_text(snap: &CellSnapshot) -> String {
    match (snap.status(), &snap.last_value) {
        (CellStatus::Pending, _) => CellStatus::Pending.symbol().to_string(),
        (CellStatus::Fresh, Some(value)) => value.summary.clone(),
        (CellStatus::Stale, Some(value)) => format!("{} (stale)", value.summary),
        _ => CellStatus::Failed.symbol().to_string(),
    }
}

fn is_percent(snap: &CellSnapshot) -> bool {
    snap.last_value
        .as_ref()
        .is_some_and(|v| v.summary.split_whitespace().next().is_some_and(|w| w.ends_with('%')))
}

/// Render the last few values as block characters scaled to their range.
fn render_trend(values: &[u64]) -> String {
    if values.is_empty() {
        return String::new();
    }

    let window: Vec<u64> = values.iter().rev().take(TREND_WIDTH).rev().copied().collect();
    let min = window.iter().copied().min().unwrap_or(0);
    let max = window.iter().copied().max().unwrap_or(0);
    let range = (max - min).max(1) as f64;

    window
        .iter()
        .map(|&v| {
            let level = ((v - min) as f64 / range * 7.0).round() as usize;
            SPARKLINE_CHARS[level.min(7)]
        })
        .collect()
}
