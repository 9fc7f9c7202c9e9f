//! Detail view rendering.
//!
//! Displays one host and metric: connection, latest reading with all of its
//! fields, the last error, and a sparkline of the gauge history.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Sparkline, Table},
    Frame,
};

use crate::app::App;
use crate::poll::CellStatus;

/// Render the detail of the selected host and metric.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let (Some(host), Some(metric)) = (app.selected_host(), app.selected_metric_name()) else {
        let empty = Paragraph::new(" Nothing selected ").block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(app.theme.border_type),
        );
        frame.render_widget(empty, area);
        return;
    };

    let snap = app.snapshot(&host.address, metric);
    let status = snap.status();

    let chunks = Layout::vertical([
        Constraint::Length(6), // Header with host and status
        Constraint::Min(4),    // Reading fields
        Constraint::Length(7), // Sparkline
    ])
    .split(area);

    // ===== HEADER SECTION =====
    let connection = &host.connection;
    let mut target = connection.target_host.clone();
    if let Some(ref user) = connection.username {
        target = format!("{}@{}", user, target);
    }

    let updated = match snap.last_updated_at {
        Some(at) => format!("{:.0}s ago", at.elapsed().as_secs_f64()),
        None => "never".to_string(),
    };

    let mut header_lines = vec![
        Line::from(vec![
            Span::styled(
                format!(" {} ", host.address),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("({}) ", host.display_alias())),
            Span::styled(
                format!("{} {}", connection.strategy.label(), target),
                Style::default().add_modifier(Modifier::DIM),
            ),
        ]),
        Line::from(vec![
            Span::raw(" Status: "),
            Span::styled(status.symbol(), app.theme.status_style(status)),
            Span::raw(format!(
                "    Updated: {}    Attempts: {}    Failures: {}",
                updated, snap.attempts, snap.failures
            )),
        ]),
    ];
    if let Some(ref err) = snap.last_error {
        header_lines.push(Line::from(vec![
            Span::raw(" Error: "),
            Span::styled(err.clone(), app.theme.status_style(CellStatus::Failed)),
        ]));
    }

    let header_block = Block::default()
        .title(format!(" {} - {} ", host.address, metric))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));
    frame.render_widget(Paragraph::new(header_lines).block(header_block), chunks[0]);

    // ===== READING FIELDS =====
    let fields_block = Block::default()
        .title(" Reading ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    match snap.last_value {
        Some(ref reading) if !reading.fields.is_empty() => {
            let rows: Vec<Row> = reading
                .fields
                .iter()
                .map(|(label, value)| {
                    Row::new(vec![Cell::from(label.clone()), Cell::from(value.clone())])
                })
                .collect();
            let table =
                Table::new(rows, [Constraint::Fill(1), Constraint::Fill(2)]).block(fields_block);
            frame.render_widget(table, chunks[1]);
        }
        Some(ref reading) => {
            let summary = Paragraph::new(format!(" {}", reading.summary)).block(fields_block);
            frame.render_widget(summary, chunks[1]);
        }
        None => {
            let empty = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    "  No value yet",
                    Style::default().add_modifier(Modifier::DIM),
                )),
            ])
            .block(fields_block);
            frame.render_widget(empty, chunks[1]);
        }
    }

    // ===== SPARKLINE =====
    let data = app.history.sparkline(&host.address, metric);
    let title = match app.history.stats(&host.address, metric) {
        Some(stats) => format!(
            " History: now {:.2}  min {:.2}  avg {:.2}  max {:.2} ",
            stats.latest, stats.min, stats.mean, stats.max
        ),
        None => " History ".to_string(),
    };
    let sparkline = Sparkline::default()
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .data(&data)
        .style(Style::default().fg(app.theme.healthy));
    frame.render_widget(sparkline, chunks[2]);
}
