//! Common UI components shared across views.
//!
//! This module contains the header bar, metric tabs, log pane, status bar,
//! and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};
use crate::poll::CellStatus;

/// Cell counts per status across the whole fleet.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: usize,
    pub fresh: usize,
    pub stale: usize,
    pub failed: usize,
}

impl StatusCounts {
    pub fn collect(app: &App) -> Self {
        let mut counts = Self::default();
        for host in &app.hosts {
            for metric in &app.metrics {
                match app.snapshot(&host.address, metric).status() {
                    CellStatus::Pending => counts.pending += 1,
                    CellStatus::Fresh => counts.fresh += 1,
                    CellStatus::Stale => counts.stale += 1,
                    CellStatus::Failed => counts.failed += 1,
                }
            }
        }
        counts
    }
}

/// Render the header bar with the dashboard title and fleet health.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let counts = StatusCounts::collect(app);

    let (status_icon, status_style) = if counts.failed > 0 {
        ("●", app.theme.status_style(CellStatus::Failed))
    } else if counts.stale > 0 {
        ("●", app.theme.status_style(CellStatus::Stale))
    } else if counts.fresh > 0 {
        ("●", app.theme.status_style(CellStatus::Fresh))
    } else {
        ("○", app.theme.status_style(CellStatus::Pending))
    };

    let dim_or = |n: usize, style: Style| {
        if n > 0 {
            Span::styled(n.to_string(), style)
        } else {
            Span::styled("0", Style::default().add_modifier(Modifier::DIM))
        }
    };

    let line = Line::from(vec![
        Span::styled(format!(" {} ", status_icon), status_style),
        Span::styled(
            format!("{} ", app.title.to_uppercase()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("│ "),
        Span::styled(counts.fresh.to_string(), Style::default().fg(app.theme.healthy)),
        Span::raw(" ok "),
        dim_or(counts.stale, Style::default().fg(app.theme.warning)),
        Span::raw(" stale "),
        dim_or(
            counts.failed,
            Style::default().fg(app.theme.critical).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" failed │ "),
        Span::styled(
            app.hosts.len().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" hosts │ "),
        Span::raw(format!("every {}s", app.poll_interval.as_secs())),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Render the metric tabs with the page indicator.
///
/// Highlights the selected metric.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let mut titles: Vec<Line> = app
        .metrics
        .iter()
        .map(|m| Line::from(format!(" {} ", m)))
        .collect();
    if titles.is_empty() {
        titles.push(Line::from(" no metrics "));
    }

    let page = format!(
        " Page {}/{} ",
        app.page.index() + 1,
        app.page.page_count().max(1)
    );
    let page_width = page.len() as u16;

    let tabs = Tabs::new(titles)
        .select(app.selected_metric)
        .style(Style::default().fg(app.theme.border))
        .highlight_style(app.theme.column_active)
        .divider("|");

    let tabs_area = Rect {
        width: area.width.saturating_sub(page_width),
        ..area
    };
    frame.render_widget(tabs, tabs_area);

    if area.width > page_width {
        let page_area = Rect {
            x: area.x + area.width - page_width,
            width: page_width,
            ..area
        };
        frame.render_widget(
            Paragraph::new(page).style(Style::default().add_modifier(Modifier::BOLD)),
            page_area,
        );
    }
}

/// Render the rolling log pane. Newest lines are at the bottom.
pub fn render_log(frame: &mut Frame, app: &App, area: Rect) {
    let visible = area.height.saturating_sub(2) as usize;
    let skip = app.log.len().saturating_sub(visible);
    let lines: Vec<Line> = app
        .log
        .iter()
        .skip(skip)
        .map(|l| Line::from(Span::styled(l.clone(), Style::default().fg(app.theme.log))))
        .collect();

    let block = Block::default()
        .title(" Log reports ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Render the status bar at the bottom.
///
/// Shows: time since last refresh and available controls. Temporary status
/// messages take precedence.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = match app.view {
        View::Hosts => "n/p:page ↑↓:host Tab:metric Enter:detail e:export ?:help q:quit",
        View::Detail => "↑↓:host Tab:metric Esc:back e:export ?:help q:quit",
    };

    let status = match app.last_refresh {
        Some(at) => format!(
            " Refreshed {:.1}s ago | {}",
            at.elapsed().as_secs_f64(),
            controls
        ),
        None => format!(" Waiting for first samples | {}", controls),
    };

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Hosts"),
        Line::from("  n/→/l       Next page"),
        Line::from("  p/←/h       Previous page"),
        Line::from("  ↑/↓ j/k     Select host"),
        Line::from("  Tab/S-Tab   Select metric"),
        Line::from("  Enter       View host - metric"),
        Line::from(""),
        section(" Detail"),
        Line::from("  ↑/↓ j/k     Previous/next host"),
        Line::from("  Tab/S-Tab   Previous/next metric"),
        Line::from("  Esc         Back to hosts"),
        Line::from(""),
        section(" General"),
        Line::from("  r           Refresh now"),
        Line::from("  e           Export to JSON"),
        Line::from("  q/Ctrl-C    Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 42u16.min(area.width.saturating_sub(4));
    let help_height = 23u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    // Clear the area behind the help
    frame.render_widget(ratatui::widgets::Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
