//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::poll::CellStatus;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Color for stale values and high gauges.
    pub warning: Color,
    /// Color for failed cells.
    pub critical: Color,
    /// Color for fresh values.
    pub healthy: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Color for log pane lines.
    pub log: Color,
    /// Style for header rows in tables.
    pub header: Style,
    /// Style for selected/highlighted rows.
    pub selected: Style,
    /// Style for the selected metric column header.
    pub column_active: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            border: Color::Gray,
            log: Color::Indexed(142),
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            column_active: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            border: Color::DarkGray,
            log: Color::Indexed(94),
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::LightBlue).add_modifier(Modifier::BOLD),
            column_active: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Get style for a cell status
    pub fn status_style(&self, status: CellStatus) -> Style {
        match status {
            CellStatus::Pending => Style::default().add_modifier(Modifier::DIM),
            CellStatus::Fresh => Style::default().fg(self.healthy),
            CellStatus::Stale => Style::default().fg(self.warning),
            CellStatus::Failed => Style::default().fg(self.critical).add_modifier(Modifier::BOLD),
        }
    }

    /// Style for a percentage gauge: warning from 75%, critical from 90%.
    pub fn percent_style(&self, percent: f64) -> Style {
        if percent >= 90.0 {
            Style::default().fg(self.critical).add_modifier(Modifier::BOLD)
        } else if percent >= 75.0 {
            Style::default().fg(self.warning)
        } else {
            Style::default().fg(self.healthy)
        }
    }
}
