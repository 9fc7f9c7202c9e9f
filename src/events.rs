use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::{Position, Rect};

use crate::app::{App, View};

/// File written by the export key.
pub const EXPORT_FILE: &str = "saido_export.json";

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    if app.view == View::Detail {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Backspace => app.go_back(),
            KeyCode::Char('q') => app.quit(),
            // Step through hosts and metrics without leaving the view
            KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => app.select_next(),
            KeyCode::Tab => app.next_metric(),
            KeyCode::BackTab => app.prev_metric(),
            KeyCode::Char('?') => app.toggle_help(),
            KeyCode::Char('e') => export(app),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),

        // Pages
        KeyCode::Char('n') | KeyCode::Right | KeyCode::Char('l') | KeyCode::PageDown => {
            app.next_page()
        }
        KeyCode::Char('p') | KeyCode::Left | KeyCode::Char('h') | KeyCode::PageUp => {
            app.prev_page()
        }

        // Rows and metric columns
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.prev_metric();
            } else {
                app.next_metric();
            }
        }
        KeyCode::BackTab => app.prev_metric(),

        KeyCode::Enter => app.enter_detail(),

        // Pull in whatever the pollers have published since the last tick
        KeyCode::Char('r') => {
            app.refresh();
        }

        KeyCode::Char('?') => app.toggle_help(),
        KeyCode::Char('e') => export(app),

        _ => {}
    }
}

fn export(app: &mut App) {
    let export_path = PathBuf::from(EXPORT_FILE);
    match app.export_state(&export_path) {
        Ok(()) => {
            app.set_status_message(format!("Exported to {}", export_path.display()));
        }
        Err(e) => {
            app.set_status_message(format!("Export failed: {}", e));
        }
    }
}

/// Handle mouse events
///
/// `table` is the screen area of the host table, borders included. Left
/// clicks outside it are ignored.
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent, table: Rect) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.select_prev(),
        MouseEventKind::ScrollDown => app.select_next(),

        // Click a host row to select it, click again to open it
        MouseEventKind::Down(MouseButton::Left) if app.view == View::Hosts => {
            if !table.contains(Position::new(mouse.column, mouse.row)) {
                return;
            }
            // Top border and header line sit above the first row
            let first_row = table.y + 2;
            if mouse.row >= first_row {
                let row = (mouse.row - first_row) as usize;
                if row < app.visible_hosts().len() {
                    if row == app.selected_row {
                        app.enter_detail();
                    } else {
                        app.selected_row = row;
                    }
                }
            }
        }

        // Right-click goes back
        MouseEventKind::Down(MouseButton::Right) => app.go_back(),

        _ => {}
    }
}
