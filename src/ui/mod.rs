//! Terminal rendering with ratatui.
//!
//! - [`common`]: header, metric tabs, log pane, status bar, help overlay
//! - [`hosts`]: the paged host table
//! - [`detail`]: a single host and metric
//! - [`theme`]: colors, with light/dark detection

pub mod common;
pub mod detail;
pub mod hosts;
pub mod theme;

pub use theme::Theme;
