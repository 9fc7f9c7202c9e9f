//! Display-side data: host pagination and gauge history.
//!
//! ## Submodules
//!
//! - [`pager`]: Splitting hosts into pages ([`paginate`], [`PageState`])
//! - [`history`]: Recent gauge values per cell for sparklines ([`History`])
//!
//! ## Data Flow
//!
//! ```text
//! Vec<Host> ──▶ PageState ──▶ hosts on the visible page
//!
//! ResultBoard (snapshots)
//!        │
//!        ▼
//! History::record()  (once per new sample)
//! ```

pub mod history;
pub mod pager;

pub use history::{GaugeStats, History};
pub use pager::{paginate, PageState};
