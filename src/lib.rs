//! # saido
//!
//! A terminal dashboard that polls metrics from a fleet of hosts, locally or
//! over SSH, and renders them live.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  config.yaml                                                 │
//! │      │                                                       │
//! │      ▼                                                       │
//! │  config::load ──▶ inventory (tree ─▶ resolve) ──▶ Vec<Host>  │
//! │                                                   │          │
//! │            ┌──────────────────────────────────────┘          │
//! │            ▼                                                 │
//! │  poll::start ── one task per (host, metric) ──▶ ResultBoard  │
//! │    driver (local | ssh) + inspector (command + parser)  │     │
//! │                                                         ▼     │
//! │  app (state) ◀── events (keys)          ui (ratatui) ◀─ app   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`config`]**: the YAML document, validated into [`DashboardInfo`]
//! - **[`inventory`]**: the group/host tree and connection inheritance
//! - **[`driver`]**: running commands locally or through `ssh`
//! - **[`inspector`]**: built-in metrics and their output parsers
//! - **[`poll`]**: the concurrent polling engine and its result slots
//! - **[`data`]**: pagination and gauge history
//! - **[`app`]**, **[`events`]**, **[`ui`]**: the interactive dashboard
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! saido config.yaml
//!
//! # Validate and list the resolved inventory without opening the dashboard
//! saido --check config.yaml
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use saido::inspector::MetricRegistry;
//! use saido::poll::{self, InspectorSampler, Sampler};
//!
//! # tokio_test::block_on(async {
//! let info = saido::config::load("config.yaml".as_ref()).unwrap();
//! let registry = MetricRegistry::new();
//!
//! let handle = poll::start(
//!     &info.hosts,
//!     &info.metric_names(),
//!     |host, metric| -> Arc<dyn Sampler> {
//!         let inspector = registry
//!             .inspector(metric, info.metrics[metric].as_deref())
//!             .unwrap();
//!         Arc::new(InspectorSampler::new(
//!             host.connection.to_driver(),
//!             inspector,
//!             Duration::from_secs(10),
//!         ))
//!     },
//!     info.poll_interval,
//! );
//!
//! let board = handle.board();
//! tokio::time::sleep(Duration::from_secs(1)).await;
//! println!("{:?}", board.snapshot(&info.hosts[0].address, "memory"));
//!
//! handle.stop(Duration::from_secs(2)).await.unwrap();
//! # });
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod driver;
pub mod error;
pub mod events;
pub mod inspector;
pub mod inventory;
pub mod logging;
pub mod poll;
pub mod settings;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use config::DashboardInfo;
pub use error::ConfigError;
pub use inventory::{ConnectionSpec, Host};
pub use poll::{PollHandle, ResultBoard};
pub use settings::Settings;
