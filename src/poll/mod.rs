//! Concurrent polling of every (host, metric) pair.
//!
//! [`start`] spawns one tokio task per pair. Each task owns a
//! [`ResultSlot`] on the shared [`ResultBoard`], which the dashboard reads
//! from. A single watch channel carries the stop signal to every task.

mod engine;
mod sampler;
mod slot;

pub use engine::{start, EngineShutdownError, PollHandle};
pub use sampler::{InspectorSampler, PollError, Sampler};
pub use slot::{CellSnapshot, CellStatus, ResultBoard, ResultSlot};
