//! Worker primitives shared by notification delivery.
//!
//! Callers may publish from plain OS threads with no Tokio runtime entered, so
//! every spawn here resolves a runtime handle first and falls back to the
//! shared delivery runtime.

/// Task classification used for tracing.
mod class;
/// Reactor-safe join set wrapper.
mod join_set;
/// Panic payload extraction.
mod panic;
/// Spawn entry points.
mod spawn;

pub use class::TaskClass;
pub use join_set::WorkerJoinSet;
pub use panic::{join_error_panic_message, panic_payload_message};
pub use spawn::{runtime_handle, spawn, spawn_blocking};
