//! Dispatch module - in-flight command tracking and response routing.
//!
//! Provides:
//! - [`CommandQueue`] - FIFO of [`PendingCommand`]s, fed frames in arrival
//!   order and always serving the queue head
//! - [`verbs`] - the per-verb step tables

mod pending;
pub mod verbs;

pub use pending::{CommandQueue, PendingCommand, PayloadFn, Reply, StatusFn, Step, StepOutcome};
