//! Taskline library
//!
//! A single-lane task queue with observable state: tasks run strictly one at
//! a time in submission order, a pluggable progress source advances the
//! active task, and every change hands an immutable snapshot of the whole
//! queue to subscribers.

pub mod progress;
pub mod queue;
pub mod utils;

// Re-export main types for easier use
pub use progress::{ProgressSource, SimulatedTransfer, TransferRequest};
pub use queue::{QueueManager, SubscriptionId, Task, TaskSpec, TaskStatus, UpdateBus};
pub use utils::{QueueConfig, TasklineError};
