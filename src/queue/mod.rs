//! Queue module: task model, manager, and snapshot publisher

pub mod manager;
pub mod publish;
pub mod task;

// Re-export for convenience
pub use manager::QueueManager;
pub use publish::{SubscriptionId, UpdateBus};
pub use task::{Task, TaskSpec, TaskStatus};
