//! Progress sources: the contract and the simulated implementation

pub mod simulated;
pub mod source;

// Re-export for convenience
pub use simulated::SimulatedTransfer;
pub use source::{ProgressSource, TransferRequest};
