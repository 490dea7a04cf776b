//! Progress source contract

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Description of the work handed to a progress source.
///
/// Carries identity and display information only; nothing here influences
/// scheduling, which stays with the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub id: String,
    pub label: String,
    pub size_units: u64,
}

/// Drives a single transfer and reports its progress.
///
/// Contract:
/// - Percent values sent through `updates` are increasing and end at 100.
/// - The method returns exactly once: `Ok(())` after the final report, or
///   `Err` with the cause if the transfer cannot finish.
/// - A closed `updates` channel means the transfer was abandoned; the source
///   must stop reporting and return without error.
///
/// The queue treats implementations interchangeably, so a real
/// network-driven source can replace [`SimulatedTransfer`] without touching
/// queue or publisher behavior.
///
/// [`SimulatedTransfer`]: crate::progress::SimulatedTransfer
#[async_trait]
pub trait ProgressSource: Send + Sync {
    async fn transfer(&self, request: TransferRequest, updates: mpsc::Sender<u8>) -> Result<()>;
}
