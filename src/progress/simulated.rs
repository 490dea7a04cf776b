//! Timer-driven stand-in for a real transfer

use crate::progress::source::{ProgressSource, TransferRequest};
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::debug;

/// Simulated transfer that advances a fixed step per fixed tick.
///
/// The default pace (1 unit every 40 ms) finishes a task in roughly four
/// seconds regardless of its size. Placeholder for a transfer source driven
/// by actual bytes moved.
#[derive(Debug, Clone)]
pub struct SimulatedTransfer {
    tick: Duration,
    step: u8,
}

impl SimulatedTransfer {
    /// Create a simulated source advancing `step` percent every `tick`.
    /// A zero step is bumped to 1 so the transfer always terminates.
    pub fn new(tick: Duration, step: u8) -> Self {
        Self {
            tick,
            step: step.max(1),
        }
    }
}

impl Default for SimulatedTransfer {
    fn default() -> Self {
        Self::new(Duration::from_millis(40), 1)
    }
}

#[async_trait]
impl ProgressSource for SimulatedTransfer {
    async fn transfer(&self, request: TransferRequest, updates: mpsc::Sender<u8>) -> Result<()> {
        debug!(
            "Simulating transfer for task {} ({} units)",
            request.id, request.size_units
        );

        let mut percent: u8 = 0;
        while percent < 100 {
            sleep(self.tick).await;
            percent = percent.saturating_add(self.step).min(100);
            if updates.send(percent).await.is_err() {
                // Receiver gone: the transfer was abandoned mid-flight.
                debug!("Transfer for task {} abandoned", request.id);
                return Ok(());
            }
        }

        Ok(())
    }
}
