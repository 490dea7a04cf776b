//! Download queue manager: one task at a time, FIFO, observable

use crate::progress::{ProgressSource, TransferRequest};
use crate::queue::publish::{SubscriptionId, UpdateBus};
use crate::queue::task::{Task, TaskSpec, TaskStatus};
use crate::utils::config::QueueConfig;
use crate::utils::error::TasklineError;
use anyhow::Result;
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Handle to the transfer currently occupying the active slot.
struct ActiveTransfer {
    id: String,
    cancel_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

/// Store and active slot, guarded together as one critical section so the
/// single-active-task invariant holds under concurrent calls.
struct QueueState {
    /// All non-removed tasks, in insertion order.
    tasks: Vec<Task>,
    active: Option<ActiveTransfer>,
}

/// Sequential task queue with observable state.
///
/// Tasks run strictly one at a time, selected oldest-pending-first, and
/// every state change publishes a full snapshot to subscribers. Cheap to
/// clone; clones share the same queue. Construct one at the application's
/// composition root and hand clones to consumers.
#[derive(Clone)]
pub struct QueueManager {
    state: Arc<Mutex<QueueState>>,
    bus: Arc<UpdateBus>,
    source: Arc<dyn ProgressSource>,
    config: QueueConfig,
}

impl QueueManager {
    /// Create a queue backed by the given progress source.
    pub fn new(config: QueueConfig, source: Arc<dyn ProgressSource>) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState {
                tasks: Vec::new(),
                active: None,
            })),
            bus: Arc::new(UpdateBus::new()),
            source,
            config: config.sanitized(),
        }
    }

    /// Append tasks to the queue and kick off processing if idle.
    ///
    /// Rejects the whole batch if any id (against the store or within the
    /// batch itself) is already taken; no task of a bad batch is admitted.
    /// Returns the ids in submission order.
    pub async fn enqueue(&self, specs: Vec<TaskSpec>) -> Result<Vec<String>> {
        if specs.is_empty() {
            return Ok(Vec::new());
        }

        let ids = {
            let mut state = self.state.lock().await;

            let mut taken: HashSet<String> =
                state.tasks.iter().map(|t| t.id.clone()).collect();
            let mut batch = Vec::with_capacity(specs.len());
            for spec in specs {
                let task = Task::from_spec(spec);
                if !taken.insert(task.id.clone()) {
                    return Err(TasklineError::DuplicateTask(task.id).into());
                }
                batch.push(task);
            }

            let ids: Vec<String> = batch.iter().map(|t| t.id.clone()).collect();
            for task in batch {
                info!("Added task {} to queue", task.id);
                state.tasks.push(task);
            }
            self.publish_locked(&state);
            ids
        };

        self.process_next().await;
        Ok(ids)
    }

    /// Remove a task from the queue, whatever its status.
    ///
    /// Unknown ids are tolerated as a no-op without publishing. Removing the
    /// active task cancels its transfer and promotes the next pending task.
    pub async fn remove(&self, id: &str) {
        let cancelled = {
            let mut state = self.state.lock().await;
            let Some(index) = state.tasks.iter().position(|t| t.id == id) else {
                debug!("Ignoring removal of unknown task {}", id);
                return;
            };
            state.tasks.remove(index);
            info!("Removed task {}", id);

            let was_active = matches!(&state.active, Some(active) if active.id == id);
            let cancelled = if was_active { state.active.take() } else { None };
            self.publish_locked(&state);
            cancelled
        };

        if let Some(active) = cancelled {
            let _ = active.cancel_tx.try_send(());
            active.handle.abort();
        }
        self.process_next().await;
    }

    /// Drop all finished tasks (completed and failed) in one pass.
    pub async fn clear_completed(&self) {
        let mut state = self.state.lock().await;
        let before = state.tasks.len();
        state.tasks.retain(|t| !t.status.is_terminal());
        let dropped = before - state.tasks.len();
        if dropped > 0 {
            info!("Cleared {} finished tasks from queue", dropped);
            self.publish_locked(&state);
        }
    }

    /// Snapshot of all tasks in queue order. An owned copy; mutating it
    /// never touches queue state.
    pub async fn get_all_tasks(&self) -> Vec<Task> {
        self.state.lock().await.tasks.clone()
    }

    /// Snapshot of a single task.
    pub async fn get_task(&self, id: &str) -> Option<Task> {
        self.state
            .lock()
            .await
            .tasks
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    /// Register a listener invoked with a snapshot on every queue change.
    pub fn subscribe(
        &self,
        listener: impl Fn(&[Task]) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.bus.subscribe(listener)
    }

    /// Remove a previously registered listener; unknown ids are a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.bus.unsubscribe(id);
    }

    /// Select-next critical section: activates the oldest pending task when
    /// the active slot is free. Safe to call at any time.
    //
    // Returns a boxed `Send` future rather than being a plain `async fn` so
    // that the compiler's auto-trait inference can resolve the cyclic
    // `drive -> settle -> process_next -> spawn(drive)` chain: the recursive
    // await sees a declared-`Send` type instead of an unresolved `impl Future`.
    fn process_next(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            if state.active.is_some() {
                return;
            }
            let Some(task) = state
                .tasks
                .iter_mut()
                .find(|t| t.status == TaskStatus::Pending)
            else {
                debug!("Queue idle");
                return;
            };

            task.status = TaskStatus::Active;
            let request = TransferRequest {
                id: task.id.clone(),
                label: task.label.clone(),
                size_units: task.size_units,
            };
            info!("Task {} started", request.id);
            self.publish_locked(&state);

            let (cancel_tx, cancel_rx) = mpsc::channel(1);
            let handle = tokio::spawn(Self::drive(self.clone(), request.clone(), cancel_rx));
            state.active = Some(ActiveTransfer {
                id: request.id,
                cancel_tx,
                handle,
            });
        })
    }

    /// Run one transfer on its own spawned task: forward progress reports
    /// into the store and settle the task when the source finishes. Exits
    /// silently on cancellation so a removed task never surfaces again.
    async fn drive(queue: QueueManager, request: TransferRequest, mut cancel_rx: mpsc::Receiver<()>) {
        let (progress_tx, mut progress_rx) = mpsc::channel(queue.config.progress_buffer);
        let source = Arc::clone(&queue.source);
        let transfer = {
            let request = request.clone();
            async move { source.transfer(request, progress_tx).await }
        };
        tokio::pin!(transfer);

        let outcome = loop {
            tokio::select! {
                result = &mut transfer => break result,
                Some(percent) = progress_rx.recv() => {
                    queue.apply_progress(&request.id, percent).await;
                }
                Some(()) = cancel_rx.recv() => {
                    debug!("Transfer for task {} cancelled", request.id);
                    return;
                }
            }
        };

        // Reports that raced with source completion are still applied in order.
        while let Ok(percent) = progress_rx.try_recv() {
            queue.apply_progress(&request.id, percent).await;
        }

        queue.settle(&request.id, outcome).await;
    }

    /// Record a progress report for the given task, publishing when the
    /// value advances. Reports for removed or settled tasks are dropped.
    async fn apply_progress(&self, id: &str, percent: u8) {
        let mut state = self.state.lock().await;
        let Some(task) = state.tasks.iter_mut().find(|t| t.id == id) else {
            return;
        };
        if task.apply_progress(percent) {
            self.publish_locked(&state);
        }
    }

    /// Move the active task to its terminal status and select the next one.
    async fn settle(&self, id: &str, outcome: Result<()>) {
        {
            let mut state = self.state.lock().await;
            let ours = matches!(&state.active, Some(active) if active.id == id);
            if !ours {
                // Removal raced the final report; nothing left to settle.
                return;
            }
            state.active = None;

            if let Some(task) = state.tasks.iter_mut().find(|t| t.id == id) {
                match outcome {
                    Ok(()) => {
                        task.progress = 100;
                        task.status = TaskStatus::Completed;
                        info!("Task {} completed", id);
                    }
                    Err(e) => {
                        task.status = TaskStatus::Failed(e.to_string());
                        error!("Task {} failed: {}", id, e);
                    }
                }
                self.publish_locked(&state);
            }
        }

        self.process_next().await;
    }

    /// Publish a snapshot of the current state. The caller holds the state
    /// lock, which is what keeps publishes in generation order.
    fn publish_locked(&self, state: &QueueState) {
        let snapshot = state.tasks.clone();
        self.bus.publish(&snapshot);
    }
}
