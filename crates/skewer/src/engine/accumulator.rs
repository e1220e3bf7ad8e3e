use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, Mutex};
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::{debug, warn};
use crate::communication::QueueItem;
use crate::config::BatcherConfig;
use crate::error::{Error, Result};
use super::batch::{Batch, BatchId, CloseReason};

/// A deadline the caller of [`Accumulator::enqueue`] must arm for a freshly opened batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PendingDeadline {
    pub batch_id: BatchId,
    pub at: Instant,
}

/// The single accumulation point of an engine.
///
/// Owns the slot holding the one OPEN batch. Every admission and every close decision happens
/// while holding the lock around this struct, so a size-triggered close and a deadline-triggered
/// close can never both win for the same batch. A closed batch leaves the slot for good; the
/// next admission opens a new one.
///
/// The open batch's deadline task lives next to it and is aborted when the batch closes for
/// any other reason.
pub(crate) struct Accumulator<I, O> {
    config: BatcherConfig,
    current: Option<Batch<I, O>>,
    deadline_task: Option<AbortHandle>,
    closed_batches: Option<mpsc::UnboundedSender<Batch<I, O>>>,
}

impl<I, O> Accumulator<I, O> {
    /// # Parameters
    ///
    /// * `config` - Size and latency bounds for every batch this accumulator opens
    /// * `closed_batches` - Where closed batches are handed off for dispatch
    pub fn new(config: BatcherConfig, closed_batches: mpsc::UnboundedSender<Batch<I, O>>) -> Self {
        Self {
            config,
            current: None,
            deadline_task: None,
            closed_batches: Some(closed_batches),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed_batches.is_none()
    }

    /// Number of items waiting in the open batch.
    pub fn open_len(&self) -> usize {
        self.current.as_ref().map_or(0, Batch::len)
    }

    /// Appends an item to the open batch, opening one first if there is none.
    ///
    /// A batch that becomes full is closed and handed off before this returns.
    ///
    /// # Returns
    ///
    /// The deadline to arm if this admission opened a batch that is still open.
    ///
    /// # Errors
    ///
    /// [`Error::EngineClosed`] once [`Accumulator::shutdown`] has run.
    pub fn enqueue(&mut self, item: QueueItem<I, O>) -> Result<Option<PendingDeadline>> {
        if self.is_closed() {
            return Err(Error::EngineClosed);
        }

        let (mut batch, opened) = match self.current.take() {
            Some(batch) if batch.accepts() => (batch, false),
            stale => {
                if let Some(stale) = stale {
                    self.hand_off(stale, CloseReason::Full);
                }
                let batch = Batch::open(self.config.max_batch_size(), self.config.max_latency());
                debug!(batch_id = %batch.id(), "batch opened");
                (batch, true)
            }
        };

        if batch.push(item).is_err() {
            unreachable!("an accepting batch rejected an item");
        }

        if batch.is_full() {
            self.hand_off(batch, CloseReason::Full);
            return Ok(None);
        }

        let pending = opened.then(|| PendingDeadline {
            batch_id: batch.id(),
            at: batch.deadline(),
        });
        self.current = Some(batch);
        Ok(pending)
    }

    /// Attaches the deadline task of the open batch identified by `batch_id`.
    ///
    /// A task for a batch that is no longer open is aborted straight away.
    pub fn track_deadline(&mut self, batch_id: BatchId, task: AbortHandle) {
        match &self.current {
            Some(batch) if batch.id() == batch_id => {
                if let Some(previous) = self.deadline_task.replace(task) {
                    previous.abort();
                }
            }
            _ => task.abort(),
        }
    }

    /// Force-closes the open batch if it is still the one identified by `batch_id`.
    ///
    /// # Returns
    ///
    /// `false` if that batch was already closed by another trigger.
    pub fn close_expired(&mut self, batch_id: BatchId) -> bool {
        match self.current.take() {
            Some(batch) if batch.id() == batch_id => {
                self.hand_off(batch, CloseReason::Deadline);
                true
            }
            other => {
                self.current = other;
                false
            }
        }
    }

    /// Stops admissions and flushes the open batch.
    ///
    /// Dropping the sender lets the dispatch worker finish once it has drained what was
    /// already handed off.
    pub fn shutdown(&mut self) {
        if let Some(batch) = self.current.take() {
            self.hand_off(batch, CloseReason::Shutdown);
        }
        self.closed_batches = None;
    }

    fn hand_off(&mut self, mut batch: Batch<I, O>, reason: CloseReason) {
        // the deadline task is the caller when the reason is Deadline
        if let Some(task) = self.deadline_task.take() {
            if reason != CloseReason::Deadline {
                task.abort();
            }
        }
        if !batch.close(reason) {
            return;
        }
        if batch.is_empty() {
            debug!(batch_id = %batch.id(), "discarding empty batch");
            return;
        }
        let Some(closed_batches) = &self.closed_batches else {
            return;
        };
        if closed_batches.send(batch).is_err() {
            warn!("dispatch worker is gone, dropping closed batch");
        }
    }
}

impl<I, O> Drop for Accumulator<I, O> {
    fn drop(&mut self) {
        if let Some(task) = self.deadline_task.take() {
            task.abort();
        }
    }
}

/// Admits one item into the shared accumulator.
///
/// If the item opened a batch that is still open, its deadline task is spawned and attached
/// while the lock is held, so no close can slip in between.
pub(crate) async fn admit<I, O>(accumulator: &Arc<Mutex<Accumulator<I, O>>>, item: QueueItem<I, O>) -> Result<()>
where I: Send + 'static, O: Send + 'static
{
    let mut guard = accumulator.lock().await;
    if let Some(pending) = guard.enqueue(item)? {
        let task = arm_deadline(Arc::downgrade(accumulator), pending);
        guard.track_deadline(pending.batch_id, task);
    }
    Ok(())
}

/// Spawns the deadline task for a freshly opened batch.
///
/// The task holds only a weak reference, so it never keeps a dropped engine alive. When it
/// fires it closes the batch only if that batch is still the open one.
pub(crate) fn arm_deadline<I, O>(accumulator: Weak<Mutex<Accumulator<I, O>>>, pending: PendingDeadline) -> AbortHandle
where I: Send + 'static, O: Send + 'static
{
    let task = tokio::spawn(async move {
        tokio::time::sleep_until(pending.at).await;
        if let Some(accumulator) = accumulator.upgrade() {
            let closed = accumulator.lock().await.close_expired(pending.batch_id);
            if !closed {
                debug!(batch_id = %pending.batch_id, "deadline fired after batch already closed");
            }
        }
    });
    task.abort_handle()
}
