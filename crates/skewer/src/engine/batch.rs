use std::fmt;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;
use crate::communication::QueueItem;

/// The identity of a batch, shared verbatim by every item admitted into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(Uuid);

impl BatchId {
    /// Generates a fresh, random batch identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a batch.
///
/// ```text
/// Open -> Closing -> Dispatched -> Completed
///                              \-> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Open,
    Closing,
    Dispatched,
    Completed,
    Failed,
}

/// What caused a batch to stop admitting items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The batch reached `max_batch_size`
    Full,
    /// The batch's deadline elapsed first
    Deadline,
    /// The engine is shutting down
    Shutdown,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CloseReason::Full => "full",
            CloseReason::Deadline => "deadline",
            CloseReason::Shutdown => "shutdown",
        };
        f.write_str(name)
    }
}

/// Upper bound on the item slots reserved when a batch opens.
const PREALLOCATE_LIMIT: usize = 1024;

/// Roughly 30 years, the same horizon tokio uses for a timer that never fires.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// # Batch
///
/// A bounded group of queued items sharing one [`BatchId`].
///
/// Items are kept in arrival order, and the dispatcher relies on that order to route
/// `result[i]` back to `items[i]`.
pub(crate) struct Batch<I, O> {
    id: BatchId,
    items: Vec<QueueItem<I, O>>,
    state: BatchState,
    capacity: usize,
    opened_at: Instant,
    deadline: Instant,
}

impl<I, O> Batch<I, O> {
    /// Opens an empty batch with a deadline `max_latency` from now.
    ///
    /// # Parameters
    ///
    /// * `capacity` - The most items this batch will ever admit
    /// * `max_latency` - How long the batch may stay open
    pub fn open(capacity: usize, max_latency: Duration) -> Self {
        let opened_at = Instant::now();
        let deadline = opened_at
            .checked_add(max_latency)
            .unwrap_or_else(|| opened_at + FAR_FUTURE);
        Self {
            id: BatchId::new(),
            items: Vec::with_capacity(capacity.min(PREALLOCATE_LIMIT)),
            state: BatchState::Open,
            capacity,
            opened_at,
            deadline,
        }
    }

    pub fn id(&self) -> BatchId {
        self.id
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    #[cfg(test)]
    pub fn opened_at(&self) -> Instant {
        self.opened_at
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    /// Whether the batch still takes new items.
    pub fn accepts(&self) -> bool {
        self.state == BatchState::Open && !self.is_full()
    }

    /// Appends an item in arrival order.
    ///
    /// # Returns
    ///
    /// The item back, untouched, if the batch no longer accepts items.
    pub fn push(&mut self, item: QueueItem<I, O>) -> Result<(), QueueItem<I, O>> {
        if !self.accepts() {
            return Err(item);
        }
        self.items.push(item);
        Ok(())
    }

    /// Moves the batch from `Open` to `Closing`.
    ///
    /// Only the first caller wins; every later call, whatever its reason, observes the batch
    /// is no longer open and returns `false`.
    pub fn close(&mut self, reason: CloseReason) -> bool {
        let closed = self.transition(BatchState::Open, BatchState::Closing);
        if closed {
            debug!(
                batch_id = %self.id,
                size = self.items.len(),
                %reason,
                open_ms = self.opened_at.elapsed().as_millis() as u64,
                "batch closed"
            );
        }
        closed
    }

    /// Marks a closed batch as handed to the predictor and takes its items.
    ///
    /// Returns no items if the batch was not in `Closing`.
    pub fn dispatch(&mut self) -> Vec<QueueItem<I, O>> {
        if self.transition(BatchState::Closing, BatchState::Dispatched) {
            std::mem::take(&mut self.items)
        } else {
            vec![]
        }
    }

    pub fn complete(&mut self) -> bool {
        self.transition(BatchState::Dispatched, BatchState::Completed)
    }

    pub fn fail(&mut self) -> bool {
        self.transition(BatchState::Dispatched, BatchState::Failed)
    }

    fn transition(&mut self, from: BatchState, to: BatchState) -> bool {
        if self.state != from {
            return false;
        }
        self.state = to;
        true
    }
}
