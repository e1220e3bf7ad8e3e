use tokio::sync::oneshot::Sender;
use tokio::time::Instant;
use tracing::debug;
use crate::communication::Prediction;
use crate::engine::batch::BatchId;
use crate::error::Result;

/// The sending half of an item's result channel.
pub(crate) type ResultSender<O> = Sender<Result<Prediction<O>>>;

/// # QueueItem
///
/// A container for associating a caller's payload with the channel its result is sent on.
///
/// A `QueueItem` is created by the engine when a payload is submitted, is owned by the open
/// batch it joins, and is consumed exactly once when the dispatcher resolves it.
///
/// ## Type Parameters
///
/// * `I` - The type of the payload to be predicted on
/// * `O` - The type of the per-item prediction sent back
pub(crate) struct QueueItem<I, O> {
    /// The payload to be predicted on
    input: I,

    /// Channel for sending the terminal result back to the caller
    sender: ResultSender<O>,

    /// When the item was admitted, for residency accounting only
    enqueued_at: Instant,
}

impl<I, O> QueueItem<I, O> {
    /// Creates a new `QueueItem`, stamping it with the current time.
    ///
    /// # Parameters
    ///
    /// * `input` - The payload to be predicted on
    /// * `sender` - Channel for sending the result back to the caller
    pub fn new(input: I, sender: ResultSender<O>) -> Self {
        Self {
            input,
            sender,
            enqueued_at: Instant::now(),
        }
    }

    /// Returns a reference to the payload.
    #[cfg(test)]
    pub fn input(&self) -> &I {
        &self.input
    }

    /// Returns the time at which the item was admitted.
    pub fn enqueued_at(&self) -> Instant {
        self.enqueued_at
    }

    /// Splits the item into its payload and its result channel.
    pub fn into_parts(self) -> (I, ResultSender<O>) {
        (self.input, self.sender)
    }
}

/// Sends a terminal result to a caller.
///
/// A caller that has already gone away simply never sees the result; the item is still
/// considered resolved.
pub(crate) fn deliver<O>(sender: ResultSender<O>, batch_id: BatchId, result: Result<Prediction<O>>) {
    if sender.send(result).is_err() {
        debug!(%batch_id, "receiver dropped before result delivery");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_queue_item_new() {
        let (tx, _rx) = oneshot::channel::<Result<Prediction<String>>>();
        let queue_item = QueueItem::new(42, tx);

        assert_eq!(*queue_item.input(), 42, "Input should match the provided value");
    }

    #[tokio::test(start_paused = true)]
    async fn test_enqueued_at_is_stamped_on_creation() {
        let before = Instant::now();
        let (tx, _rx) = oneshot::channel::<Result<Prediction<u8>>>();
        let queue_item = QueueItem::new(1, tx);
        assert!(queue_item.enqueued_at() >= before);
    }

    #[tokio::test]
    async fn test_deliver_reaches_receiver() {
        let (tx, rx) = oneshot::channel();
        let queue_item = QueueItem::new("in", tx);
        let batch_id = BatchId::new();
        let (_, sender) = queue_item.into_parts();

        deliver(sender, batch_id, Ok(Prediction::new(batch_id, "out")));

        let prediction = rx.await.unwrap().unwrap();
        assert_eq!(prediction.batch_id(), batch_id);
        assert_eq!(*prediction.output(), "out");
    }

    #[tokio::test]
    async fn test_deliver_to_dropped_receiver_does_not_panic() {
        let (tx, rx) = oneshot::channel::<Result<Prediction<u8>>>();
        drop(rx);
        let batch_id = BatchId::new();
        deliver(tx, batch_id, Ok(Prediction::new(batch_id, 1)));
    }
}
