use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use crate::engine::batch::BatchId;
use crate::error::{Error, Result};

/// A single item's successful result, tagged with the batch it was predicted in.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction<O> {
    batch_id: BatchId,
    output: O,
}

impl<O> Prediction<O> {
    pub fn new(batch_id: BatchId, output: O) -> Self {
        Self { batch_id, output }
    }

    /// The identity shared by every item of the batch this result came from.
    pub fn batch_id(&self) -> BatchId {
        self.batch_id
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn into_output(self) -> O {
        self.output
    }
}

/// # BatchHandle
///
/// An asynchronous wrapper around the receiving half of an item's result channel.
///
/// Awaiting the handle yields the item's terminal result once the batch it joined has been
/// dispatched. If the engine goes away before the batch reaches the predictor, the handle
/// resolves to [`Error::EngineClosed`].
///
/// Dropping the handle abandons the result but does not remove the item from its batch.
pub struct BatchHandle<O> {
    /// The underlying channel receiver
    receiver: oneshot::Receiver<Result<Prediction<O>>>,
}

impl<O> BatchHandle<O> {
    /// Creates a new `BatchHandle` from a Tokio oneshot channel receiver.
    pub(crate) fn new(receiver: oneshot::Receiver<Result<Prediction<O>>>) -> Self {
        Self {
            receiver,
        }
    }
}

impl<O> Future for BatchHandle<O> {
    type Output = Result<Prediction<O>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.get_mut().receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(Error::EngineClosed)),
            Poll::Pending => Poll::Pending,
        }
    }
}
