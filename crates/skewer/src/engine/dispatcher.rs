use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use futures::FutureExt;
use tokio::sync::{mpsc, Notify};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use crate::communication::{deliver, Prediction, QueueItem, ResultSender};
use crate::error::Error;
use crate::predictor::{Predictor, ResultCountMismatch};
use super::batch::{Batch, BatchId};

/// Turns a closed batch into per-item results.
///
/// The predictor is called exactly once per batch. Success delivers `result[i]` to
/// `items[i]`; any failure fails every item of the batch with the same error.
/// Nothing is retried.
pub(crate) struct Dispatcher<I, O> {
    predictor: Arc<dyn Predictor<I, O>>,
}

/// Why a whole batch failed, reproducible once per item
enum Failure {
    Inference(String),
    Mismatch { expected: usize, actual: usize },
}

impl Failure {
    fn to_error(&self, batch_id: BatchId) -> Error {
        match self {
            Failure::Inference(reason) => Error::Inference {
                batch_id,
                reason: reason.clone(),
            },
            Failure::Mismatch { expected, actual } => Error::BatchResultMismatch {
                batch_id,
                expected: *expected,
                actual: *actual,
            },
        }
    }
}

impl<I, O> Dispatcher<I, O>
where I: Send + 'static, O: Send + 'static
{
    pub fn new(predictor: Arc<dyn Predictor<I, O>>) -> Self {
        Self { predictor }
    }

    /// Runs one closed batch through the predictor and resolves every item in it.
    pub async fn dispatch(&self, mut batch: Batch<I, O>) {
        let batch_id = batch.id();
        let items = batch.dispatch();
        if items.is_empty() {
            debug!(%batch_id, "discarding batch with no items");
            return;
        }

        if let Some(oldest) = items.iter().map(QueueItem::enqueued_at).min() {
            debug!(
                %batch_id,
                size = items.len(),
                waited_ms = Instant::now().duration_since(oldest).as_millis() as u64,
                "dispatching batch"
            );
        }

        let (inputs, senders): (Vec<I>, Vec<ResultSender<O>>) = items
            .into_iter()
            .map(QueueItem::into_parts)
            .unzip();
        let expected = inputs.len();

        let outcome = AssertUnwindSafe(self.predictor.predict(inputs))
            .catch_unwind()
            .await;

        let failure = match outcome {
            Ok(Ok(outputs)) if outputs.len() == expected => {
                for (sender, output) in senders.into_iter().zip(outputs) {
                    deliver(sender, batch_id, Ok(Prediction::new(batch_id, output)));
                }
                batch.complete();
                return;
            }
            Ok(Ok(outputs)) => Failure::Mismatch { expected, actual: outputs.len() },
            Ok(Err(err)) => match err.downcast_ref::<ResultCountMismatch>() {
                Some(mismatch) => Failure::Mismatch {
                    expected: mismatch.expected,
                    actual: mismatch.actual,
                },
                None => Failure::Inference(format!("{err:#}")),
            },
            Err(_) => Failure::Inference("predictor panicked".to_string()),
        };

        match &failure {
            Failure::Mismatch { expected, actual } => {
                error!(%batch_id, expected, actual, "predictor returned wrong number of results");
            }
            Failure::Inference(reason) => {
                warn!(%batch_id, size = expected, %reason, "batch inference failed");
            }
        }
        batch.fail();
        for sender in senders {
            deliver(sender, batch_id, Err(failure.to_error(batch_id)));
        }
    }
}

/// Receives closed batches and dispatches each on its own task.
///
/// A slow predictor call for one batch never holds up the dispatch of the next. The loop
/// drains everything already queued before it honors a stop request, and ends on its own
/// once every sender of closed batches is gone.
pub(crate) async fn dispatch_loop<I, O>(
    dispatcher: Arc<Dispatcher<I, O>>,
    running: Arc<AtomicBool>,
    notifier: Arc<Notify>,
    mut closed_batches: mpsc::UnboundedReceiver<Batch<I, O>>,
)
where I: Send + 'static, O: Send + 'static
{
    loop {
        tokio::select! {
            biased;
            batch = closed_batches.recv() => match batch {
                Some(batch) => {
                    let dispatcher = dispatcher.clone();
                    tokio::spawn(async move {
                        dispatcher.dispatch(batch).await;
                    });
                }
                None => break,
            },
            _ = notifier.notified() => {
                if !running.load(Ordering::SeqCst) {
                    break;
                }
            }
        }
    }
    info!("dispatch worker stopped");
}
