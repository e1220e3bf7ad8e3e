use std::sync::Arc;
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::info;
use crate::communication::{BatchHandle, Prediction, QueueItem};
use crate::config::BatcherConfig;
use crate::engine::accumulator::{admit, Accumulator};
use crate::engine::dispatcher::{dispatch_loop, Dispatcher};
use crate::engine::worker::BatchWorkerHandle;
use crate::error::{Error, Result};
use crate::predictor::{Payload, Predictor};
use super::core_trait::PredictionBatcher;

/// # BatchInference
///
/// A batching layer in front of a single predictor.
///
/// Concurrent submissions are coalesced into one open batch. The batch closes as soon as it
/// holds `max_batch_size` items, or once `max_latency` has passed since it opened, whichever
/// comes first. Each closed batch goes to the predictor in exactly one call, and every item
/// receives its own result tagged with the batch's shared [`BatchId`](crate::BatchId).
///
/// Must be created inside a tokio runtime.
///
/// # Example
///
/// ```ignore
/// let engine = BatchInference::new(predictor, BatcherConfig::default())?;
/// let prediction = engine.predict(vec![6.8, 2.8, 4.8, 1.4]).await?;
/// println!("{} -> {:?}", prediction.batch_id(), prediction.output());
/// ```
pub struct BatchInference<I, O> {
    accumulator: Arc<Mutex<Accumulator<I, O>>>,
    config: BatcherConfig,
    // stops the dispatch worker on drop
    _worker: BatchWorkerHandle,
}

impl<I, O> BatchInference<I, O>
where I: Payload, O: Send + 'static
{
    /// Starts an engine around `predictor`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] if `config` does not validate.
    pub fn new<P>(predictor: P, config: BatcherConfig) -> Result<Self>
    where P: Predictor<I, O> + 'static,
    {
        config.validate()?;

        let (closed_tx, closed_rx) = mpsc::unbounded_channel();
        let accumulator = Arc::new(Mutex::new(Accumulator::new(config, closed_tx)));
        let dispatcher = Arc::new(Dispatcher::new(Arc::new(predictor)));

        let worker = BatchWorkerHandle::new(move |running, notifier| {
            tokio::spawn(dispatch_loop(dispatcher, running, notifier, closed_rx))
        });

        info!(
            max_batch_size = config.max_batch_size(),
            max_latency_ms = config.max_latency().as_millis() as u64,
            "batch inference engine started"
        );

        Ok(Self {
            accumulator,
            config,
            _worker: worker,
        })
    }

    /// Submits a payload and waits for its result.
    pub async fn predict(&self, payload: I) -> Result<Prediction<O>> {
        self.submit(payload).await?.await
    }

    pub fn config(&self) -> &BatcherConfig {
        &self.config
    }

    /// Number of items waiting in the currently open batch.
    pub async fn open_batch_len(&self) -> usize {
        self.accumulator.lock().await.open_len()
    }

    /// Stops accepting work.
    ///
    /// The open batch, if any, is closed and dispatched so every item already admitted still
    /// receives a result. Later submissions fail with [`Error::EngineClosed`].
    pub async fn shutdown(&self) {
        let mut accumulator = self.accumulator.lock().await;
        if accumulator.is_closed() {
            return;
        }
        accumulator.shutdown();
        info!("batch inference engine shutting down");
    }
}

#[async_trait]
impl<I, O> PredictionBatcher<I, O> for BatchInference<I, O>
where I: Payload, O: Send + 'static
{
    async fn submit(&self, payload: I) -> Result<BatchHandle<O>> {
        if payload.is_empty() {
            return Err(Error::EmptyPayload);
        }
        let (tx, rx) = oneshot::channel();
        let queue_item = QueueItem::new(payload, tx);

        admit(&self.accumulator, queue_item).await?;
        Ok(BatchHandle::new(rx))
    }
}
