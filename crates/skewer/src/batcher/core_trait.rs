use async_trait::async_trait;
use crate::communication::BatchHandle;
use crate::error::Result;

/// Accepts individual payloads and predicts on them in batches.
///
/// # Type Parameters
///
/// * `I` - The payload a single caller submits
/// * `O` - The result a single caller receives
#[async_trait]
pub trait PredictionBatcher<I, O> {
    /// Submits a payload for batched prediction.
    ///
    /// The payload joins the open batch right away. The returned handle resolves once that
    /// batch has been through the predictor, to this payload's own result tagged with the
    /// batch's identity, or to the error that failed the batch.
    ///
    /// # Errors
    ///
    /// * [`Error::EmptyPayload`](crate::error::Error::EmptyPayload) if there is nothing to predict on
    /// * [`Error::EngineClosed`](crate::error::Error::EngineClosed) if the engine is shutting down
    async fn submit(&self, payload: I) -> Result<BatchHandle<O>>;
}
