use std::path::PathBuf;
use thiserror::Error;
use crate::engine::batch::BatchId;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the batching engine, and the collaborators around it, can surface.
///
/// Batch-level failures ([`Error::Inference`] and [`Error::BatchResultMismatch`]) carry the
/// identity of the batch they happened in, so a caller can still correlate a failed response
/// with the other responses of the same batch.
#[derive(Debug, Error)]
pub enum Error {
    /// The engine is shutting down, or already shut down, and takes no new work
    #[error("engine is closed")]
    EngineClosed,

    /// A submission carried nothing to predict on
    #[error("payload must not be empty")]
    EmptyPayload,

    /// The supplied batcher configuration cannot be used
    #[error("invalid batcher configuration: {0}")]
    InvalidConfig(String),

    /// The downstream predictor failed for the whole batch
    #[error("inference failed for batch {batch_id}: {reason}")]
    Inference {
        batch_id: BatchId,
        reason: String,
    },

    /// The downstream predictor returned a different number of results than it was given
    #[error("batch {batch_id} submitted {expected} instances but the predictor returned {actual} results")]
    BatchResultMismatch {
        batch_id: BatchId,
        expected: usize,
        actual: usize,
    },

    /// No model artifact was found at the resolved location
    #[error("model not found at {}", .0.display())]
    ModelMissing(PathBuf),

    /// More than one candidate model artifact was found
    #[error("more than one model file detected, only one is allowed: {0:?}")]
    ModelAmbiguous(Vec<PathBuf>),

    /// The inbound request body is malformed
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// The batch this error was raised for, if it is a batch-level failure.
    pub fn batch_id(&self) -> Option<BatchId> {
        match self {
            Error::Inference { batch_id, .. } => Some(*batch_id),
            Error::BatchResultMismatch { batch_id, .. } => Some(*batch_id),
            _ => None,
        }
    }

    /// The HTTP status a gateway reports for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::EmptyPayload | Error::InvalidRequest(_) | Error::Json(_) => 400,
            Error::EngineClosed => 503,
            Error::Inference { .. }
            | Error::BatchResultMismatch { .. }
            | Error::InvalidConfig(_)
            | Error::ModelMissing(_)
            | Error::ModelAmbiguous(_) => 500,
        }
    }
}
