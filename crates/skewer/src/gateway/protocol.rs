use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::engine::batch::BatchId;
use crate::error::{Error, Result};

/// An inbound prediction request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    pub instances: Vec<Value>,
}

impl PredictRequest {
    pub fn new(instances: Vec<Value>) -> Self {
        Self { instances }
    }

    /// Parses a request body.
    ///
    /// # Errors
    ///
    /// * [`Error::Json`] if the body is not JSON at all
    /// * [`Error::InvalidRequest`] if `instances` is missing or not a list
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let mut value: Value = serde_json::from_slice(body)?;
        match value.get_mut("instances").map(Value::take) {
            Some(Value::Array(instances)) => Ok(Self { instances }),
            Some(_) => Err(Error::InvalidRequest("Expected \"instances\" to be a list".to_string())),
            None => Err(Error::InvalidRequest("Missing \"instances\"".to_string())),
        }
    }
}

/// A successful response, carrying the identity of the batch it was predicted in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predictions: Vec<Value>,
    #[serde(rename = "batchId")]
    pub batch_id: BatchId,
}

/// An error response. Batch-level failures still name their batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(rename = "batchId", default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<BatchId>,
}

impl From<&Error> for ErrorResponse {
    fn from(error: &Error) -> Self {
        Self {
            error: error.to_string(),
            batch_id: error.batch_id(),
        }
    }
}
