//! # Gateway
//!
//! A JSON request/response shell over [`BatchInference`](crate::batcher::BatchInference),
//! speaking the v1 prediction protocol:
//!
//! ```text
//! request:  {"instances": [...]}
//! response: {"predictions": [...], "batchId": "..."}
//! error:    {"error": "...", "batchId": "..."}
//! ```
//!
//! Each request is one item of a batch, however many instances it carries. The instances of
//! every request in a batch are concatenated into a single predictor call by
//! [`InstancePredictor`], and the predictions are sliced back per request.
//!
//! Only the envelope is provided; binding it to a transport is left to the embedding server.
mod endpoint;
mod instances;
mod protocol;

pub use endpoint::Gateway;
pub use instances::InstancePredictor;
pub use protocol::{ErrorResponse, PredictRequest, PredictResponse};
