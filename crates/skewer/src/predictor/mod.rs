//! # Predictors
//!
//! The downstream capability a batch is handed to. The engine calls a [`Predictor`] exactly
//! once per closed batch, with the payloads of every item in arrival order, and expects one
//! result per payload back in the same order.
//!
//! * [`Predictor`] - the async predict interface
//! * [`Payload`] - admission check for submitted payloads
//! * [`BlockingPredictor`] - adapts a synchronous predict function
mod blocking;
mod core_trait;

pub use blocking::BlockingPredictor;
pub use core_trait::{Payload, Predictor, ResultCountMismatch};

#[cfg(test)]
/// Mock predictor implementation.
///
/// Records every call it receives
pub(crate) mod mock;
