//! # Batching Engine
//!
//! The moving parts behind [`BatchInference`](crate::batcher::BatchInference).
//!
//! * [`batch`] - A bounded group of items sharing one identity, and its lifecycle states.
//!
//! * [`accumulator`] - The single accumulation point. Admits items into the open batch and
//!   decides when it closes, either on size or on its deadline.
//!
//! * [`dispatcher`] - Calls the predictor once per closed batch and fans the results, or the
//!   failure, back out to every item.
//!
//! * [`worker`] - Lifecycle handle for the background task that feeds the dispatcher.
//!
pub(crate) mod accumulator;
pub(crate) mod batch;
pub(crate) mod dispatcher;
pub(crate) mod worker;
