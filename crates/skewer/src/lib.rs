//! # Skewer
//!
//! An asynchronous batching layer for single-model inference endpoints.
//!
//! ## Overview
//!
//! Model runtimes are far cheaper per instance when called on many instances at once.
//! Skewer sits in front of one such model: concurrent requests arriving within a short window
//! are coalesced into one batch, sent to the model in a single call, and the results are fanned
//! back out, each tagged with the batch's shared identity.
//!
//! ## Architecture
//!
//! ### Batch formation
//!
//! Every engine has exactly one open batch at a time. A submitted payload joins it; the batch
//! closes when it reaches `max_batch_size` items, or when `max_latency` has passed since it
//! opened, whichever happens first. The next submission opens a fresh batch, so producers never
//! wait on dispatch.
//!
//! ### Dispatch
//!
//! Each closed batch is handed to the [`Predictor`](predictor::Predictor) exactly once, with
//! payloads in arrival order. Result `i` goes to item `i`. If the predictor fails, or returns
//! the wrong number of results, every item of the batch fails with the same error. Nothing is
//! retried.
//!
//! ### Identity
//!
//! Every result, success or failure, carries the [`BatchId`] of the batch it was part of. Items
//! of one batch always see the same id; items of different batches never do.
//!
//! ## Features
//!
//! - **gateway** - JSON request/response envelope (`{"instances": [...]}` in,
//!   `{"predictions": [...], "batchId": "..."}` out). Enabled by default.
//!
//! # Example
//!
//! ```rust
//! # use std::time::Duration;
//! use skewer::{BatchInference, BatcherConfig, PredictionBatcher};
//! use skewer::predictor::Predictor;
//! use async_trait::async_trait;
//!
//! struct Doubler;
//!
//! #[async_trait]
//! impl Predictor<Vec<i64>, i64> for Doubler {
//!     async fn predict(&self, instances: Vec<Vec<i64>>) -> anyhow::Result<Vec<i64>> {
//!         Ok(instances.iter().map(|row| row.iter().sum::<i64>() * 2).collect())
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> skewer::Result<()> {
//! let config = BatcherConfig::new(8, Duration::from_millis(5))?;
//! let engine = BatchInference::new(Doubler, config)?;
//!
//! let first = engine.submit(vec![1, 2]).await?;
//! let second = engine.submit(vec![3]).await?;
//!
//! let (first, second) = (first.await?, second.await?);
//! assert_eq!(first.batch_id(), second.batch_id());
//! assert_eq!(*first.output(), 6);
//! assert_eq!(*second.output(), 6);
//! # Ok(())
//! # }
//! ```

mod communication;
mod engine;

pub mod batcher;
pub mod config;
pub mod error;
pub mod model;
pub mod predictor;

#[cfg_attr(docsrs, doc(cfg(feature = "gateway")))]
#[cfg(feature = "gateway")]
pub mod gateway;

pub use batcher::{BatchInference, PredictionBatcher};
pub use communication::{BatchHandle, Prediction};
pub use config::BatcherConfig;
pub use engine::batch::BatchId;
pub use error::{Error, Result};
