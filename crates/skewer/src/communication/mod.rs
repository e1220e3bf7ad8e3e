mod handle;
mod queue_item;

pub use handle::{BatchHandle, Prediction};
pub(crate) use queue_item::{deliver, QueueItem, ResultSender};
