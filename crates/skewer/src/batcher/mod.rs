mod inference;
mod core_trait;

pub use inference::BatchInference;
pub use core_trait::PredictionBatcher;
