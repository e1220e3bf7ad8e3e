use std::sync::Arc;
use async_trait::async_trait;
use thiserror::Error;

/// Defines a model that predicts on an ordered collection of instances in one call.
///
/// # Type Parameters
///
/// * `I` - One instance, as submitted by a single caller
/// * `O` - One result, as delivered back to that caller
///
/// # Implementation Notes
///
/// Implementations should:
/// * Return exactly one result per instance, in input order
/// * Treat the call as atomic; a failure fails every instance of the batch
/// * Carry no state between calls
///
/// # Example
///
/// ```ignore
/// use skewer::predictor::Predictor;
/// use async_trait::async_trait;
///
/// struct Doubler;
///
/// #[async_trait]
/// impl Predictor<i64, i64> for Doubler {
///     async fn predict(&self, instances: Vec<i64>) -> anyhow::Result<Vec<i64>> {
///         Ok(instances.into_iter().map(|x| x * 2).collect())
///     }
/// }
/// ```
#[async_trait]
pub trait Predictor<I, O>: Send + Sync
where I: Send + 'static, O: Send + 'static
{
    /// Predicts on every instance of a batch.
    ///
    /// # Parameters
    ///
    /// * `instances` - The payloads of a batch, in arrival order
    ///
    /// # Returns
    ///
    /// One result per instance in the same order, or the error that failed the whole batch
    async fn predict(&self, instances: Vec<I>) -> anyhow::Result<Vec<O>>;
}

#[async_trait]
impl<I, O, P> Predictor<I, O> for Arc<P>
where I: Send + 'static, O: Send + 'static, P: Predictor<I, O> + ?Sized
{
    async fn predict(&self, instances: Vec<I>) -> anyhow::Result<Vec<O>> {
        (**self).predict(instances).await
    }
}

/// Raised by a predictor that detects it produced the wrong number of results.
///
/// Returning this (inside the `anyhow::Error`) makes the engine report the batch as
/// [`Error::BatchResultMismatch`](crate::error::Error::BatchResultMismatch) with these counts,
/// the same as if the result vector itself had the wrong length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("expected {expected} results, got {actual}")]
pub struct ResultCountMismatch {
    pub expected: usize,
    pub actual: usize,
}

/// A payload that can be submitted for prediction.
///
/// The engine refuses empty payloads at admission, before they can occupy a batch slot.
pub trait Payload: Send + 'static {
    /// Whether the payload carries nothing to predict on.
    fn is_empty(&self) -> bool;
}

impl<T: Send + 'static> Payload for Vec<T> {
    fn is_empty(&self) -> bool {
        Vec::is_empty(self)
    }
}

impl Payload for String {
    fn is_empty(&self) -> bool {
        String::is_empty(self)
    }
}

impl Payload for serde_json::Value {
    fn is_empty(&self) -> bool {
        match self {
            serde_json::Value::Null => true,
            serde_json::Value::String(s) => s.is_empty(),
            serde_json::Value::Array(a) => a.is_empty(),
            serde_json::Value::Object(o) => o.is_empty(),
            serde_json::Value::Bool(_) | serde_json::Value::Number(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Doubler;

    #[async_trait]
    impl Predictor<i64, i64> for Doubler {
        async fn predict(&self, instances: Vec<i64>) -> anyhow::Result<Vec<i64>> {
            Ok(instances.into_iter().map(|x| x * 2).collect())
        }
    }

    #[tokio::test]
    async fn test_arc_predictor_delegates() {
        let predictor = Arc::new(Doubler);
        let out = predictor.predict(vec![1, 2, 3]).await.unwrap();
        assert_eq!(out, vec![2, 4, 6]);
    }

    #[test]
    fn test_vec_and_string_payloads() {
        assert!(Payload::is_empty(&Vec::<u8>::new()));
        assert!(!Payload::is_empty(&vec![1u8]));
        assert!(Payload::is_empty(&String::new()));
        assert!(!Payload::is_empty(&"x".to_string()));
    }

    #[test]
    fn test_json_payloads() {
        assert!(Payload::is_empty(&json!(null)));
        assert!(Payload::is_empty(&json!([])));
        assert!(Payload::is_empty(&json!({})));
        assert!(Payload::is_empty(&json!("")));
        assert!(!Payload::is_empty(&json!(0)));
        assert!(!Payload::is_empty(&json!(false)));
        assert!(!Payload::is_empty(&json!([6.8, 2.8, 4.8, 1.4])));
    }
}
