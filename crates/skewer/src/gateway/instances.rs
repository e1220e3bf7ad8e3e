use async_trait::async_trait;
use serde_json::Value;
use crate::predictor::{Predictor, ResultCountMismatch};

/// Lifts a per-instance predictor to whole requests.
///
/// A batch of requests becomes one call to the wrapped predictor with every instance of every
/// request, in request order. The flat predictions are then cut back into one slice per
/// request, sized by that request's instance count.
pub struct InstancePredictor<P> {
    inner: P,
}

impl<P> InstancePredictor<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<P> Predictor<Vec<Value>, Vec<Value>> for InstancePredictor<P>
where P: Predictor<Value, Value>
{
    async fn predict(&self, requests: Vec<Vec<Value>>) -> anyhow::Result<Vec<Vec<Value>>> {
        let counts: Vec<usize> = requests.iter().map(Vec::len).collect();
        let instances: Vec<Value> = requests.into_iter().flatten().collect();
        let expected = instances.len();

        let predictions = self.inner.predict(instances).await?;
        if predictions.len() != expected {
            return Err(ResultCountMismatch { expected, actual: predictions.len() }.into());
        }

        let mut predictions = predictions.into_iter();
        Ok(counts
            .into_iter()
            .map(|count| predictions.by_ref().take(count).collect())
            .collect())
    }
}
