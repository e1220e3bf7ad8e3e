use std::sync::Arc;
use anyhow::Context;
use async_trait::async_trait;
use super::core_trait::Predictor;

/// Adapts a synchronous predict function into a [`Predictor`].
///
/// Classic model runtimes expose a blocking `predict(instances)`; running it directly on the
/// async runtime would stall every other batch and admission. Each call is moved onto tokio's
/// blocking pool instead.
///
/// # Example
///
/// ```ignore
/// let predictor = BlockingPredictor::new(|rows: Vec<Vec<f64>>| {
///     Ok(rows.iter().map(|row| row.iter().sum::<f64>()).collect::<Vec<f64>>())
/// });
/// ```
pub struct BlockingPredictor<F> {
    predict: Arc<F>,
}

impl<F> BlockingPredictor<F> {
    pub fn new(predict: F) -> Self {
        Self {
            predict: Arc::new(predict),
        }
    }
}

#[async_trait]
impl<I, O, F> Predictor<I, O> for BlockingPredictor<F>
where
    I: Send + 'static,
    O: Send + 'static,
    F: Fn(Vec<I>) -> anyhow::Result<Vec<O>> + Send + Sync + 'static,
{
    async fn predict(&self, instances: Vec<I>) -> anyhow::Result<Vec<O>> {
        let predict = self.predict.clone();
        tokio::task::spawn_blocking(move || predict(instances))
            .await
            .context("blocking predictor task did not complete")?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    #[tokio::test]
    async fn test_blocking_predict_runs() {
        let predictor = BlockingPredictor::new(|rows: Vec<Vec<f64>>| {
            Ok(rows.iter().map(|row| row.iter().sum::<f64>()).collect::<Vec<f64>>())
        });

        let out = predictor.predict(vec![vec![1.0, 2.0], vec![3.0]]).await.unwrap();
        assert_eq!(out, vec![3.0, 3.0]);
    }

    #[tokio::test]
    async fn test_blocking_predict_error_propagates() {
        let predictor = BlockingPredictor::new(|_rows: Vec<u8>| -> anyhow::Result<Vec<u8>> {
            bail!("model not loaded")
        });

        let err = predictor.predict(vec![1]).await.unwrap_err();
        assert_eq!(err.to_string(), "model not loaded");
    }

    #[tokio::test]
    async fn test_blocking_predict_panic_is_an_error() {
        let predictor = BlockingPredictor::new(|_rows: Vec<u8>| -> anyhow::Result<Vec<u8>> {
            panic!("segfault in native code")
        });

        let err = predictor.predict(vec![1]).await.unwrap_err();
        assert!(err.to_string().contains("did not complete"));
    }
}
