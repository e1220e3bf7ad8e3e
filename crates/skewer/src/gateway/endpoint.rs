use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use crate::batcher::{BatchInference, PredictionBatcher};
use crate::config::BatcherConfig;
use crate::error::{Error, Result};
use crate::predictor::Predictor;
use super::instances::InstancePredictor;
use super::protocol::{ErrorResponse, PredictRequest, PredictResponse};

/// The request-facing side of a batched model endpoint.
///
/// Every request submitted here becomes one item of the engine's current batch, and every
/// response, success or failure, reports the batch it was grouped under.
pub struct Gateway {
    engine: BatchInference<Vec<Value>, Vec<Value>>,
}

impl Gateway {
    /// Starts a gateway in front of a per-instance predictor.
    pub fn new<P>(predictor: P, config: BatcherConfig) -> Result<Self>
    where P: Predictor<Value, Value> + 'static,
    {
        let engine = BatchInference::new(InstancePredictor::new(predictor), config)?;
        Ok(Self { engine })
    }

    pub fn engine(&self) -> &BatchInference<Vec<Value>, Vec<Value>> {
        &self.engine
    }

    /// Predicts on one parsed request.
    pub async fn predict(&self, request: PredictRequest) -> Result<PredictResponse> {
        let prediction = self.engine.submit(request.instances).await?.await?;
        Ok(PredictResponse {
            batch_id: prediction.batch_id(),
            predictions: prediction.into_output(),
        })
    }

    /// Handles a raw request body.
    ///
    /// # Returns
    ///
    /// The status code and the JSON body to send back.
    pub async fn handle(&self, body: &[u8]) -> (u16, Vec<u8>) {
        let result = match PredictRequest::from_slice(body) {
            Ok(request) => self.predict(request).await,
            Err(err) => Err(err),
        };
        match result {
            Ok(response) => render(200, &response),
            Err(err) => {
                debug!(error = %err, "request failed");
                render(err.status_code(), &ErrorResponse::from(&err))
            }
        }
    }

    pub async fn shutdown(&self) {
        self.engine.shutdown().await;
    }
}

fn render<T: Serialize>(status: u16, body: &T) -> (u16, Vec<u8>) {
    match serde_json::to_vec(body) {
        Ok(bytes) => (status, bytes),
        Err(err) => {
            let fallback = ErrorResponse::from(&Error::Json(err));
            (500, serde_json::to_vec(&fallback).unwrap_or_default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;
    use anyhow::bail;
    use futures::future::join_all;
    use serde_json::json;
    use crate::predictor::BlockingPredictor;

    fn classify(instances: Vec<Value>) -> anyhow::Result<Vec<Value>> {
        instances
            .iter()
            .map(|row| match row.as_array() {
                Some(features) if features.len() == 4 => {
                    let petal_length = features[2].as_f64().unwrap_or_default();
                    Ok(json!(if petal_length < 2.5 { 0 } else if petal_length < 5.0 { 1 } else { 2 }))
                }
                _ => bail!("expected 4 features per instance"),
            })
            .collect()
    }

    fn gateway(max_batch_size: usize, max_latency_ms: u64) -> Arc<Gateway> {
        let config = BatcherConfig::new(max_batch_size, Duration::from_millis(max_latency_ms)).unwrap();
        Arc::new(Gateway::new(BlockingPredictor::new(classify), config).unwrap())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_share_batch_id() {
        let gateway = gateway(32, 5000);

        let tasks = (0..32).map(|_| {
            let gateway = gateway.clone();
            tokio::spawn(async move {
                gateway.handle(br#"{"instances": [[6.8, 2.8, 4.8, 1.4]]}"#).await
            })
        });
        let responses: Vec<(u16, Vec<u8>)> = join_all(tasks).await.into_iter().map(|r| r.unwrap()).collect();

        let codes: HashSet<u16> = responses.iter().map(|(code, _)| *code).collect();
        assert_eq!(codes, HashSet::from([200]));

        let batch_ids: HashSet<String> = responses
            .iter()
            .map(|(_, body)| {
                let value: Value = serde_json::from_slice(body).unwrap();
                assert_eq!(value["predictions"], json!([1]));
                value["batchId"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(batch_ids.len(), 1);
    }

    #[tokio::test]
    async fn test_multi_instance_request() {
        let gateway = gateway(4, 10);
        let request = PredictRequest::new(vec![json!([5.1, 3.5, 1.4, 0.2]), json!([7.7, 2.6, 6.9, 2.3])]);

        let response = gateway.predict(request).await.unwrap();

        assert_eq!(response.predictions, vec![json!(0), json!(2)]);
    }

    #[tokio::test]
    async fn test_bad_body_is_400() {
        let gateway = gateway(4, 10);

        let (status, body) = gateway.handle(br#"{"instances": 3}"#).await;

        assert_eq!(status, 400);
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert!(value["error"].as_str().unwrap().contains("instances"));
        assert!(value.get("batchId").is_none());
    }

    #[tokio::test]
    async fn test_empty_instances_is_400() {
        let gateway = gateway(4, 10);

        let (status, _) = gateway.handle(br#"{"instances": []}"#).await;

        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn test_inference_error_is_500_with_batch_id() {
        let gateway = gateway(4, 10);

        let (status, body) = gateway.handle(br#"{"instances": [[1.0, 2.0]]}"#).await;

        assert_eq!(status, 500);
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert!(value["error"].as_str().unwrap().contains("expected 4 features"));
        assert!(value["batchId"].is_string());
    }

    #[tokio::test]
    async fn test_closed_gateway_is_503() {
        let gateway = gateway(4, 10);
        gateway.shutdown().await;

        let (status, _) = gateway.handle(br#"{"instances": [[5.1, 3.5, 1.4, 0.2]]}"#).await;

        assert_eq!(status, 503);
    }
}
