mod model;

use std::collections::BTreeMap;
use std::sync::Arc;
use anyhow::Result;
use serde_json::Value;
use skewer::BatcherConfig;
use skewer::gateway::Gateway;
use skewer::predictor::BlockingPredictor;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use crate::model::{IrisTree, SPECIES};

const CONFIG: &str = r#"{"maxBatchSize": 32, "maxLatency": 5000}"#;
const REQUEST: &[u8] = br#"{"instances": [[6.8, 2.8, 4.8, 1.4]]}"#;
const CONCURRENT_REQUESTS: usize = 32;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "iris_batcher=info,skewer=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config: BatcherConfig = serde_json::from_str(CONFIG)?;
    config.validate()?;
    info!(max_batch_size = config.max_batch_size(), max_latency = ?config.max_latency(), "starting gateway");

    let tree = IrisTree::default();
    let gateway = Arc::new(Gateway::new(
        BlockingPredictor::new(move |instances: Vec<Value>| tree.predict(instances)),
        config,
    )?);

    let handles = (0..CONCURRENT_REQUESTS).map(|index| {
        let gateway = gateway.clone();
        tokio::spawn(async move {
            let (status, body) = gateway.handle(REQUEST).await;
            (index, status, body)
        })
    }).collect::<Vec<_>>();

    let mut batches: BTreeMap<String, usize> = BTreeMap::new();
    for handle in futures::future::join_all(handles).await {
        let (index, status, body) = match handle {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "request task did not complete");
                continue;
            }
        };
        let body: Value = serde_json::from_slice(&body)?;
        let batch_id = body["batchId"].as_str().unwrap_or("-").to_string();
        let species = body["predictions"][0].as_u64().and_then(|class| SPECIES.get(class as usize));
        println!("Index {index} status {status} batch {batch_id} species {species:?}");
        *batches.entry(batch_id).or_default() += 1;
    }

    for (batch_id, count) in &batches {
        info!(%batch_id, count, "batch summary");
    }

    gateway.shutdown().await;
    Ok(())
}
