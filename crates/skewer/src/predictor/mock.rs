use std::sync::Mutex;
use std::time::Duration;
use anyhow::bail;
use async_trait::async_trait;
use super::core_trait::Predictor;

/// How the mock answers a call
#[derive(Clone, Copy, Debug)]
pub enum Behavior {
    /// One output per input, `input * 10`
    Echo,
    /// Always fails
    Fail,
    /// Returns one result fewer than asked
    DropOne,
}

// A mock predictor that records the size of every batch it sees
pub struct MockPredictor {
    pub(crate) behavior: Behavior,
    pub(crate) delay: Duration,
    pub(crate) calls: Mutex<Vec<Vec<i64>>>,
}

impl MockPredictor {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            delay: Duration::ZERO,
            calls: Mutex::new(vec![]),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.calls.lock().unwrap().iter().map(Vec::len).collect()
    }
}

#[async_trait]
impl Predictor<Vec<i64>, i64> for MockPredictor {
    async fn predict(&self, instances: Vec<Vec<i64>>) -> anyhow::Result<Vec<i64>> {
        let firsts: Vec<i64> = instances.iter().map(|i| i[0]).collect();
        self.calls.lock().unwrap().push(firsts.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.behavior {
            Behavior::Echo => Ok(firsts.into_iter().map(|x| x * 10).collect()),
            Behavior::Fail => bail!("mock predictor failure"),
            Behavior::DropOne => Ok(firsts.into_iter().skip(1).map(|x| x * 10).collect()),
        }
    }
}
