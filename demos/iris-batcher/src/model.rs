use anyhow::{bail, Result};
use serde_json::{json, Value};

/// Class labels, indexed by prediction.
pub const SPECIES: [&str; 3] = ["setosa", "versicolor", "virginica"];

/// A hand-tuned stand-in for a fitted iris classifier.
///
/// Splits on petal length, then petal width, the two features a shallow decision tree picks
/// first on this dataset.
pub struct IrisTree {
    petal_length_split: f64,
    petal_width_split: f64,
}

impl Default for IrisTree {
    fn default() -> Self {
        Self::new()
    }
}

impl IrisTree {
    pub fn new() -> Self {
        Self {
            petal_length_split: 2.45,
            petal_width_split: 1.75,
        }
    }

    /// Predicts one class index per instance.
    ///
    /// Fails the whole call if any instance does not have exactly four numeric features.
    pub fn predict(&self, instances: Vec<Value>) -> Result<Vec<Value>> {
        instances.iter().map(|instance| self.classify(instance)).collect()
    }

    fn classify(&self, instance: &Value) -> Result<Value> {
        let Some(features) = instance.as_array() else {
            bail!("expected a list of features, got {instance}");
        };
        if features.len() != 4 {
            bail!("X has {} features, but IrisTree is expecting 4 features as input", features.len());
        }
        let mut row = [0f64; 4];
        for (slot, feature) in row.iter_mut().zip(features) {
            *slot = match feature.as_f64() {
                Some(v) => v,
                None => bail!("could not convert {feature} to float"),
            };
        }

        let class = if row[2] < self.petal_length_split {
            0
        } else if row[3] < self.petal_width_split {
            1
        } else {
            2
        };
        Ok(json!(class))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_each_species() {
        let tree = IrisTree::new();
        let out = tree
            .predict(vec![json!([5.1, 3.5, 1.4, 0.2]), json!([6.8, 2.8, 4.8, 1.4]), json!([7.7, 3.0, 6.1, 2.3])])
            .unwrap();
        assert_eq!(out, vec![json!(0), json!(1), json!(2)]);
    }

    #[test]
    fn test_default_matches_new() {
        let row = vec![json!([6.3, 3.3, 6.0, 2.5])];
        assert_eq!(IrisTree::default().predict(row.clone()).unwrap(), IrisTree::new().predict(row).unwrap());
    }

    #[test]
    fn test_wrong_feature_count_fails() {
        let err = IrisTree::new().predict(vec![json!([1.0, 2.0, 3.0])]).unwrap_err();
        assert!(err.to_string().contains("expecting 4"));
    }
}
