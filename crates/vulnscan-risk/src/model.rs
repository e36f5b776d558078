//! From-scratch logistic regression, trained by batch gradient descent over
//! persisted feedback — the risk scorer's "learned" mode, as opposed to its
//! fixed-weight default.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::features::FEATURE_NAMES;

const CURRENT_MODEL_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    pub version: u32,
    pub weights: Vec<f64>,
    pub bias: f64,
    pub trained_on_samples: usize,
}

impl LogisticModel {
    /// `sigmoid(w . x + b)`, in `[0,1]`.
    pub fn predict_probability(&self, features: &[f64]) -> f64 {
        let z: f64 = self
            .weights
            .iter()
            .zip(features.iter())
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias;
        sigmoid(z)
    }

    pub fn is_stale_format(&self) -> bool {
        self.version != CURRENT_MODEL_VERSION
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// One training example: the frozen feature vector plus the binary label
/// (`true_positive` maps to `1.0`, `false_positive` to `0.0`; `unsure`
/// records are excluded by the caller before this point).
pub struct TrainingExample {
    pub features: Vec<f64>,
    pub label: f64,
}

/// Batch gradient descent with a fixed learning rate and epoch count.
/// Deterministic given identical input order (no rand-at-init is used),
/// which keeps a retrain over the same feedback store reproducible.
pub fn train(examples: &[TrainingExample], learning_rate: f64, epochs: usize) -> LogisticModel {
    let n_features = FEATURE_NAMES.len();
    let mut weights = vec![0.0_f64; n_features];
    let mut bias = 0.0_f64;

    if examples.is_empty() {
        return LogisticModel {
            version: CURRENT_MODEL_VERSION,
            weights,
            bias,
            trained_on_samples: 0,
        };
    }

    let m = examples.len() as f64;

    for epoch in 0..epochs {
        let mut grad_w = vec![0.0_f64; n_features];
        let mut grad_b = 0.0_f64;

        for ex in examples {
            let z: f64 = weights
                .iter()
                .zip(ex.features.iter())
                .map(|(w, x)| w * x)
                .sum::<f64>()
                + bias;
            let prediction = sigmoid(z);
            let error = prediction - ex.label;

            for (g, x) in grad_w.iter_mut().zip(ex.features.iter()) {
                *g += error * x;
            }
            grad_b += error;
        }

        for (w, g) in weights.iter_mut().zip(grad_w.iter()) {
            *w -= learning_rate * (g / m);
        }
        bias -= learning_rate * (grad_b / m);

        if epoch % 50 == 0 {
            info!(epoch, "risk model training epoch");
        }
    }

    LogisticModel {
        version: CURRENT_MODEL_VERSION,
        weights,
        bias,
        trained_on_samples: examples.len(),
    }
}
