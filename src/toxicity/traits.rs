// Toxicity classifier trait — the swap-ready abstraction.
//
// A classifier is built once with its label set baked in, then answers
// batches of normalized texts. Threshold decisions belong to the caller.
// The default implementation uses a local ONNX model (unbiased-toxic-roberta);
// Google's Perspective API is available as an alternate backend.

use anyhow::Result;
use async_trait::async_trait;

/// Construction-time parameters every backend receives.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierSettings {
    /// Labels to report, in order. Labels the backend doesn't know are skipped.
    pub labels: Vec<String>,
}

/// One label's two-class output for one text.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPrediction {
    pub label: String,
    /// `[not_toxic, toxic]`, summing to 1.0.
    pub probabilities: [f64; 2],
}

impl LabelPrediction {
    /// Build a prediction from a single toxic-class probability.
    pub fn from_toxic(label: impl Into<String>, toxic: f64) -> Self {
        let toxic = toxic.clamp(0.0, 1.0);
        Self {
            label: label.into(),
            probabilities: [1.0 - toxic, toxic],
        }
    }

    /// Probability mass on the toxic side.
    pub fn toxic(&self) -> f64 {
        self.probabilities[1]
    }
}

/// Every configured label's prediction for one input text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub predictions: Vec<LabelPrediction>,
}

impl Classification {
    pub fn get(&self, label: &str) -> Option<&LabelPrediction> {
        self.predictions.iter().find(|p| p.label == label)
    }
}

/// Trait for classifying text toxicity. Implementations must be async because
/// inference is either offloaded to a blocking thread or an HTTP call.
#[async_trait]
pub trait ToxicityClassifier: Send + Sync {
    /// Classify a batch of texts, returning one Classification per input in
    /// the same order.
    async fn classify_batch(&self, texts: &[String]) -> Result<Vec<Classification>>;

    /// Classify a single text.
    async fn classify_text(&self, text: &str) -> Result<Classification> {
        let mut results = self.classify_batch(&[text.to_string()]).await?;
        if results.is_empty() {
            anyhow::bail!("Classifier returned no result for a single input");
        }
        Ok(results.swap_remove(0))
    }
}
