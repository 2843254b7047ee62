// Local ONNX toxicity classifier using Detoxify's unbiased-toxic-roberta model.
//
// Runs entirely on the local CPU: no API calls, no rate limits, no network
// dependency once the model files are on disk.
//
// Model: protectai/unbiased-toxic-roberta-onnx (quantized, ~126MB)
// Output: 7 independent toxicity heads with continuous 0-1 scores via sigmoid.
// Each head is reported as a two-class distribution [1 - p, p].

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, warn};

use super::download::{TOXICITY_MODEL_FILE, TOXICITY_TOKENIZER_FILE};
use super::traits::{Classification, ClassifierSettings, LabelPrediction, ToxicityClassifier};

/// Heads output by unbiased-toxic-roberta, in the order the model returns them.
pub const LABEL_ORDER: [&str; 7] = [
    "toxicity",
    "severe_toxicity",
    "obscene",
    "identity_attack",
    "insult",
    "threat",
    "sexual_explicit",
];

/// RoBERTa's pad token id.
const PAD_TOKEN_ID: i64 = 1;

/// RoBERTa's maximum sequence length.
const MAX_SEQUENCE_LEN: usize = 512;

/// Local ONNX-based toxicity classifier. Holds the model session and tokenizer
/// behind Arc<Mutex> so inference can be offloaded to spawn_blocking without
/// blocking the async runtime.
pub struct OnnxToxicityClassifier {
    // ort::Session::run takes &mut self, and spawn_blocking needs 'static.
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    /// (label, column in the model output) for every configured label the model knows.
    heads: Arc<Vec<(String, usize)>>,
}

impl OnnxToxicityClassifier {
    /// Load the ONNX model and tokenizer from the given directory.
    ///
    /// Expects `model_quantized.onnx` and `tokenizer.json` to exist in `model_dir`.
    /// Call `download::download_model()` first if they don't. This does
    /// blocking file IO and session setup; call it off the async runtime.
    pub fn load(model_dir: &Path, settings: &ClassifierSettings) -> Result<Self> {
        let model_path = model_dir.join(TOXICITY_MODEL_FILE);
        let tokenizer_path = model_dir.join(TOXICITY_TOKENIZER_FILE);

        if !model_path.exists() {
            anyhow::bail!(
                "Model file not found: {}\nRun `foulcheck download-model` to download it.",
                model_path.display()
            );
        }
        if !tokenizer_path.exists() {
            anyhow::bail!(
                "Tokenizer file not found: {}\nRun `foulcheck download-model` to download it.",
                tokenizer_path.display()
            );
        }

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LEN,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure tokenizer truncation: {}", e))?;

        let heads = resolve_heads(&settings.labels);

        debug!(
            model_dir = %model_dir.display(),
            heads = heads.len(),
            "Loaded ONNX toxicity model"
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            heads: Arc::new(heads),
        })
    }
}

/// Map configured labels onto model output columns, skipping unknown labels.
fn resolve_heads(labels: &[String]) -> Vec<(String, usize)> {
    labels
        .iter()
        .filter_map(|label| match LABEL_ORDER.iter().position(|l| *l == label.as_str()) {
            Some(idx) => Some((label.clone(), idx)),
            None => {
                warn!(label = %label, "Label not produced by the ONNX model, ignoring");
                None
            }
        })
        .collect()
}

#[async_trait]
impl ToxicityClassifier for OnnxToxicityClassifier {
    /// True batch inference: tokenize all texts, run one forward pass, apply
    /// sigmoid to logits, and keep the configured heads.
    ///
    /// The CPU-bound tokenization and inference are offloaded to spawn_blocking
    /// so they don't block the tokio async runtime.
    async fn classify_batch(&self, texts: &[String]) -> Result<Vec<Classification>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let session = Arc::clone(&self.session);
        let tokenizer = Arc::clone(&self.tokenizer);
        let heads = Arc::clone(&self.heads);
        let texts = texts.to_vec();

        tokio::task::spawn_blocking(move || {
            let encodings: Vec<_> = texts
                .iter()
                .map(|t| {
                    tokenizer
                        .encode(t.as_str(), true)
                        .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))
                })
                .collect::<Result<Vec<_>>>()?;

            let batch_size = encodings.len();
            let max_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);

            // Right-padded to max_len. Shape: [batch_size, max_len]
            let mut input_ids_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);
            let mut attention_mask_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);

            for enc in &encodings {
                let ids = enc.get_ids();
                input_ids_flat.extend(ids.iter().map(|&id| id as i64));
                attention_mask_flat.extend(enc.get_attention_mask().iter().map(|&m| m as i64));

                for _ in ids.len()..max_len {
                    input_ids_flat.push(PAD_TOKEN_ID);
                    attention_mask_flat.push(0);
                }
            }

            let shape = [batch_size as i64, max_len as i64];

            let input_ids_tensor = Tensor::from_array((shape, input_ids_flat))
                .context("Failed to create input_ids tensor")?;
            let attention_mask_tensor = Tensor::from_array((shape, attention_mask_flat))
                .context("Failed to create attention_mask tensor")?;

            let logits = {
                let mut session = session
                    .lock()
                    .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;

                let outputs = session
                    .run(ort::inputs! {
                        "input_ids" => input_ids_tensor,
                        "attention_mask" => attention_mask_tensor
                    })
                    .context("ONNX inference failed")?;

                // Output shape: [batch_size, 7], raw logits
                let (_out_shape, data) = outputs[0]
                    .try_extract_tensor::<f32>()
                    .context("Failed to extract output tensor")?;

                data.to_vec()
            };

            if logits.len() != batch_size * LABEL_ORDER.len() {
                anyhow::bail!(
                    "Unexpected ONNX output size {} for batch of {}",
                    logits.len(),
                    batch_size
                );
            }

            let results: Vec<Classification> = logits
                .chunks_exact(LABEL_ORDER.len())
                .zip(&texts)
                .map(|(row, text)| {
                    let classification = classify_row(row, &heads);
                    debug!(
                        heads = classification.predictions.len(),
                        text_preview = %crate::output::truncate_chars(text, 50),
                        "ONNX classified text"
                    );
                    classification
                })
                .collect();

            Ok(results)
        })
        .await
        .context("spawn_blocking panicked")?
    }
}

/// Sigmoid activation: maps any real number to (0, 1).
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Turn one row of raw logits into predictions for the selected heads.
fn classify_row(row: &[f32], heads: &[(String, usize)]) -> Classification {
    Classification {
        predictions: heads
            .iter()
            .map(|(label, idx)| {
                LabelPrediction::from_toxic(label.as_str(), sigmoid(row[*idx] as f64))
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sigmoid_zero() {
        let result = sigmoid(0.0);
        assert!((result - 0.5).abs() < 1e-10, "sigmoid(0) should be 0.5");
    }

    #[test]
    fn test_sigmoid_extremes() {
        assert!(sigmoid(10.0) > 0.999);
        assert!(sigmoid(-10.0) < 0.001);
    }

    #[test]
    fn test_sigmoid_symmetry() {
        for x in [0.5, 1.0, 2.0, 5.0] {
            let sum = sigmoid(x) + sigmoid(-x);
            assert!(
                (sum - 1.0).abs() < 1e-10,
                "sigmoid({x}) + sigmoid(-{x}) should equal 1.0"
            );
        }
    }

    #[test]
    fn test_resolve_heads_keeps_configured_order() {
        let heads = resolve_heads(&labels(&["threat", "toxicity", "insult"]));
        assert_eq!(
            heads,
            vec![
                ("threat".to_string(), 5),
                ("toxicity".to_string(), 0),
                ("insult".to_string(), 4),
            ]
        );
    }

    #[test]
    fn test_resolve_heads_skips_unknown_labels() {
        let heads = resolve_heads(&labels(&["spam", "obscene"]));
        assert_eq!(heads, vec![("obscene".to_string(), 2)]);
    }

    #[test]
    fn test_classify_row_maps_columns() {
        // toxicity, severe_toxicity, obscene, identity_attack, insult, threat, sexual_explicit
        let row = [10.0f32, -10.0, 0.0, -10.0, 10.0, -10.0, -10.0];
        let heads = resolve_heads(&labels(&["obscene", "insult"]));
        let c = classify_row(&row, &heads);

        assert_eq!(c.predictions.len(), 2);
        let obscene = c.get("obscene").unwrap();
        assert!((obscene.toxic() - 0.5).abs() < 1e-6);
        let insult = c.get("insult").unwrap();
        assert!(insult.toxic() > 0.999);
    }

    #[test]
    fn test_load_fails_without_model_files() {
        let dir = std::env::temp_dir().join("foulcheck-onnx-missing");
        let settings = ClassifierSettings {
            labels: labels(&["toxicity"]),
        };
        let err = OnnxToxicityClassifier::load(&dir, &settings)
            .err()
            .expect("load should fail");
        assert!(err.to_string().contains("Model file not found"));
    }
}
