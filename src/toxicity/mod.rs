// Toxicity classification — trait-based abstraction for swappable backends.
//
// The ToxicityClassifier trait defines the interface. OnnxToxicityClassifier
// runs a local model; PerspectiveClassifier calls Google's Perspective API.
// SharedClassifier wraps whichever backend is configured in a lazily-built,
// process-wide handle.

pub mod download;
pub mod onnx;
pub mod perspective;
pub mod rate_limiter;
pub mod shared;
pub mod traits;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use crate::config::{Config, ScorerBackend};
use shared::ClassifierLoader;
use traits::{ClassifierSettings, ToxicityClassifier};

/// Builds the configured backend. Everything it needs is captured from the
/// configuration up front, so later config changes never reach the classifier.
pub struct BackendLoader {
    backend: ScorerBackend,
    model_dir: PathBuf,
    perspective_api_key: String,
    settings: ClassifierSettings,
}

impl BackendLoader {
    pub fn from_config(config: &Config) -> Self {
        Self {
            backend: config.scorer_backend.clone(),
            model_dir: config.model_dir.clone(),
            perspective_api_key: config.perspective_api_key.clone(),
            settings: config.classifier_settings(),
        }
    }
}

#[async_trait]
impl ClassifierLoader for BackendLoader {
    async fn load(&self) -> Result<Arc<dyn ToxicityClassifier>> {
        match self.backend {
            ScorerBackend::Onnx => {
                info!(
                    model_dir = %self.model_dir.display(),
                    "Using local ONNX toxicity classifier"
                );
                let model_dir = self.model_dir.clone();
                let settings = self.settings.clone();
                let classifier = tokio::task::spawn_blocking(move || {
                    onnx::OnnxToxicityClassifier::load(&model_dir, &settings)
                })
                .await
                .context("ONNX model loading panicked")??;
                Ok(Arc::new(classifier))
            }
            ScorerBackend::Perspective => {
                info!("Using Perspective API toxicity classifier");
                let classifier = perspective::PerspectiveClassifier::new(
                    self.perspective_api_key.clone(),
                    &self.settings,
                )?;
                Ok(Arc::new(classifier))
            }
        }
    }
}
