use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use crate::toxicity::traits::ClassifierSettings;

pub const DEFAULT_THRESHOLD: f64 = 0.85;

pub const DEFAULT_LABELS: [&str; 6] = [
    "identity_attack",
    "insult",
    "obscene",
    "severe_toxicity",
    "threat",
    "toxicity",
];

pub const DEFAULT_CORS_ORIGIN: &str = "*";

pub const DEFAULT_CLASSIFIER_TIMEOUT_SECS: u64 = 30;

/// Which toxicity classifier backend to use.
#[derive(Debug, Clone, PartialEq)]
pub enum ScorerBackend {
    /// Local ONNX model (default) — no API key needed, no rate limits
    Onnx,
    /// Google Perspective API — requires PERSPECTIVE_API_KEY, 1 QPS limit
    Perspective,
}

/// Central configuration, read from the environment once at startup and
/// never mutated afterwards.
///
/// Every setting is best-effort: unparseable or missing values fall back to
/// their defaults instead of failing startup. The .env file is loaded
/// automatically at startup via dotenvy.
#[derive(Debug, Clone)]
pub struct Config {
    /// Score at or above which a label counts as toxic (TOXICITY_THRESHOLD)
    pub threshold: f64,
    /// Labels compared against the threshold, in order (TOXICITY_LABELS)
    pub labels: Vec<String>,
    /// Value of Access-Control-Allow-Origin (CORS_ORIGIN)
    pub cors_origin: String,
    /// Extra lexicon entries on top of the base word list (CUSTOM_BAD_WORDS)
    pub custom_words: Vec<String>,
    /// Which classifier backend to build (MODERATION_SCORER, default onnx)
    pub scorer_backend: ScorerBackend,
    /// Directory containing the ONNX model files (FOULCHECK_MODEL_DIR)
    pub model_dir: PathBuf,
    pub perspective_api_key: String,
    /// Upper bound on a single classifier call (CLASSIFIER_TIMEOUT_SECS)
    pub classifier_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let threshold = lookup("TOXICITY_THRESHOLD")
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|t| t.is_finite())
            .unwrap_or(DEFAULT_THRESHOLD);

        let labels = dedup_preserving_order(split_list(lookup("TOXICITY_LABELS").as_deref()));
        // An override that parses to nothing means "use the defaults", not "no labels".
        let labels = if labels.is_empty() {
            DEFAULT_LABELS.iter().map(|s| s.to_string()).collect()
        } else {
            labels
        };

        let cors_origin = lookup("CORS_ORIGIN")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string());

        let scorer_backend = match lookup("MODERATION_SCORER").as_deref().map(str::trim) {
            Some("perspective") => ScorerBackend::Perspective,
            // "onnx" or unset both default to ONNX
            _ => ScorerBackend::Onnx,
        };

        let model_dir = lookup("FOULCHECK_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(crate::toxicity::download::default_model_dir);

        let classifier_timeout = lookup("CLASSIFIER_TIMEOUT_SECS")
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_CLASSIFIER_TIMEOUT_SECS);

        Self {
            threshold,
            labels,
            cors_origin,
            custom_words: split_list(lookup("CUSTOM_BAD_WORDS").as_deref()),
            scorer_backend,
            model_dir,
            perspective_api_key: lookup("PERSPECTIVE_API_KEY").unwrap_or_default(),
            classifier_timeout: Duration::from_secs(classifier_timeout),
        }
    }

    /// Labels as handed to the classifier at construction.
    pub fn classifier_settings(&self) -> ClassifierSettings {
        ClassifierSettings {
            labels: self.labels.clone(),
        }
    }

    /// Validate that the chosen scorer backend has what it needs.
    /// For ONNX: model files must exist (or user should run download-model).
    /// For Perspective: API key must be set.
    pub fn require_scorer(&self) -> Result<()> {
        match self.scorer_backend {
            ScorerBackend::Onnx => {
                if !crate::toxicity::download::model_files_present(&self.model_dir) {
                    anyhow::bail!(
                        "ONNX model files not found in {}\n\
                         Run `foulcheck download-model` to download them.\n\
                         Or set MODERATION_SCORER=perspective to use the Perspective API instead.",
                        self.model_dir.display()
                    );
                }
                Ok(())
            }
            ScorerBackend::Perspective => {
                if self.perspective_api_key.is_empty() {
                    anyhow::bail!(
                        "PERSPECTIVE_API_KEY not set. Add it to your .env file.\n\
                         See .env.example for the required variables."
                    );
                }
                Ok(())
            }
        }
    }
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
pub fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list_trims_and_drops_empty() {
        assert_eq!(split_list(Some(" a, b ,,c , ")), vec!["a", "b", "c"]);
        assert!(split_list(None).is_empty());
        assert!(split_list(Some(" , ,")).is_empty());
    }

    #[test]
    fn test_dedup_preserving_order() {
        let items = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        assert_eq!(dedup_preserving_order(items), vec!["b", "a"]);
    }

    #[test]
    fn test_classifier_settings_mirror_config() {
        let config = Config::default();
        let settings = config.classifier_settings();
        assert_eq!(settings.labels, config.labels);
    }
}
