// Google Perspective API classifier backend.
//
// Perspective scores text per attribute (TOXICITY, INSULT, ...). Each
// configured label is mapped to the closest Perspective attribute and the
// summary score is reported as that label's toxic probability. One HTTP
// call per text, spaced by the free-tier 1 QPS limit.
//
// API docs: https://developers.perspectiveapi.com/s/about-the-api-methods

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::rate_limiter::RateLimiter;
use super::traits::{Classification, ClassifierSettings, LabelPrediction, ToxicityClassifier};

const ANALYZE_URL: &str = "https://commentanalyzer.googleapis.com/v1alpha1/comments:analyze";

/// Perspective attribute for a classifier label, if one exists.
pub fn perspective_attribute(label: &str) -> Option<&'static str> {
    match label {
        "toxicity" => Some("TOXICITY"),
        "severe_toxicity" => Some("SEVERE_TOXICITY"),
        "identity_attack" => Some("IDENTITY_ATTACK"),
        "insult" => Some("INSULT"),
        "threat" => Some("THREAT"),
        // Perspective has no "obscene"; PROFANITY is the closest match
        "obscene" => Some("PROFANITY"),
        "sexual_explicit" => Some("SEXUALLY_EXPLICIT"),
        _ => None,
    }
}

pub struct PerspectiveClassifier {
    client: Client,
    api_key: String,
    rate_limiter: RateLimiter,
    /// (label, Perspective attribute) for every configured label Perspective supports.
    attributes: Vec<(String, &'static str)>,
}

impl PerspectiveClassifier {
    pub fn new(api_key: String, settings: &ClassifierSettings) -> Result<Self> {
        if api_key.is_empty() {
            anyhow::bail!("PERSPECTIVE_API_KEY not set; the perspective scorer needs it");
        }

        let attributes: Vec<(String, &'static str)> = settings
            .labels
            .iter()
            .filter_map(|label| match perspective_attribute(label) {
                Some(attr) => Some((label.clone(), attr)),
                None => {
                    warn!(label = %label, "Label has no Perspective attribute, ignoring");
                    None
                }
            })
            .collect();

        Ok(Self {
            client: Client::new(),
            api_key,
            // Perspective free tier: 1 query per second
            rate_limiter: RateLimiter::new(1.0),
            attributes,
        })
    }

    async fn classify_one(&self, text: &str) -> Result<Classification> {
        if self.attributes.is_empty() {
            return Ok(Classification::default());
        }

        self.rate_limiter.acquire().await;

        let request = AnalyzeRequest {
            comment: Comment { text },
            requested_attributes: self
                .attributes
                .iter()
                .map(|(_, attr)| (*attr, AttributeConfig {}))
                .collect(),
            languages: &["en"],
        };

        let response = self
            .client
            .post(ANALYZE_URL)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .context("Failed to call Perspective API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Perspective API returned {}: {}", status, body);
        }

        let result: AnalyzeResponse = response
            .json()
            .await
            .context("Failed to parse Perspective API response")?;

        let classification = classification_from_response(&result, &self.attributes);

        debug!(
            labels = classification.predictions.len(),
            text_preview = %crate::output::truncate_chars(text, 50),
            "Perspective classified text"
        );

        Ok(classification)
    }
}

#[async_trait]
impl ToxicityClassifier for PerspectiveClassifier {
    async fn classify_batch(&self, texts: &[String]) -> Result<Vec<Classification>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.classify_one(text).await?);
        }
        Ok(results)
    }
}

/// Build a Classification from an analyze response. Attributes the API
/// didn't score are left out rather than reported as zero.
fn classification_from_response(
    response: &AnalyzeResponse,
    attributes: &[(String, &'static str)],
) -> Classification {
    Classification {
        predictions: attributes
            .iter()
            .filter_map(|(label, attr)| {
                let score = response.attribute_scores.get(*attr)?;
                Some(LabelPrediction::from_toxic(label.as_str(), score.summary_score.value))
            })
            .collect(),
    }
}

// --- Perspective API request/response types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest<'a> {
    comment: Comment<'a>,
    requested_attributes: HashMap<&'static str, AttributeConfig>,
    languages: &'a [&'a str],
}

#[derive(Serialize)]
struct Comment<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct AttributeConfig {}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeResponse {
    attribute_scores: HashMap<String, AttributeScore>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttributeScore {
    summary_score: SummaryScore,
}

#[derive(Deserialize)]
struct SummaryScore {
    value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(labels: &[&str]) -> ClassifierSettings {
        ClassifierSettings {
            labels: labels.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_requires_api_key() {
        assert!(PerspectiveClassifier::new(String::new(), &settings(&["insult"])).is_err());
    }

    #[test]
    fn test_obscene_maps_to_profanity() {
        assert_eq!(perspective_attribute("obscene"), Some("PROFANITY"));
        assert_eq!(perspective_attribute("spam"), None);
    }

    #[test]
    fn test_unknown_labels_dropped() {
        let c = PerspectiveClassifier::new("k".into(), &settings(&["insult", "spam"])).unwrap();
        assert_eq!(c.attributes, vec![("insult".to_string(), "INSULT")]);
    }

    #[test]
    fn test_classification_from_response() {
        let body = r#"{
            "attributeScores": {
                "INSULT": { "summaryScore": { "value": 0.91, "type": "PROBABILITY" } },
                "PROFANITY": { "summaryScore": { "value": 0.02, "type": "PROBABILITY" } }
            },
            "languages": ["en"]
        }"#;
        let response: AnalyzeResponse = serde_json::from_str(body).unwrap();
        let attributes = vec![
            ("insult".to_string(), "INSULT"),
            ("obscene".to_string(), "PROFANITY"),
            ("threat".to_string(), "THREAT"),
        ];

        let c = classification_from_response(&response, &attributes);

        assert_eq!(c.predictions.len(), 2);
        assert!((c.get("insult").unwrap().toxic() - 0.91).abs() < 1e-12);
        assert!((c.get("obscene").unwrap().toxic() - 0.02).abs() < 1e-12);
        assert!(c.get("threat").is_none());
    }
}
