// Moderation pipeline — the whole verdict for one message.
//
//   validate -> self-message check -> normalize -> [lexicon, classifier] -> merge
//
// The two detectors are independent and OR'd: either one alone is enough
// to flag a message. Every verdict echoes the raw input, the normalized
// text, and every score that went into it so callers can audit the result.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::lexicon::ProfanityLexicon;
use crate::normalize::normalize;
use crate::output::truncate_chars;
use crate::toxicity::shared::SharedClassifier;
use crate::toxicity::traits::Classification;

/// A validated moderation request.
#[derive(Debug, Clone, PartialEq)]
pub struct ModerationRequest {
    pub text: String,
    pub from_user: Option<String>,
    pub bot_name: Option<String>,
}

impl ModerationRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            from_user: None,
            bot_name: None,
        }
    }

    /// Validate a JSON request body.
    ///
    /// Returns `None` when `text` is missing, not a string, or empty.
    /// Non-string `fromUser` / `botName` are treated as absent.
    pub fn from_json(body: &Value) -> Option<Self> {
        let text = body.get("text")?.as_str()?;
        if text.is_empty() {
            return None;
        }
        let optional = |key: &str| body.get(key).and_then(Value::as_str).map(String::from);
        Some(Self {
            text: text.to_string(),
            from_user: optional("fromUser"),
            bot_name: optional("botName"),
        })
    }
}

/// Whether a message was sent by the bot itself: both names present and the
/// sender contains the bot name, case-insensitively.
pub fn is_self_message(from_user: &str, bot_name: &str) -> bool {
    !from_user.is_empty()
        && !bot_name.is_empty()
        && from_user.to_lowercase().contains(&bot_name.to_lowercase())
}

/// Round a probability to 4 decimal places.
pub fn round_score(score: f64) -> f64 {
    (score * 10_000.0).round() / 10_000.0
}

/// Response for a message that was not inspected because the bot sent it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedResult {
    pub foul: bool,
    pub skipped: bool,
    pub reason: &'static str,
}

impl SkippedResult {
    pub fn self_message() -> Self {
        Self {
            foul: false,
            skipped: true,
            reason: "self_message",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reasons {
    pub lexicon_profanity: bool,
    pub toxicity_scores: BTreeMap<String, f64>,
    pub threshold: f64,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModerationResult {
    pub foul: bool,
    pub input: String,
    pub norm: String,
    pub reasons: Reasons,
}

/// Either shape a successful moderation call can produce.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ModerationOutcome {
    Skipped(SkippedResult),
    Verdict(ModerationResult),
}

impl ModerationOutcome {
    pub fn is_foul(&self) -> bool {
        match self {
            Self::Skipped(s) => s.foul,
            Self::Verdict(v) => v.foul,
        }
    }
}

/// Rounded toxic score per label, as reported by the classifier.
pub fn toxicity_scores(classification: &Classification) -> BTreeMap<String, f64> {
    classification
        .predictions
        .iter()
        .map(|p| (p.label.clone(), round_score(p.toxic())))
        .collect()
}

/// True if any configured label's rounded score reaches the threshold.
/// Labels the classifier didn't report never count.
pub fn toxic_hit(scores: &BTreeMap<String, f64>, labels: &[String], threshold: f64) -> bool {
    labels
        .iter()
        .filter_map(|label| scores.get(label))
        .any(|score| *score >= threshold)
}

/// The moderation pipeline, shared by every request in the process.
pub struct Moderator {
    lexicon: ProfanityLexicon,
    classifier: SharedClassifier,
    threshold: f64,
    labels: Vec<String>,
    classifier_timeout: Duration,
}

impl Moderator {
    pub fn new(config: &Config, lexicon: ProfanityLexicon, classifier: SharedClassifier) -> Self {
        Self {
            lexicon,
            classifier,
            threshold: config.threshold,
            labels: config.labels.clone(),
            classifier_timeout: config.classifier_timeout,
        }
    }

    pub fn classifier(&self) -> &SharedClassifier {
        &self.classifier
    }

    /// Run the full pipeline on one request.
    ///
    /// Fails if the classifier can't be loaded, errors, or times out; there
    /// is no lexicon-only fallback.
    pub async fn moderate(&self, request: &ModerationRequest) -> Result<ModerationOutcome> {
        if let (Some(from_user), Some(bot_name)) = (&request.from_user, &request.bot_name) {
            if is_self_message(from_user, bot_name) {
                debug!(from_user = %from_user, "Skipping bot's own message");
                return Ok(ModerationOutcome::Skipped(SkippedResult::self_message()));
            }
        }

        let norm = normalize(&request.text);
        let lexicon_profanity = self.lexicon.is_profane(&norm);

        let classifier = self.classifier.get().await?;
        let batch = [norm.clone()];
        let mut classifications =
            tokio::time::timeout(self.classifier_timeout, classifier.classify_batch(&batch))
                .await
                .map_err(|_| {
                    anyhow::anyhow!(
                        "Toxicity classifier timed out after {:?}",
                        self.classifier_timeout
                    )
                })?
                .context("Toxicity classification failed")?;

        if classifications.is_empty() {
            anyhow::bail!("Toxicity classifier returned no result");
        }
        let classification = classifications.swap_remove(0);

        let scores = toxicity_scores(&classification);
        let toxic = toxic_hit(&scores, &self.labels, self.threshold);
        let foul = lexicon_profanity || toxic;

        debug!(
            foul,
            lexicon_profanity,
            toxic,
            text_preview = %truncate_chars(&norm, 50),
            "Moderated message"
        );

        Ok(ModerationOutcome::Verdict(ModerationResult {
            foul,
            input: request.text.clone(),
            norm,
            reasons: Reasons {
                lexicon_profanity,
                toxicity_scores: scores,
                threshold: self.threshold,
                labels: self.labels.clone(),
            },
        }))
    }
}
