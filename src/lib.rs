// foulcheck: foul-message detection endpoint.
//
// This is the library root. A message is foul if the profanity lexicon
// matches its normalized form or the toxicity classifier scores any
// configured label at or above the threshold.

pub mod config;
pub mod lexicon;
pub mod moderation;
pub mod normalize;
pub mod output;
pub mod toxicity;
pub mod web;

use anyhow::Result;

use config::Config;
use lexicon::ProfanityLexicon;
use moderation::Moderator;
use toxicity::shared::SharedClassifier;
use toxicity::BackendLoader;

/// Wire up the pipeline for the given configuration. The classifier itself
/// isn't loaded until the first message needs it.
pub fn build_moderator(config: &Config) -> Result<Moderator> {
    let lexicon = ProfanityLexicon::with_custom_words(&config.custom_words)?;
    let classifier = SharedClassifier::new(BackendLoader::from_config(config));
    Ok(Moderator::new(config, lexicon, classifier))
}
