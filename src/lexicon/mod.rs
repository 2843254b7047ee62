// Profanity lexicon — whole-word lookup against a static word list.
//
// The base list ships inside the binary (words.txt). Custom words from
// configuration are merged in once at construction; nothing is added or
// removed afterwards, so a built lexicon is immutable and shareable.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use crate::normalize::normalize;

/// The embedded base dictionary.
const BASE_WORDS: &str = include_str!("words.txt");

/// Parse the word-list format: one entry per line, `#` comments, blanks skipped.
pub fn parse_word_list(source: &str) -> impl Iterator<Item = &str> {
    source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

/// A compiled profanity word list.
pub struct ProfanityLexicon {
    words: BTreeSet<String>,
    pattern: Option<Regex>,
}

impl ProfanityLexicon {
    /// Build the lexicon from the embedded base list plus `custom_words`.
    pub fn with_custom_words<S: AsRef<str>>(custom_words: &[S]) -> Result<Self> {
        let base = parse_word_list(BASE_WORDS);
        let custom = custom_words.iter().map(AsRef::as_ref);
        Self::from_words(base.chain(custom))
    }

    /// Build a lexicon from an arbitrary set of entries.
    ///
    /// Entries go through the same normalizer as message text, so `a$$` and
    /// `ass` are the same entry. Entries that normalize to nothing are dropped.
    pub fn from_words<'a, I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let words: BTreeSet<String> = entries
            .into_iter()
            .map(normalize)
            .filter(|w| !w.is_empty())
            .collect();

        let pattern = if words.is_empty() {
            None
        } else {
            let alternation = words
                .iter()
                .map(|w| regex::escape(w))
                .collect::<Vec<_>>()
                .join("|");
            // `!` and `1` fold to `i`, so "idiot!!!" arrives as "idiotiii".
            // A trailing run of `i` still counts as the bare entry. `\b` is
            // Unicode-aware, so accented and non-Latin letters are word chars.
            let regex = Regex::new(&format!(r"\b(?:{alternation})i*\b"))
                .context("Failed to compile profanity lexicon pattern")?;
            Some(regex)
        };

        debug!(entries = words.len(), "Built profanity lexicon");

        Ok(Self { words, pattern })
    }

    /// Whether `normalized` contains any lexicon entry as a whole word or phrase,
    /// optionally followed by folded emphasis (`i` runs).
    ///
    /// Expects text that already went through [`normalize`].
    pub fn is_profane(&self, normalized: &str) -> bool {
        self.pattern
            .as_ref()
            .is_some_and(|re| re.is_match(normalized))
    }

    /// Number of distinct entries after normalization.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn contains_word(&self, word: &str) -> bool {
        self.words.contains(&normalize(word))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_list_loads() {
        let lexicon = ProfanityLexicon::with_custom_words::<&str>(&[]).unwrap();
        assert!(lexicon.len() > 50);
        assert!(lexicon.contains_word("shit"));
    }

    #[test]
    fn test_parse_word_list_skips_comments_and_blanks() {
        let parsed: Vec<&str> = parse_word_list("# header\n\n  alpha \nbeta\n#gamma\n").collect();
        assert_eq!(parsed, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_whole_word_only() {
        let lexicon = ProfanityLexicon::from_words(["ass"]).unwrap();
        assert!(lexicon.is_profane("what an ass"));
        assert!(!lexicon.is_profane("classic assassin"));
    }

    #[test]
    fn test_trailing_emphasis_tolerated() {
        let lexicon = ProfanityLexicon::from_words(["idiot"]).unwrap();
        assert!(lexicon.is_profane(&normalize("such an idiot!!!")));
        assert!(lexicon.is_profane(&normalize("idiot1")));
        assert!(!lexicon.is_profane(&normalize("idiots")));
    }

    #[test]
    fn test_unicode_word_boundaries() {
        let lexicon = ProfanityLexicon::from_words(["ass", "сука"]).unwrap();
        assert!(lexicon.is_profane("ты сука"));
        assert!(!lexicon.is_profane("assé"));
        assert!(!lexicon.is_profane("сукаа"));
    }

    #[test]
    fn test_phrase_entries() {
        let lexicon = ProfanityLexicon::from_words(["go away"]).unwrap();
        assert!(lexicon.is_profane("please go away now"));
        assert!(!lexicon.is_profane("go home away"));
    }

    #[test]
    fn test_entries_are_normalized() {
        let lexicon = ProfanityLexicon::from_words(["  Sh!7  "]).unwrap();
        assert!(lexicon.contains_word("shit"));
        assert!(lexicon.is_profane("oh shit"));
    }

    #[test]
    fn test_empty_lexicon_never_matches() {
        let lexicon = ProfanityLexicon::from_words(["", "   ", "??"]).unwrap();
        assert!(lexicon.is_empty());
        assert!(!lexicon.is_profane("anything at all"));
    }
}
