//! Text normalization stages and the pipeline that chains them.
//!
//! Every stage maps a string to a string, so any subset can be composed in any
//! order. [`Pipeline::complete`] builds the canonical chain used for indexing:
//! accent decoding, punctuation stripping, lowercasing, stopword removal and
//! stemming, applied left to right.

mod latex;
pub(crate) mod stopwords;

pub use latex::LatexAccentDecoder;
pub use stopwords::StopwordRemover;

use crate::config::NormalizerConfig;
use crate::language::Language;
use std::collections::HashSet;

/// Default punctuation set: ASCII punctuation plus the locale marks found in
/// Spanish, French and German records.
pub const DEFAULT_PUNCTUATION: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~¿¡«»“”‘’„…–—";

pub trait Normalizer: Send + Sync {
    fn apply_to(&self, text: &str) -> String;
}

/// Deletes every character of a configurable set.
#[derive(Debug, Clone)]
pub struct PunctuationRemover {
    characters: HashSet<char>,
}

impl PunctuationRemover {
    pub fn new(characters: &str) -> Self {
        Self { characters: characters.chars().collect() }
    }
}

impl Default for PunctuationRemover {
    fn default() -> Self {
        Self::new(DEFAULT_PUNCTUATION)
    }
}

impl Normalizer for PunctuationRemover {
    fn apply_to(&self, text: &str) -> String {
        text.chars().filter(|c| !self.characters.contains(c)).collect()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Lowercaser;

impl Normalizer for Lowercaser {
    fn apply_to(&self, text: &str) -> String {
        text.to_lowercase()
    }
}

/// Snowball stemming; tokens are split on whitespace, stemmed and rejoined.
pub struct Stemmer {
    inner: rust_stemmers::Stemmer,
}

impl Stemmer {
    pub fn new(language: Language) -> Self {
        Self { inner: rust_stemmers::Stemmer::create(language.stemmer_algorithm()) }
    }
}

impl Normalizer for Stemmer {
    fn apply_to(&self, text: &str) -> String {
        text.split_whitespace()
            .map(|token| self.inner.stem(token))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// An ordered list of stages applied left to right.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Normalizer>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<N: Normalizer + 'static>(mut self, stage: N) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// The canonical indexing chain for `language`, with every stage enabled.
    pub fn complete(language: Language) -> Self {
        Self::from_config(&NormalizerConfig::default(), language)
    }

    /// Builds the chain the config describes, skipping disabled stages.
    pub fn from_config(config: &NormalizerConfig, language: Language) -> Self {
        let mut pipeline = Pipeline::new();
        if config.latex_accents {
            pipeline = pipeline.with(LatexAccentDecoder);
        }
        pipeline = pipeline.with(match &config.punctuation {
            Some(chars) => PunctuationRemover::new(chars),
            None => PunctuationRemover::default(),
        });
        if config.lowercase {
            pipeline = pipeline.with(Lowercaser);
        }
        if config.stopwords {
            pipeline = pipeline.with(StopwordRemover::new(language));
        }
        if config.stemming {
            pipeline = pipeline.with(Stemmer::new(language));
        }
        pipeline
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Normalizes `text` and splits the result into tokens.
    pub fn tokens(&self, text: &str) -> Vec<String> {
        self.apply_to(text).split_whitespace().map(str::to_string).collect()
    }
}

impl Normalizer for Pipeline {
    fn apply_to(&self, text: &str) -> String {
        let mut current = text.to_string();
        for stage in &self.stages {
            if current.is_empty() {
                break;
            }
            current = stage.apply_to(&current);
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punctuation_remover_keeps_words() {
        let result = PunctuationRemover::default().apply_to("hola, que hace?");
        assert_eq!(result, "hola que hace");
    }

    #[test]
    fn punctuation_remover_strips_locale_marks() {
        let result = PunctuationRemover::default().apply_to("¿qué? «bien» ¡sí!");
        assert_eq!(result, "qué bien sí");
    }

    #[test]
    fn custom_punctuation_set() {
        let result = PunctuationRemover::new(",").apply_to("a, b. c");
        assert_eq!(result, "a b. c");
    }

    #[test]
    fn lowercaser_keeps_all_tokens() {
        assert_eq!(Lowercaser.apply_to("Title Cased Phrase"), "title cased phrase");
    }

    #[test]
    fn every_stage_maps_empty_to_empty() {
        let stages: Vec<Box<dyn Normalizer>> = vec![
            Box::new(LatexAccentDecoder),
            Box::new(PunctuationRemover::default()),
            Box::new(Lowercaser),
            Box::new(StopwordRemover::new(Language::Spanish)),
            Box::new(Stemmer::new(Language::Spanish)),
            Box::new(Pipeline::complete(Language::English)),
        ];
        for stage in stages {
            assert_eq!(stage.apply_to(""), "");
        }
    }

    #[test]
    fn disabled_stages_are_skipped() {
        let config = NormalizerConfig { stopwords: false, stemming: false, ..Default::default() };
        let pipeline = Pipeline::from_config(&config, Language::English);
        assert_eq!(pipeline.len(), 3);
        assert_eq!(pipeline.apply_to("The Cats, and DOGS"), "the cats and dogs");
    }
}
