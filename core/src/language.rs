use crate::error::{LsirError, Result};
use crate::normalize::{stopwords, Lowercaser, Normalizer, PunctuationRemover};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Languages with both a stopword dictionary and a snowball stemmer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Spanish,
    Portuguese,
    French,
    Italian,
    German,
}

impl Language {
    /// Voting order of the guesser; earlier languages win ties.
    pub const ALL: [Language; 6] = [
        Language::English,
        Language::Spanish,
        Language::Portuguese,
        Language::French,
        Language::Italian,
        Language::German,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Language::English => "english",
            Language::Spanish => "spanish",
            Language::Portuguese => "portuguese",
            Language::French => "french",
            Language::Italian => "italian",
            Language::German => "german",
        }
    }

    pub(crate) fn stemmer_algorithm(self) -> rust_stemmers::Algorithm {
        use rust_stemmers::Algorithm;
        match self {
            Language::English => Algorithm::English,
            Language::Spanish => Algorithm::Spanish,
            Language::Portuguese => Algorithm::Portuguese,
            Language::French => Algorithm::French,
            Language::Italian => Algorithm::Italian,
            Language::German => Algorithm::German,
        }
    }

    /// Resolves a document language tag, falling back to `default` when the tag is blank.
    pub fn resolve(tag: &str, default: Language) -> Result<Language> {
        if tag.trim().is_empty() {
            return Ok(default);
        }
        tag.parse()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = LsirError;

    /// Accepts names (`spanish`), ISO codes (`es`) and locale tags (`es_CO`, `en-US`).
    fn from_str(tag: &str) -> Result<Self> {
        let lowered = tag.trim().to_lowercase();
        let primary = lowered.split(['_', '-']).next().unwrap_or_default();
        let language = match primary {
            "english" | "en" | "eng" => Language::English,
            "spanish" | "es" | "spa" | "español" | "espanol" => Language::Spanish,
            "portuguese" | "pt" | "por" | "português" => Language::Portuguese,
            "french" | "fr" | "fra" | "fre" | "français" => Language::French,
            "italian" | "it" | "ita" | "italiano" => Language::Italian,
            "german" | "de" | "deu" | "ger" | "deutsch" => Language::German,
            _ => return Err(LsirError::UnknownLanguage(tag.to_string())),
        };
        Ok(language)
    }
}

/// Guesses the language of free text, typically a query.
pub trait LanguageGuesser: Send + Sync {
    fn guess(&self, text: &str) -> Language;
}

/// Always answers the same language.
#[derive(Debug, Clone, Copy)]
pub struct FixedGuesser(pub Language);

impl LanguageGuesser for FixedGuesser {
    fn guess(&self, _text: &str) -> Language {
        self.0
    }
}

/// Dictionary voting over the stopword lists of every supported language.
pub struct StopwordGuesser {
    dictionaries: Vec<(Language, HashSet<&'static str>)>,
    punctuation: PunctuationRemover,
    default_language: Language,
}

impl StopwordGuesser {
    pub fn new(default_language: Language) -> Self {
        let dictionaries = Language::ALL
            .iter()
            .map(|&lang| (lang, stopwords::words(lang).iter().copied().collect()))
            .collect();
        Self { dictionaries, punctuation: PunctuationRemover::default(), default_language }
    }

    /// Number of tokens of `text` found in each language's dictionary, in voting order.
    pub fn counts(&self, text: &str) -> Vec<(Language, usize)> {
        let cleaned = Lowercaser.apply_to(&self.punctuation.apply_to(text));
        let tokens: Vec<&str> = cleaned.split_whitespace().collect();
        self.dictionaries
            .iter()
            .map(|(lang, dict)| (*lang, tokens.iter().filter(|t| dict.contains(**t)).count()))
            .collect()
    }
}

impl Default for StopwordGuesser {
    fn default() -> Self {
        Self::new(Language::English)
    }
}

impl LanguageGuesser for StopwordGuesser {
    fn guess(&self, text: &str) -> Language {
        let mut best = self.default_language;
        let mut best_count = 0;
        for (lang, count) in self.counts(text) {
            if count > best_count {
                best = lang;
                best_count = count;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_codes_and_locales() {
        assert_eq!("spanish".parse::<Language>().unwrap(), Language::Spanish);
        assert_eq!("es_CO".parse::<Language>().unwrap(), Language::Spanish);
        assert_eq!("en-US".parse::<Language>().unwrap(), Language::English);
        assert_eq!("DE".parse::<Language>().unwrap(), Language::German);
        assert!(matches!("klingon".parse::<Language>(), Err(LsirError::UnknownLanguage(_))));
    }

    #[test]
    fn blank_tag_resolves_to_default() {
        assert_eq!(Language::resolve("  ", Language::Italian).unwrap(), Language::Italian);
    }

    #[test]
    fn guesses_languages_for_different_sentences() {
        let guesser = StopwordGuesser::default();
        assert_eq!(guesser.guess("hola, ¿qué hace?"), Language::Spanish);
        assert_eq!(guesser.guess("hello, how are you?"), Language::English);
        assert_eq!(guesser.guess("je suis un homme"), Language::French);
        assert_eq!(guesser.guess("ich trinke das Wasser"), Language::German);
    }

    #[test]
    fn falls_back_to_default_language() {
        let guesser = StopwordGuesser::default();
        assert_eq!(guesser.guess("askdfjlask klajsd flkajslk ajlsdkfj alskdf"), Language::English);
        assert_eq!(guesser.guess(""), Language::English);
    }

    #[test]
    fn picks_dominant_language() {
        let guesser = StopwordGuesser::default();
        assert_eq!(guesser.guess("hello how are you man hola que hace"), Language::English);
        assert_eq!(guesser.guess("hello how are hola que hay de nuevo"), Language::Spanish);
        assert_eq!(
            guesser.guess("Communications in Computer and Information Science"),
            Language::English
        );
    }
}
