use crate::error::{LsirError, Result};
use crate::index::Field;
use crate::language::Language;
use serde::{Deserialize, Serialize};

/// Which normalization stages run, and with which defaults.
///
/// Persisted alongside every matrix: queries against a matrix must be
/// normalized by the same chain that built it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Language used for documents with a blank language tag.
    #[serde(default = "default_language")]
    pub default_language: Language,

    #[serde(default = "default_true")]
    pub latex_accents: bool,

    /// Characters to strip; `None` means [`crate::normalize::DEFAULT_PUNCTUATION`].
    #[serde(default)]
    pub punctuation: Option<String>,

    #[serde(default = "default_true")]
    pub lowercase: bool,

    #[serde(default = "default_true")]
    pub stopwords: bool,

    #[serde(default = "default_true")]
    pub stemming: bool,
}

fn default_language() -> Language {
    Language::Spanish
}

fn default_true() -> bool {
    true
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            default_language: default_language(),
            latex_accents: true,
            punctuation: None,
            lowercase: true,
            stopwords: true,
            stemming: true,
        }
    }
}

/// Options of a term-document matrix build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixOptions {
    #[serde(default = "default_fields")]
    pub fields: Vec<Field>,

    /// Apply TF-IDF weighting to the raw counts.
    #[serde(default = "default_true")]
    pub regularise: bool,

    #[serde(default)]
    pub normalizer: NormalizerConfig,
}

fn default_fields() -> Vec<Field> {
    vec![Field::Title, Field::Description, Field::Keywords]
}

impl Default for MatrixOptions {
    fn default() -> Self {
        Self { fields: default_fields(), regularise: true, normalizer: NormalizerConfig::default() }
    }
}

impl MatrixOptions {
    /// Stable textual form, mixed into the build hash.
    pub fn token(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

pub const DEFAULT_COVARIANCE: f64 = 0.8;

/// Options of a ranking build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingOptions {
    pub kind: String,
    pub covariance: f64,
    /// Number of singular values kept; filled in by the builder.
    #[serde(default)]
    pub rank: Option<usize>,
}

impl RankingOptions {
    pub fn lsa(covariance: f64) -> Result<Self> {
        if !(covariance > 0.0 && covariance <= 1.0) {
            return Err(LsirError::InvalidCovariance(covariance));
        }
        Ok(Self { kind: "lsa".to_string(), covariance, rank: None })
    }
}

impl Default for RankingOptions {
    fn default() -> Self {
        Self { kind: "lsa".to_string(), covariance: DEFAULT_COVARIANCE, rank: None }
    }
}

/// Per-query policy. A threshold wins over a limit; with neither, the top
/// [`DEFAULT_LIMIT`] results are returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub threshold: Option<f64>,
    /// Skip language guessing and normalize the query in this language.
    #[serde(default)]
    pub language: Option<Language>,
}

pub const DEFAULT_LIMIT: usize = 10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covariance_must_lie_in_unit_interval() {
        assert!(RankingOptions::lsa(0.8).is_ok());
        assert!(RankingOptions::lsa(1.0).is_ok());
        for bad in [0.0, -0.1, 1.01, f64::NAN] {
            assert!(matches!(RankingOptions::lsa(bad), Err(LsirError::InvalidCovariance(_))));
        }
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: NormalizerConfig = serde_json::from_str(r#"{"stemming": false}"#).unwrap();
        assert!(!config.stemming);
        assert!(config.stopwords);
        assert_eq!(config.default_language, Language::Spanish);
    }

    #[test]
    fn option_token_is_stable() {
        let a = MatrixOptions::default().token().unwrap();
        let b = MatrixOptions::default().token().unwrap();
        assert_eq!(a, b);
        let raw = MatrixOptions { regularise: false, ..Default::default() }.token().unwrap();
        assert_ne!(a, raw);
    }
}
