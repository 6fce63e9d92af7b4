//! Vocabulary extraction and term-document frequency matrices.

use crate::config::MatrixOptions;
use crate::error::{LsirError, Result};
use crate::index::{Corpus, DocMeta};
use crate::language::Language;
use crate::normalize::Pipeline;
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;

/// Content-derived address of a stored artifact (hex SHA-1).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildHash(String);

impl BuildHash {
    pub fn digest(material: &str) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(material.as_bytes());
        BuildHash(format!("{:x}", hasher.finalize()))
    }

    /// Digest of several fields, each prefixed with its length so that no two
    /// field lists share an encoding.
    pub fn digest_fields(fields: &[&str]) -> Self {
        let mut hasher = Sha1::new();
        for field in fields {
            hasher.update(format!("{}:", field.len()).as_bytes());
            hasher.update(field.as_bytes());
        }
        BuildHash(format!("{:x}", hasher.finalize()))
    }

    /// Wraps an already computed digest, e.g. one read back from disk.
    pub fn from_hex(hex: impl Into<String>) -> Self {
        BuildHash(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(8)]
    }
}

impl fmt::Display for BuildHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sorted, deduplicated terms; a term's position is its matrix column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    terms: Vec<String>,
    positions: HashMap<String, usize>,
}

impl Vocabulary {
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = tokens.into_iter().map(Into::into).collect();
        Self::from_terms(set.into_iter().collect())
    }

    /// Keeps the given order; used when reading a stored term list.
    pub fn from_terms(terms: Vec<String>) -> Self {
        let positions = terms.iter().enumerate().map(|(i, t)| (t.clone(), i)).collect();
        Self { terms, positions }
    }

    pub fn position(&self, term: &str) -> Option<usize> {
        self.positions.get(term).copied()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Raw counts of `tokens` over this vocabulary; unknown tokens are dropped.
    pub fn frequency<S: AsRef<str>>(&self, tokens: &[S]) -> DVector<f64> {
        let mut freq = DVector::zeros(self.len());
        for token in tokens {
            if let Some(col) = self.position(token.as_ref()) {
                freq[col] += 1.0;
            }
        }
        freq
    }
}

/// A built term-document matrix with everything needed to address and query it.
#[derive(Debug, Clone)]
pub struct TermDocumentMatrix {
    pub corpus_id: String,
    pub modified: String,
    pub vocabulary: Vocabulary,
    /// documents × terms
    pub matrix: DMatrix<f64>,
    pub options: MatrixOptions,
    pub hash: BuildHash,
    pub documents: Vec<DocMeta>,
}

impl TermDocumentMatrix {
    pub fn shape(&self) -> (usize, usize) {
        self.matrix.shape()
    }
}

/// Hash of a matrix build. Pure in its inputs: no clock, no randomness.
pub fn matrix_hash(corpus_id: &str, modified: &str, rows: usize, cols: usize, options_token: &str) -> BuildHash {
    BuildHash::digest_fields(&[corpus_id, modified, &rows.to_string(), &cols.to_string(), options_token])
}

/// Builds the vocabulary and frequency matrix of `corpus`.
pub fn build_matrix(corpus: &Corpus, options: &MatrixOptions) -> Result<TermDocumentMatrix> {
    if corpus.is_empty() {
        return Err(LsirError::EmptyCorpus);
    }
    let languages = document_languages(corpus, options)?;

    let mut pipelines: BTreeMap<Language, Pipeline> = BTreeMap::new();
    for &lang in &languages {
        pipelines
            .entry(lang)
            .or_insert_with(|| Pipeline::from_config(&options.normalizer, lang));
    }

    let counts: Vec<HashMap<String, usize>> = corpus
        .documents
        .par_iter()
        .zip(languages.par_iter())
        .map(|(doc, lang)| {
            let mut counts = HashMap::new();
            for token in pipelines[lang].tokens(&doc.text(&options.fields)) {
                *counts.entry(token).or_insert(0) += 1;
            }
            counts
        })
        .collect();

    let vocabulary = Vocabulary::from_tokens(counts.iter().flat_map(|c| c.keys().cloned()));
    let (rows, cols) = (corpus.len(), vocabulary.len());
    let mut matrix = DMatrix::zeros(rows, cols);
    for (row, doc_counts) in counts.iter().enumerate() {
        for (term, &count) in doc_counts {
            if let Some(col) = vocabulary.position(term) {
                matrix[(row, col)] = count as f64;
            }
        }
    }
    if options.regularise {
        matrix = tfidf(&matrix);
    }

    let hash = matrix_hash(&corpus.id, &corpus.modified, rows, cols, &options.token()?);
    tracing::info!(docs = rows, terms = cols, regularise = options.regularise, hash = %hash, "built term document matrix");

    Ok(TermDocumentMatrix {
        corpus_id: corpus.id.clone(),
        modified: corpus.modified.clone(),
        vocabulary,
        matrix,
        options: options.clone(),
        hash,
        documents: corpus.documents.iter().map(|d| d.meta()).collect(),
    })
}

fn document_languages(corpus: &Corpus, options: &MatrixOptions) -> Result<Vec<Language>> {
    let mut seen = HashSet::new();
    corpus
        .documents
        .iter()
        .map(|doc| {
            if doc.external_id.trim().is_empty() {
                return Err(LsirError::MalformedDocument {
                    id: doc.title.clone(),
                    reason: "missing identifier".into(),
                });
            }
            if !seen.insert(doc.external_id.as_str()) {
                return Err(LsirError::MalformedDocument {
                    id: doc.external_id.clone(),
                    reason: "duplicate identifier".into(),
                });
            }
            Language::resolve(&doc.language, options.normalizer.default_language)
        })
        .collect()
}

/// TF-IDF weighting of a raw count matrix.
///
/// tf = count / tokens in the document, idf = ln(N / df) + 1. Empty rows and
/// never-seen terms stay zero.
pub fn tfidf(counts: &DMatrix<f64>) -> DMatrix<f64> {
    let (rows, cols) = counts.shape();
    let n = rows as f64;
    let idf: Vec<f64> = (0..cols)
        .map(|j| {
            let df = counts.column(j).iter().filter(|&&v| v > 0.0).count();
            if df == 0 {
                0.0
            } else {
                (n / df as f64).ln() + 1.0
            }
        })
        .collect();
    let mut weighted = DMatrix::zeros(rows, cols);
    for i in 0..rows {
        let total: f64 = counts.row(i).sum();
        if total == 0.0 {
            continue;
        }
        for j in 0..cols {
            weighted[(i, j)] = counts[(i, j)] / total * idf[j];
        }
    }
    weighted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NormalizerConfig;
    use crate::index::Document;

    fn doc(id: &str, title: &str) -> Document {
        Document { external_id: id.into(), language: "english".into(), title: title.into(), ..Default::default() }
    }

    fn plain_options(regularise: bool) -> MatrixOptions {
        MatrixOptions {
            regularise,
            normalizer: NormalizerConfig { stopwords: false, stemming: false, ..Default::default() },
            ..Default::default()
        }
    }

    fn animals() -> Corpus {
        Corpus::new("animals", "2024-01-01T00:00:00Z").with_documents(vec![
            doc("d1", "cats and dogs"),
            doc("d2", "dogs and birds"),
            doc("d3", "birds and fish"),
        ])
    }

    #[test]
    fn vocabulary_is_sorted_and_unique() {
        let built = build_matrix(&animals(), &plain_options(false)).unwrap();
        assert_eq!(built.vocabulary.terms(), &["and", "birds", "cats", "dogs", "fish"]);
        let terms = built.vocabulary.terms();
        assert!(terms.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn counts_land_in_the_right_cells() {
        let built = build_matrix(&animals(), &plain_options(false)).unwrap();
        assert_eq!(built.shape(), (3, 5));
        let expected = DMatrix::from_row_slice(3, 5, &[
            1.0, 0.0, 1.0, 1.0, 0.0,
            1.0, 1.0, 0.0, 1.0, 0.0,
            1.0, 1.0, 0.0, 0.0, 1.0,
        ]);
        assert_eq!(built.matrix, expected);
    }

    #[test]
    fn repeated_tokens_are_counted() {
        let corpus = Corpus::new("c", "m").with_documents(vec![doc("a", "spam spam eggs")]);
        let built = build_matrix(&corpus, &plain_options(false)).unwrap();
        let spam = built.vocabulary.position("spam").unwrap();
        assert_eq!(built.matrix[(0, spam)], 2.0);
    }

    #[test]
    fn tfidf_matches_hand_computation() {
        let built = build_matrix(&animals(), &plain_options(true)).unwrap();
        let v = &built.vocabulary;
        let dogs_idf = (3.0f64 / 2.0).ln() + 1.0;
        let cats_idf = 3.0f64.ln() + 1.0;
        assert!((built.matrix[(0, v.position("and").unwrap())] - 1.0 / 3.0).abs() < 1e-12);
        assert!((built.matrix[(0, v.position("dogs").unwrap())] - dogs_idf / 3.0).abs() < 1e-12);
        assert!((built.matrix[(0, v.position("cats").unwrap())] - cats_idf / 3.0).abs() < 1e-12);
    }

    #[test]
    fn tfidf_is_deterministic() {
        let counts = DMatrix::from_row_slice(2, 3, &[2.0, 0.0, 1.0, 0.0, 3.0, 1.0]);
        assert_eq!(tfidf(&counts), tfidf(&counts));
    }

    #[test]
    fn empty_document_gives_zero_row() {
        let corpus = Corpus::new("c", "m").with_documents(vec![doc("a", "real words"), doc("b", "?!, ...")]);
        for regularise in [false, true] {
            let built = build_matrix(&corpus, &plain_options(regularise)).unwrap();
            assert!(built.matrix.row(1).iter().all(|&v| v == 0.0));
            assert!(built.matrix.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn empty_corpus_is_an_input_error() {
        let err = build_matrix(&Corpus::new("c", "m"), &MatrixOptions::default()).unwrap_err();
        assert!(matches!(err, LsirError::EmptyCorpus));
        assert!(err.is_input_error());
    }

    #[test]
    fn unknown_language_is_a_configuration_error() {
        let mut bad = doc("a", "text");
        bad.language = "klingon".into();
        let corpus = Corpus::new("c", "m").with_documents(vec![bad]);
        let err = build_matrix(&corpus, &MatrixOptions::default()).unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn duplicate_identifiers_are_rejected() {
        let corpus = Corpus::new("c", "m").with_documents(vec![doc("a", "one"), doc("a", "two")]);
        let err = build_matrix(&corpus, &MatrixOptions::default()).unwrap_err();
        assert!(matches!(err, LsirError::MalformedDocument { .. }));
    }

    #[test]
    fn hash_is_reproducible_and_input_sensitive() {
        let options = plain_options(true);
        let first = build_matrix(&animals(), &options).unwrap().hash;
        let second = build_matrix(&animals(), &options).unwrap().hash;
        assert_eq!(first, second);

        let mut touched = animals();
        touched.modified = "2024-02-01T00:00:00Z".into();
        assert_ne!(build_matrix(&touched, &options).unwrap().hash, first);

        let mut renamed = animals();
        renamed.id = "zoo".into();
        assert_ne!(build_matrix(&renamed, &options).unwrap().hash, first);

        let mut grown = animals();
        grown.documents.push(doc("d4", "fish"));
        assert_ne!(build_matrix(&grown, &options).unwrap().hash, first);

        assert_ne!(build_matrix(&animals(), &plain_options(false)).unwrap().hash, first);
    }

    #[test]
    fn hash_separates_its_fields() {
        assert_ne!(matrix_hash("c", "m", 1, 12, "{}"), matrix_hash("c", "m", 11, 2, "{}"));
        assert_ne!(matrix_hash("ab", "c", 1, 1, "{}"), matrix_hash("a", "bc", 1, 1, "{}"));
        assert_eq!(matrix_hash("c", "m", 1, 12, "{}"), matrix_hash("c", "m", 1, 12, "{}"));
    }

    #[test]
    fn different_shapes_never_share_a_hash() {
        let options = plain_options(false);
        let wide = Corpus::new("c", "m").with_documents(vec![doc(
            "only",
            "one two three four five six seven eight nine ten eleven twelve",
        )]);
        let tall = Corpus::new("c", "m").with_documents(
            (0..11).map(|i| doc(&format!("d{i}"), "alpha beta")).collect(),
        );
        let wide = build_matrix(&wide, &options).unwrap();
        let tall = build_matrix(&tall, &options).unwrap();
        assert_eq!(wide.shape(), (1, 12));
        assert_eq!(tall.shape(), (11, 2));
        assert_ne!(wide.hash, tall.hash);
    }

    #[test]
    fn frequency_drops_unknown_terms() {
        let vocab = Vocabulary::from_tokens(["b", "a", "c", "a"]);
        assert_eq!(vocab.terms(), &["a", "b", "c"]);
        let freq = vocab.frequency(&["a", "zzz", "a", "c"]);
        assert_eq!(freq.as_slice(), &[2.0, 0.0, 1.0]);
    }
}
