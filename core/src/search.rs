//! Query-time cosine ranking over a ranking matrix.

use crate::config::{NormalizerConfig, QueryOptions, DEFAULT_LIMIT};
use crate::error::{LsirError, Result};
use crate::index::{DocId, DocMeta};
use crate::language::{Language, LanguageGuesser, StopwordGuesser};
use crate::matrix::{BuildHash, TermDocumentMatrix, Vocabulary};
use crate::normalize::Pipeline;
use crate::ranking::RankingMatrix;
use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub score: f64,
}

/// Cosine similarity of `query` against every row of `matrix`, best first.
///
/// A zero query yields nothing, and zero rows are left out rather than scored.
/// Ties keep row order.
pub fn rank(matrix: &DMatrix<f64>, row_norms: &[f64], query: &DVector<f64>, options: &QueryOptions) -> Vec<SearchHit> {
    let query_norm = query.norm();
    if query_norm == 0.0 || matrix.nrows() == 0 {
        return Vec::new();
    }
    let dots = matrix * query;
    let mut hits: Vec<SearchHit> = row_norms
        .iter()
        .enumerate()
        .filter(|&(_, &norm)| norm > 0.0)
        .map(|(row, &norm)| SearchHit { doc_id: row as DocId, score: dots[row] / (norm * query_norm) })
        .filter(|hit| hit.score.is_finite())
        .collect();
    hits.sort_by(|a, b| b.score.total_cmp(&a.score));

    match (options.threshold, options.limit) {
        (Some(threshold), _) => hits.into_iter().filter(|hit| hit.score > threshold).collect(),
        (None, limit) => {
            hits.truncate(limit.unwrap_or(DEFAULT_LIMIT));
            hits
        }
    }
}

pub fn row_norms(matrix: &DMatrix<f64>) -> Vec<f64> {
    (0..matrix.nrows()).map(|i| matrix.row(i).norm()).collect()
}

/// A loaded ranking, ready to answer free-text queries.
pub struct Ranker {
    hash: BuildHash,
    matrix: DMatrix<f64>,
    row_norms: Vec<f64>,
    vocabulary: Vocabulary,
    documents: Vec<DocMeta>,
    pipelines: BTreeMap<Language, Pipeline>,
    guesser: Box<dyn LanguageGuesser>,
}

impl Ranker {
    pub fn new(
        hash: BuildHash,
        matrix: DMatrix<f64>,
        vocabulary: Vocabulary,
        documents: Vec<DocMeta>,
        normalizer: &NormalizerConfig,
    ) -> Result<Self> {
        let expected = (documents.len(), vocabulary.len());
        if matrix.shape() != expected {
            return Err(LsirError::ShapeMismatch { expected, found: matrix.shape() });
        }
        let pipelines = Language::ALL
            .iter()
            .map(|&lang| (lang, Pipeline::from_config(normalizer, lang)))
            .collect();
        Ok(Self {
            hash,
            row_norms: row_norms(&matrix),
            matrix,
            vocabulary,
            documents,
            pipelines,
            guesser: Box::new(StopwordGuesser::new(normalizer.default_language)),
        })
    }

    pub fn from_built(td_matrix: &TermDocumentMatrix, ranking: &RankingMatrix) -> Result<Self> {
        Self::new(
            ranking.hash.clone(),
            ranking.matrix.clone(),
            td_matrix.vocabulary.clone(),
            td_matrix.documents.clone(),
            &td_matrix.options.normalizer,
        )
    }

    pub fn with_guesser(mut self, guesser: impl LanguageGuesser + 'static) -> Self {
        self.guesser = Box::new(guesser);
        self
    }

    pub fn hash(&self) -> &BuildHash {
        &self.hash
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[DocMeta] {
        &self.documents
    }

    pub fn document(&self, doc_id: DocId) -> Option<&DocMeta> {
        self.documents.get(doc_id as usize)
    }

    /// Normalizes raw query tokens and counts them over the vocabulary.
    pub fn query_vector<S: AsRef<str>>(&self, tokens: &[S], language: Option<Language>) -> DVector<f64> {
        let text = tokens.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(" ");
        let language = language.unwrap_or_else(|| self.guesser.guess(&text));
        let normalized = self.pipelines[&language].tokens(&text);
        self.vocabulary.frequency(&normalized)
    }

    pub fn query<S: AsRef<str>>(&self, tokens: &[S], options: &QueryOptions) -> Vec<SearchHit> {
        let q = self.query_vector(tokens, options.language);
        let hits = rank(&self.matrix, &self.row_norms, &q, options);
        tracing::debug!(ranking = %self.hash.short(), terms = q.iter().filter(|&&v| v > 0.0).count(), hits = hits.len(), "query");
        hits
    }

    /// Same as [`Ranker::query`], resolved to document references.
    pub fn query_documents<S: AsRef<str>>(&self, tokens: &[S], options: &QueryOptions) -> Vec<(&DocMeta, f64)> {
        self.query(tokens, options)
            .into_iter()
            .filter_map(|hit| self.document(hit.doc_id).map(|doc| (doc, hit.score)))
            .collect()
    }
}
