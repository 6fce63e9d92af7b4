//! Precision, recall and F1 of a ranking against labeled queries.

use crate::config::QueryOptions;
use crate::error::{LsirError, Result};
use crate::search::Ranker;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::BufRead;

/// A labeled query: the documents a human judged relevant for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundTruthQuery {
    pub query: String,
    #[serde(default)]
    pub relevant: BTreeSet<String>,
}

/// Reads ground truth from JSON lines, skipping blank lines.
pub fn read_ground_truth<R: BufRead>(reader: R) -> Result<Vec<GroundTruthQuery>> {
    let mut queries = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let query: GroundTruthQuery = serde_json::from_str(&line)
            .map_err(|e| LsirError::MalformedGroundTruth(format!("line {}: {e}", idx + 1)))?;
        queries.push(query);
    }
    Ok(queries)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceResult {
    pub true_positives: usize,
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    /// `None` when nothing was retrieved.
    pub precision: Option<f64>,
    /// `None` when nothing is relevant.
    pub recall: Option<f64>,
    pub f1_score: Option<f64>,
}

impl PerformanceResult {
    /// Confusion counts of `experiment` against `truth` inside `universe`.
    pub fn compare(truth: &BTreeSet<String>, experiment: &BTreeSet<String>, universe: &BTreeSet<String>) -> Self {
        let true_positives = truth.intersection(experiment).count();
        let false_negatives = truth.difference(experiment).count();
        let false_positives = experiment.difference(truth).count();
        let true_negatives = universe.iter().filter(|d| !truth.contains(*d) && !experiment.contains(*d)).count();

        let precision = ratio(true_positives, true_positives + false_positives);
        let recall = ratio(true_positives, true_positives + false_negatives);
        let f1_score = match (precision, recall) {
            (Some(p), Some(r)) if p + r > 0.0 => Some(2.0 * p * r / (p + r)),
            _ => None,
        };
        Self { true_positives, true_negatives, false_positives, false_negatives, precision, recall, f1_score }
    }
}

fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64)
}

/// Mean of each metric over the queries where it is defined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Averages {
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub f1_score: Option<f64>,
}

impl Averages {
    pub fn over<'a>(results: impl IntoIterator<Item = &'a PerformanceResult> + Clone) -> Self {
        Self {
            precision: mean(results.clone().into_iter().filter_map(|r| r.precision)),
            recall: mean(results.clone().into_iter().filter_map(|r| r.recall)),
            f1_score: mean(results.into_iter().filter_map(|r| r.f1_score)),
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryPerformance {
    pub query: String,
    #[serde(flatten)]
    pub result: PerformanceResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationParameters {
    pub target: String,
    pub queries: usize,
    pub cosine: Option<f64>,
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub words: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub parameters: EvaluationParameters,
    pub averages: Averages,
    pub results: Vec<QueryPerformance>,
}

/// Evaluation run settings shared by every query.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvaluationOptions {
    pub query: QueryOptions,
    /// Only evaluate queries with exactly this many words.
    pub words: Option<usize>,
}

/// Runs every labeled query through `ranker` and scores the results.
///
/// The universe is every document the ranking addresses.
pub fn evaluate(ranker: &Ranker, queries: &[GroundTruthQuery], options: &EvaluationOptions) -> EvaluationReport {
    let universe: BTreeSet<String> = ranker.documents().iter().map(|d| d.external_id.clone()).collect();
    let mut results = Vec::new();
    for labeled in queries {
        let tokens: Vec<&str> = labeled.query.split_whitespace().collect();
        if options.words.is_some_and(|n| tokens.len() != n) {
            continue;
        }
        let experiment: BTreeSet<String> = ranker
            .query_documents(&tokens, &options.query)
            .into_iter()
            .map(|(doc, _)| doc.external_id.clone())
            .collect();
        let result = PerformanceResult::compare(&labeled.relevant, &experiment, &universe);
        tracing::debug!(query = %labeled.query, precision = ?result.precision, recall = ?result.recall, "evaluated query");
        results.push(QueryPerformance { query: labeled.query.clone(), result });
    }
    let averages = Averages::over(results.iter().map(|r| &r.result));
    tracing::info!(queries = results.len(), precision = ?averages.precision, recall = ?averages.recall, f1 = ?averages.f1_score, "evaluation finished");

    EvaluationReport {
        parameters: EvaluationParameters {
            target: ranker.hash().to_string(),
            queries: results.len(),
            cosine: options.query.threshold,
            limit: options.query.limit,
            words: options.words,
        },
        averages,
        results,
    }
}
