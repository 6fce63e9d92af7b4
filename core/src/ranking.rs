//! LSA ranking matrices: rank-reduced reconstructions of a term-document matrix.

use crate::config::RankingOptions;
use crate::error::{LsirError, Result};
use crate::matrix::{BuildHash, TermDocumentMatrix};
use nalgebra::{DMatrix, SVD};

#[derive(Debug, Clone)]
pub struct RankingMatrix {
    /// Same shape as the source matrix, rank at most `options.rank`.
    pub matrix: DMatrix<f64>,
    pub options: RankingOptions,
    pub hash: BuildHash,
    pub source: BuildHash,
}

/// Number of singular values to keep for `covariance`.
///
/// Counts the prefixes of the normalized singular values whose cumulative
/// energy is strictly below the target. A target of exactly 1 keeps every
/// singular value.
pub fn select_rank(singular_values: &[f64], covariance: f64) -> usize {
    let total: f64 = singular_values.iter().sum();
    if total <= 0.0 {
        return 0;
    }
    if covariance >= 1.0 {
        return singular_values.len();
    }
    let mut cumulative = 0.0;
    let mut k = 0;
    for s in singular_values {
        cumulative += s / total;
        if cumulative < covariance {
            k += 1;
        }
    }
    k
}

/// Singular values of `matrix` in descending order together with the
/// decomposition they came from.
fn decompose(matrix: &DMatrix<f64>) -> Result<(SVD<f64, nalgebra::Dyn, nalgebra::Dyn>, Vec<usize>)> {
    let (rows, cols) = matrix.shape();
    let svd = SVD::try_new(matrix.clone(), true, true, f64::EPSILON, 0)
        .ok_or(LsirError::SvdFailed { rows, cols })?;
    let mut order: Vec<usize> = (0..svd.singular_values.len()).collect();
    order.sort_by(|&a, &b| svd.singular_values[b].total_cmp(&svd.singular_values[a]));
    Ok((svd, order))
}

pub fn ranking_hash(source: &BuildHash, rows: usize, cols: usize, options_token: &str) -> BuildHash {
    BuildHash::digest_fields(&[source.as_str(), &rows.to_string(), &cols.to_string(), options_token, "lsa"])
}

/// Builds the LSA ranking of `td_matrix`, keeping `covariance` of the singular value energy.
pub fn build_lsa_ranking(td_matrix: &TermDocumentMatrix, covariance: f64) -> Result<RankingMatrix> {
    let mut options = RankingOptions::lsa(covariance)?;
    let (rows, cols) = td_matrix.shape();
    let mut ranking = DMatrix::zeros(rows, cols);

    let k = if rows.min(cols) == 0 {
        0
    } else {
        let (svd, order) = decompose(&td_matrix.matrix)?;
        let sorted: Vec<f64> = order.iter().map(|&i| svd.singular_values[i]).collect();
        let k = select_rank(&sorted, covariance);
        tracing::debug!(singular_values = ?sorted, k, covariance, "selected lsa rank");
        if k > 0 {
            let u = svd.u.as_ref().ok_or(LsirError::SvdFailed { rows, cols })?;
            let v_t = svd.v_t.as_ref().ok_or(LsirError::SvdFailed { rows, cols })?;
            for &i in &order[..k] {
                let v = v_t.row(i).transpose();
                ranking.ger(svd.singular_values[i], &u.column(i), &v, 1.0);
            }
        }
        k
    };
    if k == 0 {
        tracing::warn!(hash = %td_matrix.hash, covariance, "lsa rank is zero, every query will come back empty");
    }

    options.rank = Some(k);
    let token = serde_json::to_string(&options)?;
    let hash = ranking_hash(&td_matrix.hash, rows, cols, &token);
    tracing::info!(source = %td_matrix.hash, rank = k, hash = %hash, "built lsa ranking");

    Ok(RankingMatrix { matrix: ranking, options, hash, source: td_matrix.hash.clone() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatrixOptions;
    use crate::index::{Corpus, Document};
    use crate::matrix::{build_matrix, Vocabulary};

    fn td(matrix: DMatrix<f64>) -> TermDocumentMatrix {
        let cols = matrix.ncols();
        TermDocumentMatrix {
            corpus_id: "c".into(),
            modified: "m".into(),
            vocabulary: Vocabulary::from_terms((0..cols).map(|i| format!("t{i}")).collect()),
            matrix,
            options: MatrixOptions::default(),
            hash: BuildHash::digest("source"),
            documents: Vec::new(),
        }
    }

    #[test]
    fn rank_counts_prefixes_strictly_below_target() {
        // cumulative 0.25, 0.5, 1.0, all exact in binary
        let values = [1.0, 1.0, 2.0];
        assert_eq!(select_rank(&values, 0.25), 0);
        assert_eq!(select_rank(&values, 0.3), 1);
        assert_eq!(select_rank(&values, 0.5), 1);
        assert_eq!(select_rank(&values, 0.75), 2);
        assert_eq!(select_rank(&values, 1.0), 3);
    }

    #[test]
    fn near_uniform_values_keep_a_partial_rank() {
        let values = [1.0, 0.99, 0.98, 0.97, 0.96];
        let k = select_rank(&values, 0.8);
        assert!((1..=4).contains(&k));

        let total: f64 = values.iter().sum();
        let expected = values
            .iter()
            .scan(0.0, |acc, v| {
                *acc += v / total;
                Some(*acc)
            })
            .filter(|c| *c < 0.8)
            .count();
        assert_eq!(k, expected);
    }

    #[test]
    fn zero_matrix_has_zero_rank() {
        assert_eq!(select_rank(&[0.0, 0.0], 0.8), 0);
        assert_eq!(select_rank(&[], 0.8), 0);
    }

    #[test]
    fn full_covariance_reconstructs_the_source() {
        let source = DMatrix::from_row_slice(3, 4, &[
            1.0, 0.0, 2.0, 0.0,
            0.0, 3.0, 0.0, 1.0,
            1.0, 1.0, 1.0, 1.0,
        ]);
        let ranking = build_lsa_ranking(&td(source.clone()), 1.0).unwrap();
        assert_eq!(ranking.options.rank, Some(3));
        assert!((ranking.matrix - source).abs().max() < 1e-9);
    }

    #[test]
    fn truncation_matches_the_singular_value_rule() {
        let source = DMatrix::from_diagonal(&nalgebra::DVector::from_vec(vec![1.0, 0.99, 0.98, 0.97, 0.96]));
        let ranking = build_lsa_ranking(&td(source), 0.8).unwrap();
        assert_eq!(ranking.options.rank, Some(3));
        assert_eq!(ranking.matrix.shape(), (5, 5));
        let kept = (0..5).filter(|&i| ranking.matrix.row(i).norm() > 1e-9).count();
        assert_eq!(kept, 3);
    }

    #[test]
    fn zero_rank_gives_zero_matrix() {
        let source = DMatrix::from_row_slice(2, 2, &[10.0, 0.0, 0.0, 1.0]);
        // normalized energy 0.909.., so nothing lies strictly below 0.5
        let ranking = build_lsa_ranking(&td(source), 0.5).unwrap();
        assert_eq!(ranking.options.rank, Some(0));
        assert!(ranking.matrix.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn empty_vocabulary_builds_an_empty_ranking() {
        let ranking = build_lsa_ranking(&td(DMatrix::zeros(2, 0)), 0.8).unwrap();
        assert_eq!(ranking.matrix.shape(), (2, 0));
        assert_eq!(ranking.options.rank, Some(0));
    }

    #[test]
    fn invalid_covariance_fails_fast() {
        let err = build_lsa_ranking(&td(DMatrix::identity(2, 2)), 1.5).unwrap_err();
        assert!(matches!(err, LsirError::InvalidCovariance(_)));
    }

    #[test]
    fn hash_depends_on_source_and_options() {
        let corpus = Corpus::new("c", "m").with_documents(vec![
            Document { external_id: "a".into(), title: "uno dos tres".into(), ..Default::default() },
            Document { external_id: "b".into(), title: "tres cuatro".into(), ..Default::default() },
        ]);
        let built = build_matrix(&corpus, &MatrixOptions::default()).unwrap();
        let a = build_lsa_ranking(&built, 0.8).unwrap();
        let b = build_lsa_ranking(&built, 0.8).unwrap();
        let c = build_lsa_ranking(&built, 1.0).unwrap();
        assert_eq!(a.hash, b.hash);
        assert_ne!(a.hash, c.hash);
        assert_eq!(a.source, built.hash);
    }

    #[test]
    fn hash_separates_shape_fields() {
        let source = BuildHash::digest("source");
        assert_ne!(ranking_hash(&source, 1, 12, "{}"), ranking_hash(&source, 11, 2, "{}"));
    }
}
