//! Content-addressed artifact store.
//!
//! ```text
//! <root>/term_lists/<hash>.txt   newline-delimited vocabulary
//! <root>/matrices/<hash>.bin     term-document matrix (bincode)
//! <root>/matrices/<hash>.json    matrix manifest
//! <root>/models/<hash>.bin       ranking matrix (bincode)
//! <root>/models/<hash>.json      ranking manifest
//! ```

use crate::config::{MatrixOptions, RankingOptions};
use crate::error::{LsirError, Result};
use crate::index::DocMeta;
use crate::matrix::{BuildHash, TermDocumentMatrix, Vocabulary};
use crate::ranking::RankingMatrix;
use crate::search::Ranker;
use nalgebra::DMatrix;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, create_dir_all, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixManifest {
    pub hash: BuildHash,
    pub corpus_id: String,
    pub modified: String,
    pub rows: usize,
    pub cols: usize,
    pub options: MatrixOptions,
    pub documents: Vec<DocMeta>,
    pub created_at: String,
    pub version: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingManifest {
    pub hash: BuildHash,
    pub source: BuildHash,
    pub rows: usize,
    pub cols: usize,
    pub options: RankingOptions,
    pub created_at: String,
    pub version: u32,
}

const VERSION: u32 = 1;

pub struct ArtifactPaths {
    pub root: PathBuf,
}

impl ArtifactPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn term_lists(&self) -> PathBuf { self.root.join("term_lists") }
    fn matrices(&self) -> PathBuf { self.root.join("matrices") }
    fn models(&self) -> PathBuf { self.root.join("models") }
    pub fn term_list(&self, hash: &BuildHash) -> PathBuf { self.term_lists().join(format!("{hash}.txt")) }
    pub fn matrix(&self, hash: &BuildHash) -> PathBuf { self.matrices().join(format!("{hash}.bin")) }
    fn matrix_manifest(&self, hash: &BuildHash) -> PathBuf { self.matrices().join(format!("{hash}.json")) }
    pub fn ranking(&self, hash: &BuildHash) -> PathBuf { self.models().join(format!("{hash}.bin")) }
    fn ranking_manifest(&self, hash: &BuildHash) -> PathBuf { self.models().join(format!("{hash}.json")) }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default()
}

/// Creation stamps compare as instants; unparsable stamps sort oldest.
fn created(stamp: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(stamp, &Rfc3339).ok()
}

fn save_dense(path: &Path, matrix: &DMatrix<f64>) -> Result<()> {
    let mut f = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut f, matrix)?;
    f.flush()?;
    Ok(())
}

fn load_dense(path: &Path, expected: (usize, usize)) -> Result<DMatrix<f64>> {
    let f = File::open(path).map_err(|e| not_found(path, e))?;
    let matrix: DMatrix<f64> = bincode::deserialize_from(BufReader::new(f))?;
    if matrix.shape() != expected {
        return Err(LsirError::ShapeMismatch { expected, found: matrix.shape() });
    }
    Ok(matrix)
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let f = File::open(path).map_err(|e| not_found(path, e))?;
    Ok(serde_json::from_reader(BufReader::new(f))?)
}

fn not_found(path: &Path, err: std::io::Error) -> LsirError {
    if err.kind() == std::io::ErrorKind::NotFound {
        LsirError::ArtifactNotFound(path.display().to_string())
    } else {
        LsirError::Io(err)
    }
}

pub fn save_term_list(paths: &ArtifactPaths, hash: &BuildHash, vocabulary: &Vocabulary) -> Result<()> {
    create_dir_all(paths.term_lists())?;
    fs::write(paths.term_list(hash), vocabulary.terms().join("\n"))?;
    Ok(())
}

pub fn load_term_list(paths: &ArtifactPaths, hash: &BuildHash) -> Result<Vocabulary> {
    let path = paths.term_list(hash);
    let text = fs::read_to_string(&path).map_err(|e| not_found(&path, e))?;
    let terms = if text.is_empty() { Vec::new() } else { text.split('\n').map(str::to_string).collect() };
    Ok(Vocabulary::from_terms(terms))
}

/// Writes the matrix, its term list and its manifest under the matrix hash.
pub fn save_matrix(paths: &ArtifactPaths, td_matrix: &TermDocumentMatrix) -> Result<MatrixManifest> {
    create_dir_all(paths.matrices())?;
    let (rows, cols) = td_matrix.shape();
    save_term_list(paths, &td_matrix.hash, &td_matrix.vocabulary)?;
    save_dense(&paths.matrix(&td_matrix.hash), &td_matrix.matrix)?;
    let manifest = MatrixManifest {
        hash: td_matrix.hash.clone(),
        corpus_id: td_matrix.corpus_id.clone(),
        modified: td_matrix.modified.clone(),
        rows,
        cols,
        options: td_matrix.options.clone(),
        documents: td_matrix.documents.clone(),
        created_at: now_rfc3339(),
        version: VERSION,
    };
    save_json(&paths.matrix_manifest(&td_matrix.hash), &manifest)?;
    tracing::info!(hash = %td_matrix.hash, rows, cols, root = %paths.root.display(), "stored term document matrix");
    Ok(manifest)
}

pub fn load_matrix_manifest(paths: &ArtifactPaths, hash: &BuildHash) -> Result<MatrixManifest> {
    load_json(&paths.matrix_manifest(hash))
}

pub fn load_matrix(paths: &ArtifactPaths, hash: &BuildHash) -> Result<TermDocumentMatrix> {
    let manifest = load_matrix_manifest(paths, hash)?;
    let vocabulary = load_term_list(paths, hash)?;
    if vocabulary.len() != manifest.cols {
        return Err(LsirError::ShapeMismatch {
            expected: (manifest.rows, manifest.cols),
            found: (manifest.rows, vocabulary.len()),
        });
    }
    let matrix = load_dense(&paths.matrix(hash), (manifest.rows, manifest.cols))?;
    Ok(TermDocumentMatrix {
        corpus_id: manifest.corpus_id,
        modified: manifest.modified,
        vocabulary,
        matrix,
        options: manifest.options,
        hash: manifest.hash,
        documents: manifest.documents,
    })
}

pub fn save_ranking(paths: &ArtifactPaths, ranking: &RankingMatrix) -> Result<RankingManifest> {
    create_dir_all(paths.models())?;
    let (rows, cols) = ranking.matrix.shape();
    save_dense(&paths.ranking(&ranking.hash), &ranking.matrix)?;
    let manifest = RankingManifest {
        hash: ranking.hash.clone(),
        source: ranking.source.clone(),
        rows,
        cols,
        options: ranking.options.clone(),
        created_at: now_rfc3339(),
        version: VERSION,
    };
    save_json(&paths.ranking_manifest(&ranking.hash), &manifest)?;
    tracing::info!(hash = %ranking.hash, source = %ranking.source, root = %paths.root.display(), "stored ranking matrix");
    Ok(manifest)
}

pub fn load_ranking_manifest(paths: &ArtifactPaths, hash: &BuildHash) -> Result<RankingManifest> {
    load_json(&paths.ranking_manifest(hash))
}

pub fn load_ranking(paths: &ArtifactPaths, hash: &BuildHash) -> Result<RankingMatrix> {
    let manifest = load_ranking_manifest(paths, hash)?;
    let matrix = load_dense(&paths.ranking(hash), (manifest.rows, manifest.cols))?;
    Ok(RankingMatrix { matrix, options: manifest.options, hash: manifest.hash, source: manifest.source })
}

/// Loads a ranking and its source matrix's vocabulary and documents into a [`Ranker`].
pub fn load_ranker(paths: &ArtifactPaths, hash: &BuildHash) -> Result<Ranker> {
    let ranking = load_ranking(paths, hash)?;
    let source = load_matrix_manifest(paths, &ranking.source)?;
    let vocabulary = load_term_list(paths, &ranking.source)?;
    Ranker::new(ranking.hash, ranking.matrix, vocabulary, source.documents, &source.options.normalizer)
}

fn manifests<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|s| s.to_str()) == Some("json") {
            found.push(load_json(&path)?);
        }
    }
    Ok(found)
}

/// All stored matrices, newest first.
pub fn list_matrices(paths: &ArtifactPaths) -> Result<Vec<MatrixManifest>> {
    let mut all: Vec<MatrixManifest> = manifests(&paths.matrices())?;
    all.sort_by(|a, b| created(&b.created_at).cmp(&created(&a.created_at)).then_with(|| a.hash.cmp(&b.hash)));
    Ok(all)
}

/// All stored rankings, newest first.
pub fn list_rankings(paths: &ArtifactPaths) -> Result<Vec<RankingManifest>> {
    let mut all: Vec<RankingManifest> = manifests(&paths.models())?;
    all.sort_by(|a, b| created(&b.created_at).cmp(&created(&a.created_at)).then_with(|| a.hash.cmp(&b.hash)));
    Ok(all)
}

fn resolve<'a, I>(hashes: I, target: Option<&str>, kind: &str) -> Result<BuildHash>
where
    I: IntoIterator<Item = &'a BuildHash>,
{
    let mut hashes = hashes.into_iter();
    match target {
        None => hashes.next().cloned().ok_or_else(|| LsirError::ArtifactNotFound(format!("no {kind} stored yet"))),
        Some(prefix) => {
            let matches: Vec<&BuildHash> = hashes.filter(|h| h.as_str().starts_with(prefix)).collect();
            match matches.as_slice() {
                [one] => Ok((*one).clone()),
                [] => Err(LsirError::ArtifactNotFound(format!("no {kind} matching {prefix}"))),
                _ => Err(LsirError::ArtifactNotFound(format!("{prefix} matches {} {kind}s", matches.len()))),
            }
        }
    }
}

/// The matrix whose hash starts with `target`, or the newest one.
pub fn resolve_matrix(paths: &ArtifactPaths, target: Option<&str>) -> Result<BuildHash> {
    let all = list_matrices(paths)?;
    resolve(all.iter().map(|m| &m.hash), target, "matrix")
}

/// The ranking whose hash starts with `target`, or the newest one.
pub fn resolve_ranking(paths: &ArtifactPaths, target: Option<&str>) -> Result<BuildHash> {
    let all = list_rankings(paths)?;
    resolve(all.iter().map(|m| &m.hash), target, "ranking")
}
