mod record;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use lsir_core::config::DEFAULT_COVARIANCE;
use lsir_core::evaluate::{evaluate, read_ground_truth, EvaluationOptions, EvaluationReport};
use lsir_core::persist::{
    list_matrices, list_rankings, load_matrix, load_ranker, resolve_matrix, resolve_ranking, save_matrix, save_ranking,
    ArtifactPaths,
};
use lsir_core::{build_lsa_ranking, build_matrix, Corpus, Field, Language, MatrixOptions, QueryOptions};
use record::{parser_for, read_documents};
use sha1::{Digest, Sha1};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "lsir")]
#[command(about = "Build, query and evaluate latent semantic rankings", long_about = None)]
struct Cli {
    /// Artifact store directory
    #[arg(long, global = true, env = "LSIR_STORE", default_value = "./store")]
    store: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a term-document matrix from input records
    Matrix {
        /// Input path (file or directory)
        #[arg(long)]
        input: PathBuf,
        /// Record format of the input files
        #[arg(long, default_value = "jsonl")]
        format: String,
        /// Fields the matrix is built from
        #[arg(long, value_delimiter = ',')]
        fields: Vec<Field>,
        /// Keep raw counts instead of TF-IDF weights
        #[arg(long, default_value_t = false)]
        no_tfidf: bool,
        /// Language of records without a language tag
        #[arg(long)]
        default_language: Option<Language>,
        /// Corpus identity; defaults to a digest of the input paths
        #[arg(long)]
        corpus_id: Option<String>,
    },
    /// Build an LSA ranking from a stored matrix
    Ranking {
        /// Matrix hash or unique prefix; the newest matrix when omitted
        #[arg(long)]
        matrix: Option<String>,
        /// Fraction of singular value mass to keep
        #[arg(long, default_value_t = DEFAULT_COVARIANCE)]
        covariance: f64,
    },
    /// Rank documents for a free-text query
    Query {
        #[arg(long)]
        ranking: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
        /// Only return results scoring above this cosine
        #[arg(long)]
        cosine: Option<f64>,
        /// Query language; guessed when omitted
        #[arg(long)]
        language: Option<Language>,
        #[arg(required = true)]
        words: Vec<String>,
    },
    /// Score a ranking against labeled queries
    Evaluate {
        /// Ground truth, one JSON object per line
        #[arg(long)]
        truth: PathBuf,
        #[arg(long)]
        ranking: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        cosine: Option<f64>,
        /// Only evaluate queries with exactly this many words
        #[arg(long)]
        words: Option<usize>,
        /// Write the full report here
        #[arg(long)]
        output: Option<PathBuf>,
        /// Print a single `<param> <precision> <recall> <f1>` line
        #[arg(long, default_value_t = false)]
        tabular: bool,
    },
    /// List stored matrices and rankings, newest first
    List {
        #[arg(long, default_value_t = 10)]
        count: usize,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let paths = ArtifactPaths::new(&cli.store);

    match cli.command {
        Commands::Matrix { input, format, fields, no_tfidf, default_language, corpus_id } => {
            let mut options = MatrixOptions { regularise: !no_tfidf, ..Default::default() };
            if !fields.is_empty() {
                options.fields = fields;
            }
            if let Some(language) = default_language {
                options.normalizer.default_language = language;
            }
            build_and_store_matrix(&paths, &input, &format, corpus_id, &options)
        }
        Commands::Ranking { matrix, covariance } => {
            let hash = resolve_matrix(&paths, matrix.as_deref())?;
            let td = load_matrix(&paths, &hash)?;
            let ranking = build_lsa_ranking(&td, covariance)?;
            save_ranking(&paths, &ranking)?;
            println!("{}", ranking.hash);
            Ok(())
        }
        Commands::Query { ranking, limit, cosine, language, words } => {
            let hash = resolve_ranking(&paths, ranking.as_deref())?;
            let ranker = load_ranker(&paths, &hash)?;
            let options = QueryOptions { limit, threshold: cosine, language };
            for (doc, score) in ranker.query_documents(words.as_slice(), &options) {
                println!("{score:.6}\t{}\t{}", doc.external_id, doc.title);
            }
            Ok(())
        }
        Commands::Evaluate { truth, ranking, limit, cosine, words, output, tabular } => {
            let hash = resolve_ranking(&paths, ranking.as_deref())?;
            let ranker = load_ranker(&paths, &hash)?;
            let f = File::open(&truth).with_context(|| format!("opening {}", truth.display()))?;
            let queries = read_ground_truth(BufReader::new(f))?;
            let options = EvaluationOptions { query: QueryOptions { limit, threshold: cosine, language: None }, words };
            let report = evaluate(&ranker, &queries, &options);
            if let Some(output) = output {
                fs::write(&output, serde_json::to_string_pretty(&report)?)?;
                tracing::info!(output = %output.display(), "wrote evaluation report");
            }
            if tabular {
                println!("{}", tabular_line(&report));
            } else {
                println!("{}", serde_json::to_string_pretty(&report.averages)?);
            }
            Ok(())
        }
        Commands::List { count } => {
            println!("matrices:");
            for m in list_matrices(&paths)?.into_iter().take(count) {
                println!("  {}  {}  {}x{}  {}", m.hash, m.created_at, m.rows, m.cols, m.corpus_id);
            }
            println!("rankings:");
            for r in list_rankings(&paths)?.into_iter().take(count) {
                let rank = r.options.rank.map(|k| k.to_string()).unwrap_or_else(|| "-".into());
                println!("  {}  {}  k={}  c={}  from {}", r.hash, r.created_at, rank, r.options.covariance, r.source.short());
            }
            Ok(())
        }
    }
}

fn build_and_store_matrix(
    paths: &ArtifactPaths,
    input: &Path,
    format: &str,
    corpus_id: Option<String>,
    options: &MatrixOptions,
) -> Result<()> {
    let parser = parser_for(format)?;
    let files = input_files(input, format)?;
    if files.is_empty() {
        bail!("no {format} files found under {}", input.display());
    }

    let mut documents = Vec::new();
    for file in &files {
        documents.extend(read_documents(file, parser.as_ref())?);
    }
    let corpus = Corpus::new(corpus_id.unwrap_or_else(|| corpus_digest(&files)), last_modified(&files)?)
        .with_documents(documents);
    tracing::info!(files = files.len(), documents = corpus.len(), corpus = %corpus.id, "ingested records");

    let td = build_matrix(&corpus, options)?;
    save_matrix(paths, &td)?;
    println!("{}", td.hash);
    Ok(())
}

/// The input file itself, or every file under it with a matching extension, sorted.
fn input_files(input: &Path, format: &str) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        bail!("input {} does not exist", input.display());
    }
    let mut files: Vec<PathBuf> = WalkDir::new(input)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && p.extension().and_then(|s| s.to_str()) == Some(format))
        .collect();
    files.sort();
    Ok(files)
}

fn corpus_digest(files: &[PathBuf]) -> String {
    let mut sorted: Vec<String> = files.iter().map(|p| p.display().to_string()).collect();
    sorted.sort();
    let mut hasher = Sha1::new();
    for path in &sorted {
        hasher.update(path.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

fn last_modified(files: &[PathBuf]) -> Result<String> {
    let mut newest = None;
    for file in files {
        let modified = fs::metadata(file)?.modified()?;
        newest = newest.max(Some(modified));
    }
    match newest {
        Some(t) => Ok(OffsetDateTime::from(t).format(&Rfc3339)?),
        None => Ok(String::new()),
    }
}

/// `<param> <precision> <recall> <f1>`, where the parameter is the cosine
/// threshold when one was used and the limit otherwise.
fn tabular_line(report: &EvaluationReport) -> String {
    let fmt_metric = |v: Option<f64>| v.map(|v| format!("{v:.4}")).unwrap_or_else(|| "-".into());
    let param = match (report.parameters.cosine, report.parameters.limit) {
        (Some(c), _) => c.to_string(),
        (None, Some(l)) => l.to_string(),
        (None, None) => lsir_core::config::DEFAULT_LIMIT.to_string(),
    };
    format!(
        "{param} {} {} {}",
        fmt_metric(report.averages.precision),
        fmt_metric(report.averages.recall),
        fmt_metric(report.averages.f1_score)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsir_core::evaluate::{Averages, EvaluationParameters};

    fn report(cosine: Option<f64>, limit: Option<usize>) -> EvaluationReport {
        EvaluationReport {
            parameters: EvaluationParameters { target: "abc".into(), queries: 2, cosine, limit, words: None },
            averages: Averages { precision: Some(0.5), recall: Some(0.25), f1_score: None },
            results: vec![],
        }
    }

    #[test]
    fn tabular_line_prefers_the_threshold() {
        assert_eq!(tabular_line(&report(Some(0.3), Some(5))), "0.3 0.5000 0.2500 -");
        assert_eq!(tabular_line(&report(None, Some(5))), "5 0.5000 0.2500 -");
        assert_eq!(tabular_line(&report(None, None)), "10 0.5000 0.2500 -");
    }

    #[test]
    fn corpus_digest_ignores_input_order() {
        let a = vec![PathBuf::from("b.jsonl"), PathBuf::from("a.jsonl")];
        let b = vec![PathBuf::from("a.jsonl"), PathBuf::from("b.jsonl")];
        assert_eq!(corpus_digest(&a), corpus_digest(&b));
        assert_eq!(corpus_digest(&a).len(), 40);
    }

    #[test]
    fn directories_are_walked_for_matching_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/b.jsonl"), "").unwrap();
        fs::write(dir.path().join("a.jsonl"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        let files = input_files(dir.path(), "jsonl").unwrap();
        assert_eq!(files.len(), 2);
        assert!(last_modified(&files).unwrap().contains('T'));
    }
}
