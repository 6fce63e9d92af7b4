//! Latent semantic indexing over bibliographic records.
//!
//! Documents are normalized ([`normalize`]), counted into a term-document
//! matrix ([`matrix`]), reduced with a truncated SVD ([`ranking`]) and
//! queried by cosine similarity ([`search`]). [`evaluate`] scores a ranking
//! against labeled queries and [`persist`] stores the artifacts by build hash.

pub mod config;
pub mod error;
pub mod evaluate;
pub mod index;
pub mod language;
pub mod matrix;
pub mod normalize;
pub mod persist;
pub mod ranking;
pub mod search;

pub use config::{MatrixOptions, NormalizerConfig, QueryOptions, RankingOptions};
pub use error::{LsirError, Result};
pub use index::{Corpus, DocId, DocMeta, Document, Field};
pub use language::{FixedGuesser, Language, LanguageGuesser, StopwordGuesser};
pub use matrix::{build_matrix, BuildHash, TermDocumentMatrix, Vocabulary};
pub use ranking::{build_lsa_ranking, RankingMatrix};
pub use search::{Ranker, SearchHit};
