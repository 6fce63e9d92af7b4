use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use lsir_core::persist::{load_ranker, resolve_ranking, ArtifactPaths};
use lsir_core::{DocId, Language, LsirError, QueryOptions, Ranker};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Results per request are capped regardless of the requested limit.
const MAX_LIMIT: usize = 100;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub limit: Option<usize>,
    pub cosine: Option<f64>,
    pub lang: Option<String>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub ranking: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub external_id: String,
    pub title: String,
    pub score: f64,
}

#[derive(Deserialize, Default)]
pub struct ReloadRequest {
    /// Hash or unique prefix; the newest ranking when absent.
    pub ranking: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub store: PathBuf,
    pub ranker: Arc<RwLock<Ranker>>,
    pub admin_token: Option<String>,
}

type ApiError = (StatusCode, String);

fn api_error(err: LsirError) -> ApiError {
    let status = match &err {
        LsirError::ArtifactNotFound(_) => StatusCode::NOT_FOUND,
        e if e.is_input_error() || e.is_configuration_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

fn load(store: &std::path::Path, ranking: Option<&str>) -> lsir_core::Result<Ranker> {
    let paths = ArtifactPaths::new(store);
    let hash = resolve_ranking(&paths, ranking)?;
    load_ranker(&paths, &hash)
}

/// Loads `ranking` (or the newest ranking) from `store` and builds the router.
pub fn build_app(store: impl Into<PathBuf>, ranking: Option<String>) -> Result<Router> {
    let store = store.into();
    let ranker = load(&store, ranking.as_deref())?;
    tracing::info!(ranking = %ranker.hash(), documents = ranker.len(), "loaded ranking");
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    let app_state = AppState { store, ranker: Arc::new(RwLock::new(ranker)), admin_token };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/ranking/reload", post(reload_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let language = match params.lang.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        Some(tag) => Some(tag.parse::<Language>().map_err(api_error)?),
        None => None,
    };
    let options = QueryOptions {
        limit: Some(params.limit.unwrap_or(lsir_core::config::DEFAULT_LIMIT).min(MAX_LIMIT)),
        threshold: params.cosine,
        language,
    };
    let words: Vec<&str> = params.q.split_whitespace().collect();

    let ranker = state.ranker.read();
    let mut results: Vec<SearchHit> = ranker
        .query(&words, &options)
        .into_iter()
        .filter_map(|hit| {
            ranker.document(hit.doc_id).map(|doc| SearchHit {
                doc_id: hit.doc_id,
                external_id: doc.external_id.clone(),
                title: doc.title.clone(),
                score: hit.score,
            })
        })
        .collect();
    let total_hits = results.len();
    // A threshold lifts the limit in the ranker; the response is still capped.
    results.truncate(MAX_LIMIT);
    let ranking = ranker.hash().to_string();
    drop(ranker);

    let elapsed = start.elapsed();
    tracing::debug!(q = %params.q, total_hits, took_s = elapsed.as_secs_f64(), "search");
    Ok(Json(SearchResponse { query: params.q, ranking, took_s: elapsed.as_secs_f64(), total_hits, results }))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<DocId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let ranker = state.ranker.read();
    match ranker.document(doc_id) {
        Some(doc) => Ok(Json(serde_json::json!({
            "doc_id": doc_id,
            "external_id": doc.external_id,
            "title": doc.title,
        }))),
        None => Err((StatusCode::NOT_FOUND, format!("no document {doc_id}"))),
    }
}

async fn reload_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<ReloadRequest>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let store = state.store.clone();
    let ranker = tokio::task::spawn_blocking(move || load(&store, request.ranking.as_deref()))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(api_error)?;

    let hash = ranker.hash().to_string();
    let documents = ranker.len();
    *state.ranker.write() = ranker;
    tracing::info!(ranking = %hash, documents, "reloaded ranking");
    Ok(Json(serde_json::json!({ "ranking": hash, "documents": documents })))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
