//! JSON HTTP surface over the viewer index and the lookup client.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::index::ViewerIndex;
use crate::lookup::{
    BibliographicLookup, InputError, LookupError, parse_retmax, require_pmids, require_sentence,
};

/// Edge cache lifetime for citation searches.
pub const CITE_CACHE_CONTROL: &str = "s-maxage=300";
/// Edge cache lifetime for article fetches.
pub const PUBMED_CACHE_CONTROL: &str = "s-maxage=600";

/// Shared, read-only handler state.
#[derive(Clone)]
pub struct AppState {
    pub index: Arc<ViewerIndex>,
    pub lookup: Arc<dyn BibliographicLookup>,
}

impl AppState {
    #[must_use]
    pub fn new(index: Arc<ViewerIndex>, lookup: Arc<dyn BibliographicLookup>) -> Self {
        Self { index, lookup }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SearchParams {
    q: Option<String>,
    systems: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CiteParams {
    sentence: Option<String>,
    retmax: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PubMedParams {
    pmids: Option<String>,
}

/// Builds the `/api` router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/search", get(search))
        .route("/api/systems", get(systems))
        .route("/api/cite", get(cite))
        .route("/api/pubmed", get(pubmed))
        .with_state(state)
}

/// Binds `addr` and serves until the process stops.
///
/// # Errors
///
/// Fails when the address cannot be bound or the server stops with an I/O error.
pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Viewer API listening");
    serve_listener(listener, state).await
}

/// Serves on an already-bound listener.
///
/// # Errors
///
/// Fails when the server stops with an I/O error.
pub async fn serve_listener(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    let response = state
        .index
        .search(params.q.as_deref().unwrap_or_default(), params.systems.as_deref());
    Json(response).into_response()
}

async fn systems(State(state): State<AppState>) -> Response {
    Json(state.index.systems_overview()).into_response()
}

async fn cite(State(state): State<AppState>, Query(params): Query<CiteParams>) -> Response {
    let sentence = match require_sentence(params.sentence.as_deref()) {
        Ok(sentence) => sentence,
        Err(error) => return bad_request(&error),
    };
    let retmax = parse_retmax(params.retmax.as_deref());

    match state.lookup.cite(sentence, retmax).await {
        Ok(response) => with_cache_control(Json(response).into_response(), CITE_CACHE_CONTROL),
        Err(error) => lookup_failure(&error),
    }
}

async fn pubmed(State(state): State<AppState>, Query(params): Query<PubMedParams>) -> Response {
    let pmids = match require_pmids(params.pmids.as_deref()) {
        Ok(pmids) => pmids,
        Err(error) => return bad_request(&error),
    };

    match state.lookup.fetch_articles(&pmids).await {
        Ok(response) => with_cache_control(Json(response).into_response(), PUBMED_CACHE_CONTROL),
        Err(error) => lookup_failure(&error),
    }
}

fn bad_request(error: &InputError) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": error.short_message() })),
    )
        .into_response()
}

/// Lookup failures are reported in-band with a 200 status.
fn lookup_failure(error: &LookupError) -> Response {
    warn!(error = %error, "Lookup failed");
    (StatusCode::OK, Json(json!({ "error": error.summary() }))).into_response()
}

fn with_cache_control(mut response: Response, value: &'static str) -> Response {
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static(value));
    response
}
