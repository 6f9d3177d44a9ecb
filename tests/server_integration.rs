//! Integration tests for the JSON HTTP API.
//!
//! The server runs on an ephemeral localhost port with an in-memory index and
//! a scripted lookup in place of `PubMed`.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use biogen_core::corpus::{DuplicatePolicy, load_system_str};
use biogen_core::lookup::{
    Article, BibliographicLookup, Citation, CiteResponse, FetchResponse, LookupError,
};
use biogen_core::server::{AppState, serve_listener};
use biogen_core::topics::{EmptyQueryPolicy, load_topics};
use biogen_core::ViewerIndex;
use serde_json::Value;
use url::Url;

mod support;
use support::socket_guard::bind_local_or_skip;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Cite(String, usize),
    Fetch(Vec<String>),
}

#[derive(Default)]
struct ScriptedLookup {
    fail: bool,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedLookup {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BibliographicLookup for ScriptedLookup {
    async fn cite(&self, sentence: &str, retmax: usize) -> Result<CiteResponse, LookupError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Cite(sentence.to_string(), retmax));
        if self.fail {
            return Err(LookupError::http_status("esearch", 500, "upstream exploded"));
        }
        Ok(CiteResponse {
            query: format!("\"{sentence}\"[tiab]"),
            pmids: vec!["12345678".into()],
            citations: vec![Citation {
                pmid: "12345678".into(),
                title: "A trial".into(),
                ..Citation::default()
            }],
        })
    }

    async fn fetch_articles(&self, pmids: &[String]) -> Result<FetchResponse, LookupError> {
        self.calls.lock().unwrap().push(Call::Fetch(pmids.to_vec()));
        if self.fail {
            return Err(LookupError::http_status("efetch", 502, ""));
        }
        Ok(FetchResponse::new(
            pmids
                .iter()
                .map(|pmid| Article {
                    pmid: pmid.clone(),
                    ..Article::default()
                })
                .collect(),
        ))
    }
}

fn index() -> ViewerIndex {
    let topics = load_topics(
        r#"[
            {"id": 11, "question": "Insulin pumps in type 1 diabetes", "topic": "devices"},
            {"id": 20, "question": "Is metformin first-line for type 2 diabetes?", "topic": "diabetes"},
            {"id": 3, "question": "How is asthma treated?", "topic": "respiratory"}
        ]"#,
    );
    let system_a = load_system_str(
        r#"{"topic_id": "20", "responses": [{"text": "Yes, metformin is first-line.", "citations": ["31415926"]}]}"#,
        DuplicatePolicy::Replace,
    );
    let system_b = load_system_str(
        r#"{"id": 11, "answer": "Pumps help. Monitoring matters (PMID: 2718281)."}"#,
        DuplicatePolicy::Replace,
    );
    ViewerIndex::from_parts(
        topics,
        vec![("System A".into(), system_a), ("System B".into(), system_b)],
        BTreeMap::from([("System A".to_string(), "Baseline".to_string())]),
        EmptyQueryPolicy::All,
    )
}

struct TestServer {
    base: String,
    lookup: Arc<ScriptedLookup>,
}

impl TestServer {
    fn url(&self, path: &str, params: &[(&str, &str)]) -> Url {
        Url::parse_with_params(&format!("{}{path}", self.base), params).unwrap()
    }
}

async fn start_server(lookup: ScriptedLookup) -> Option<TestServer> {
    let listener = bind_local_or_skip().await?;
    let addr = listener.local_addr().unwrap();
    let lookup = Arc::new(lookup);
    let state = AppState::new(Arc::new(index()), lookup.clone());
    tokio::spawn(async move {
        let _ = serve_listener(listener, state).await;
    });
    Some(TestServer {
        base: format!("http://{addr}"),
        lookup,
    })
}

async fn get_json(url: Url) -> (u16, Option<String>, Value) {
    let response = reqwest::get(url).await.unwrap();
    let status = response.status().as_u16();
    let cache_control = response
        .headers()
        .get("cache-control")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body: Value = response.json().await.unwrap();
    (status, cache_control, body)
}

#[tokio::test]
async fn test_search_returns_rows_with_answers_for_every_selected_system() {
    let Some(server) = start_server(ScriptedLookup::default()).await else {
        return;
    };

    let (status, _, body) = get_json(server.url("/api/search", &[("q", "Diabetes")])).await;
    assert_eq!(status, 200);
    assert_eq!(body["count"], 2);
    assert_eq!(body["systems"], serde_json::json!(["System A", "System B"]));

    let rows = body["results"].as_array().unwrap();
    assert_eq!(rows[0]["id"], 11);
    assert_eq!(rows[1]["id"], 20);

    let metformin = &rows[1];
    assert_eq!(
        metformin["answers"]["System A"]["identifiers_all"],
        serde_json::json!(["31415926"])
    );
    assert_eq!(metformin["answers"]["System B"]["text"], "");
    assert_eq!(metformin["pmids"]["System B"], serde_json::json!([]));

    let pumps = &rows[0];
    assert_eq!(
        pumps["answers"]["System B"]["sentences"][1]["text"],
        "Monitoring matters (PMID: 2718281)."
    );
    assert_eq!(pumps["pmids"]["System B"], serde_json::json!(["2718281"]));
}

#[tokio::test]
async fn test_search_system_selection_filters_and_falls_back() {
    let Some(server) = start_server(ScriptedLookup::default()).await else {
        return;
    };

    let (_, _, body) = get_json(server.url(
        "/api/search",
        &[("q", ""), ("systems", " System B ,Unknown")],
    ))
    .await;
    assert_eq!(body["systems"], serde_json::json!(["System B"]));
    assert_eq!(body["count"], 3, "empty query lists every topic");
    assert!(body["results"][0]["answers"].get("System A").is_none());

    let (_, _, body) = get_json(server.url("/api/search", &[("systems", "Nope")])).await;
    assert_eq!(body["systems"], serde_json::json!(["System A", "System B"]));
}

#[tokio::test]
async fn test_systems_lists_names_and_descriptions() {
    let Some(server) = start_server(ScriptedLookup::default()).await else {
        return;
    };

    let (status, _, body) = get_json(server.url("/api/systems", &[])).await;
    assert_eq!(status, 200);
    assert_eq!(body["systems"], serde_json::json!(["System A", "System B"]));
    assert_eq!(body["descriptions"]["System A"], "Baseline");
}

#[tokio::test]
async fn test_cite_missing_sentence_is_bad_request() {
    let Some(server) = start_server(ScriptedLookup::default()).await else {
        return;
    };

    let (status, _, body) = get_json(server.url("/api/cite", &[])).await;
    assert_eq!(status, 400);
    assert_eq!(body, serde_json::json!({"error": "Missing ?sentence="}));

    let (status, _, _) = get_json(server.url("/api/cite", &[("sentence", "   ")])).await;
    assert_eq!(status, 400);
    assert!(server.lookup.calls().is_empty(), "lookup must not be called");
}

#[tokio::test]
async fn test_cite_clamps_retmax_and_sets_cache_header() {
    let Some(server) = start_server(ScriptedLookup::default()).await else {
        return;
    };

    let (status, cache, body) = get_json(server.url(
        "/api/cite",
        &[("sentence", "  Metformin works. "), ("retmax", "50")],
    ))
    .await;
    assert_eq!(status, 200);
    assert_eq!(cache.as_deref(), Some("s-maxage=300"));
    assert_eq!(body["pmids"], serde_json::json!(["12345678"]));
    assert_eq!(body["citations"][0]["title"], "A trial");

    let (_, _, _) = get_json(server.url("/api/cite", &[("sentence", "x"), ("retmax", "abc")])).await;
    assert_eq!(
        server.lookup.calls(),
        vec![
            Call::Cite("Metformin works.".into(), 20),
            Call::Cite("x".into(), 5)
        ]
    );
}

#[tokio::test]
async fn test_cite_lookup_failure_is_reported_in_band() {
    let Some(server) = start_server(ScriptedLookup::failing()).await else {
        return;
    };

    let (status, cache, body) =
        get_json(server.url("/api/cite", &[("sentence", "Metformin")])).await;
    assert_eq!(status, 200);
    assert_eq!(cache, None);
    assert_eq!(body, serde_json::json!({"error": "esearch 500: upstream exploded"}));
}

#[tokio::test]
async fn test_pubmed_requires_valid_identifiers() {
    let Some(server) = start_server(ScriptedLookup::default()).await else {
        return;
    };

    let (status, _, body) = get_json(server.url("/api/pubmed", &[("pmids", "12,abc")])).await;
    assert_eq!(status, 400);
    assert_eq!(body, serde_json::json!({"error": "Provide ?pmids=123,456"}));

    let (status, _, _) = get_json(server.url("/api/pubmed", &[])).await;
    assert_eq!(status, 400);
    assert!(server.lookup.calls().is_empty());
}

#[tokio::test]
async fn test_pubmed_filters_identifiers_and_sets_cache_header() {
    let Some(server) = start_server(ScriptedLookup::default()).await else {
        return;
    };

    let (status, cache, body) = get_json(server.url(
        "/api/pubmed",
        &[("pmids", "12345, abc 23456789,1234567890")],
    ))
    .await;
    assert_eq!(status, 200);
    assert_eq!(cache.as_deref(), Some("s-maxage=600"));
    assert_eq!(body["count"], 2);
    assert_eq!(body["items"][1]["pmid"], "23456789");
    assert!(body["items"][0].get("abstract").is_some());
    assert_eq!(
        server.lookup.calls(),
        vec![Call::Fetch(vec!["12345".into(), "23456789".into()])]
    );
}

#[tokio::test]
async fn test_pubmed_lookup_failure_is_reported_in_band() {
    let Some(server) = start_server(ScriptedLookup::failing()).await else {
        return;
    };

    let (status, _, body) = get_json(server.url("/api/pubmed", &[("pmids", "12345")])).await;
    assert_eq!(status, 200);
    assert_eq!(body, serde_json::json!({"error": "efetch 502: "}));
}
