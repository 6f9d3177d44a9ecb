//! `PubMed` E-utilities client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

use crate::user_agent::lookup_user_agent;
use crate::utils::extract_year_from_str;

use super::efetch::parse_articles;
use super::http_client::build_lookup_http_client;
use super::query::{build_query, extract_doi};
use super::{
    BibliographicLookup, Citation, CiteResponse, FetchResponse, LookupError, LookupSettings,
    MAX_FETCH_PMIDS, MAX_RETMAX, article_url,
};

#[derive(Debug, Default, Deserialize)]
struct EsearchBody {
    #[serde(default)]
    esearchresult: EsearchResult,
}

#[derive(Debug, Default, Deserialize)]
struct EsearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct EsummaryBody {
    #[serde(default)]
    result: Map<String, Value>,
}

/// Client for NCBI E-utilities.
pub struct PubMedClient {
    client: Client,
    settings: LookupSettings,
}

impl PubMedClient {
    /// Creates a client from explicit settings.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] when HTTP client construction fails.
    pub fn new(settings: LookupSettings) -> Result<Self, LookupError> {
        let user_agent = lookup_user_agent(settings.contact_email.as_deref());
        let client = build_lookup_http_client(&user_agent, settings.timeouts)?;
        Ok(Self { client, settings })
    }

    /// Creates a client with default settings and a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] when HTTP client construction fails.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, LookupError> {
        Self::new(LookupSettings {
            base_url: base_url.into(),
            ..LookupSettings::default()
        })
    }

    /// The settings this client was built with.
    #[must_use]
    pub fn settings(&self) -> &LookupSettings {
        &self.settings
    }

    fn endpoint_url(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Url, LookupError> {
        let mut all: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        all.push(("tool", self.settings.tool_name.as_str()));
        if let Some(key) = self.settings.api_key.as_deref() {
            all.push(("api_key", key));
        }
        if let Some(email) = self.settings.contact_email.as_deref() {
            all.push(("email", email));
        }
        let base = self.settings.base_url.trim_end_matches('/');
        Url::parse_with_params(&format!("{base}/{endpoint}.fcgi"), &all)
            .map_err(|e| LookupError::transport(endpoint, &format!("invalid base URL: {e}")))
    }

    async fn get(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<reqwest::Response, LookupError> {
        let url = self.endpoint_url(endpoint, params)?;
        debug!(endpoint, "Calling E-utilities");

        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(endpoint, error = %e, "E-utilities request failed");
            LookupError::transport(endpoint, &e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(endpoint, status = status.as_u16(), "E-utilities error status");
            return Err(LookupError::http_status(endpoint, status.as_u16(), &body));
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, LookupError> {
        let response = self.get(endpoint, params).await?;
        response.json::<T>().await.map_err(|e| {
            warn!(endpoint, error = %e, "Failed to parse E-utilities JSON");
            LookupError::invalid_response(endpoint, &e.to_string())
        })
    }

    /// Returns identifiers matching `term`, best first.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] on transport, status, or decoding failures.
    #[tracing::instrument(skip(self))]
    pub async fn esearch(&self, term: &str, retmax: usize) -> Result<Vec<String>, LookupError> {
        let params = [
            ("db", "pubmed".to_string()),
            ("retmode", "json".to_string()),
            ("sort", "relevance".to_string()),
            ("retmax", retmax.to_string()),
            ("term", term.to_string()),
        ];
        let body: EsearchBody = self.get_json("esearch", &params).await?;
        Ok(body.esearchresult.idlist)
    }

    /// Returns the `esummary` result map keyed by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] on transport, status, or decoding failures.
    #[tracing::instrument(skip(self), fields(ids = ids.len()))]
    pub async fn esummary(&self, ids: &[String]) -> Result<Map<String, Value>, LookupError> {
        if ids.is_empty() {
            return Ok(Map::new());
        }
        let params = [
            ("db", "pubmed".to_string()),
            ("retmode", "json".to_string()),
            ("id", ids.join(",")),
        ];
        let body: EsummaryBody = self.get_json("esummary", &params).await?;
        Ok(body.result)
    }

    /// Returns the raw `efetch` XML for `ids`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] on transport, status, or body read failures.
    #[tracing::instrument(skip(self), fields(ids = ids.len()))]
    pub async fn efetch(&self, ids: &[String]) -> Result<String, LookupError> {
        let params = [
            ("db", "pubmed".to_string()),
            ("retmode", "xml".to_string()),
            ("id", ids.join(",")),
        ];
        let response = self.get("efetch", &params).await?;
        response
            .text()
            .await
            .map_err(|e| LookupError::invalid_response("efetch", &e.to_string()))
    }
}

impl std::fmt::Debug for PubMedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PubMedClient")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

fn summary_text<'a>(doc: &'a Value, key: &str) -> &'a str {
    doc.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or_default()
}

/// Builds a citation from one `esummary` document.
fn citation_from_summary(pmid: &str, doc: &Value) -> Citation {
    let journal = match summary_text(doc, "fulljournalname") {
        "" => summary_text(doc, "source"),
        name => name,
    };
    let date = match summary_text(doc, "sortpubdate") {
        "" => summary_text(doc, "pubdate"),
        date => date,
    };
    Citation {
        pmid: pmid.to_string(),
        title: summary_text(doc, "title").to_string(),
        journal: journal.to_string(),
        year: extract_year_from_str(date),
        doi: extract_doi(summary_text(doc, "elocationid")),
        url: article_url(pmid),
    }
}

#[async_trait]
impl BibliographicLookup for PubMedClient {
    #[tracing::instrument(skip(self, sentence), fields(chars = sentence.len()))]
    async fn cite(&self, sentence: &str, retmax: usize) -> Result<CiteResponse, LookupError> {
        let query = build_query(sentence);
        let pmids = self.esearch(&query, retmax.clamp(1, MAX_RETMAX)).await?;
        let summaries = self.esummary(&pmids).await?;

        let citations = pmids
            .iter()
            .filter_map(|id| {
                summaries
                    .get(id)
                    .filter(|doc| doc.is_object())
                    .map(|doc| citation_from_summary(id, doc))
            })
            .collect();
        Ok(CiteResponse {
            query,
            pmids,
            citations,
        })
    }

    #[tracing::instrument(skip(self), fields(ids = pmids.len()))]
    async fn fetch_articles(&self, pmids: &[String]) -> Result<FetchResponse, LookupError> {
        if pmids.is_empty() {
            return Ok(FetchResponse::default());
        }
        let pmids = &pmids[..pmids.len().min(MAX_FETCH_PMIDS)];
        let xml = self.efetch(pmids).await?;
        Ok(FetchResponse::new(parse_articles(&xml)))
    }
}
