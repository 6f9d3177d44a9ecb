//! Bibliographic lookups against `PubMed`.
//!
//! The [`BibliographicLookup`] trait is the seam between request handlers and
//! the remote service. [`PubMedClient`] implements it on top of NCBI
//! E-utilities (`esearch`, `esummary`, `efetch`); tests substitute their own
//! implementations.
//!
//! # Example
//!
//! ```no_run
//! use biogen_core::lookup::{BibliographicLookup, LookupSettings, PubMedClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = PubMedClient::new(LookupSettings::default())?;
//! let response = client.cite("Metformin lowers HbA1c.", 5).await?;
//! println!("{} citations for {}", response.citations.len(), response.query);
//! # Ok(())
//! # }
//! ```

mod efetch;
mod error;
mod http_client;
mod pubmed;
mod query;

pub use efetch::parse_articles;
pub use error::{BODY_PREVIEW_CHARS, InputError, LookupError};
pub use http_client::{CONNECT_TIMEOUT_SECS, HttpTimeouts, READ_TIMEOUT_SECS, build_lookup_http_client};
pub use pubmed::PubMedClient;
pub use query::{build_query, content_tokens, extract_doi, sanitize_sentence};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::corpus::is_valid_identifier;

/// Default E-utilities base URL.
pub const DEFAULT_EUTILS_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
/// Default `tool` parameter sent to E-utilities.
pub const DEFAULT_TOOL_NAME: &str = "trec-biogen-viewer";
/// Citations returned when the caller does not say.
pub const DEFAULT_RETMAX: usize = 5;
/// Upper bound on citations per request.
pub const MAX_RETMAX: usize = 20;
/// Upper bound on identifiers per fetch.
pub const MAX_FETCH_PMIDS: usize = 50;

/// Public `PubMed` page for an identifier.
#[must_use]
pub fn article_url(pmid: &str) -> String {
    format!("https://pubmed.ncbi.nlm.nih.gov/{pmid}/")
}

/// One citation candidate for a sentence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub pmid: String,
    pub title: String,
    pub journal: String,
    pub year: String,
    pub doi: String,
    pub url: String,
}

/// Result of a sentence citation search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiteResponse {
    /// Search term sent to `esearch`.
    pub query: String,
    /// Identifiers returned by `esearch`, in relevance order.
    pub pmids: Vec<String>,
    /// Summaries for `pmids`; identifiers without a summary are skipped.
    pub citations: Vec<Citation>,
}

/// Full record for one article.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub pmid: String,
    pub title: String,
    pub journal: String,
    pub year: String,
    pub doi: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub url: String,
}

/// Result of an article fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub count: usize,
    pub items: Vec<Article>,
}

impl FetchResponse {
    #[must_use]
    pub fn new(items: Vec<Article>) -> Self {
        Self {
            count: items.len(),
            items,
        }
    }
}

/// Looks up supporting literature for answer text.
#[async_trait]
pub trait BibliographicLookup: Send + Sync {
    /// Finds up to `retmax` citations for a free-text sentence.
    async fn cite(&self, sentence: &str, retmax: usize) -> Result<CiteResponse, LookupError>;

    /// Fetches title, journal, year, DOI, and abstract for each identifier.
    async fn fetch_articles(&self, pmids: &[String]) -> Result<FetchResponse, LookupError>;
}

/// Connection and identification settings for [`PubMedClient`].
#[derive(Clone, PartialEq, Eq)]
pub struct LookupSettings {
    pub base_url: String,
    pub tool_name: String,
    pub contact_email: Option<String>,
    pub api_key: Option<String>,
    pub timeouts: HttpTimeouts,
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_EUTILS_BASE_URL.to_string(),
            tool_name: DEFAULT_TOOL_NAME.to_string(),
            contact_email: None,
            api_key: None,
            timeouts: HttpTimeouts::default(),
        }
    }
}

impl std::fmt::Debug for LookupSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupSettings")
            .field("base_url", &self.base_url)
            .field("tool_name", &self.tool_name)
            .field("contact_email", &self.contact_email)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

/// Parses a `retmax` parameter.
///
/// A leading integer is read the way browsers parse query numbers; missing,
/// unparsable, or zero values give [`DEFAULT_RETMAX`]. The result is clamped
/// to `1..=MAX_RETMAX`.
#[must_use]
pub fn parse_retmax(value: Option<&str>) -> usize {
    let Some(parsed) = value.and_then(leading_integer).filter(|n| *n != 0) else {
        return DEFAULT_RETMAX;
    };
    if parsed < 1 {
        return 1;
    }
    usize::try_from(parsed).map_or(MAX_RETMAX, |n| n.min(MAX_RETMAX))
}

fn leading_integer(value: &str) -> Option<i64> {
    let value = value.trim_start();
    let (sign, digits) = match value.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, value.strip_prefix('+').unwrap_or(value)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let digits = &digits[..end];
    if digits.is_empty() {
        return None;
    }
    // Out-of-range inputs saturate.
    Some(digits.parse::<i64>().unwrap_or(i64::MAX) * sign)
}

/// Parses a comma- or whitespace-separated identifier list.
///
/// Invalid entries are dropped and at most [`MAX_FETCH_PMIDS`] are kept.
#[must_use]
pub fn parse_pmid_list(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty() && is_valid_identifier(part))
        .take(MAX_FETCH_PMIDS)
        .map(str::to_string)
        .collect()
}

/// Validates a cite sentence, returning it trimmed.
///
/// # Errors
///
/// Returns [`InputError::MissingSentence`] for a missing or blank sentence.
pub fn require_sentence(sentence: Option<&str>) -> Result<&str, InputError> {
    match sentence.map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(InputError::MissingSentence),
    }
}

/// Parses an identifier list that must not come back empty.
///
/// # Errors
///
/// Returns [`InputError::NoValidPmids`] when no valid identifier remains.
pub fn require_pmids(value: Option<&str>) -> Result<Vec<String>, InputError> {
    let pmids = parse_pmid_list(value.unwrap_or_default());
    if pmids.is_empty() {
        return Err(InputError::NoValidPmids);
    }
    Ok(pmids)
}
