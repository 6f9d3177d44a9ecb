//! Error types for bibliographic lookups.
//!
//! Messages follow the What/Why/Fix pattern used across the project.

use thiserror::Error;

/// Failures while talking to the bibliographic service.
#[derive(Debug, Clone, Error)]
pub enum LookupError {
    /// The service answered with a non-success status.
    #[error("{endpoint} {status}: {body_preview}\n  Suggestion: {suggestion}")]
    HttpStatus {
        /// E-utilities endpoint name (`esearch`, `esummary`, `efetch`)
        endpoint: String,
        /// HTTP status code
        status: u16,
        /// First 200 characters of the response body
        body_preview: String,
        /// How to fix the issue
        suggestion: String,
    },

    /// The request never produced a response.
    #[error("{endpoint} request failed: {reason}\n  Suggestion: {suggestion}")]
    Transport {
        endpoint: String,
        reason: String,
        suggestion: String,
    },

    /// The response body could not be decoded.
    #[error("{endpoint} returned an unexpected response: {reason}\n  Suggestion: {suggestion}")]
    InvalidResponse {
        endpoint: String,
        reason: String,
        suggestion: String,
    },

    /// HTTP client construction failed.
    #[error("could not initialize the lookup HTTP client: {reason}\n  Suggestion: {suggestion}")]
    Client { reason: String, suggestion: String },
}

/// Maximum characters of a failed response body kept in [`LookupError::HttpStatus`].
pub const BODY_PREVIEW_CHARS: usize = 200;

impl LookupError {
    /// Creates an `HttpStatus` error, truncating the body to a short preview.
    #[must_use]
    pub fn http_status(endpoint: &str, status: u16, body: &str) -> Self {
        let suggestion = match status {
            429 => "E-utilities rate limit exceeded. Configure api_key or slow down requests",
            400..=499 => "Check the request parameters and api_key",
            _ => "E-utilities may be temporarily unavailable. Try again later",
        };
        Self::HttpStatus {
            endpoint: endpoint.to_string(),
            status,
            body_preview: body.chars().take(BODY_PREVIEW_CHARS).collect(),
            suggestion: suggestion.to_string(),
        }
    }

    /// Creates a `Transport` error.
    #[must_use]
    pub fn transport(endpoint: &str, reason: &str) -> Self {
        Self::Transport {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
            suggestion: "Check your network connection and eutils_base_url".to_string(),
        }
    }

    /// Creates an `InvalidResponse` error.
    #[must_use]
    pub fn invalid_response(endpoint: &str, reason: &str) -> Self {
        Self::InvalidResponse {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
            suggestion: "Verify eutils_base_url points at an NCBI E-utilities endpoint".to_string(),
        }
    }

    /// The message without its suggestion line.
    #[must_use]
    pub fn summary(&self) -> String {
        let message = self.to_string();
        match message.rfind("\n  Suggestion:") {
            Some(end) => message[..end].to_string(),
            None => message,
        }
    }

    /// Creates a `Client` error.
    #[must_use]
    pub fn client(reason: &str) -> Self {
        Self::Client {
            reason: reason.to_string(),
            suggestion: "Check proxy environment variables and TLS configuration".to_string(),
        }
    }
}

/// Caller input that cannot be turned into a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// The cite sentence was missing or blank.
    #[error("Missing ?sentence=\n  Suggestion: Pass the sentence to find citations for")]
    MissingSentence,

    /// No valid identifiers were supplied.
    #[error("Provide ?pmids=123,456\n  Suggestion: Identifiers must be 5 to 9 digits, separated by commas or spaces")]
    NoValidPmids,
}

impl InputError {
    /// Short message used in HTTP error envelopes.
    #[must_use]
    pub fn short_message(&self) -> &'static str {
        match self {
            Self::MissingSentence => "Missing ?sentence=",
            Self::NoValidPmids => "Provide ?pmids=123,456",
        }
    }
}
