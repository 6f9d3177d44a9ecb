//! Shared HTTP client construction for lookup calls.
//!
//! Every outbound client gets the same timeouts, compression and
//! User-Agent policy from here.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use reqwest::{Client, ClientBuilder, Proxy};
use tracing::warn;

use super::LookupError;

/// Default connect timeout.
pub const CONNECT_TIMEOUT_SECS: u64 = 10;
/// Default whole-request timeout.
pub const READ_TIMEOUT_SECS: u64 = 30;

/// Connect and read timeouts for lookup clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
        }
    }
}

/// Builds a lookup HTTP client.
///
/// Some sandboxed environments panic while querying system proxy settings;
/// in that case the client is rebuilt with proxies taken from the
/// environment only.
///
/// # Errors
///
/// Returns [`LookupError::Client`] when client construction fails.
pub fn build_lookup_http_client(
    user_agent: &str,
    timeouts: HttpTimeouts,
) -> Result<Client, LookupError> {
    match try_build_client(user_agent, timeouts, false) {
        Ok(client) => Ok(client),
        Err(BuildClientFailure::Panic) => {
            warn!("Lookup client hit system proxy panic; using env-proxy fallback builder");
            match try_build_client(user_agent, timeouts, true) {
                Ok(client) => Ok(client),
                Err(BuildClientFailure::Panic) => Err(LookupError::client(
                    "HTTP client construction panicked while initializing networking",
                )),
                Err(BuildClientFailure::Build(error)) => Err(LookupError::client(&format!(
                    "HTTP client construction failed: {error}"
                ))),
            }
        }
        Err(BuildClientFailure::Build(error)) => Err(LookupError::client(&format!(
            "HTTP client construction failed: {error}"
        ))),
    }
}

enum BuildClientFailure {
    Panic,
    Build(reqwest::Error),
}

fn try_build_client(
    user_agent: &str,
    timeouts: HttpTimeouts,
    disable_system_proxy_lookup: bool,
) -> Result<Client, BuildClientFailure> {
    let user_agent = user_agent.to_string();
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = base_builder(user_agent, timeouts);
        if disable_system_proxy_lookup {
            builder = apply_env_proxy_fallback(builder.no_proxy());
        }
        builder.build().map_err(BuildClientFailure::Build)
    }))
    .map_err(|_| BuildClientFailure::Panic)?
}

fn base_builder(user_agent: String, timeouts: HttpTimeouts) -> ClientBuilder {
    Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_timeout_secs))
        .timeout(Duration::from_secs(timeouts.read_timeout_secs))
        .user_agent(user_agent)
        .gzip(true)
}

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(proxy) = find_first_proxy_var(&["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"])
        && let Ok(resolved) = Proxy::https(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    if let Some(proxy) = find_first_proxy_var(&["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"])
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    builder
}

fn find_first_proxy_var(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let timeouts = HttpTimeouts::default();
        assert_eq!(timeouts.connect_timeout_secs, 10);
        assert_eq!(timeouts.read_timeout_secs, 30);
    }

    #[test]
    fn test_build_lookup_http_client_succeeds_with_custom_timeouts() {
        let timeouts = HttpTimeouts {
            connect_timeout_secs: 1,
            read_timeout_secs: 2,
        };
        assert!(build_lookup_http_client("biogen-viewer/test", timeouts).is_ok());
    }
}
