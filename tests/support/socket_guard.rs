//! Localhost socket availability for tests that run a real server.
//!
//! Sandboxed runners sometimes forbid binding even `127.0.0.1`. Those tests
//! then skip with a note on stderr, unless `BIOGEN_REQUIRE_SOCKET_TESTS` is
//! set, in which case a missing socket is a hard failure.

use tokio::net::TcpListener;
use wiremock::MockServer;

const REQUIRE_ENV: &str = "BIOGEN_REQUIRE_SOCKET_TESTS";

fn sockets_required() -> bool {
    std::env::var(REQUIRE_ENV).is_ok_and(|value| {
        matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
    })
}

fn skip_or_fail(error: &std::io::Error) {
    let note = format!(
        "localhost socket unavailable in {} ({error})",
        std::thread::current().name().unwrap_or("unnamed test")
    );
    assert!(!sockets_required(), "{note}; unset {REQUIRE_ENV} to skip instead");
    eprintln!("{note}; skipping. Set {REQUIRE_ENV}=1 to make this fatal.");
}

/// Binds an ephemeral localhost port, or returns `None` when the test should skip.
#[allow(dead_code)]
pub async fn bind_local_or_skip() -> Option<TcpListener> {
    match TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => Some(listener),
        Err(error) => {
            skip_or_fail(&error);
            None
        }
    }
}

/// Starts a mock E-utilities server, or returns `None` when the test should skip.
#[allow(dead_code)]
pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if let Err(error) = std::net::TcpListener::bind("127.0.0.1:0") {
        skip_or_fail(&error);
        return None;
    }
    Some(MockServer::start().await)
}
