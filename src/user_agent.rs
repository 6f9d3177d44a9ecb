//! User-Agent strings for outbound lookup traffic.
//!
//! NCBI asks callers to identify themselves; a configured contact email takes
//! precedence over the tool identifier.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/biogen-viewer";

/// Default User-Agent when no contact email is configured.
#[must_use]
pub(crate) fn default_lookup_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("biogen-viewer/{version} (research-tool; +{PROJECT_UA_URL})")
}

/// User-Agent for lookup requests: `mailto:{email}` when a contact email is set.
#[must_use]
pub(crate) fn lookup_user_agent(contact_email: Option<&str>) -> String {
    match contact_email.map(str::trim).filter(|email| !email.is_empty()) {
        Some(email) => format!("mailto:{email}"),
        None => default_lookup_user_agent(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lookup_user_agent_carries_version_and_url() {
        let ua = default_lookup_user_agent();
        assert!(ua.contains(PROJECT_UA_URL), "UA must contain project URL: {ua}");
        assert_eq!(
            env!("CARGO_PKG_VERSION"),
            ua.strip_prefix("biogen-viewer/")
                .and_then(|s| s.split(' ').next())
                .unwrap(),
        );
    }

    #[test]
    fn test_lookup_user_agent_prefers_contact_email() {
        assert_eq!(lookup_user_agent(Some(" me@example.org ")), "mailto:me@example.org");
        assert_eq!(lookup_user_agent(Some("")), default_lookup_user_agent());
        assert_eq!(lookup_user_agent(None), default_lookup_user_agent());
    }
}
