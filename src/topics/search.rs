//! Token filter over the topic catalog.

use std::str::FromStr;

use tracing::instrument;

use super::{Topic, TopicIndex};

/// Result policy for an empty or whitespace-only query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyQueryPolicy {
    /// Return every topic, ascending by id.
    #[default]
    All,
    /// Return no topics.
    None,
}

impl EmptyQueryPolicy {
    /// Returns the stable label used in config files and CLI flags.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::None => "none",
        }
    }
}

impl FromStr for EmptyQueryPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "none" => Ok(Self::None),
            other => Err(format!(
                "unknown empty-query policy '{other}' (expected 'all' or 'none')"
            )),
        }
    }
}

/// Returns the lower-cased text a query is matched against.
#[must_use]
pub fn search_haystack(topic: &Topic) -> String {
    format!(
        "{} {} {} {}",
        topic.id, topic.question, topic.topic, topic.narrative
    )
    .to_lowercase()
}

/// Filters topics whose combined fields contain every query token.
///
/// Matching is case-insensitive substring matching with AND semantics; there
/// is no ranking. Results are ascending by id.
#[must_use]
#[instrument(skip(topics), fields(topics = topics.len()))]
pub fn search<'a>(topics: &'a TopicIndex, query: &str, policy: EmptyQueryPolicy) -> Vec<&'a Topic> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return match policy {
            EmptyQueryPolicy::All => topics.iter().collect(),
            EmptyQueryPolicy::None => Vec::new(),
        };
    }

    let tokens: Vec<&str> = query.split_whitespace().collect();
    topics
        .iter()
        .filter(|topic| {
            let haystack = search_haystack(topic);
            tokens.iter().all(|token| haystack.contains(token))
        })
        .collect()
}
