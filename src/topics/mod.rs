//! Benchmark topic catalog.
//!
//! Topics are loaded once from a single JSON array and indexed by their
//! numeric identifier. The [`search`] submodule filters the catalog by
//! free-text query.

mod search;

pub use search::{EmptyQueryPolicy, search, search_haystack};

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::corpus::parse_topic_id;

/// One benchmark question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Topic {
    pub id: u64,
    pub question: String,
    pub topic: String,
    pub narrative: String,
}

impl Topic {
    /// Builds a topic from one catalog entry. Entries without a usable `id` yield `None`.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let id = value.get("id").and_then(parse_topic_id)?;
        let text = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Some(Self {
            id,
            question: text("question"),
            topic: text("topic"),
            narrative: text("narrative"),
        })
    }
}

/// Topics keyed by id, iterated in ascending id order.
#[derive(Debug, Clone, Default)]
pub struct TopicIndex {
    topics: BTreeMap<u64, Topic>,
}

impl TopicIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a topic, replacing any earlier topic with the same id.
    pub fn insert(&mut self, topic: Topic) {
        self.topics.insert(topic.id, topic);
    }

    /// Returns the topic with the given id.
    #[must_use]
    pub fn get(&self, id: u64) -> Option<&Topic> {
        self.topics.get(&id)
    }

    /// Number of topics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    /// Returns true when the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Iterates topics in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Topic> {
        self.topics.values()
    }
}

impl FromIterator<Topic> for TopicIndex {
    fn from_iter<I: IntoIterator<Item = Topic>>(iter: I) -> Self {
        let mut index = Self::new();
        for topic in iter {
            index.insert(topic);
        }
        index
    }
}

/// Parses a topic catalog from a JSON array.
///
/// Malformed JSON or a non-array document yields an empty index. Entries
/// without an `id` are dropped; missing text fields default to `""`; later
/// duplicates overwrite earlier ones.
#[must_use]
#[instrument(skip(content), fields(bytes = content.len()))]
pub fn load_topics(content: &str) -> TopicIndex {
    let items = match serde_json::from_str::<Value>(content) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            warn!("Topic catalog is not a JSON array; treating as empty");
            return TopicIndex::new();
        }
        Err(error) => {
            warn!(error = %error, "Topic catalog is not valid JSON; treating as empty");
            return TopicIndex::new();
        }
    };

    let mut index = TopicIndex::new();
    for item in &items {
        match Topic::from_value(item) {
            Some(topic) => index.insert(topic),
            None => debug!("Dropping topic entry without a usable id"),
        }
    }
    index
}

/// Loads the topic catalog file. A missing or unreadable file yields an empty index.
#[must_use]
#[instrument(fields(path = %path.display()))]
pub fn load_topics_file(path: &Path) -> TopicIndex {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let index = load_topics(&content);
            info!(topics = index.len(), "Loaded topic catalog");
            index
        }
        Err(error) => {
            warn!(error = %error, "Topic catalog unreadable; treating as empty");
            TopicIndex::new()
        }
    }
}
