//! The immutable, in-memory viewer index.
//!
//! A [`ViewerIndex`] is built once before any query is served and is then
//! shared read-only (typically behind an `Arc`) by every request handler.
//! Source files are read exactly once; changes on disk are not picked up
//! until the index is rebuilt.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;
use tracing::{info, instrument};

use crate::corpus::{DuplicatePolicy, NormalizedAnswer, SystemCorpus, load_system_file};
use crate::descriptions::load_descriptions_file;
use crate::topics::{EmptyQueryPolicy, Topic, TopicIndex, load_topics_file, search};

/// Topic catalog file name inside the data directory.
pub const TOPICS_FILE: &str = "task_b.json";
/// Optional descriptions file name inside the data directory.
pub const DESCRIPTIONS_FILE: &str = "system_descriptions.json";

/// A compared system and the corpus file backing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemSource {
    /// Display name, e.g. `System A`.
    pub name: String,
    /// Corpus file name relative to the data directory.
    pub file: String,
}

impl SystemSource {
    #[must_use]
    pub fn new(name: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
        }
    }
}

impl FromStr for SystemSource {
    type Err = String;

    /// Parses `Name=file.jsonl`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let Some((name, file)) = value.split_once('=') else {
            return Err(format!("expected 'Name=file.jsonl', got '{value}'"));
        };
        let (name, file) = (name.trim(), file.trim());
        if name.is_empty() || file.is_empty() {
            return Err(format!("system name and file must be non-empty in '{value}'"));
        }
        if name.contains(',') {
            return Err(format!("system name must not contain ',' in '{value}'"));
        }
        Ok(Self::new(name, file))
    }
}

/// The default systems: `System A` through `System E`.
#[must_use]
pub fn default_systems() -> Vec<SystemSource> {
    ["A", "B", "C", "D", "E"]
        .iter()
        .map(|letter| {
            SystemSource::new(
                format!("System {letter}"),
                format!("System_{letter}_output.jsonl"),
            )
        })
        .collect()
}

/// Where and how to build the index.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub data_dir: PathBuf,
    pub systems: Vec<SystemSource>,
    pub duplicates: DuplicatePolicy,
    pub empty_query: EmptyQueryPolicy,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            systems: default_systems(),
            duplicates: DuplicatePolicy::default(),
            empty_query: EmptyQueryPolicy::default(),
        }
    }
}

/// One search result row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicRow {
    pub id: u64,
    pub question: String,
    pub topic: String,
    pub narrative: String,
    /// Canonical answer per selected system (empty when the system has none).
    pub answers: BTreeMap<String, NormalizedAnswer>,
    /// Whole-record identifiers per selected system.
    pub pmids: BTreeMap<String, Vec<String>>,
}

/// Search response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResponse {
    pub results: Vec<TopicRow>,
    pub count: usize,
    /// Systems actually used for this response, in configured order.
    pub systems: Vec<String>,
}

/// Known systems and their descriptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemsResponse {
    pub systems: Vec<String>,
    pub descriptions: BTreeMap<String, String>,
}

/// Read-only index over topics, system answers, and descriptions.
#[derive(Debug, Clone, Default)]
pub struct ViewerIndex {
    topics: TopicIndex,
    systems: Vec<String>,
    corpora: HashMap<String, SystemCorpus>,
    descriptions: BTreeMap<String, String>,
    empty_query: EmptyQueryPolicy,
}

impl ViewerIndex {
    /// Reads the catalog, every system corpus, and the descriptions from the data directory.
    ///
    /// Missing files are tolerated and produce empty data.
    #[must_use]
    #[instrument(skip(options), fields(data_dir = %options.data_dir.display()))]
    pub fn load(options: &IndexOptions) -> Self {
        let topics = load_topics_file(&options.data_dir.join(TOPICS_FILE));
        let corpora = options
            .systems
            .iter()
            .map(|source| {
                let corpus =
                    load_system_file(&options.data_dir.join(&source.file), options.duplicates);
                (source.name.clone(), corpus)
            })
            .collect();
        let descriptions = load_descriptions_file(&options.data_dir.join(DESCRIPTIONS_FILE));

        let index = Self::from_parts(topics, corpora, descriptions, options.empty_query);
        info!(
            topics = index.topics.len(),
            systems = index.systems.len(),
            "Viewer index ready"
        );
        index
    }

    /// Builds an index from already-loaded parts.
    ///
    /// `corpora` order defines the system order; a repeated name keeps its
    /// first corpus.
    #[must_use]
    pub fn from_parts(
        topics: TopicIndex,
        corpora: Vec<(String, SystemCorpus)>,
        descriptions: BTreeMap<String, String>,
        empty_query: EmptyQueryPolicy,
    ) -> Self {
        let mut systems = Vec::new();
        let mut by_name = HashMap::new();
        for (name, corpus) in corpora {
            if by_name.contains_key(&name) {
                continue;
            }
            systems.push(name.clone());
            by_name.insert(name, corpus);
        }
        Self {
            topics,
            systems,
            corpora: by_name,
            descriptions,
            empty_query,
        }
    }

    /// The topic catalog.
    #[must_use]
    pub fn topics(&self) -> &TopicIndex {
        &self.topics
    }

    /// System names in configured order.
    #[must_use]
    pub fn system_names(&self) -> &[String] {
        &self.systems
    }

    /// The corpus loaded for `system`.
    #[must_use]
    pub fn corpus(&self, system: &str) -> Option<&SystemCorpus> {
        self.corpora.get(system)
    }

    /// Resolves a comma-separated system selection.
    ///
    /// Names are trimmed, unknown names dropped, and repeats removed. An empty
    /// or fully-unknown selection falls back to every known system.
    #[must_use]
    pub fn resolve_systems(&self, selection: Option<&str>) -> Vec<String> {
        let mut selected: Vec<String> = Vec::new();
        for name in selection.unwrap_or_default().split(',').map(str::trim) {
            if name.is_empty() || !self.corpora.contains_key(name) {
                continue;
            }
            if !selected.iter().any(|s| s == name) {
                selected.push(name.to_string());
            }
        }
        if selected.is_empty() {
            return self.systems.clone();
        }
        selected
    }

    /// Runs a topic search and attaches every selected system's answer.
    #[must_use]
    #[instrument(skip(self))]
    pub fn search(&self, query: &str, systems: Option<&str>) -> SearchResponse {
        let systems = self.resolve_systems(systems);
        let results: Vec<TopicRow> = search(&self.topics, query, self.empty_query)
            .into_iter()
            .map(|topic| self.row(topic, &systems))
            .collect();
        SearchResponse {
            count: results.len(),
            results,
            systems,
        }
    }

    /// Lists systems with their descriptions.
    #[must_use]
    pub fn systems_overview(&self) -> SystemsResponse {
        SystemsResponse {
            systems: self.systems.clone(),
            descriptions: self.descriptions.clone(),
        }
    }

    fn row(&self, topic: &Topic, systems: &[String]) -> TopicRow {
        let mut answers = BTreeMap::new();
        let mut pmids = BTreeMap::new();
        for system in systems {
            let corpus = self.corpora.get(system);
            let answer = corpus
                .and_then(|c| c.answer(topic.id))
                .cloned()
                .unwrap_or_default();
            let ids = corpus
                .map(|c| c.record_identifiers(topic.id).to_vec())
                .unwrap_or_default();
            answers.insert(system.clone(), answer);
            pmids.insert(system.clone(), ids);
        }
        TopicRow {
            id: topic.id,
            question: topic.question.clone(),
            topic: topic.topic.clone(),
            narrative: topic.narrative.clone(),
            answers,
            pmids,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::corpus::load_system_str;
    use crate::descriptions::default_descriptions;
    use crate::topics::load_topics;

    fn index(policy: EmptyQueryPolicy) -> ViewerIndex {
        let topics = load_topics(
            r#"[
                {"id": 2, "question": "Type 2 diabetes and metformin", "topic": "diabetes"},
                {"id": 1, "question": "Asthma inhalers", "topic": "respiratory"}
            ]"#,
        );
        let system_a = load_system_str(
            concat!(
                r#"{"id": 2, "responses": [{"text": "Metformin is first-line.", "citations": ["12345678"]}]}"#,
                "\n",
                r#"{"id": 1, "answer": "Use inhalers. Follow up. (PMID: 7654321)"}"#,
                "\n"
            ),
            DuplicatePolicy::Replace,
        );
        let system_b = load_system_str(r#"{"qid": "1", "text": "Steroids help."}"#, DuplicatePolicy::Replace);
        ViewerIndex::from_parts(
            topics,
            vec![("System A".into(), system_a), ("System B".into(), system_b)],
            default_descriptions(),
            policy,
        )
    }

    #[test]
    fn test_resolve_systems_filters_unknown_and_falls_back() {
        let index = index(EmptyQueryPolicy::All);
        assert_eq!(index.resolve_systems(Some(" System B , Nope")), vec!["System B"]);
        assert_eq!(index.resolve_systems(Some("Nope,Other")), vec!["System A", "System B"]);
        assert_eq!(index.resolve_systems(Some("  ")), vec!["System A", "System B"]);
        assert_eq!(index.resolve_systems(None), vec!["System A", "System B"]);
        assert_eq!(
            index.resolve_systems(Some("System B,System A,System B")),
            vec!["System B", "System A"]
        );
    }

    #[test]
    fn test_search_attaches_answers_for_selected_systems() {
        let index = index(EmptyQueryPolicy::All);
        let response = index.search("diabetes", None);
        assert_eq!(response.count, 1);
        let row = &response.results[0];
        assert_eq!(row.id, 2);
        assert_eq!(row.answers["System A"].identifiers_all, vec!["12345678"]);
        assert!(row.answers["System B"].is_empty(), "missing answer is empty, not absent");
        assert!(row.pmids["System B"].is_empty());
    }

    #[test]
    fn test_search_exposes_record_level_pmids_for_flat_answers() {
        let index = index(EmptyQueryPolicy::All);
        let response = index.search("asthma", Some("System A"));
        assert_eq!(response.systems, vec!["System A"]);
        let row = &response.results[0];
        assert!(row.answers["System A"].identifiers_all.is_empty());
        assert_eq!(row.pmids["System A"], vec!["7654321"]);
        assert!(!row.answers.contains_key("System B"));
    }

    #[test]
    fn test_search_empty_query_follows_policy() {
        let all = index(EmptyQueryPolicy::All).search("", None);
        assert_eq!(all.results.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(all.count, 2);

        let none = index(EmptyQueryPolicy::None).search("", None);
        assert_eq!(none.count, 0);
        assert_eq!(none.systems, vec!["System A", "System B"]);
    }

    #[test]
    fn test_systems_overview_lists_configured_systems() {
        let overview = index(EmptyQueryPolicy::All).systems_overview();
        assert_eq!(overview.systems, vec!["System A", "System B"]);
        assert!(overview.descriptions.contains_key("System E"));
    }

    #[test]
    fn test_from_parts_keeps_first_duplicate_system() {
        let index = ViewerIndex::from_parts(
            TopicIndex::new(),
            vec![
                ("X".into(), load_system_str(r#"{"id": 1, "answer": "first"}"#, DuplicatePolicy::Replace)),
                ("X".into(), SystemCorpus::default()),
            ],
            BTreeMap::new(),
            EmptyQueryPolicy::All,
        );
        assert_eq!(index.system_names(), ["X"]);
        assert_eq!(index.corpus("X").unwrap().len(), 1);
    }

    #[test]
    fn test_system_source_from_str() {
        let source: SystemSource = "System F = System_F_output.jsonl".parse().unwrap();
        assert_eq!(source, SystemSource::new("System F", "System_F_output.jsonl"));
        assert!("no-separator".parse::<SystemSource>().is_err());
        assert!("=file.jsonl".parse::<SystemSource>().is_err());
        assert!("A,B=file.jsonl".parse::<SystemSource>().is_err());
    }

    #[test]
    fn test_default_systems_map_to_output_files() {
        let systems = default_systems();
        assert_eq!(systems.len(), 5);
        assert_eq!(systems[2], SystemSource::new("System C", "System_C_output.jsonl"));
    }
}
