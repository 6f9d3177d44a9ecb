//! Integration tests for building the viewer index from a data directory.

use std::fs;
use std::path::Path;

use biogen_core::corpus::DuplicatePolicy;
use biogen_core::index::{IndexOptions, SystemSource, ViewerIndex, default_systems};
use biogen_core::topics::EmptyQueryPolicy;
use tempfile::TempDir;

const TOPICS: &str = r#"[
    {"id": 1, "question": "Is metformin first-line for type 2 diabetes?", "topic": "diabetes", "narrative": "Adults only"},
    {"id": "2", "question": "How are asthma exacerbations treated?", "topic": "respiratory"},
    {"question": "No id, dropped"}
]"#;

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

fn data_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "task_b.json", TOPICS);
    write(
        dir.path(),
        "System_A_output.jsonl",
        concat!(
            r#"{"metadata": {"topic_id": "1"}, "responses": [{"text": "Metformin is first-line.", "citations": ["31415926", {"pmid": "27182818"}]}], "pmids": ["11111111"]}"#,
            "\n",
            "not json at all\n",
            "\n",
            r#"{"qid": "2", "answer": "Use inhaled steroids. 2 puffs daily.", "references": [{"pmid": 22222222}, "33333333"]}"#,
            "\n",
            r#"{"id": 1, "text": "Metformin remains first-line.", "evidence": [{"PMID": "44444444"}]}"#,
            "\n",
        ),
    );
    write(
        dir.path(),
        "System_B_output.jsonl",
        r#"{"topic_id": 2, "text": "Short-acting beta agonists (PMID: 55555555)."}"#,
    );
    write(
        dir.path(),
        "system_descriptions.json",
        r#"{"System B": "Dense retrieval + reranker.", "System Z": "Unlisted", "System C": 7}"#,
    );
    dir
}

fn options(dir: &TempDir) -> IndexOptions {
    IndexOptions {
        data_dir: dir.path().to_path_buf(),
        ..IndexOptions::default()
    }
}

#[test]
fn test_load_reads_catalog_corpora_and_descriptions() {
    let dir = data_dir();
    let index = ViewerIndex::load(&options(&dir));

    assert_eq!(index.topics().len(), 2);
    assert_eq!(
        index.system_names(),
        ["System A", "System B", "System C", "System D", "System E"]
    );

    let system_a = index.corpus("System A").unwrap();
    assert_eq!(system_a.len(), 2);
    let stats = system_a.stats();
    assert_eq!(stats.lines, 4, "blank lines are not counted");
    assert_eq!(stats.records, 3);
    assert_eq!(stats.dropped, 1);

    assert!(index.corpus("System C").unwrap().is_empty());

    let overview = index.systems_overview();
    assert_eq!(overview.descriptions["System B"], "Dense retrieval + reranker.");
    assert_eq!(overview.descriptions["System Z"], "Unlisted");
    assert_eq!(
        overview.descriptions["System C"],
        "BM25 + reformulations; MedCPT bi-encoder + cross-encoder rerank."
    );
}

#[test]
fn test_later_record_replaces_answer_but_identifiers_accumulate() {
    let dir = data_dir();
    let index = ViewerIndex::load(&options(&dir));

    let response = index.search("metformin", Some("System A"));
    assert_eq!(response.count, 1);
    let row = &response.results[0];
    assert_eq!(row.id, 1);
    assert_eq!(row.narrative, "Adults only");

    let answer = &row.answers["System A"];
    assert_eq!(answer.text, "Metformin remains first-line.");
    assert!(answer.identifiers_all.is_empty());
    assert_eq!(row.pmids["System A"], vec!["11111111", "44444444"]);
}

#[test]
fn test_concatenate_policy_merges_duplicate_topics() {
    let dir = data_dir();
    let index = ViewerIndex::load(&IndexOptions {
        duplicates: DuplicatePolicy::Concatenate,
        ..options(&dir)
    });

    let response = index.search("1", Some("System A"));
    let row = response.results.iter().find(|r| r.id == 1).unwrap();
    let answer = &row.answers["System A"];
    assert_eq!(
        answer.text,
        "Metformin is first-line.\n• Metformin remains first-line."
    );
    assert_eq!(answer.sentences.len(), 2);
    assert_eq!(answer.identifiers_all, vec!["31415926", "27182818"]);
}

#[test]
fn test_missing_system_files_give_empty_answers() {
    let dir = data_dir();
    let index = ViewerIndex::load(&options(&dir));

    let response = index.search("asthma", None);
    assert_eq!(response.count, 1);
    let row = &response.results[0];
    assert_eq!(row.answers.len(), 5);

    let system_a = &row.answers["System A"];
    assert_eq!(system_a.sentences.len(), 2);
    assert_eq!(system_a.sentences[1].text, "2 puffs daily.");
    assert_eq!(row.pmids["System A"], vec!["22222222", "33333333"]);

    assert_eq!(row.pmids["System B"], vec!["55555555"]);
    assert!(row.answers["System E"].is_empty());
    assert!(row.pmids["System E"].is_empty());
}

#[test]
fn test_custom_system_list_and_empty_query_policy() {
    let dir = data_dir();
    let index = ViewerIndex::load(&IndexOptions {
        systems: vec![SystemSource::new("Beta", "System_B_output.jsonl")],
        empty_query: EmptyQueryPolicy::None,
        ..options(&dir)
    });

    assert_eq!(index.system_names(), ["Beta"]);
    assert_eq!(index.search("   ", None).count, 0);

    let response = index.search("ASTHMA", Some("System A"));
    assert_eq!(response.systems, vec!["Beta"], "unknown selection falls back");
    assert_eq!(response.results[0].pmids["Beta"], vec!["55555555"]);
}

#[test]
fn test_empty_data_dir_yields_empty_index() {
    let dir = TempDir::new().unwrap();
    let index = ViewerIndex::load(&options(&dir));

    assert!(index.topics().is_empty());
    assert_eq!(index.system_names().len(), default_systems().len());
    assert_eq!(index.search("", None).count, 0);
    assert_eq!(index.systems_overview().descriptions.len(), 5);
}
