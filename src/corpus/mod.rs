//! Per-system answer corpora.
//!
//! Each QA system contributes one newline-delimited JSON file with one record
//! per line. This module turns such a file into a map of canonical answers
//! keyed by topic, plus the record-level identifiers cited for each topic.
//!
//! Loading never fails: unreadable files become empty corpora and malformed
//! lines are skipped individually.

mod extractor;
mod normalizer;
mod record;

pub use extractor::{
    MAX_IDENTIFIER_DIGITS, MIN_IDENTIFIER_DIGITS, extract_identifiers, identifier_from_value,
    is_valid_identifier,
};
pub use normalizer::{
    CONCATENATION_SEPARATOR, MAX_ANSWER_IDENTIFIERS, MAX_SENTENCE_IDENTIFIERS, NormalizedAnswer,
    ParsedLine, Sentence, normalize, normalize_shape, parse_line, parse_record_line,
    split_sentences,
};
pub use record::{AnswerShape, RawRecord, ResponseEntry, parse_topic_id, resolve_topic_id};

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use tracing::{debug, info, instrument, warn};

use extractor::IdentifierSet;

/// What to do when a topic appears in more than one record of the same file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// The later record's answer replaces the earlier one.
    #[default]
    Replace,
    /// Texts are joined with `"\n• "` and sentence lists appended.
    Concatenate,
}

impl DuplicatePolicy {
    /// Returns the stable label used in config files and CLI flags.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Concatenate => "concatenate",
        }
    }
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(Self::Replace),
            "concatenate" | "concat" => Ok(Self::Concatenate),
            other => Err(format!(
                "unknown duplicate policy '{other}' (expected 'replace' or 'concatenate')"
            )),
        }
    }
}

/// Line-level counters for one corpus load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Non-blank lines read.
    pub lines: usize,
    /// Lines with a resolvable topic, including ones that only carry identifiers.
    pub records: usize,
    /// Lines dropped (malformed JSON or unresolvable topic).
    pub dropped: usize,
}

/// Everything loaded from one system's corpus.
#[derive(Debug, Clone, Default)]
pub struct SystemCorpus {
    answers: HashMap<u64, NormalizedAnswer>,
    record_identifiers: HashMap<u64, Vec<String>>,
    stats: LoadStats,
}

impl SystemCorpus {
    /// Returns the canonical answer for `topic_id`, if the system answered it.
    #[must_use]
    pub fn answer(&self, topic_id: u64) -> Option<&NormalizedAnswer> {
        self.answers.get(&topic_id)
    }

    /// Returns the whole-record identifiers cited for `topic_id` (empty if none).
    #[must_use]
    pub fn record_identifiers(&self, topic_id: u64) -> &[String] {
        self.record_identifiers
            .get(&topic_id)
            .map_or(&[], Vec::as_slice)
    }

    /// Number of topics with an answer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    /// Returns true when no answers were loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Line counters from the load.
    #[must_use]
    pub fn stats(&self) -> LoadStats {
        self.stats
    }
}

/// Accumulates records into a [`SystemCorpus`].
#[derive(Debug, Default)]
struct CorpusBuilder {
    policy: DuplicatePolicy,
    answers: HashMap<u64, NormalizedAnswer>,
    identifiers: HashMap<u64, IdentifierSet>,
    stats: LoadStats,
}

impl CorpusBuilder {
    fn new(policy: DuplicatePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    fn push_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        self.stats.lines += 1;

        let (topic_id, answer, identifiers) = match parse_line(line) {
            ParsedLine::Record {
                topic_id,
                answer,
                identifiers,
            } => (topic_id, answer, identifiers),
            ParsedLine::NoTopicId => {
                debug!(line = self.stats.lines, "Skipping record without a resolvable topic id");
                self.stats.dropped += 1;
                return;
            }
            ParsedLine::Malformed(error) => {
                debug!(line = self.stats.lines, error = %error, "Skipping malformed corpus line");
                self.stats.dropped += 1;
                return;
            }
        };
        self.stats.records += 1;

        let ids = self.identifiers.entry(topic_id).or_default();
        for id in identifiers {
            if ids.len() >= MAX_ANSWER_IDENTIFIERS {
                break;
            }
            ids.insert(id);
        }

        // A record without answer text only contributes identifiers.
        if answer.is_empty() {
            return;
        }

        match self.policy {
            DuplicatePolicy::Replace => {
                self.answers.insert(topic_id, answer);
            }
            DuplicatePolicy::Concatenate => {
                let merged = match self.answers.remove(&topic_id) {
                    Some(previous) => previous.concatenate(answer),
                    None => answer,
                };
                self.answers.insert(topic_id, merged);
            }
        }
    }

    fn finish(self) -> SystemCorpus {
        SystemCorpus {
            answers: self.answers,
            record_identifiers: self
                .identifiers
                .into_iter()
                .filter(|(_, ids)| !ids.is_empty())
                .map(|(topic_id, ids)| (topic_id, ids.into_vec()))
                .collect(),
            stats: self.stats,
        }
    }
}

/// Loads a corpus from any buffered reader.
///
/// Blank lines are skipped, invalid UTF-8 is replaced lossily, and an I/O
/// error ends the load while keeping every record read before it.
#[instrument(skip(reader))]
pub fn load_system<R: BufRead>(mut reader: R, policy: DuplicatePolicy) -> SystemCorpus {
    let mut builder = CorpusBuilder::new(policy);
    let mut buffer = Vec::new();
    loop {
        buffer.clear();
        match reader.read_until(b'\n', &mut buffer) {
            Ok(0) => break,
            Ok(_) => builder.push_line(&String::from_utf8_lossy(&buffer)),
            Err(error) => {
                warn!(error = %error, "Corpus read interrupted; keeping records loaded so far");
                break;
            }
        }
    }
    builder.finish()
}

/// Loads a corpus from a string.
#[must_use]
pub fn load_system_str(content: &str, policy: DuplicatePolicy) -> SystemCorpus {
    load_system(content.as_bytes(), policy)
}

/// Loads a corpus file. A missing or unreadable file yields an empty corpus.
#[instrument(fields(path = %path.display()))]
pub fn load_system_file(path: &Path, policy: DuplicatePolicy) -> SystemCorpus {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(error) => {
            warn!(error = %error, "Corpus file unreadable; treating as empty");
            return SystemCorpus::default();
        }
    };
    let corpus = load_system(BufReader::new(file), policy);
    let stats = corpus.stats();
    info!(
        topics = corpus.len(),
        lines = stats.lines,
        dropped = stats.dropped,
        "Loaded system corpus"
    );
    corpus
}
