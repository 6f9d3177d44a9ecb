//! Biogen Viewer Core Library
//!
//! Data layer for comparing the answers several question-answering systems
//! gave to the same benchmark topics. Per-system answer files arrive in
//! inconsistent shapes; this crate normalizes them into one canonical answer
//! per topic and system, indexes the topic catalog for search, and looks up
//! supporting literature in `PubMed`.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`corpus`] - Identifier extraction, answer normalization, per-system loading
//! - [`topics`] - Topic catalog and token search
//! - [`index`] - The immutable [`ViewerIndex`] shared by every query
//! - [`descriptions`] - Human-readable system descriptions
//! - [`lookup`] - `PubMed` E-utilities client behind [`BibliographicLookup`]
//! - [`config`] - Config file and environment loading
//! - [`server`] - JSON HTTP API

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod corpus;
pub mod descriptions;
pub mod index;
pub mod lookup;
pub mod server;
pub mod topics;
mod user_agent;
mod utils;

// Re-export commonly used types
pub use corpus::{DuplicatePolicy, NormalizedAnswer, Sentence, SystemCorpus, extract_identifiers, normalize};
pub use index::{IndexOptions, SearchResponse, SystemSource, SystemsResponse, TopicRow, ViewerIndex};
pub use lookup::{
    Article, BibliographicLookup, Citation, CiteResponse, FetchResponse, InputError, LookupError,
    LookupSettings, PubMedClient,
};
pub use topics::{EmptyQueryPolicy, Topic, TopicIndex};
