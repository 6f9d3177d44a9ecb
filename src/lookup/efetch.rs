//! Article records from `efetch` XML.
//!
//! The document is streamed with `quick-xml`; only the handful of fields the
//! viewer shows are collected. Inline markup inside titles and abstracts is
//! flattened to its text, and entity references (named and numeric) are
//! decoded. Fields that are absent come back empty.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, warn};

use crate::utils::extract_year_from_str;

use super::{Article, article_url};

/// A field whose element text is being collected.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Field {
    Pmid,
    Title,
    Journal,
    Year,
    MedlineDate,
    Doi,
    /// One `AbstractText` section with its optional `Label`.
    Abstract(Option<String>),
}

#[derive(Debug)]
struct Capture {
    field: Field,
    /// Element depth at which the capture started.
    depth: usize,
    text: String,
}

#[derive(Debug, Default)]
struct ArticleBuilder {
    pmid: String,
    title: String,
    journal: String,
    year: String,
    medline_year: String,
    doi: String,
    abstract_parts: Vec<String>,
}

impl ArticleBuilder {
    /// Stores captured text. The first occurrence of a scalar field wins.
    fn set(&mut self, field: Field, text: &str) {
        let text = text.trim();
        let fill = |slot: &mut String, value: &str| {
            if slot.is_empty() {
                *slot = value.to_string();
            }
        };
        match field {
            Field::Pmid if text.bytes().all(|b| b.is_ascii_digit()) => fill(&mut self.pmid, text),
            Field::Pmid => {}
            Field::Title => fill(&mut self.title, text),
            Field::Journal => fill(&mut self.journal, text),
            Field::Year => fill(&mut self.year, text),
            Field::MedlineDate => fill(&mut self.medline_year, &extract_year_from_str(text)),
            Field::Doi => fill(&mut self.doi, text),
            Field::Abstract(Some(label)) => self.abstract_parts.push(format!("{label}: {text}")),
            Field::Abstract(None) => self.abstract_parts.push(text.to_string()),
        }
    }

    fn into_article(self) -> Article {
        let url = if self.pmid.is_empty() {
            String::new()
        } else {
            article_url(&self.pmid)
        };
        Article {
            url,
            title: self.title,
            journal: self.journal,
            year: if self.year.is_empty() {
                self.medline_year
            } else {
                self.year
            },
            doi: self.doi,
            abstract_text: self.abstract_parts.join("\n\n"),
            pmid: self.pmid,
        }
    }
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key)
        .and_then(|a| a.unescape_value().ok())
        .map(std::borrow::Cow::into_owned)
}

fn field_for(name: &str, parent: Option<&str>, e: &BytesStart<'_>) -> Option<Field> {
    match (name, parent) {
        ("PMID", _) => Some(Field::Pmid),
        ("ArticleTitle", _) => Some(Field::Title),
        ("Title", Some("Journal")) => Some(Field::Journal),
        ("Year", Some("PubDate")) => Some(Field::Year),
        ("MedlineDate", Some("PubDate")) => Some(Field::MedlineDate),
        ("ELocationID", _) => attribute(e, b"EIdType")
            .filter(|kind| kind == "doi")
            .map(|_| Field::Doi),
        ("AbstractText", _) => Some(Field::Abstract(
            attribute(e, b"Label").filter(|label| !label.trim().is_empty()),
        )),
        _ => None,
    }
}

/// Parses every `PubmedArticle` in an `efetch` response.
///
/// Malformed XML stops the parse; articles completed before the error are kept.
#[must_use]
pub fn parse_articles(xml: &str) -> Vec<Article> {
    let mut reader = Reader::from_str(xml);
    let mut articles = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    let mut current: Option<ArticleBuilder> = None;
    let mut capture: Option<Capture> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if name == "PubmedArticle" {
                    current = Some(ArticleBuilder::default());
                }
                if current.is_some()
                    && capture.is_none()
                    && let Some(field) = field_for(&name, stack.last().map(String::as_str), &e)
                {
                    capture = Some(Capture {
                        field,
                        depth: stack.len(),
                        text: String::new(),
                    });
                }
                stack.push(name);
            }
            Ok(Event::End(_)) => {
                let name = stack.pop().unwrap_or_default();
                if capture.as_ref().is_some_and(|c| c.depth == stack.len())
                    && let (Some(done), Some(article)) = (capture.take(), current.as_mut())
                {
                    article.set(done.field, &done.text);
                }
                if name == "PubmedArticle"
                    && let Some(article) = current.take()
                {
                    articles.push(article.into_article());
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(c) = capture.as_mut() {
                    match t.unescape() {
                        Ok(text) => c.text.push_str(&text),
                        Err(error) => {
                            debug!(error = %error, "Keeping undecodable efetch text as-is");
                            c.text.push_str(&String::from_utf8_lossy(&t));
                        }
                    }
                }
            }
            Ok(Event::CData(t)) => {
                if let Some(c) = capture.as_mut() {
                    c.text.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Ok(Event::Eof) => break,
            Err(error) => {
                warn!(
                    error = %error,
                    parsed = articles.len(),
                    "efetch XML is malformed; keeping articles parsed so far"
                );
                break;
            }
            Ok(_) => {}
        }
    }
    articles
}
