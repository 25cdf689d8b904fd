//! Card list and keyword list parsing
//!
//! Supported card lists:
//! - MTGJSON atomic files: `{"data": {"<card name>": [{..., "foreignData": [...]}]}}`
//! - a JSON array of `{"name": "..."}` objects
//! - plain text with one `name$weight` entry per line (the weight is ignored)
//!
//! Supported keyword lists:
//! - MTGJSON `Keywords.json`: `{"data": {"abilityWords": [...], ...}}`
//! - a JSON array of strings
//! - plain text with one keyword per line

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Failure to build a dictionary from its source.
///
/// This is the only error that aborts recognizer construction: matching
/// cannot work without a vocabulary.
#[derive(Error, Debug)]
pub enum VocabularyError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("No usable entries in {path}")]
    Empty { path: String },
}

/// Source file encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Text,
}

impl SourceFormat {
    /// Pick the format from the file extension, else from the first non-space byte
    pub fn detect(path: &Path, content: &str) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SourceFormat::Json,
            Some(ext) if ext.eq_ignore_ascii_case("txt") => SourceFormat::Text,
            _ => match content.trim_start().chars().next() {
                Some('{') | Some('[') => SourceFormat::Json,
                _ => SourceFormat::Text,
            },
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CardListJson {
    Atomic { data: BTreeMap<String, Vec<AtomicCard>> },
    Named(Vec<NamedCard>),
}

#[derive(Deserialize)]
struct AtomicCard {
    #[serde(default, rename = "foreignData")]
    foreign_data: Vec<ForeignName>,
}

#[derive(Deserialize)]
struct ForeignName {
    name: String,
    #[serde(default)]
    language: String,
}

#[derive(Deserialize)]
struct NamedCard {
    name: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum KeywordListJson {
    Grouped { data: BTreeMap<String, Vec<String>> },
    Plain(Vec<String>),
}

/// Parse a JSON card list into `(alias, canonical)` pairs.
///
/// Foreign names are added as aliases of the English name for every
/// language listed in `languages` (e.g. `"French"`).
pub fn parse_card_json(content: &str, languages: &[String]) -> Result<Vec<(String, String)>, serde_json::Error> {
    let parsed: CardListJson = serde_json::from_str(content)?;

    let entries = match parsed {
        CardListJson::Atomic { data } => {
            let mut entries = Vec::with_capacity(data.len());
            for (name, printings) in data {
                entries.push((name.clone(), name.clone()));
                for foreign in printings.iter().flat_map(|p| &p.foreign_data) {
                    if languages.iter().any(|l| l.eq_ignore_ascii_case(&foreign.language)) {
                        entries.push((foreign.name.clone(), name.clone()));
                    }
                }
            }
            entries
        }
        CardListJson::Named(cards) => cards
            .into_iter()
            .map(|card| (card.name.clone(), card.name))
            .collect(),
    };

    Ok(entries)
}

/// Parse the `name$weight` text format
pub fn parse_card_text(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .filter_map(|line| {
            let name = line.split('$').next().unwrap_or_default().trim();
            (!name.is_empty()).then(|| (name.to_string(), name.to_string()))
        })
        .collect()
}

/// Parse a JSON keyword list
pub fn parse_keyword_json(content: &str) -> Result<Vec<String>, serde_json::Error> {
    let parsed: KeywordListJson = serde_json::from_str(content)?;
    Ok(match parsed {
        KeywordListJson::Grouped { data } => {
            for (group, words) in &data {
                debug!("Keyword group {}: {} entries", group, words.len());
            }
            data.into_values().flatten().collect()
        }
        KeywordListJson::Plain(words) => words,
    })
}

/// Parse a keyword list with one keyword per line
pub fn parse_keyword_text(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn read_source(path: &Path) -> Result<String, VocabularyError> {
    std::fs::read_to_string(path).map_err(|source| VocabularyError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Read a card list file into `(alias, canonical)` pairs
pub fn load_card_entries(path: &Path, languages: &[String]) -> Result<Vec<(String, String)>, VocabularyError> {
    let content = read_source(path)?;
    let entries = match SourceFormat::detect(path, &content) {
        SourceFormat::Json => parse_card_json(&content, languages).map_err(|source| VocabularyError::Json {
            path: path.display().to_string(),
            source,
        })?,
        SourceFormat::Text => parse_card_text(&content),
    };

    if entries.is_empty() {
        return Err(VocabularyError::Empty {
            path: path.display().to_string(),
        });
    }
    Ok(entries)
}

/// Read a keyword list file
pub fn load_keywords(path: &Path) -> Result<Vec<String>, VocabularyError> {
    let content = read_source(path)?;
    let keywords = match SourceFormat::detect(path, &content) {
        SourceFormat::Json => parse_keyword_json(&content).map_err(|source| VocabularyError::Json {
            path: path.display().to_string(),
            source,
        })?,
        SourceFormat::Text => parse_keyword_text(&content),
    };

    if keywords.is_empty() {
        return Err(VocabularyError::Empty {
            path: path.display().to_string(),
        });
    }
    Ok(keywords)
}
