//! Card-name and keyword dictionaries
//!
//! Both dictionaries share [`Lexicon`]: normalized terms kept in insertion
//! order and bucketed by character count, so a bounded search only visits
//! terms whose length is within the edit budget of the query.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info};

use super::distance::bounded_levenshtein;
use super::normalize::{clean, normalize, NormalizeMode};
use super::sources::{self, VocabularyError};

/// UI labels that show up on decklist screenshots and are never card names
pub const DEFAULT_UI_LABELS: &[&str] = &[
    "Deck",
    "Decks",
    "Sideboard",
    "Main Deck",
    "Maindeck",
    "Mainboard",
    "Companion",
    "Commander",
    "Land",
    "Lands",
    "Creature",
    "Creatures",
    "Instant",
    "Instants",
    "Sorcery",
    "Sorceries",
    "Enchantment",
    "Enchantments",
    "Artifact",
    "Artifacts",
    "Planeswalker",
    "Planeswalkers",
    "Search",
    "Done",
    "Cards",
    "Craft",
    "Collection",
];

/// A term found by a bounded search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermMatch {
    /// Insertion index of the term
    pub index: usize,
    /// Edit distance between the query and the term
    pub distance: usize,
}

impl TermMatch {
    /// Lower distance wins, then earlier insertion
    fn beats(&self, other: &TermMatch) -> bool {
        (self.distance, self.index) < (other.distance, other.index)
    }
}

/// Normalized terms with exact and bounded-distance lookup
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    terms: Vec<String>,
    chars: Vec<Vec<char>>,
    positions: HashMap<String, usize>,
    by_len: BTreeMap<usize, Vec<usize>>,
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a normalized term and return its index.
    /// An already known term keeps its original index.
    pub fn insert(&mut self, term: String) -> usize {
        if let Some(&index) = self.positions.get(&term) {
            return index;
        }

        let index = self.terms.len();
        let chars: Vec<char> = term.chars().collect();
        self.by_len.entry(chars.len()).or_default().push(index);
        self.positions.insert(term.clone(), index);
        self.terms.push(term);
        self.chars.push(chars);
        index
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.positions.contains_key(term)
    }

    pub fn position(&self, term: &str) -> Option<usize> {
        self.positions.get(term).copied()
    }

    pub fn term(&self, index: usize) -> Option<&str> {
        self.terms.get(index).map(String::as_str)
    }

    /// Terms in insertion order
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }

    /// Closest term within `max_distance` edits of `query`.
    ///
    /// Ties go to the earliest inserted term.
    pub fn nearest(&self, query: &[char], max_distance: usize) -> Option<TermMatch> {
        let min_len = query.len().saturating_sub(max_distance);
        let max_len = query.len() + max_distance;
        let mut best: Option<TermMatch> = None;

        for indices in self.by_len.range(min_len..=max_len).map(|(_, v)| v) {
            for &index in indices {
                let budget = best.map_or(max_distance, |b| b.distance);
                let Some(distance) = bounded_levenshtein(query, &self.chars[index], budget) else {
                    continue;
                };
                let candidate = TermMatch { index, distance };
                if best.map_or(true, |b| candidate.beats(&b)) {
                    best = Some(candidate);
                }
            }
        }

        best
    }

    /// Term whose first `prefix.len()` characters are closest to `prefix`.
    ///
    /// Scans every term. A term is kept only when its distance is strictly
    /// below the current budget, which then shrinks to that distance.
    pub fn closest_prefix(&self, prefix: &[char], mut budget: usize) -> Option<TermMatch> {
        let mut best = None;

        for (index, chars) in self.chars.iter().enumerate() {
            if budget == 0 {
                break;
            }
            let head = &chars[..prefix.len().min(chars.len())];
            if let Some(distance) = bounded_levenshtein(prefix, head, budget - 1) {
                best = Some(TermMatch { index, distance });
                budget = distance;
            }
        }

        best
    }
}

/// Normalized card name -> canonical card name
#[derive(Debug, Clone, Default)]
pub struct VocabularyIndex {
    lexicon: Lexicon,
    canonical: Vec<String>,
}

impl VocabularyIndex {
    /// Normalize raw text the same way index keys are normalized
    pub fn normalize(raw: &str) -> String {
        normalize(raw, NormalizeMode::CardName)
    }

    /// Query form of raw text: normalized like a key but not length-bounded
    pub fn query(raw: &str) -> String {
        clean(raw, NormalizeMode::CardName)
    }

    /// Build from canonical card names
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_entries(names.into_iter().map(|name| {
            let name = name.as_ref().to_string();
            (name.clone(), name)
        }))
    }

    /// Build from `(alias, canonical)` pairs.
    ///
    /// Aliases are normalized into keys. When two entries normalize to the
    /// same key the last canonical name wins.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut index = Self::default();
        for (alias, canonical) in entries {
            index.insert(&alias, canonical);
        }
        index
    }

    /// Load a card list file, see [`sources::load_card_entries`]
    pub fn load(path: &Path, languages: &[String]) -> Result<Self, VocabularyError> {
        let entries = sources::load_card_entries(path, languages)?;
        let index = Self::from_entries(entries);
        if index.is_empty() {
            return Err(VocabularyError::Empty {
                path: path.display().to_string(),
            });
        }
        info!("Loaded {} card names from {:?}", index.len(), path);
        Ok(index)
    }

    fn insert(&mut self, alias: &str, canonical: String) {
        let key = Self::normalize(alias);
        if key.is_empty() {
            return;
        }

        let index = self.lexicon.insert(key);
        if index == self.canonical.len() {
            self.canonical.push(canonical);
        } else if self.canonical[index] != canonical {
            debug!(
                "Key collision on {:?}: {:?} replaces {:?}",
                alias, canonical, self.canonical[index]
            );
            self.canonical[index] = canonical;
        }
    }

    /// Canonical name for a normalized key
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.lexicon
            .position(key)
            .map(|index| self.canonical[index].as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lexicon.contains(key)
    }

    /// All normalized keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.lexicon.terms()
    }

    pub fn len(&self) -> usize {
        self.lexicon.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lexicon.is_empty()
    }

    pub(crate) fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Canonical name stored at a lexicon index
    pub(crate) fn canonical_at(&self, index: usize) -> &str {
        &self.canonical[index]
    }
}

/// Non-card vocabulary used only to reject fragments
#[derive(Debug, Clone, Default)]
pub struct KeywordIndex {
    lexicon: Lexicon,
}

impl KeywordIndex {
    /// Normalize raw text the same way keywords are normalized
    pub fn normalize(raw: &str) -> String {
        normalize(raw, NormalizeMode::Light)
    }

    /// Build from keyword strings only
    pub fn from_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lexicon = Lexicon::new();
        for keyword in keywords {
            let key = Self::normalize(keyword.as_ref());
            if !key.is_empty() {
                lexicon.insert(key);
            }
        }
        Self { lexicon }
    }

    /// Build from keyword strings plus [`DEFAULT_UI_LABELS`]
    pub fn with_ui_labels<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let labels = DEFAULT_UI_LABELS.iter().map(|label| label.to_string());
        let keywords = keywords.into_iter().map(|k| k.as_ref().to_string());
        Self::from_keywords(labels.chain(keywords))
    }

    /// Load a keyword file, see [`sources::load_keywords`]; UI labels are always included
    pub fn load(path: &Path) -> Result<Self, VocabularyError> {
        let keywords = sources::load_keywords(path)?;
        let index = Self::with_ui_labels(keywords);
        info!("Loaded {} keywords from {:?}", index.len(), path);
        Ok(index)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lexicon.contains(key)
    }

    pub fn len(&self) -> usize {
        self.lexicon.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lexicon.is_empty()
    }

    pub(crate) fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_lexicon_insert_keeps_first_position() {
        let mut lexicon = Lexicon::new();
        assert_eq!(lexicon.insert("island".to_string()), 0);
        assert_eq!(lexicon.insert("forest".to_string()), 1);
        assert_eq!(lexicon.insert("island".to_string()), 0);
        assert_eq!(lexicon.len(), 2);
        assert_eq!(lexicon.term(1), Some("forest"));
    }

    #[test]
    fn test_nearest_prefers_lowest_distance_then_insertion() {
        let mut lexicon = Lexicon::new();
        for term in ["bolt", "boat", "bold", "lightning bolt"] {
            lexicon.insert(term.to_string());
        }

        // "bolx" is one edit from bolt, boat is two away, bold is one away
        let found = lexicon.nearest(&chars("bolx"), 2).unwrap();
        assert_eq!(found, TermMatch { index: 0, distance: 1 });

        let found = lexicon.nearest(&chars("lightnin bolt"), 3).unwrap();
        assert_eq!(found, TermMatch { index: 3, distance: 1 });

        assert!(lexicon.nearest(&chars("xxxxxx"), 2).is_none());
    }

    #[test]
    fn test_closest_prefix_requires_strict_improvement() {
        let mut lexicon = Lexicon::new();
        lexicon.insert("lightning bolt".to_string());
        lexicon.insert("lightning helix".to_string());
        lexicon.insert("counterspell".to_string());

        let found = lexicon.closest_prefix(&chars("lightningbo"), 3).unwrap();
        assert_eq!(found.index, 0);
        assert_eq!(found.distance, 2);

        // Exactly on budget is not an improvement
        assert!(lexicon.closest_prefix(&chars("lightningbo"), 2).is_none());
        assert!(lexicon.closest_prefix(&chars("cou"), 0).is_none());
    }

    #[test]
    fn test_vocabulary_lookup() {
        let index = VocabularyIndex::from_names(["Lightning Bolt", "Fire // Ice", "Counterspell"]);
        assert_eq!(index.len(), 3);
        assert_eq!(index.lookup("lightning bolt"), Some("Lightning Bolt"));
        assert_eq!(index.lookup("fire"), Some("Fire // Ice"));
        assert_eq!(index.lookup("Lightning Bolt"), None);
        let keys: Vec<&str> = index.keys().collect();
        assert_eq!(keys, vec!["lightning bolt", "fire", "counterspell"]);
    }

    #[test]
    fn test_vocabulary_collision_keeps_last() {
        let index = VocabularyIndex::from_names(["Bolt!", "bolt"]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.lookup("bolt"), Some("bolt"));
    }

    #[test]
    fn test_vocabulary_aliases() {
        let index = VocabularyIndex::from_entries([
            ("Lightning Bolt".to_string(), "Lightning Bolt".to_string()),
            ("Foudre".to_string(), "Lightning Bolt".to_string()),
        ]);
        assert_eq!(index.lookup("foudre"), Some("Lightning Bolt"));
    }

    #[test]
    fn test_empty_names_are_skipped() {
        let index = VocabularyIndex::from_names(["1996 World Champion", "???", ""]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.lookup("world champion"), Some("1996 World Champion"));
    }

    #[test]
    fn test_keyword_index_includes_ui_labels() {
        let index = KeywordIndex::with_ui_labels(["Flying", "Scry"]);
        assert!(index.contains("search"));
        assert!(index.contains("sideboard"));
        assert!(index.contains("flying"));
        assert!(index.len() >= DEFAULT_UI_LABELS.len());

        let bare = KeywordIndex::from_keywords(["Flying"]);
        assert_eq!(bare.len(), 1);
        assert!(!bare.contains("search"));
    }
}
