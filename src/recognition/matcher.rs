//! Approximate card-name matching
//!
//! Resolution goes through four tiers, stopping at the first that decides:
//! a length gate, an exact key lookup, a prefix scan for truncated text
//! (`"lightningbo.."`), and a bounded nearest-neighbour search.

use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::vocabulary::VocabularyIndex;

/// Shortest text that can be a card name
pub const MIN_TEXT_LEN: usize = 3;
/// Longer text is card rules text, not a name
pub const MAX_TEXT_LEN: usize = 30;
/// Upper bound on the fuzzy edit budget
pub const MAX_FUZZY_DISTANCE: usize = 6;
/// A fuzzy match may not need more than this many extra characters
pub const MAX_LENGTH_SLACK: usize = 7;
/// Marker for text cut off by the OCR engine
pub const TRUNCATION_MARKER: &str = "..";

/// Why a fragment did not resolve to a card
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    TooShort { len: usize },
    TooLong { len: usize },
    /// Truncated text with no prefix within budget
    NoPrefixMatch { budget: usize },
    /// Nothing within the fuzzy edit budget
    NoCandidate { budget: usize },
    /// Best candidate is much shorter than the text
    LengthMismatch { candidate: String, distance: usize },
}

/// Diagnostic result of a resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Exact(String),
    Prefix { card: String, distance: usize },
    Fuzzy { card: String, distance: usize },
    Rejected(RejectReason),
}

impl MatchOutcome {
    /// Matched card, if any
    pub fn card(&self) -> Option<&str> {
        match self {
            MatchOutcome::Exact(card)
            | MatchOutcome::Prefix { card, .. }
            | MatchOutcome::Fuzzy { card, .. } => Some(card),
            MatchOutcome::Rejected(_) => None,
        }
    }

    pub fn into_card(self) -> Option<String> {
        match self {
            MatchOutcome::Exact(card)
            | MatchOutcome::Prefix { card, .. }
            | MatchOutcome::Fuzzy { card, .. } => Some(card),
            MatchOutcome::Rejected(_) => None,
        }
    }
}

impl fmt::Display for MatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchOutcome::Exact(card) => write!(f, "exact {}", card),
            MatchOutcome::Prefix { card, distance } => write!(f, "prefix {} (distance {})", card, distance),
            MatchOutcome::Fuzzy { card, distance } => write!(f, "fuzzy {} (distance {})", card, distance),
            MatchOutcome::Rejected(reason) => write!(f, "rejected: {:?}", reason),
        }
    }
}

/// Resolves normalized OCR text to canonical card names
#[derive(Debug, Clone)]
pub struct ApproximateMatcher {
    vocabulary: Arc<VocabularyIndex>,
    max_ratio_diff: f64,
}

impl ApproximateMatcher {
    /// Create a matcher; `max_ratio_diff` is the allowed edits per character
    pub fn new(vocabulary: Arc<VocabularyIndex>, max_ratio_diff: f64) -> Self {
        Self {
            vocabulary,
            max_ratio_diff: max_ratio_diff.max(0.0),
        }
    }

    pub fn vocabulary(&self) -> &VocabularyIndex {
        &self.vocabulary
    }

    pub fn max_ratio_diff(&self) -> f64 {
        self.max_ratio_diff
    }

    /// Canonical card for `text`, or `None` when no tier accepts it
    pub fn resolve(&self, text: &str) -> Option<String> {
        self.resolve_detailed(text).into_card()
    }

    /// Resolve `text` and report which tier decided
    pub fn resolve_detailed(&self, text: &str) -> MatchOutcome {
        let outcome = self.run_tiers(text);
        match &outcome {
            MatchOutcome::Rejected(reason) => debug!("Not found: {:?} ({:?})", text, reason),
            found => debug!("Found: {:?} -> {}", text, found),
        }
        outcome
    }

    fn run_tiers(&self, text: &str) -> MatchOutcome {
        let len = text.chars().count();
        if len < MIN_TEXT_LEN {
            return MatchOutcome::Rejected(RejectReason::TooShort { len });
        }
        if len > MAX_TEXT_LEN {
            return MatchOutcome::Rejected(RejectReason::TooLong { len });
        }

        if let Some(card) = self.vocabulary.lookup(text) {
            return MatchOutcome::Exact(card.to_string());
        }

        if let Some(i) = text.find(TRUNCATION_MARKER) {
            return self.match_prefix(&text[..i]);
        }

        self.match_fuzzy(text)
    }

    fn match_prefix(&self, prefix: &str) -> MatchOutcome {
        let prefix: Vec<char> = prefix.chars().collect();
        let budget = self.budget(prefix.len());

        match self.vocabulary.lexicon().closest_prefix(&prefix, budget) {
            Some(found) => MatchOutcome::Prefix {
                card: self.vocabulary.canonical_at(found.index).to_string(),
                distance: found.distance,
            },
            None => MatchOutcome::Rejected(RejectReason::NoPrefixMatch { budget }),
        }
    }

    fn match_fuzzy(&self, text: &str) -> MatchOutcome {
        let cleaned: Vec<char> = text.replace('.', "").trim_end_matches(' ').chars().collect();
        let budget = self.budget(cleaned.len()).min(MAX_FUZZY_DISTANCE);

        let Some(found) = self.vocabulary.lexicon().nearest(&cleaned, budget) else {
            return MatchOutcome::Rejected(RejectReason::NoCandidate { budget });
        };

        let key_len = self
            .vocabulary
            .lexicon()
            .term(found.index)
            .map_or(0, |key| key.chars().count());
        let card = self.vocabulary.canonical_at(found.index).to_string();

        if cleaned.len() < key_len + MAX_LENGTH_SLACK {
            MatchOutcome::Fuzzy {
                card,
                distance: found.distance,
            }
        } else {
            MatchOutcome::Rejected(RejectReason::LengthMismatch {
                candidate: card,
                distance: found.distance,
            })
        }
    }

    /// Edit budget for a text of `len` characters
    fn budget(&self, len: usize) -> usize {
        (self.max_ratio_diff * len as f64).floor() as usize
    }
}
