//! Keyword filter
//!
//! Drops UI labels and rules keywords ("Sideboard", "Search", "Flying")
//! before card matching, so short card names are not matched against them.

use std::sync::Arc;
use tracing::debug;

use super::vocabulary::KeywordIndex;

/// Upper bound on the keyword edit budget
pub const MAX_KEYWORD_DISTANCE: usize = 3;

/// Decides whether a raw fragment is a keyword rather than a card name
#[derive(Debug, Clone)]
pub struct KeywordFilter {
    keywords: Arc<KeywordIndex>,
    max_ratio_diff: f64,
}

impl KeywordFilter {
    pub fn new(keywords: Arc<KeywordIndex>, max_ratio_diff: f64) -> Self {
        Self {
            keywords,
            max_ratio_diff: max_ratio_diff.max(0.0),
        }
    }

    /// True when `raw` is within the keyword edit budget of a known keyword.
    ///
    /// The budget is computed on the raw character count.
    pub fn is_keyword(&self, raw: &str) -> bool {
        let key: Vec<char> = KeywordIndex::normalize(raw).chars().collect();
        if key.is_empty() {
            return false;
        }

        let raw_len = raw.chars().count();
        let budget = ((self.max_ratio_diff * raw_len as f64).floor() as usize).min(MAX_KEYWORD_DISTANCE);

        match self.keywords.lexicon().nearest(&key, budget) {
            Some(found) => {
                debug!(
                    "Keyword: {:?} ~ {:?} (distance {})",
                    raw,
                    self.keywords.lexicon().term(found.index).unwrap_or_default(),
                    found.distance
                );
                true
            }
            None => false,
        }
    }
}
