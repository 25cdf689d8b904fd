//! Recognition Engine
//!
//! Turns OCR fragments into a deck. Fragments are sorted into reading order,
//! keyword labels are dropped, the rest are resolved to card names, stack
//! multipliers are attached to the nearest card and the result is split
//! into main and side piles.
//!
//! Everything here works on `&self` over read-only indices, so one
//! [`DeckRecognizer`] can serve concurrent runs.

pub mod distance;
pub mod keywords;
pub mod matcher;
pub mod normalize;
pub mod quantity;
pub mod sources;
pub mod vocabulary;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::deck::Deck;
use crate::vision::{BoxText, BoxTextList, OcrBackend};

pub use distance::bounded_levenshtein;
pub use keywords::KeywordFilter;
pub use matcher::{ApproximateMatcher, MatchOutcome, RejectReason, MAX_TEXT_LEN};
pub use normalize::{clean, normalize, normalize_card_name, NormalizeMode};
pub use quantity::{split_leading_count, AssignmentReport, ConflictPolicy, MultiplierToken, QuantityAssigner};
pub use sources::VocabularyError;
pub use vocabulary::{KeywordIndex, VocabularyIndex, DEFAULT_UI_LABELS};

/// Tunable recognition thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Allowed card-name edits per character
    pub max_ratio_diff: f64,
    /// Allowed keyword edits per character
    pub max_ratio_diff_keyword: f64,
    /// How competing multipliers on one card are settled
    pub conflict_policy: ConflictPolicy,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            max_ratio_diff: 0.3,
            max_ratio_diff_keyword: 0.2,
            conflict_policy: ConflictPolicy::LastWins,
        }
    }
}

/// Fragments-to-deck pipeline over shared card and keyword indices
#[derive(Debug, Clone)]
pub struct DeckRecognizer {
    matcher: ApproximateMatcher,
    keyword_filter: KeywordFilter,
    assigner: QuantityAssigner,
}

impl DeckRecognizer {
    pub fn new(vocabulary: Arc<VocabularyIndex>, keywords: Arc<KeywordIndex>, config: RecognitionConfig) -> Self {
        info!(
            "Recognizer ready: {} card keys, {} keywords (ratio {}, keyword ratio {}, {:?})",
            vocabulary.len(),
            keywords.len(),
            config.max_ratio_diff,
            config.max_ratio_diff_keyword,
            config.conflict_policy
        );
        Self {
            matcher: ApproximateMatcher::new(vocabulary, config.max_ratio_diff),
            keyword_filter: KeywordFilter::new(keywords, config.max_ratio_diff_keyword),
            assigner: QuantityAssigner::new(config.conflict_policy),
        }
    }

    /// Build from a card list file and a keyword list file.
    ///
    /// Either source being missing, malformed or empty is an error.
    pub fn from_files(
        cards_path: &Path,
        keywords_path: &Path,
        languages: &[String],
        config: RecognitionConfig,
    ) -> Result<Self, VocabularyError> {
        let vocabulary = VocabularyIndex::load(cards_path, languages)?;
        let keywords = KeywordIndex::load(keywords_path)?;
        Ok(Self::new(Arc::new(vocabulary), Arc::new(keywords), config))
    }

    pub fn matcher(&self) -> &ApproximateMatcher {
        &self.matcher
    }

    pub fn keyword_filter(&self) -> &KeywordFilter {
        &self.keyword_filter
    }

    /// Resolve fragments to cards, in reading order.
    ///
    /// Each returned fragment keeps its source box; its text is the
    /// canonical card name. An inline count ("4 Opt") becomes the card
    /// count, everything else starts at 1. Unmatched fragments are left out.
    pub fn box_texts_to_cards(&self, box_texts: &BoxTextList) -> BoxTextList {
        let mut sorted = box_texts.clone();
        sorted.sort();

        let mut cards = BoxTextList::new();
        for fragment in &sorted {
            if let Some(card) = self.fragment_to_card(fragment) {
                cards.push(card);
            }
        }

        debug!("Resolved {} of {} fragments", cards.len(), sorted.len());
        cards
    }

    fn fragment_to_card(&self, fragment: &BoxText) -> Option<BoxText> {
        let (count, raw) = split_leading_count(&fragment.text);

        if self.keyword_filter.is_keyword(raw) {
            return None;
        }

        // Untruncated, so the matcher's length gate sees the real length
        let query = VocabularyIndex::query(raw);
        let card = self.matcher.resolve(&query)?;
        Some(BoxText::with_count(fragment.bbox, card, count.unwrap_or(1)))
    }

    /// Overlay multiplier labels from `box_texts` onto `cards`, scanning labels
    /// in reading order
    pub fn assign_stacked(&self, box_texts: &BoxTextList, cards: &mut BoxTextList) -> AssignmentReport {
        let mut sorted = box_texts.clone();
        sorted.sort();

        let report = self.assigner.assign(&sorted, cards);
        debug!(
            "Multipliers: {} assigned, {} dropped, {} conflicting",
            report.assigned, report.dropped, report.conflicts
        );
        report
    }

    /// Full pipeline from raw fragments to a partitioned deck
    pub fn box_texts_to_deck(&self, box_texts: &BoxTextList) -> Deck {
        let mut cards = self.box_texts_to_cards(box_texts);
        self.assign_stacked(box_texts, &mut cards);

        let deck = Deck::partition(cards.iter().map(|card| (card.text.as_str(), card.count)));
        info!(
            "Recognized {} cards ({} main, {} side)",
            deck.len(),
            deck.main.len(),
            deck.side.len()
        );
        deck
    }

    /// Run `backend` on `image` and recognize the result
    pub fn image_to_deck(&self, backend: &dyn OcrBackend, image: &str) -> Result<Deck> {
        info!("Running {} OCR on {}", backend.name(), image);
        let box_texts = backend
            .image_to_box_texts(image)
            .with_context(|| format!("OCR failed for {}", image))?;
        Ok(self.box_texts_to_deck(&box_texts))
    }
}
