//! deckscan - decklist recognition from OCR output
//!
//! Resolves noisy OCR fragments of a decklist screenshot or photo to card
//! names, attaches stack multipliers and splits the result into a main deck
//! and a sideboard.

pub mod config;
pub mod data;
pub mod deck;
pub mod recognition;
pub mod storage;
pub mod vision;

pub use deck::{Deck, Pile};
pub use recognition::{DeckRecognizer, KeywordIndex, RecognitionConfig, VocabularyIndex};
pub use vision::{BoundingBox, BoxText, BoxTextList};
