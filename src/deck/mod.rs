//! Decks and piles
//!
//! A recognized card sequence is split into a main pile and a side pile by
//! its running count: the main pile takes at least 60 cards, the side pile
//! at most 15. Reading order decides which copies land where.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

/// Minimum main deck size in constructed formats
pub const MAIN_DECK_MIN: u32 = 60;
/// Maximum sideboard size in constructed formats
pub const SIDEBOARD_MAX: u32 = 15;

/// Multiset of card names, in first-insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pile {
    entries: Vec<(String, u32)>,
    positions: HashMap<String, usize>,
}

impl Pile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` copies of `card`; a zero count is ignored
    pub fn add(&mut self, card: &str, count: u32) {
        if count == 0 {
            return;
        }
        match self.positions.get(card) {
            Some(&i) => self.entries[i].1 += count,
            None => {
                self.positions.insert(card.to_string(), self.entries.len());
                self.entries.push((card.to_string(), count));
            }
        }
    }

    /// Copies of `card` in the pile
    pub fn count(&self, card: &str) -> u32 {
        self.positions.get(card).map_or(0, |&i| self.entries[i].1)
    }

    /// Total number of cards
    pub fn len(&self) -> u32 {
        self.entries.iter().map(|(_, n)| n).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct cards
    pub fn distinct(&self) -> usize {
        self.entries.len()
    }

    /// `(card, count)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(card, n)| (card.as_str(), *n))
    }

    /// Cards of both piles added together
    pub fn merge(&self, other: &Pile) -> Pile {
        let mut merged = self.clone();
        for (card, n) in other.iter() {
            merged.add(card, n);
        }
        merged
    }

    /// Sum of per-card count differences
    pub fn diff(&self, other: &Pile) -> u32 {
        let mine = self.iter().map(|(card, n)| n.abs_diff(other.count(card)));
        let missing = other
            .iter()
            .filter(|(card, _)| self.count(card) == 0)
            .map(|(_, n)| n);
        mine.chain(missing).sum()
    }
}

impl fmt::Display for Pile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (card, n) in self.iter() {
            writeln!(f, "{} {}", n, card)?;
        }
        Ok(())
    }
}

/// A main pile and a side pile
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deck {
    pub main: Pile,
    pub side: Pile,
}

impl Deck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split an ordered `(card, count)` sequence into main and side piles.
    ///
    /// The main pile holds the first `max(60, total - 15)` cards of the
    /// sequence; an entry crossing that boundary is split between the piles.
    pub fn partition<I, S>(cards: I) -> Deck
    where
        I: IntoIterator<Item = (S, u32)>,
        S: AsRef<str>,
    {
        let cards: Vec<(S, u32)> = cards.into_iter().collect();
        let total: u32 = cards.iter().map(|(_, n)| n).sum();
        let main_cap = MAIN_DECK_MIN.max(total.saturating_sub(SIDEBOARD_MAX));

        let mut deck = Deck::new();
        let mut added = 0u32;
        for (card, count) in &cards {
            let main_portion = (*count).min(main_cap.saturating_sub(added));
            deck.main.add(card.as_ref(), main_portion);
            deck.side.add(card.as_ref(), count - main_portion);
            added += count;
        }

        deck
    }

    /// Total number of cards
    pub fn len(&self) -> u32 {
        self.main.len() + self.side.len()
    }

    pub fn is_empty(&self) -> bool {
        self.main.is_empty() && self.side.is_empty()
    }

    pub fn add(&mut self, card: &str, count: u32, in_sideboard: bool) {
        if in_sideboard {
            self.side.add(card, count);
        } else {
            self.main.add(card, count);
        }
    }

    /// Pile-wise union of two decks
    pub fn merge(&self, other: &Deck) -> Deck {
        Deck {
            main: self.main.merge(&other.main),
            side: self.side.merge(&other.side),
        }
    }

    /// Number of card differences with `other`, pile by pile
    pub fn diff(&self, other: &Deck) -> u32 {
        self.main.diff(&other.main) + self.side.diff(&other.side)
    }

    /// Parse the deck text format: `"<count> <card>"` lines, main pile first,
    /// then a blank line and the side pile. The first blank line starts the
    /// side pile even when no main cards precede it, so a deck with only a
    /// side pile reads back as written. Malformed lines are skipped.
    pub fn parse(content: &str) -> Deck {
        let mut deck = Deck::new();
        let mut in_sideboard = false;

        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                in_sideboard = true;
                continue;
            }
            match parse_deck_line(line) {
                Some((count, card)) => deck.add(card, count, in_sideboard),
                None => warn!("Skipping malformed deck line {}: {:?}", line_no + 1, line),
            }
        }

        deck
    }

    pub fn load(path: &Path) -> Result<Deck> {
        info!("Loading deck from {:?}", path);
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read deck file {:?}", path))?;
        Ok(Deck::parse(&content))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        info!("Saving deck ({} cards) to {:?}", self.len(), path);
        std::fs::write(path, self.to_string())
            .with_context(|| format!("Failed to write deck file {:?}", path))?;
        Ok(())
    }
}

impl fmt::Display for Deck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.main)?;
        if !self.side.is_empty() {
            writeln!(f)?;
            write!(f, "{}", self.side)?;
        }
        Ok(())
    }
}

fn parse_deck_line(line: &str) -> Option<(u32, &str)> {
    let (count, card) = line.split_once(' ')?;
    let count: u32 = count.trim_end_matches(['x', 'X']).parse().ok()?;
    let card = card.trim();
    (count > 0 && !card.is_empty()).then_some((count, card))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn ones(n: usize) -> Vec<(String, u32)> {
        (0..n).map(|i| (format!("Card {}", i), 1)).collect()
    }

    #[test]
    fn test_pile_counts() {
        let mut pile = Pile::new();
        pile.add("Island", 2);
        pile.add("Forest", 1);
        pile.add("Island", 3);
        pile.add("Swamp", 0);

        assert_eq!(pile.count("Island"), 5);
        assert_eq!(pile.count("Swamp"), 0);
        assert_eq!(pile.len(), 6);
        assert_eq!(pile.distinct(), 2);
        assert_eq!(pile.to_string(), "5 Island\n1 Forest\n");
    }

    #[test]
    fn test_partition_small_deck_is_all_main() {
        let deck = Deck::partition(vec![("Island", 20), ("Opt", 4)]);
        assert_eq!(deck.main.len(), 24);
        assert!(deck.side.is_empty());
    }

    #[test]
    fn test_partition_75_cards() {
        let deck = Deck::partition(ones(75));
        assert_eq!(deck.main.len(), 60);
        assert_eq!(deck.side.len(), 15);
        assert_eq!(deck.main.count("Card 59"), 1);
        assert_eq!(deck.side.count("Card 60"), 1);
        assert_eq!(deck.main.count("Card 60"), 0);
    }

    #[test]
    fn test_partition_straddles_boundary() {
        let deck = Deck::partition(vec![("Island", 58), ("Opt", 4), ("Duress", 13)]);
        assert_eq!(deck.main.count("Opt"), 2);
        assert_eq!(deck.side.count("Opt"), 2);
        assert_eq!(deck.side.count("Duress"), 13);
        assert_eq!(deck.len(), 75);
    }

    #[test]
    fn test_partition_large_total_keeps_fifteen_aside() {
        let deck = Deck::partition(vec![("Relentless Rats", 80), ("Duress", 15)]);
        assert_eq!(deck.main.len(), 80);
        assert_eq!(deck.side.len(), 15);
    }

    #[test]
    fn test_partition_invariants() {
        for total in [0usize, 1, 59, 60, 61, 74, 75, 76, 100] {
            let deck = Deck::partition(ones(total));
            let total = total as u32;
            assert_eq!(deck.len(), total);
            assert!(deck.main.len() >= total.min(MAIN_DECK_MIN));
            assert!(deck.side.len() <= SIDEBOARD_MAX);
        }
    }

    #[test]
    fn test_display_and_parse() {
        let deck = Deck::partition(vec![("Island", 58), ("Opt", 4), ("Duress", 13)]);
        let text = deck.to_string();
        assert_eq!(text, "58 Island\n2 Opt\n\n2 Opt\n13 Duress\n");
        assert_eq!(Deck::parse(&text), deck);
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let deck = Deck::parse("4 Lightning Bolt\nLightning Bolt\n4x Opt\nzero Island\n\n\n2 Duress\n");
        assert_eq!(deck.main.count("Lightning Bolt"), 4);
        assert_eq!(deck.main.count("Opt"), 4);
        assert_eq!(deck.main.len(), 8);
        assert_eq!(deck.side.count("Duress"), 2);
    }

    #[test]
    fn test_side_only_deck_roundtrip() {
        let mut deck = Deck::new();
        deck.add("Duress", 2, true);
        deck.add("Negate", 1, true);

        let text = deck.to_string();
        assert_eq!(text, "\n2 Duress\n1 Negate\n");

        let parsed = Deck::parse(&text);
        assert!(parsed.main.is_empty());
        assert_eq!(parsed, deck);
    }

    #[test]
    fn test_diff_and_merge() {
        let a = Deck::parse("4 Lightning Bolt\n2 Opt\n\n1 Duress\n");
        let b = Deck::parse("3 Lightning Bolt\n2 Ponder\n\n1 Duress\n");
        assert_eq!(a.diff(&a), 0);
        // 1 bolt, 2 opt, 2 ponder
        assert_eq!(a.diff(&b), 5);
        assert_eq!(b.diff(&a), 5);

        let merged = a.merge(&b);
        assert_eq!(merged.main.count("Lightning Bolt"), 7);
        assert_eq!(merged.side.count("Duress"), 2);
        assert_eq!(merged.len(), a.len() + b.len());
    }

    #[test]
    fn test_save_and_load() {
        let deck = Deck::partition(ones(70));
        let temp_file = NamedTempFile::new().unwrap();

        deck.save(temp_file.path()).unwrap();
        let loaded = Deck::load(temp_file.path()).unwrap();

        assert_eq!(loaded, deck);
    }
}
