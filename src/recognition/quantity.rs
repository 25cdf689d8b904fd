//! Stack multipliers
//!
//! Screenshots show copies of a card as a separate "x4" / "4x" label near
//! the card name. Each label is attached to the nearest recognized card
//! box; text decklists instead carry the count in front of the name.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::vision::{squared_distance, BoundingBox, BoxText, BoxTextList};

/// Characters read as a multiplication sign
pub const MULTIPLY_SIGNS: [char; 3] = ['×', 'x', 'X'];

/// Which layout a multiplier label comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Sign then digit ("x4"); the card name sits above or left of the label
    Maindeck,
    /// Digit then sign ("4x"); the card name can be anywhere around it
    Sideboard,
}

/// A two-character multiplier label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiplierToken {
    pub bbox: BoundingBox,
    pub value: u32,
    pub orientation: Orientation,
}

impl MultiplierToken {
    /// Read a fragment as a multiplier label, if it is one.
    /// A zero count is not a multiplier.
    pub fn parse(fragment: &BoxText) -> Option<Self> {
        let chars: Vec<char> = fragment.text.chars().collect();
        let [first, second] = chars.as_slice() else {
            return None;
        };

        let (digit, orientation) = if MULTIPLY_SIGNS.contains(first) {
            (*second, Orientation::Maindeck)
        } else if MULTIPLY_SIGNS.contains(second) {
            (*first, Orientation::Sideboard)
        } else {
            return None;
        };

        let value = digit.to_digit(10).filter(|&v| v > 0 && digit.is_ascii_digit())?;
        Some(Self {
            bbox: fragment.bbox,
            value,
            orientation,
        })
    }

    /// Whether a card box may own this label
    fn admits(&self, candidate: &BoundingBox) -> bool {
        match self.orientation {
            Orientation::Maindeck => {
                let m = self.bbox.origin();
                let b = candidate.origin();
                b.x <= m.x && b.y <= m.y
            }
            Orientation::Sideboard => true,
        }
    }
}

/// How to settle several labels pointing at the same card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Each label overwrites the count; the last one in reading order stays
    #[default]
    LastWins,
    /// The first label to reach a card fixes its count
    FirstWins,
}

/// What happened to the multiplier labels of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AssignmentReport {
    /// Labels whose value was written to a card
    pub assigned: usize,
    /// Labels with no admissible card
    pub dropped: usize,
    /// Labels that hit a card already set by an earlier label
    pub conflicts: usize,
}

/// Attaches multiplier labels to recognized cards
#[derive(Debug, Clone, Copy, Default)]
pub struct QuantityAssigner {
    policy: ConflictPolicy,
}

impl QuantityAssigner {
    pub fn new(policy: ConflictPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    /// Scan `fragments` for multiplier labels and write their values onto `cards`.
    ///
    /// Labels are processed in the order of `fragments`.
    pub fn assign(&self, fragments: &BoxTextList, cards: &mut BoxTextList) -> AssignmentReport {
        let mut report = AssignmentReport::default();
        let mut already_set = vec![false; cards.len()];

        for token in fragments.iter().filter_map(MultiplierToken::parse) {
            let Some(target) = nearest_card(&token, cards.as_slice()) else {
                debug!("Dropping multiplier x{} at {}: no card in range", token.value, token.bbox);
                report.dropped += 1;
                continue;
            };

            if already_set[target] {
                report.conflicts += 1;
                if self.policy == ConflictPolicy::FirstWins {
                    continue;
                }
            }

            if let Some(card) = cards.get_mut(target) {
                debug!("Assigning x{} to {:?}", token.value, card.text);
                card.count = token.value;
            }
            already_set[target] = true;
            report.assigned += 1;
        }

        report
    }
}

/// Index of the admissible card closest to the label; ties keep reading order
fn nearest_card(token: &MultiplierToken, cards: &[BoxText]) -> Option<usize> {
    cards
        .iter()
        .enumerate()
        .filter(|(_, card)| token.admits(&card.bbox))
        .min_by_key(|(_, card)| squared_distance(&token.bbox, &card.bbox))
        .map(|(index, _)| index)
}

/// Split an inline count off a decklist line.
///
/// Accepts `"4 Name"`, `"4x Name"` and `"4 x Name"` with counts from 1 to 99.
/// Anything else comes back unchanged with no count.
pub fn split_leading_count(text: &str) -> (Option<u32>, &str) {
    let trimmed = text.trim_start();
    let digits = trimmed.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 || digits > 2 {
        return (None, text);
    }
    let count: u32 = match trimmed[..digits].parse() {
        Ok(count) if count > 0 => count,
        _ => return (None, text),
    };

    let after_digits = &trimmed[digits..];
    let signed = after_digits
        .trim_start()
        .strip_prefix(|c: char| MULTIPLY_SIGNS.contains(&c))
        .filter(|rest| rest.starts_with(char::is_whitespace));

    let rest = match signed {
        Some(rest) => rest,
        None if after_digits.starts_with(char::is_whitespace) => after_digits,
        None => return (None, text),
    };

    let name = rest.trim();
    if name.is_empty() {
        return (None, text);
    }
    (Some(count), name)
}
