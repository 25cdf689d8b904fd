//! Text normalization shared by index construction and queries

/// Longest normalized key, in characters
pub const MAX_NAME_LEN: usize = 30;

/// Marker separating the faces of split and double-faced cards
pub const SPLIT_MARKER: &str = "//";

/// Punctuation removed in [`NormalizeMode::Light`]
const LIGHT_STRIPPED: &[char] = &['@', '*', '(', ')', '?', '!', ':', ';', '"'];

/// How aggressively text is cleaned before lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalizeMode {
    /// Keep only letters, apostrophes, commas, periods and spaces
    #[default]
    CardName,
    /// Drop a fixed punctuation set and digits, keep everything else
    Light,
}

/// Normalize `text` into a lookup key.
///
/// Both modes cut at the split-name marker, lowercase, trim spaces and
/// bound the key to [`MAX_NAME_LEN`] characters. Applying it twice gives
/// the same result as applying it once.
pub fn normalize(text: &str, mode: NormalizeMode) -> String {
    let cleaned = clean(text, mode);
    let bounded: String = cleaned.chars().take(MAX_NAME_LEN).collect();
    bounded.trim_end_matches(' ').to_string()
}

/// [`normalize`] without the length bound.
///
/// Queries go through this so overlong text keeps its full length and
/// fails the length gate instead of being cut down to a plausible key.
pub fn clean(text: &str, mode: NormalizeMode) -> String {
    let kept: String = front_face(text)
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|&c| match mode {
            NormalizeMode::CardName => {
                c.is_alphabetic() || matches!(c, '\'' | ',' | '.' | ' ')
            }
            NormalizeMode::Light => !c.is_ascii_digit() && !LIGHT_STRIPPED.contains(&c),
        })
        .collect();

    // Light mode keeps slashes, so stripping digits can form a new marker
    front_face(&kept).trim_matches(' ').to_string()
}

fn front_face(text: &str) -> &str {
    match text.find(SPLIT_MARKER) {
        Some(i) => &text[..i],
        None => text,
    }
}

/// Card-name normalization
pub fn normalize_card_name(text: &str) -> String {
    normalize(text, NormalizeMode::CardName)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_name_basic() {
        assert_eq!(normalize_card_name("Lightning Bolt"), "lightning bolt");
        assert_eq!(normalize_card_name("  Counterspell  "), "counterspell");
        assert_eq!(normalize_card_name("Jace, the Mind Sculptor"), "jace, the mind sculptor");
        assert_eq!(normalize_card_name("Urza's Saga"), "urza's saga");
    }

    #[test]
    fn test_card_name_strips_foreign_characters() {
        assert_eq!(normalize_card_name("4 Lightning Bolt"), "lightning bolt");
        assert_eq!(normalize_card_name("Lim-Dûl's Vault"), "limdûl's vault");
        assert_eq!(normalize_card_name("Bolt!?"), "bolt");
        assert_eq!(normalize_card_name("Dr. Julius Jumblemorph"), "dr. julius jumblemorph");
    }

    #[test]
    fn test_split_marker() {
        assert_eq!(normalize_card_name("Fire // Ice"), "fire");
        assert_eq!(normalize_card_name("Fire//Ice"), "fire");
        assert_eq!(normalize(
            "Delver of Secrets // Insectile Aberration",
            NormalizeMode::Light
        ), "delver of secrets");
    }

    #[test]
    fn test_light_mode() {
        assert_eq!(normalize("Search (2)", NormalizeMode::Light), "search");
        assert_eq!(normalize("Lands: 24", NormalizeMode::Light), "lands");
        assert_eq!(normalize("Sideboard-Cards", NormalizeMode::Light), "sideboard-cards");
    }

    #[test]
    fn test_bounded_length() {
        let long = "Asmoranomardicadaistinaculdacar and friends";
        let key = normalize_card_name(long);
        assert!(key.chars().count() <= MAX_NAME_LEN);
        assert!(key.starts_with("asmoranomardicadaistinaculdaca"));
        // A space at the cut is trimmed as well
        let key = normalize_card_name("abcdefghijklmnopqrstuvwxyzabc defgh");
        assert_eq!(key, "abcdefghijklmnopqrstuvwxyzabc");
    }

    #[test]
    fn test_clean_keeps_full_length() {
        let text = "Jace, the Mind Sculptor (WWK) 31 and more text";
        let cleaned = clean(text, NormalizeMode::CardName);
        assert_eq!(cleaned, "jace, the mind sculptor wwk  and more text");
        assert!(cleaned.chars().count() > MAX_NAME_LEN);
        assert_eq!(normalize_card_name("Jace, the Mind Sculptor (WWK) 31"), "jace, the mind sculptor wwk");
        assert_eq!(clean("Fire // Ice", NormalizeMode::CardName), "fire");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "Lightning Bolt",
            "Fire // Ice",
            "  Jace, the Mind Sculptor ",
            "4x Thoughtseize",
            "Asmoranomardicadaistinaculdacar and friends",
            "Lim-Dûl's Vault",
            "Fire/2/Ice",
            "",
        ];
        for mode in [NormalizeMode::CardName, NormalizeMode::Light] {
            for sample in samples {
                let once = normalize(sample, mode);
                assert_eq!(normalize(&once, mode), once, "{:?} {:?}", mode, sample);
            }
        }
    }
}
