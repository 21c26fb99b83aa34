//! Free-text normalization for cross-source name matching.
//!
//! Platform exports describe the same project with different wording,
//! casing, accents and punctuation ("Remboursement mensualité n°12 -
//! Résidence Les Tilleuls" vs "RESIDENCE LES TILLEULS"). Matching happens
//! on a reduced key: lower-cased, diacritics folded, everything
//! non-alphanumeric dropped, and known boilerplate wording removed.

/// Boilerplate wording stripped from flow descriptions before matching,
/// in normalized form. Longer phrases come first so that removing
/// "remboursement mensualité" never leaves a dangling "mensualité".
const BOILERPLATE_PHRASES: &[&str] = &[
    "investissementdansleprojet",
    "remboursementmensualite",
    "remboursementanticipe",
    "remboursementduprojet",
    "creditducompte",
    "offreacceptee",
    "remboursement",
    "investissement",
    "souscription",
    "mensualite",
    "echeance",
    "versement",
    "projet",
    "coupon",
];

/// Reduces free text to a match key: lower-case, diacritics folded to
/// their ASCII base letter, all non-alphanumerics removed.
pub fn normalize_match_key(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    for c in raw.chars().flat_map(|c| c.to_lowercase()) {
        match c {
            'à' | 'â' | 'ä' => key.push('a'),
            'é' | 'è' | 'ê' | 'ë' => key.push('e'),
            'î' | 'ï' => key.push('i'),
            'ô' | 'ö' => key.push('o'),
            'ù' | 'û' | 'ü' => key.push('u'),
            'ÿ' => key.push('y'),
            'ç' => key.push('c'),
            'œ' => key.push_str("oe"),
            'æ' => key.push_str("ae"),
            _ if c.is_ascii_alphanumeric() => key.push(c),
            _ => {}
        }
    }
    key
}

/// Removes known boilerplate wording from an already-normalized key.
pub fn strip_boilerplate(key: &str) -> String {
    let mut stripped = key.to_string();
    for phrase in BOILERPLATE_PHRASES {
        if stripped.contains(phrase) {
            stripped = stripped.replace(phrase, "");
        }
    }
    stripped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_folds_accents_and_case() {
        assert_eq!(
            normalize_match_key("Résidence Les Tilleuls"),
            "residencelestilleuls"
        );
        assert_eq!(normalize_match_key("CHÂTEAU-D'ŒX 2"), "chateaudoex2");
    }

    #[test]
    fn test_normalize_drops_punctuation() {
        assert_eq!(normalize_match_key("n°12 - Lot B"), "n12lotb");
    }

    #[test]
    fn test_strip_boilerplate_removes_platform_wording() {
        let key = normalize_match_key("Remboursement mensualité n°3 Villa Marguerite");
        assert_eq!(strip_boilerplate(&key), "n3villamarguerite");
    }

    #[test]
    fn test_strip_boilerplate_handles_nested_phrases() {
        // "investissement dans le projet" must go as a whole, not leave
        // "dansle" behind after a shorter phrase fires first.
        let key = normalize_match_key("Investissement dans le projet Les Docks");
        assert_eq!(strip_boilerplate(&key), "lesdocks");
    }

    #[test]
    fn test_strip_boilerplate_on_clean_key_is_identity() {
        assert_eq!(strip_boilerplate("lesdocks"), "lesdocks");
    }
}
