//! Item-name tokenizer.
//!
//! Splits OCR'd prescription and bill text into lowercase alphanumeric tokens
//! and filters out dosage forms, routes, frequency codes, units and bare
//! quantities so only the drug-identifying words remain.

/// Dosage forms, routes, frequency codes and units that never identify a drug.
///
/// The dotted and `%` entries cannot survive [`tokenize`], but they do appear
/// in whitespace-split words (see [`is_significant_word`]).
pub const STOPWORDS: &[&str] = &[
    "tab", "tablet", "cap", "capsule", "cream", "ointment", "inj", "injection", "syrup",
    "suspension", "susp", "drop", "drops", "gel", "lotion", "solution", "sol", "mg", "mcg", "gm",
    "g", "ml", "%", "xr", "sr", "er", "od", "bd", "tds", "qd", "qds", "once", "twice", "thrice",
    "tab.", "cap.", "inj.", "cream.",
];

/// Shortest token considered meaningful.
pub const MIN_TOKEN_LEN: usize = 3;

/// Check whether a token is in the stopword set.
pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// Split text into lowercase ASCII-alphanumeric tokens.
///
/// Any run of other characters (spaces, punctuation, non-ASCII) separates
/// tokens; empty tokens are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// A number optionally followed by a unit suffix: "2", "500", "500mg", "10ml".
pub fn is_quantity(token: &str) -> bool {
    let unit = token.trim_start_matches(|c: char| c.is_ascii_digit());
    unit.len() < token.len() && unit.chars().all(|c| c.is_ascii_lowercase() || c == '%')
}

/// Check whether a token identifies something (not a stopword, not a
/// quantity, not a tiny fragment).
pub fn is_meaningful(token: &str) -> bool {
    !token.is_empty()
        && !is_stopword(token)
        && !is_quantity(token)
        && token.chars().count() >= MIN_TOKEN_LEN
}

/// Keep only meaningful tokens, preserving order.
pub fn filter_meaningful<S: AsRef<str>>(tokens: &[S]) -> Vec<&str> {
    tokens
        .iter()
        .map(AsRef::as_ref)
        .filter(|t| is_meaningful(t))
        .collect()
}

/// First meaningful token, falling back to the first raw token, then "".
pub fn first_meaningful<S: AsRef<str>>(tokens: &[S]) -> &str {
    tokens
        .iter()
        .map(AsRef::as_ref)
        .find(|t| is_meaningful(t))
        .or_else(|| tokens.first().map(AsRef::as_ref))
        .unwrap_or("")
}

/// Whitespace-delimited word check used by partial-word matching.
///
/// Unlike [`is_meaningful`] this keeps quantities and punctuation-bearing
/// words; it only drops stopwords and words shorter than [`MIN_TOKEN_LEN`].
pub fn is_significant_word(word: &str) -> bool {
    word.chars().count() >= MIN_TOKEN_LEN && !is_stopword(&word.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_splits_on_punctuation() {
        assert_eq!(
            tokenize("Azithromycin-500mg Tab."),
            vec!["azithromycin", "500mg", "tab"]
        );
        assert_eq!(tokenize("  DOLO 650 / strip "), vec!["dolo", "650", "strip"]);
        assert!(tokenize("").is_empty());
        assert!(tokenize("--- ///").is_empty());
    }

    #[test]
    fn test_tokenize_treats_non_ascii_as_separator() {
        assert_eq!(tokenize("café₹120"), vec!["caf", "120"]);
    }

    #[test]
    fn test_quantity_detection() {
        assert!(is_quantity("2"));
        assert!(is_quantity("500mg"));
        assert!(is_quantity("10ml"));
        assert!(!is_quantity("mg"));
        assert!(!is_quantity("b12"));
        assert!(!is_quantity("d3x5"));
        assert!(!is_quantity(""));
    }

    #[test]
    fn test_filter_meaningful() {
        let tokens = tokenize("Pantoprazole 40 mg Tab BD");
        assert_eq!(filter_meaningful(&tokens), vec!["pantoprazole"]);

        let tokens = tokenize("Vitamin D3 60000 IU");
        // "d3" is too short, "iu" is too short
        assert_eq!(filter_meaningful(&tokens), vec!["vitamin"]);

        let tokens = tokenize("Syrup Cough Relief 100ml");
        assert_eq!(filter_meaningful(&tokens), vec!["cough", "relief"]);
    }

    #[test]
    fn test_first_meaningful_fallbacks() {
        let tokens = tokenize("Tab Crocin 500");
        assert_eq!(first_meaningful(&tokens), "crocin");

        // Nothing meaningful: fall back to the first raw token
        let tokens = tokenize("Tab 500 mg");
        assert_eq!(first_meaningful(&tokens), "tab");

        let empty: Vec<String> = Vec::new();
        assert_eq!(first_meaningful(&empty), "");
    }

    #[test]
    fn test_significant_word() {
        assert!(is_significant_word("azithro"));
        assert!(is_significant_word("500"));
        assert!(!is_significant_word("tab."));
        assert!(!is_significant_word("Syrup"));
        assert!(!is_significant_word("d3"));
    }
}
