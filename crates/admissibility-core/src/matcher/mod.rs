//! Bill-item to prescription matching.
//!
//! A bill line is compared against a prescribed name through an ordered
//! cascade of strategies. Strategies run from most to least precise and the
//! first one that fires is reported, so the tag doubles as a confidence hint.
//!
//! | Order | Strategy          | Fires when                                               |
//! |-------|-------------------|----------------------------------------------------------|
//! | 1     | exact             | full strings are equal                                   |
//! | 2     | first-word        | first meaningful tokens are equal                        |
//! | 3     | near-first-word   | first meaningful tokens are one edit apart               |
//! | 4     | prefix            | a single-token side prefixes the other's first token     |
//! | 5     | normalized-near   | meaningful tokens joined are one edit apart              |
//! | 6     | partial-word      | significant words contain each other or are one edit off |
//! | 7     | phonetic          | consonant skeletons are one edit apart                   |

mod similarity;
mod tokenizer;

pub use similarity::*;
pub use tokenizer::*;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies which matching heuristic attributed a bill item to a
/// prescription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyTag {
    Exact,
    FirstWord,
    NearFirstWord,
    Prefix,
    NormalizedNear,
    PartialWord,
    Phonetic,
}

impl StrategyTag {
    /// Strategies in evaluation order.
    pub const CASCADE: [StrategyTag; 7] = [
        StrategyTag::Exact,
        StrategyTag::FirstWord,
        StrategyTag::NearFirstWord,
        StrategyTag::Prefix,
        StrategyTag::NormalizedNear,
        StrategyTag::PartialWord,
        StrategyTag::Phonetic,
    ];

    /// Human-readable label used in decision reasons.
    pub fn label(self) -> &'static str {
        match self {
            StrategyTag::Exact => "exact match",
            StrategyTag::FirstWord => "first word match",
            StrategyTag::NearFirstWord => "near first-word match",
            StrategyTag::Prefix => "prefix match",
            StrategyTag::NormalizedNear => "normalized near match",
            StrategyTag::PartialWord => "partial word match",
            StrategyTag::Phonetic => "phonetic match",
        }
    }

    /// Stable machine-readable tag (the serde name).
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyTag::Exact => "exact",
            StrategyTag::FirstWord => "first-word",
            StrategyTag::NearFirstWord => "near-first-word",
            StrategyTag::Prefix => "prefix",
            StrategyTag::NormalizedNear => "normalized-near",
            StrategyTag::PartialWord => "partial-word",
            StrategyTag::Phonetic => "phonetic",
        }
    }

    /// Evaluate this strategy on a prepared name pair.
    pub fn applies(self, pair: &NamePair) -> bool {
        match self {
            StrategyTag::Exact => pair.bill == pair.prescribed,
            StrategyTag::FirstWord => pair.bill_first == pair.prescribed_first,
            StrategyTag::NearFirstWord => within_one_edit(pair.bill_first, pair.prescribed_first),
            StrategyTag::Prefix => pair.prefix_match(),
            StrategyTag::NormalizedNear => {
                within_one_edit(&pair.bill_normalized, &pair.prescribed_normalized)
            }
            StrategyTag::PartialWord => pair.partial_word_match(),
            StrategyTag::Phonetic => phonetic_match(pair.bill, pair.prescribed),
        }
    }
}

impl fmt::Display for StrategyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of matching one bill item against a prescription list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Lowercased prescribed name the item was attributed to
    pub matched_prescription_name: Option<String>,
    /// Strategy that produced the attribution
    pub strategy: Option<StrategyTag>,
}

impl MatchResult {
    /// Check whether any prescription was matched.
    pub fn is_match(&self) -> bool {
        self.matched_prescription_name.is_some()
    }
}

/// Bill and prescribed names, lowercased and pre-tokenized once for the
/// whole cascade.
#[derive(Debug, Clone)]
pub struct NamePair<'a> {
    bill: &'a str,
    prescribed: &'a str,
    bill_tokens: &'a [String],
    prescribed_tokens: &'a [String],
    bill_first: &'a str,
    prescribed_first: &'a str,
    bill_normalized: String,
    prescribed_normalized: String,
}

impl<'a> NamePair<'a> {
    /// Prepare a pair from already-lowercased names and their tokens.
    ///
    /// Returns `None` when either side is empty or has no tokens; such pairs
    /// never match.
    pub fn new(
        bill: &'a str,
        bill_tokens: &'a [String],
        prescribed: &'a str,
        prescribed_tokens: &'a [String],
    ) -> Option<Self> {
        if bill.is_empty() || prescribed.is_empty() {
            return None;
        }
        if bill_tokens.is_empty() || prescribed_tokens.is_empty() {
            return None;
        }

        Some(Self {
            bill,
            prescribed,
            bill_tokens,
            prescribed_tokens,
            bill_first: first_meaningful(bill_tokens),
            prescribed_first: first_meaningful(prescribed_tokens),
            bill_normalized: filter_meaningful(bill_tokens).concat(),
            prescribed_normalized: filter_meaningful(prescribed_tokens).concat(),
        })
    }

    /// Run the cascade and return the first strategy that fires.
    pub fn strategy(&self) -> Option<StrategyTag> {
        StrategyTag::CASCADE.into_iter().find(|s| s.applies(self))
    }

    fn prefix_match(&self) -> bool {
        let single_token = self.prescribed_tokens.len() == 1 || self.bill_tokens.len() == 1;
        single_token
            && (self.bill_first.starts_with(self.prescribed_first)
                || self.prescribed_first.starts_with(self.bill_first))
    }

    fn partial_word_match(&self) -> bool {
        let bill_words: Vec<&str> = self
            .bill
            .split_whitespace()
            .filter(|w| is_significant_word(w))
            .collect();

        self.prescribed
            .split_whitespace()
            .filter(|w| is_significant_word(w))
            .any(|pw| {
                bill_words
                    .iter()
                    .any(|bw| bw.contains(pw) || pw.contains(bw) || within_one_edit(bw, pw))
            })
    }
}

/// Normalize a free-text name for matching: trimmed and lowercased.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Determine which strategy, if any, matches a bill name to a prescribed
/// name. Case and surrounding whitespace are ignored.
pub fn match_strategy(bill_name: &str, prescribed_name: &str) -> Option<StrategyTag> {
    let bill = normalize_name(bill_name);
    let prescribed = normalize_name(prescribed_name);
    let bill_tokens = tokenize(&bill);
    let prescribed_tokens = tokenize(&prescribed);

    NamePair::new(&bill, &bill_tokens, &prescribed, &prescribed_tokens)?.strategy()
}

/// Check whether a bill name is admissible against a prescribed name.
pub fn is_admissible_match(bill_name: &str, prescribed_name: &str) -> bool {
    match_strategy(bill_name, prescribed_name).is_some()
}

/// Matcher over a fixed prescription list.
///
/// Prescribed names are lowercased and tokenized once up front; the caller's
/// list is only read.
#[derive(Debug, Clone)]
pub struct Matcher {
    prescribed: Vec<(String, Vec<String>)>,
}

impl Matcher {
    /// Create a matcher for the given prescribed names, in order.
    pub fn new<S: AsRef<str>>(prescribed_names: &[S]) -> Self {
        let prescribed = prescribed_names
            .iter()
            .map(|name| {
                let lower = normalize_name(name.as_ref());
                let tokens = tokenize(&lower);
                (lower, tokens)
            })
            .collect();
        Self { prescribed }
    }

    /// Number of prescribed names.
    pub fn len(&self) -> usize {
        self.prescribed.len()
    }

    /// Check whether the prescription list is empty.
    pub fn is_empty(&self) -> bool {
        self.prescribed.is_empty()
    }

    /// Attribute a bill name to the first prescribed name that matches.
    pub fn find_match(&self, bill_name: &str) -> MatchResult {
        let bill = normalize_name(bill_name);
        let bill_tokens = tokenize(&bill);

        self.prescribed
            .iter()
            .find_map(|(prescribed, tokens)| {
                NamePair::new(&bill, &bill_tokens, prescribed, tokens)?
                    .strategy()
                    .map(|strategy| MatchResult {
                        matched_prescription_name: Some(prescribed.clone()),
                        strategy: Some(strategy),
                    })
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert_eq!(match_strategy("crocin", "crocin"), Some(StrategyTag::Exact));
        assert_eq!(
            match_strategy("  Crocin Advance ", "crocin advance"),
            Some(StrategyTag::Exact)
        );
    }

    #[test]
    fn test_first_word_wins_over_looser_strategies() {
        // Partial-word and phonetic would also fire; first-word is reported.
        assert_eq!(
            match_strategy("azithromycin tab", "azithromycin 500"),
            Some(StrategyTag::FirstWord)
        );
        assert_eq!(
            match_strategy("tab pantoprazole 40", "pantoprazole"),
            Some(StrategyTag::FirstWord)
        );
    }

    #[test]
    fn test_near_first_word() {
        assert_eq!(
            match_strategy("paracetmol 650", "paracetamol 500"),
            Some(StrategyTag::NearFirstWord)
        );
    }

    #[test]
    fn test_prefix_match() {
        assert_eq!(match_strategy("azithromicin", "azithro"), Some(StrategyTag::Prefix));
        assert_eq!(match_strategy("dolo", "dolo-650"), Some(StrategyTag::FirstWord));
        assert_eq!(match_strategy("augmentin 625 duo", "augment"), Some(StrategyTag::Prefix));
    }

    #[test]
    fn test_normalized_near() {
        // First tokens differ, joined meaningful tokens agree
        assert_eq!(
            match_strategy("neuro bion forte", "neurobion forte"),
            Some(StrategyTag::NormalizedNear)
        );
    }

    #[test]
    fn test_partial_word() {
        assert_eq!(
            match_strategy("tab. cetirizine hcl", "levocetirizine"),
            Some(StrategyTag::PartialWord)
        );
        assert_eq!(
            match_strategy("crocin advance", "calpol advance"),
            Some(StrategyTag::PartialWord)
        );
    }

    #[test]
    fn test_phonetic() {
        // Two vowel slips: too far apart for edit checks, same skeleton
        assert_eq!(
            match_strategy("omiprazol", "omeprazole"),
            Some(StrategyTag::Phonetic)
        );
    }

    #[test]
    fn test_no_match() {
        assert_eq!(match_strategy("vitamin c tablets", "metformin"), None);
        assert_eq!(match_strategy("aspirin", "paracetamol"), None);
    }

    #[test]
    fn test_empty_or_tokenless_never_matches() {
        assert_eq!(match_strategy("", "crocin"), None);
        assert_eq!(match_strategy("crocin", "   "), None);
        assert_eq!(match_strategy("---", "---"), None);
        assert!(!is_admissible_match("", ""));
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(
            match_strategy("AZITHROMICIN", "Azithro"),
            match_strategy("azithromicin", "azithro")
        );
    }

    #[test]
    fn test_cascade_order_and_labels() {
        assert_eq!(StrategyTag::CASCADE[0], StrategyTag::Exact);
        assert_eq!(StrategyTag::CASCADE[6], StrategyTag::Phonetic);
        assert_eq!(StrategyTag::NearFirstWord.to_string(), "near first-word match");
        assert_eq!(
            serde_json::to_string(&StrategyTag::NormalizedNear).unwrap(),
            "\"normalized-near\""
        );
        for tag in StrategyTag::CASCADE {
            let json = serde_json::to_string(&tag).unwrap();
            assert_eq!(json.trim_matches('"'), tag.as_str());
        }
    }

    #[test]
    fn test_matcher_first_match_wins() {
        let matcher = Matcher::new(&["Metformin 500", "Pan 40", "Pantoprazole"]);
        let result = matcher.find_match("Pantoprazole 40mg");

        // "pan" is contained in "pantoprazole" and is listed before the exact drug
        assert_eq!(result.matched_prescription_name.as_deref(), Some("pan 40"));
        assert_eq!(result.strategy, Some(StrategyTag::PartialWord));
    }

    #[test]
    fn test_matcher_no_match() {
        let matcher = Matcher::new(&["Metformin"]);
        let result = matcher.find_match("Vitamin C Tablets");
        assert!(!result.is_match());
        assert_eq!(result, MatchResult::default());

        let empty: Vec<String> = Vec::new();
        assert!(!Matcher::new(&empty).find_match("crocin").is_match());
    }
}
