//! Consultation-fee detection.
//!
//! A bill line counts as a professional fee when it carries a strong fee
//! phrase, a "consult..." word, or an actor word (doctor, opd, visit, ...)
//! together with the word "fee". Drug names that only resemble fee wording
//! must not trigger the consultation cap.

use crate::matcher::{is_stopword, tokenize};

/// Phrases that alone mark a consultation charge.
pub const CONSULTATION_PHRASES: &[&str] = &[
    "consultation fee",
    "doctor fee",
    "physician fee",
    "specialist fee",
    "opd fee",
    "outpatient fee",
    "emergency fee",
    "visit fee",
];

/// Words naming who or what is being paid for; only count alongside "fee".
pub const CONSULTATION_ACTORS: &[&str] = &[
    "doctor",
    "physician",
    "specialist",
    "opd",
    "outpatient",
    "emergency",
    "visit",
    "checkup",
];

/// Root shared by consult, consultation, consulting, consultant.
const CONSULT_ROOT: &str = "consult";

/// Shortest token considered by the word-level checks.
const MIN_CONSULTATION_TOKEN_LEN: usize = 4;

/// Check whether a bill item is a consultation-type charge.
pub fn is_consultation_item(bill_name: &str) -> bool {
    let text = bill_name.trim().to_lowercase();
    if text.is_empty() {
        return false;
    }

    if CONSULTATION_PHRASES.iter().any(|p| text.contains(p)) {
        return true;
    }

    let tokens = tokenize(&text);
    let meaningful: Vec<&str> = tokens
        .iter()
        .map(String::as_str)
        .filter(|t| t.len() >= MIN_CONSULTATION_TOKEN_LEN && !is_stopword(t))
        .collect();

    if meaningful.iter().any(|t| t.starts_with(CONSULT_ROOT)) {
        return true;
    }

    let has_actor = meaningful.iter().any(|t| CONSULTATION_ACTORS.contains(t));
    let has_fee = tokens.iter().any(|t| t == "fee");
    has_actor && has_fee
}
