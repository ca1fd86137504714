//! Reading reimbursement claim forms from OCR text.
//!
//! The extraction service only classifies a page as `claim_form` and returns
//! its raw text; the treatment table and declared total are recovered here.

use std::str::FromStr;
use std::sync::LazyLock;

use admissibility_core::models::coerce_amount;
use admissibility_core::{ClaimForm, ClaimedTreatment, Decimal, TreatmentType};
use regex::Regex;
use serde_json::Value;

/// Phrases that identify a reimbursement claim form.
const FORM_INDICATORS: &[&str] = &[
    "claim format",
    "reimbursement",
    "employee no",
    "claim no",
    "hospitalized from date",
    "treatment received",
    "details of treatment",
    "declaration by",
];

/// Table header fragments; rows containing them are skipped.
const HEADER_MARKERS: &[&str] = &["s.no", "bill date", "name of patient", "relation"];

const RELATIONS: &[&str] = &[
    "SELF", "WIFE", "HUSBAND", "SON", "DAUGHTER", "FATHER", "MOTHER",
];

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(e) => {
            tracing::error!(pattern, error = %e, "Invalid claim form pattern");
            None
        }
    }
}

static DATE: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"(\d{2}[./-]\d{2}[./-]\d{4})"));

static TRAILING_AMOUNT: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"(\d[\d,]*(?:\.\d{2})?)\s*$"));

static CLAIM_NO: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"(?i)claim\s*no[:.]?\s*(\d+)"));

/// Declared-total patterns, most specific first.
static DECLARED_TOTAL: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)amount\s*in\s*rupees[:\s]*(?:rs\.?|₹)?\s*([\d,]+(?:\.\d{2})?)",
        r"(?i)total[:\s]*(?:rs\.?|₹)?\s*([\d,]+(?:\.\d{2})?)",
    ]
    .into_iter()
    .filter_map(compile)
    .collect()
});

/// Check whether OCR text looks like a reimbursement claim form.
pub fn looks_like_claim_form(text: &str) -> bool {
    let lower = text.to_lowercase();
    FORM_INDICATORS.iter().any(|i| lower.contains(i))
}

/// Parse claim-form OCR text. Returns `None` when the text is not a claim
/// form.
pub fn parse_claim_form_text(text: &str) -> Option<ClaimForm> {
    if !looks_like_claim_form(text) {
        return None;
    }

    let treatments: Vec<ClaimedTreatment> = text.lines().filter_map(parse_treatment_row).collect();
    let claim_no = CLAIM_NO
        .as_ref()
        .and_then(|re| re.captures(text))
        .map(|caps| caps[1].to_string());
    let declared_total = DECLARED_TOTAL
        .iter()
        .filter_map(|re| re.captures(text))
        .find_map(|caps| parse_amount(&caps[1]));

    tracing::debug!(
        treatments = treatments.len(),
        declared_total = ?declared_total,
        "Parsed claim form"
    );

    Some(ClaimForm {
        claim_no,
        treatments,
        declared_total,
    })
}

/// Parse one treatment-table row: a date, free text, and a trailing amount.
pub fn parse_treatment_row(line: &str) -> Option<ClaimedTreatment> {
    let lower = line.to_lowercase();
    if HEADER_MARKERS.iter().any(|h| lower.contains(h)) {
        return None;
    }

    let date = DATE.as_ref()?.find(line)?;
    let amount = TRAILING_AMOUNT.as_ref()?.captures(line)?.get(1)?;
    if amount.start() < date.end() {
        return None;
    }

    let middle = line.get(date.end()..amount.start()).unwrap_or_default();
    let upper = middle.to_uppercase();
    let words: Vec<&str> = upper
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    Some(ClaimedTreatment {
        date: Some(date.as_str().to_string()),
        relation: RELATIONS
            .iter()
            .find(|r| words.contains(*r))
            .map(|r| r.to_string()),
        treatment_type: TreatmentType::detect(middle),
        amount: parse_amount(amount.as_str())?,
    })
}

fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()?;
    Some(coerce_amount(&Value::String(cleaned)))
}
