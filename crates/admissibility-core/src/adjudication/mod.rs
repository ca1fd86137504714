//! Claim adjudication.
//!
//! Pipeline per bill item: Skip blank names → Prescription matching →
//! Consultation classification → Decision → Totals

use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;

use crate::config::AdjudicationConfig;
use crate::consultation::is_consultation_item;
use crate::matcher::{MatchResult, Matcher, StrategyTag};
use crate::models::{
    coerce_amount, sum_amounts, Adjudication, AdjudicationRow, BillItem, ClaimSummary, ClaimTotals,
    Decision,
};

/// Adjudication errors.
#[derive(Error, Debug)]
pub enum AdjudicationError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type AdjudicationResult<T> = Result<T, AdjudicationError>;

/// Adjudicator bound to one prescription list.
///
/// Holds no mutable state; the same adjudicator may be shared across threads
/// and reused for any number of bills.
#[derive(Debug, Clone)]
pub struct Adjudicator {
    config: AdjudicationConfig,
    matcher: Matcher,
}

impl Adjudicator {
    /// Create an adjudicator with the default configuration.
    pub fn new<S: AsRef<str>>(prescribed_names: &[S]) -> Self {
        Self::with_config(prescribed_names, AdjudicationConfig::default())
    }

    /// Create an adjudicator with a custom configuration.
    pub fn with_config<S: AsRef<str>>(prescribed_names: &[S], config: AdjudicationConfig) -> Self {
        Self {
            config,
            matcher: Matcher::new(prescribed_names),
        }
    }

    /// Adjudicate every bill item and aggregate totals.
    ///
    /// Items with a blank name are skipped. Inputs are only read.
    pub fn adjudicate(&self, bill_items: &[BillItem]) -> Adjudication {
        let rows: Vec<AdjudicationRow> = bill_items
            .iter()
            .filter(|item| item.has_name())
            .map(|item| self.adjudicate_item(item))
            .collect();

        let totals = ClaimTotals::from_rows(&rows);
        let summary = summarize(&rows, bill_items.len() - rows.len());

        tracing::info!(
            rows = rows.len(),
            skipped = summary.skipped_count,
            admissible = %totals.admissible,
            inadmissible = %totals.inadmissible,
            "Adjudicated bill items"
        );

        Adjudication {
            rows,
            totals,
            summary,
        }
    }

    /// Adjudicate a single bill item.
    pub fn adjudicate_item(&self, item: &BillItem) -> AdjudicationRow {
        let MatchResult {
            matched_prescription_name: matched_with,
            strategy: matched_by,
        } = self.matcher.find_match(&item.name);

        let is_consultation = is_consultation_item(&item.name);
        let decision = self.decide(item, is_consultation, &matched_with, matched_by);
        let admissible_amount = match &decision {
            Decision::ConsultationCapped { cap, .. } => *cap,
            Decision::NoMatch => Decimal::ZERO,
            _ => item.amount,
        };

        tracing::trace!(
            bill = %item.name,
            kind = ?decision.kind(),
            admissible = %admissible_amount,
            "Bill item decided"
        );

        AdjudicationRow {
            bill_name: item.name.clone(),
            billed_amount: item.amount,
            status: decision.status(),
            admissible_amount,
            is_consultation,
            reason: decision.reason(&item.name, &self.config.currency_symbol),
            decision,
            matched_with,
            matched_by,
        }
    }

    fn decide(
        &self,
        item: &BillItem,
        is_consultation: bool,
        matched_with: &Option<String>,
        matched_by: Option<StrategyTag>,
    ) -> Decision {
        let cap = self.config.consultation_cap;

        if is_consultation {
            tracing::debug!(bill = %item.name, amount = %item.amount, "Consultation item detected");
            if item.amount > cap {
                tracing::debug!(bill = %item.name, amount = %item.amount, %cap, "Consultation fee capped");
                return Decision::ConsultationCapped {
                    original: item.amount,
                    cap,
                };
            }
            return Decision::ConsultationWithinLimit;
        }

        match (matched_with, matched_by) {
            (Some(name), Some(strategy)) => Decision::PrescriptionMatch {
                matched_with: name.clone(),
                strategy,
            },
            _ => Decision::NoMatch,
        }
    }

    /// Get the configuration in use.
    pub fn config(&self) -> &AdjudicationConfig {
        &self.config
    }

    /// Get the matcher for direct access.
    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }
}

fn summarize(rows: &[AdjudicationRow], skipped_count: usize) -> ClaimSummary {
    let mut summary = ClaimSummary {
        skipped_count,
        ..ClaimSummary::default()
    };

    for row in rows {
        if row.is_admissible() {
            summary.admissible_count += 1;
        } else {
            summary.inadmissible_count += 1;
        }
        if row.is_consultation {
            summary.consultation_count += 1;
            summary.consultation_excess =
                sum_amounts([summary.consultation_excess, row.disallowed_amount()]);
        }
    }

    summary
}

/// Adjudicate bill items against prescribed names with the default
/// configuration.
pub fn adjudicate<S: AsRef<str>>(prescribed_names: &[S], bill_items: &[BillItem]) -> Adjudication {
    Adjudicator::new(prescribed_names).adjudicate(bill_items)
}

/// Adjudicate with a custom configuration.
pub fn adjudicate_with_config<S: AsRef<str>>(
    prescribed_names: &[S],
    bill_items: &[BillItem],
    config: &AdjudicationConfig,
) -> Adjudication {
    Adjudicator::with_config(prescribed_names, config.clone()).adjudicate(bill_items)
}

/// Adjudicate from JSON documents.
///
/// `prescribed_json` must be an array of strings (nulls are ignored);
/// `bill_json` must be an array of `{ "name", "amount" }` objects. Amounts
/// are coerced leniently; any other shape is an
/// [`AdjudicationError::InvalidArgument`].
pub fn adjudicate_json(
    prescribed_json: &str,
    bill_json: &str,
    config: &AdjudicationConfig,
) -> AdjudicationResult<Adjudication> {
    let prescribed = parse_prescribed_names(&serde_json::from_str(prescribed_json)?)?;
    let bill_items = parse_bill_items(&serde_json::from_str(bill_json)?)?;
    Ok(adjudicate_with_config(&prescribed, &bill_items, config))
}

/// Validate and convert a JSON array of prescribed names.
pub fn parse_prescribed_names(value: &Value) -> AdjudicationResult<Vec<String>> {
    let entries = value.as_array().ok_or_else(|| {
        AdjudicationError::InvalidArgument("prescribed names must be an array".into())
    })?;

    let mut names = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        match entry {
            Value::String(name) => names.push(name.clone()),
            Value::Null => {}
            other => {
                return Err(AdjudicationError::InvalidArgument(format!(
                    "prescribed name at index {index} is not a string: {other}"
                )))
            }
        }
    }
    Ok(names)
}

/// Validate and convert a JSON array of bill items.
pub fn parse_bill_items(value: &Value) -> AdjudicationResult<Vec<BillItem>> {
    let entries = value
        .as_array()
        .ok_or_else(|| AdjudicationError::InvalidArgument("bill items must be an array".into()))?;

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let object = entry.as_object().ok_or_else(|| {
                AdjudicationError::InvalidArgument(format!(
                    "bill item at index {index} is not an object"
                ))
            })?;

            let name = match object.get("name") {
                Some(Value::String(name)) => name.clone(),
                _ => String::new(),
            };
            let amount = object.get("amount").map(coerce_amount).unwrap_or_default();
            Ok(BillItem { name, amount })
        })
        .collect()
}
