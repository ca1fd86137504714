//! Adjudication results: per-item decisions and claim totals.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::matcher::StrategyTag;

use super::sum_amounts;

/// Whether a billed amount is reimbursable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionStatus {
    Admissible,
    Inadmissible,
}

/// Discriminant of a [`Decision`], for filtering without matching payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    ConsultationCapped,
    ConsultationWithinLimit,
    PrescriptionMatch,
    NoMatch,
}

/// Why a bill item was admitted or rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decision {
    /// Consultation charge above the cap; only the cap is admissible
    ConsultationCapped { original: Decimal, cap: Decimal },
    /// Consultation charge at or below the cap
    ConsultationWithinLimit,
    /// Attributed to a prescribed medicine
    PrescriptionMatch {
        matched_with: String,
        strategy: StrategyTag,
    },
    /// Neither a consultation nor a prescribed medicine
    NoMatch,
}

impl Decision {
    /// Get the fieldless kind of this decision.
    pub fn kind(&self) -> DecisionKind {
        match self {
            Decision::ConsultationCapped { .. } => DecisionKind::ConsultationCapped,
            Decision::ConsultationWithinLimit => DecisionKind::ConsultationWithinLimit,
            Decision::PrescriptionMatch { .. } => DecisionKind::PrescriptionMatch,
            Decision::NoMatch => DecisionKind::NoMatch,
        }
    }

    /// Status implied by this decision.
    pub fn status(&self) -> AdmissionStatus {
        match self {
            Decision::NoMatch => AdmissionStatus::Inadmissible,
            _ => AdmissionStatus::Admissible,
        }
    }

    /// Render the human-readable reason shown next to a bill item.
    pub fn reason(&self, bill_name: &str, currency_symbol: &str) -> String {
        match self {
            Decision::ConsultationCapped { original, cap } => format!(
                "Consultation limited to {currency_symbol}{} (original: {currency_symbol}{})",
                cap.normalize(),
                original.normalize()
            ),
            Decision::ConsultationWithinLimit => "Consultation fee (within limit)".to_string(),
            Decision::PrescriptionMatch {
                matched_with,
                strategy,
            } => format!("Matches prescription: \"{matched_with}\" via {strategy}"),
            Decision::NoMatch => format!("No prescription match for \"{bill_name}\""),
        }
    }
}

/// Adjudicated bill line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjudicationRow {
    /// Bill item name as submitted
    pub bill_name: String,
    /// Amount on the bill (after coercion)
    pub billed_amount: Decimal,
    /// Admissible / Inadmissible
    pub status: AdmissionStatus,
    /// Reimbursable portion, `0 <= admissible_amount <= billed_amount`
    pub admissible_amount: Decimal,
    /// Whether the item was classified as a consultation charge
    pub is_consultation: bool,
    /// Structured decision
    pub decision: Decision,
    /// Display text for the decision
    pub reason: String,
    /// Prescribed name (lowercased) the item matched, if any
    pub matched_with: Option<String>,
    /// Strategy that matched, if any
    pub matched_by: Option<StrategyTag>,
}

impl AdjudicationRow {
    /// Check whether the row is admissible.
    pub fn is_admissible(&self) -> bool {
        self.status == AdmissionStatus::Admissible
    }

    /// Billed amount that is not reimbursed.
    pub fn disallowed_amount(&self) -> Decimal {
        self.billed_amount - self.admissible_amount
    }
}

/// Claim-level money totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimTotals {
    /// Sum of billed amounts
    pub total: Decimal,
    /// Sum of admissible amounts over admissible rows
    pub admissible: Decimal,
    /// `total - admissible`
    pub inadmissible: Decimal,
}

impl ClaimTotals {
    /// Compute totals from adjudicated rows.
    pub fn from_rows(rows: &[AdjudicationRow]) -> Self {
        let total = sum_amounts(rows.iter().map(|r| r.billed_amount));
        let admissible = sum_amounts(
            rows.iter()
                .filter(|r| r.is_admissible())
                .map(|r| r.admissible_amount),
        );

        Self {
            total,
            admissible,
            inadmissible: total - admissible,
        }
    }
}

/// Row counts and consultation adjustments for a claim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSummary {
    pub admissible_count: usize,
    pub inadmissible_count: usize,
    pub consultation_count: usize,
    /// Amount cut from consultation charges by the cap
    pub consultation_excess: Decimal,
    /// Bill items dropped for having a blank name
    pub skipped_count: usize,
}

/// One line of the prescription-term to bill-item mapping view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub prescription_term: Option<String>,
    pub strategy: Option<StrategyTag>,
    pub bill_item: String,
}

/// Full result of one adjudication pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjudication {
    pub rows: Vec<AdjudicationRow>,
    pub totals: ClaimTotals,
    pub summary: ClaimSummary,
}

impl Adjudication {
    /// Prescription-term to bill-item mapping, one entry per row.
    pub fn mapping(&self) -> Vec<MappingEntry> {
        self.rows
            .iter()
            .map(|r| MappingEntry {
                prescription_term: r.matched_with.clone(),
                strategy: r.matched_by,
                bill_item: r.bill_name.clone(),
            })
            .collect()
    }

    /// Rows with the given status, in bill order.
    pub fn rows_with_status(
        &self,
        status: AdmissionStatus,
    ) -> impl Iterator<Item = &AdjudicationRow> + '_ {
        self.rows.iter().filter(move |r| r.status == status)
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(name: &str, billed: Decimal, decision: Decision, admissible: Decimal) -> AdjudicationRow {
        AdjudicationRow {
            bill_name: name.into(),
            billed_amount: billed,
            status: decision.status(),
            admissible_amount: admissible,
            is_consultation: matches!(
                decision.kind(),
                DecisionKind::ConsultationCapped | DecisionKind::ConsultationWithinLimit
            ),
            reason: decision.reason(name, "₹"),
            matched_with: None,
            matched_by: None,
            decision,
        }
    }

    #[test]
    fn test_reason_texts() {
        let capped = Decision::ConsultationCapped {
            original: dec!(500),
            cap: dec!(300),
        };
        assert_eq!(
            capped.reason("Doctor Consultation Fee", "₹"),
            "Consultation limited to ₹300 (original: ₹500)"
        );
        assert_eq!(
            Decision::ConsultationWithinLimit.reason("OPD fee", "₹"),
            "Consultation fee (within limit)"
        );

        let matched = Decision::PrescriptionMatch {
            matched_with: "azithromycin 500".into(),
            strategy: StrategyTag::FirstWord,
        };
        assert_eq!(
            matched.reason("Azithromycin Tab", "₹"),
            "Matches prescription: \"azithromycin 500\" via first word match"
        );
        assert_eq!(
            Decision::NoMatch.reason("Vitamin C Tablets", "₹"),
            "No prescription match for \"Vitamin C Tablets\""
        );
    }

    #[test]
    fn test_reason_without_currency_symbol() {
        let capped = Decision::ConsultationCapped {
            original: dec!(450.5),
            cap: dec!(300),
        };
        assert_eq!(capped.reason("x", ""), "Consultation limited to 300 (original: 450.5)");
    }

    #[test]
    fn test_reason_ignores_amount_scale() {
        let capped = Decision::ConsultationCapped {
            original: dec!(500.00),
            cap: dec!(300.0),
        };
        assert_eq!(
            capped.reason("Doctor Fee", "₹"),
            "Consultation limited to ₹300 (original: ₹500)"
        );
    }

    #[test]
    fn test_totals_saturate_instead_of_overflowing() {
        let rows = vec![
            row("Gauze", Decimal::MAX, Decision::NoMatch, Decimal::ZERO),
            row("Mask", Decimal::MAX, Decision::NoMatch, Decimal::ZERO),
        ];

        let totals = ClaimTotals::from_rows(&rows);
        assert_eq!(totals.total, Decimal::MAX);
        assert_eq!(totals.admissible, Decimal::ZERO);
        assert_eq!(totals.inadmissible, Decimal::MAX);
    }

    #[test]
    fn test_decision_status_and_kind() {
        assert_eq!(Decision::NoMatch.status(), AdmissionStatus::Inadmissible);
        assert_eq!(
            Decision::ConsultationWithinLimit.status(),
            AdmissionStatus::Admissible
        );
        assert_eq!(Decision::NoMatch.kind(), DecisionKind::NoMatch);
    }

    #[test]
    fn test_totals_from_rows() {
        let rows = vec![
            row(
                "Consultation",
                dec!(500),
                Decision::ConsultationCapped {
                    original: dec!(500),
                    cap: dec!(300),
                },
                dec!(300),
            ),
            row("Vitamin C", dec!(200.25), Decision::NoMatch, Decimal::ZERO),
        ];

        let totals = ClaimTotals::from_rows(&rows);
        assert_eq!(totals.total, dec!(700.25));
        assert_eq!(totals.admissible, dec!(300));
        assert_eq!(totals.inadmissible, dec!(400.25));
        assert_eq!(rows[0].disallowed_amount(), dec!(200));
    }

    #[test]
    fn test_decision_serializes_tagged() {
        let json = serde_json::to_value(Decision::PrescriptionMatch {
            matched_with: "crocin".into(),
            strategy: StrategyTag::Exact,
        })
        .unwrap();
        assert_eq!(json["kind"], "prescription_match");
        assert_eq!(json["strategy"], "exact");
    }
}
