//! Claim-form cross-verification.
//!
//! A claim form declares what the employee is asking for: a table of
//! treatments with amounts and, sometimes, a grand total. Verification
//! compares those declarations with the adjudicated bills.
//!
//! Checks, in order:
//!
//! | Check              | Discrepancy                   | Severity                     |
//! |--------------------|-------------------------------|------------------------------|
//! | Claimed vs admissible total | `AmountMismatch`     | High above 500, else Medium; Low when under-claimed |
//! | Each treatment row has a bill | `MissingSupportingDocument` | Medium              |
//! | Consultations claimed vs found | `MissingBills`      | High                         |
//! | Medicines claimed vs found | `MissingPrescriptions`   | Medium                       |

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::AdjudicationConfig;
use crate::models::{round_cents, sum_amounts, Adjudication, AdjudicationRow};

/// Difference between claimed and admissible totals treated as rounding.
pub const AMOUNT_TOLERANCE: Decimal = Decimal::ONE;

/// Over-claims above this difference are high severity.
pub const HIGH_SEVERITY_DIFFERENCE: Decimal = Decimal::from_parts(500, 0, 0, false, 0);

/// A treatment row matches a bill within this absolute difference...
pub const ITEM_AMOUNT_TOLERANCE: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// ...or within this fraction of the claimed amount (10%).
pub const ITEM_RATIO_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

/// Item matches closer than this are high confidence.
pub const HIGH_CONFIDENCE_DIFFERENCE: Decimal = Decimal::TEN;

/// Kind of treatment declared on a claim-form row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentType {
    Consultation,
    Medicine,
    Vaccination,
    Surgery,
    Diagnostic,
    Test,
}

impl TreatmentType {
    /// Keyword order used when a row mentions several types.
    pub const ALL: [TreatmentType; 6] = [
        TreatmentType::Consultation,
        TreatmentType::Medicine,
        TreatmentType::Vaccination,
        TreatmentType::Surgery,
        TreatmentType::Diagnostic,
        TreatmentType::Test,
    ];

    /// Upper-case keyword as written on claim forms.
    pub fn keyword(self) -> &'static str {
        match self {
            TreatmentType::Consultation => "CONSULTATION",
            TreatmentType::Medicine => "MEDICINE",
            TreatmentType::Vaccination => "VACCINATION",
            TreatmentType::Surgery => "SURGERY",
            TreatmentType::Diagnostic => "DIAGNOSTIC",
            TreatmentType::Test => "TEST",
        }
    }

    /// Find the first treatment keyword contained in `text`, ignoring case.
    pub fn detect(text: &str) -> Option<Self> {
        let upper = text.to_uppercase();
        Self::ALL.into_iter().find(|t| upper.contains(t.keyword()))
    }
}

impl fmt::Display for TreatmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One row of the claim form's treatment table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClaimedTreatment {
    /// Bill date as written (DD.MM.YYYY and similar)
    pub date: Option<String>,
    /// Relation of the patient to the employee (SELF, WIFE, SON, ...)
    pub relation: Option<String>,
    pub treatment_type: Option<TreatmentType>,
    pub amount: Decimal,
}

impl ClaimedTreatment {
    fn label(&self) -> String {
        self.treatment_type
            .map_or_else(|| "UNKNOWN".to_string(), |t| t.keyword().to_string())
    }
}

/// Declarations read from a reimbursement claim form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClaimForm {
    /// Claim number, if printed on the form
    pub claim_no: Option<String>,
    pub treatments: Vec<ClaimedTreatment>,
    /// Grand total printed on the form, if found
    pub declared_total: Option<Decimal>,
}

impl ClaimForm {
    /// Amount the employee claims: the treatment table's sum, or the
    /// printed total when the table could not be read.
    pub fn claimed_total(&self) -> Decimal {
        if self.treatments.is_empty() {
            return self.declared_total.unwrap_or_default();
        }
        round_cents(sum_amounts(self.treatments.iter().map(|t| t.amount)))
    }

    fn count(&self, treatment_type: TreatmentType) -> usize {
        self.treatments
            .iter()
            .filter(|t| t.treatment_type == Some(treatment_type))
            .count()
    }
}

/// Overall outcome of comparing the claimed total with the admissible total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Verified,
    OverClaimed,
    UnderClaimed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancyKind {
    AmountMismatch,
    MissingSupportingDocument,
    MissingBills,
    MissingPrescriptions,
}

/// A problem found while verifying a claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discrepancy {
    pub kind: DiscrepancyKind,
    pub severity: Severity,
    pub description: String,
    /// Amount involved, when the discrepancy is about money
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Medium,
    High,
}

/// A claim-form row backed by an admitted bill item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMatch {
    pub form_item: String,
    pub bill_item: String,
    pub confidence: Confidence,
}

/// Money figures compared during verification, rounded to cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub claimed: Decimal,
    pub billed: Decimal,
    pub admissible: Decimal,
    pub difference: Decimal,
    /// `difference / claimed * 100`, zero when nothing is claimed
    pub discrepancy_percentage: Decimal,
}

/// Result of cross-verifying a claim form against adjudicated bills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub status: VerificationStatus,
    pub summary: VerificationSummary,
    pub discrepancies: Vec<Discrepancy>,
    pub matches: Vec<ItemMatch>,
}

impl Verification {
    /// Check whether any discrepancy was found.
    pub fn has_discrepancies(&self) -> bool {
        !self.discrepancies.is_empty()
    }

    /// Highest severity among the discrepancies.
    pub fn max_severity(&self) -> Option<Severity> {
        self.discrepancies.iter().map(|d| d.severity).max()
    }
}

/// Cross-verify a claim form against an adjudication of its bills.
pub fn verify_claim(
    form: &ClaimForm,
    adjudication: &Adjudication,
    config: &AdjudicationConfig,
) -> Verification {
    let sym = config.currency_symbol.as_str();
    let claimed = form.claimed_total();
    let admissible = adjudication.totals.admissible;
    let difference = abs_diff(claimed, admissible);

    let summary = VerificationSummary {
        claimed: round_cents(claimed),
        billed: round_cents(adjudication.totals.total),
        admissible: round_cents(admissible),
        difference: round_cents(difference),
        discrepancy_percentage: percentage(difference, claimed),
    };

    let mut verification = Verification {
        status: VerificationStatus::Verified,
        summary,
        discrepancies: Vec::new(),
        matches: Vec::new(),
    };

    if difference > AMOUNT_TOLERANCE {
        let (status, severity, relation) = if claimed > admissible {
            let severity = if difference > HIGH_SEVERITY_DIFFERENCE {
                Severity::High
            } else {
                Severity::Medium
            };
            (VerificationStatus::OverClaimed, severity, "exceeds")
        } else {
            (VerificationStatus::UnderClaimed, Severity::Low, "is less than")
        };

        verification.status = status;
        verification.discrepancies.push(Discrepancy {
            kind: DiscrepancyKind::AmountMismatch,
            severity,
            description: format!(
                "Claimed amount ({sym}{claimed:.2}) {relation} admissible amount ({sym}{admissible:.2})"
            ),
            amount: Some(summary.difference),
        });
    }

    let admitted: Vec<&AdjudicationRow> = adjudication
        .rows
        .iter()
        .filter(|r| r.is_admissible())
        .collect();

    verify_treatments(form, &admitted, sym, &mut verification);
    check_supporting_documents(form, &admitted, &mut verification);

    tracing::debug!(
        status = ?verification.status,
        %claimed,
        %admissible,
        discrepancies = verification.discrepancies.len(),
        "Claim form verified"
    );

    verification
}

fn verify_treatments(
    form: &ClaimForm,
    admitted: &[&AdjudicationRow],
    sym: &str,
    verification: &mut Verification,
) {
    for treatment in &form.treatments {
        let label = treatment.label();
        let claimed = treatment.amount;

        let found = admitted.iter().find_map(|row| {
            let diff = abs_diff(claimed, row.billed_amount);
            item_amounts_agree(claimed, diff).then_some((row, diff))
        });

        match found {
            Some((row, diff)) => verification.matches.push(ItemMatch {
                form_item: format!("{label} - {sym}{claimed:.2}"),
                bill_item: format!("{} - {sym}{:.2}", row.bill_name, row.billed_amount),
                confidence: if diff <= HIGH_CONFIDENCE_DIFFERENCE {
                    Confidence::High
                } else {
                    Confidence::Medium
                },
            }),
            None if claimed > Decimal::ZERO => {
                verification.discrepancies.push(Discrepancy {
                    kind: DiscrepancyKind::MissingSupportingDocument,
                    severity: Severity::Medium,
                    description: format!(
                        "Claimed {label} ({sym}{claimed:.2}) on {} - no matching bill found",
                        treatment.date.as_deref().unwrap_or("unknown date")
                    ),
                    amount: Some(claimed),
                });
            }
            None => {}
        }
    }
}

fn check_supporting_documents(
    form: &ClaimForm,
    admitted: &[&AdjudicationRow],
    verification: &mut Verification,
) {
    let consultations_claimed = form.count(TreatmentType::Consultation);
    let medicines_claimed = form.count(TreatmentType::Medicine);
    let consultations_found = admitted.iter().filter(|r| r.is_consultation).count();
    let medicines_found = admitted.len() - consultations_found;

    if consultations_claimed > consultations_found {
        verification.discrepancies.push(Discrepancy {
            kind: DiscrepancyKind::MissingBills,
            severity: Severity::High,
            description: format!(
                "Claimed {consultations_claimed} consultations but found {consultations_found} consultation bills"
            ),
            amount: None,
        });
    }

    if medicines_claimed > medicines_found {
        verification.discrepancies.push(Discrepancy {
            kind: DiscrepancyKind::MissingPrescriptions,
            severity: Severity::Medium,
            description: format!(
                "Claimed {medicines_claimed} medicine purchases but found {medicines_found} medicine bills"
            ),
            amount: None,
        });
    }
}

fn abs_diff(a: Decimal, b: Decimal) -> Decimal {
    if a > b {
        a - b
    } else {
        b - a
    }
}

/// Within the absolute tolerance, or within 10% of a positive claimed amount.
fn item_amounts_agree(claimed: Decimal, diff: Decimal) -> bool {
    if diff <= ITEM_AMOUNT_TOLERANCE {
        return true;
    }
    claimed > Decimal::ZERO
        && claimed
            .checked_mul(ITEM_RATIO_TOLERANCE)
            .is_some_and(|limit| diff <= limit)
}

fn percentage(difference: Decimal, claimed: Decimal) -> Decimal {
    if claimed <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    difference
        .checked_div(claimed)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map_or(Decimal::MAX, round_cents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BillItem;
    use crate::adjudicate;
    use rust_decimal_macros::dec;

    fn treatment(treatment_type: TreatmentType, amount: Decimal) -> ClaimedTreatment {
        ClaimedTreatment {
            date: Some("12.03.2024".into()),
            relation: Some("SELF".into()),
            treatment_type: Some(treatment_type),
            amount,
        }
    }

    fn form(treatments: Vec<ClaimedTreatment>) -> ClaimForm {
        ClaimForm {
            treatments,
            ..ClaimForm::default()
        }
    }

    fn bills() -> Adjudication {
        adjudicate(
            &["Azithromycin 500"],
            &[
                BillItem::new("Doctor Consultation Fee", dec!(500)),
                BillItem::new("Azithromycin Tab", dec!(120)),
                BillItem::new("Face Mask", dec!(50)),
            ],
        )
    }

    struct StatusCase {
        id: &'static str,
        claimed: Decimal,
        expected_status: VerificationStatus,
        expected_severity: Option<Severity>,
    }

    #[test]
    fn test_amount_status_cases() {
        // Admissible total for `bills()` is 300 + 120 = 420.
        let cases = [
            StatusCase {
                id: "exact",
                claimed: dec!(420),
                expected_status: VerificationStatus::Verified,
                expected_severity: None,
            },
            StatusCase {
                id: "within-rupee",
                claimed: dec!(421),
                expected_status: VerificationStatus::Verified,
                expected_severity: None,
            },
            StatusCase {
                id: "over-medium",
                claimed: dec!(670),
                expected_status: VerificationStatus::OverClaimed,
                expected_severity: Some(Severity::Medium),
            },
            StatusCase {
                id: "over-high",
                claimed: dec!(1000),
                expected_status: VerificationStatus::OverClaimed,
                expected_severity: Some(Severity::High),
            },
            StatusCase {
                id: "under",
                claimed: dec!(400),
                expected_status: VerificationStatus::UnderClaimed,
                expected_severity: Some(Severity::Low),
            },
        ];

        let adjudication = bills();
        let config = AdjudicationConfig::default();

        for case in cases {
            let claim_form = ClaimForm {
                declared_total: Some(case.claimed),
                ..ClaimForm::default()
            };
            let result = verify_claim(&claim_form, &adjudication, &config);

            assert_eq!(result.status, case.expected_status, "Case {}: status", case.id);
            let amount_severity = result
                .discrepancies
                .iter()
                .find(|d| d.kind == DiscrepancyKind::AmountMismatch)
                .map(|d| d.severity);
            assert_eq!(amount_severity, case.expected_severity, "Case {}: severity", case.id);
        }
    }

    #[test]
    fn test_over_claim_description_and_summary() {
        let claim_form = form(vec![
            treatment(TreatmentType::Consultation, dec!(500)),
            treatment(TreatmentType::Medicine, dec!(120)),
        ]);
        let result = verify_claim(&claim_form, &bills(), &AdjudicationConfig::default());

        assert_eq!(result.status, VerificationStatus::OverClaimed);
        assert_eq!(result.summary.claimed, dec!(620));
        assert_eq!(result.summary.billed, dec!(670));
        assert_eq!(result.summary.admissible, dec!(420));
        assert_eq!(result.summary.difference, dec!(200));
        assert_eq!(result.summary.discrepancy_percentage, dec!(32.26));
        assert_eq!(
            result.discrepancies[0].description,
            "Claimed amount (₹620.00) exceeds admissible amount (₹420.00)"
        );
    }

    #[test]
    fn test_treatment_rows_matched_to_bills() {
        let claim_form = form(vec![
            treatment(TreatmentType::Consultation, dec!(500)),
            treatment(TreatmentType::Medicine, dec!(125)),
            treatment(TreatmentType::Vaccination, dec!(900)),
        ]);
        let result = verify_claim(&claim_form, &bills(), &AdjudicationConfig::default());

        assert_eq!(result.matches.len(), 2);
        assert_eq!(result.matches[0].form_item, "CONSULTATION - ₹500.00");
        assert_eq!(
            result.matches[0].bill_item,
            "Doctor Consultation Fee - ₹500.00"
        );
        assert_eq!(result.matches[0].confidence, Confidence::High);
        assert_eq!(result.matches[1].confidence, Confidence::High);

        let missing: Vec<_> = result
            .discrepancies
            .iter()
            .filter(|d| d.kind == DiscrepancyKind::MissingSupportingDocument)
            .collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(
            missing[0].description,
            "Claimed VACCINATION (₹900.00) on 12.03.2024 - no matching bill found"
        );
        assert_eq!(missing[0].amount, Some(dec!(900)));
    }

    #[test]
    fn test_item_tolerance() {
        assert!(item_amounts_agree(dec!(100), dec!(50)));
        assert!(item_amounts_agree(dec!(1000), dec!(100)));
        assert!(!item_amounts_agree(dec!(1000), dec!(101)));
        assert!(!item_amounts_agree(Decimal::ZERO, dec!(60)));
    }

    #[test]
    fn test_missing_consultation_and_medicine_bills() {
        let claim_form = form(vec![
            treatment(TreatmentType::Consultation, dec!(300)),
            treatment(TreatmentType::Consultation, dec!(300)),
            treatment(TreatmentType::Medicine, dec!(120)),
            treatment(TreatmentType::Medicine, dec!(80)),
        ]);
        let result = verify_claim(&claim_form, &bills(), &AdjudicationConfig::default());

        let bills_missing = result
            .discrepancies
            .iter()
            .find(|d| d.kind == DiscrepancyKind::MissingBills)
            .unwrap();
        assert_eq!(bills_missing.severity, Severity::High);
        assert_eq!(
            bills_missing.description,
            "Claimed 2 consultations but found 1 consultation bills"
        );

        let prescriptions_missing = result
            .discrepancies
            .iter()
            .find(|d| d.kind == DiscrepancyKind::MissingPrescriptions)
            .unwrap();
        assert_eq!(
            prescriptions_missing.description,
            "Claimed 2 medicine purchases but found 1 medicine bills"
        );
        assert_eq!(result.max_severity(), Some(Severity::High));
    }

    #[test]
    fn test_zero_claim_against_no_bills_is_verified() {
        let result = verify_claim(
            &ClaimForm::default(),
            &adjudicate::<&str>(&[], &[]),
            &AdjudicationConfig::default(),
        );
        assert_eq!(result.status, VerificationStatus::Verified);
        assert!(!result.has_discrepancies());
        assert_eq!(result.summary.discrepancy_percentage, Decimal::ZERO);
    }

    #[test]
    fn test_detect_treatment_type() {
        assert_eq!(
            TreatmentType::detect("Dr. Rao clinic consultation"),
            Some(TreatmentType::Consultation)
        );
        assert_eq!(
            TreatmentType::detect("MEDICINE / TEST"),
            Some(TreatmentType::Medicine)
        );
        assert_eq!(TreatmentType::detect("SELF CITY HOSPITAL"), None);
    }
}
