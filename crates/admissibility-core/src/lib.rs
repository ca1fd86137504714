//! Admissibility Core Library
//!
//! Reconciles prescribed medicines against billed line items and decides
//! which billed amounts are reimbursable.
//!
//! # Architecture
//!
//! ```text
//! Prescription names ──┐
//!                      ▼
//!   Bill item → Tokenizer → Matcher (strategy cascade) ──┐
//!           │                                           ▼
//!           └────────→ Consultation classifier ──→ Decision table
//!                                                       │
//!                                           ┌───────────▼───────────┐
//!                                           │  Rows + claim totals  │
//!                                           └───────────────────────┘
//! ```
//!
//! # Core Principle
//!
//! **Adjudication is a pure function of its inputs.** No global state, no I/O;
//! adjudicating the same lists twice yields identical results.
//!
//! # Modules
//!
//! - [`matcher`]: Tokenizer, similarity primitives and the strategy cascade
//! - [`consultation`]: Consultation-fee classifier
//! - [`adjudication`]: Per-item decisions and totals
//! - [`models`]: Domain types (BillItem, AdjudicationRow, ClaimTotals, Claim)
//! - [`config`]: Business constants (consultation cap, currency symbol)
//! - [`verification`]: Claim-form cross-verification against adjudicated bills

pub mod adjudication;
pub mod config;
pub mod consultation;
pub mod matcher;
pub mod models;
pub mod verification;

// Re-export commonly used types
pub use adjudication::{
    adjudicate, adjudicate_json, adjudicate_with_config, AdjudicationError, Adjudicator,
};
pub use config::{AdjudicationConfig, ConfigError};
pub use consultation::is_consultation_item;
pub use matcher::{is_admissible_match, match_strategy, MatchResult, Matcher, StrategyTag};
pub use models::{
    Adjudication, AdjudicationRow, AdmissionStatus, BillItem, Claim, ClaimSummary, ClaimTotals,
    Decision, DecisionKind, MappingEntry,
};
pub use rust_decimal::Decimal;
pub use verification::{
    verify_claim, ClaimForm, ClaimedTreatment, Discrepancy, DiscrepancyKind, Severity,
    TreatmentType, Verification, VerificationStatus,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use rust_decimal::prelude::ToPrimitive;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum AdmissibilityError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl From<AdjudicationError> for AdmissibilityError {
    fn from(e: AdjudicationError) -> Self {
        match e {
            AdjudicationError::InvalidArgument(msg) => AdmissibilityError::InvalidInput(msg),
            AdjudicationError::Json(e) => AdmissibilityError::SerializationError(e.to_string()),
        }
    }
}

impl From<ConfigError> for AdmissibilityError {
    fn from(e: ConfigError) -> Self {
        AdmissibilityError::ConfigurationError(e.to_string())
    }
}

impl From<serde_json::Error> for AdmissibilityError {
    fn from(e: serde_json::Error) -> Self {
        AdmissibilityError::SerializationError(e.to_string())
    }
}

// =========================================================================
// Functions (exported to FFI)
// =========================================================================

/// Adjudicate bill items against prescribed names.
///
/// `consultation_cap` overrides the default cap when given.
#[uniffi::export]
pub fn adjudicate_claim(
    prescribed_names: Vec<String>,
    bill_items: Vec<FfiBillItem>,
    consultation_cap: Option<f64>,
) -> Result<FfiAdjudication, AdmissibilityError> {
    let config = match consultation_cap {
        Some(cap) => {
            let cap = Decimal::try_from(cap)
                .map_err(|_| ConfigError::InvalidCap(cap.to_string()))?;
            AdjudicationConfig::with_cap(cap)?
        }
        None => AdjudicationConfig::default(),
    };

    let items: Vec<BillItem> = bill_items.into_iter().map(Into::into).collect();
    Ok(adjudicate_with_config(&prescribed_names, &items, &config).into())
}

/// Adjudicate from JSON arrays using configuration from the environment.
#[uniffi::export]
pub fn adjudicate_claim_json(
    prescribed_json: String,
    bill_json: String,
) -> Result<FfiAdjudication, AdmissibilityError> {
    let config = AdjudicationConfig::from_env()?;
    Ok(adjudicate_json(&prescribed_json, &bill_json, &config)?.into())
}

/// Adjudicate from JSON arrays and return the full result as JSON.
#[uniffi::export]
pub fn adjudicate_claim_to_json(
    prescribed_json: String,
    bill_json: String,
) -> Result<String, AdmissibilityError> {
    let config = AdjudicationConfig::from_env()?;
    Ok(adjudicate_json(&prescribed_json, &bill_json, &config)?.to_json()?)
}

/// Strategy tag matching a bill name to a prescribed name, if any.
#[uniffi::export]
pub fn match_bill_item(bill_name: String, prescribed_name: String) -> Option<String> {
    match_strategy(&bill_name, &prescribed_name).map(|s| s.as_str().to_string())
}

/// Check whether a bill item is a consultation charge.
#[uniffi::export]
pub fn is_consultation(bill_name: String) -> bool {
    is_consultation_item(&bill_name)
}

// =========================================================================
// FFI Types
// =========================================================================

fn to_f64(amount: Decimal) -> f64 {
    models::round_cents(amount).to_f64().unwrap_or_default()
}

fn to_u32(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// FFI-safe bill item.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBillItem {
    pub name: String,
    pub amount: f64,
}

impl From<FfiBillItem> for BillItem {
    fn from(item: FfiBillItem) -> Self {
        BillItem {
            name: item.name,
            amount: models::coerce_amount_f64(item.amount),
        }
    }
}

/// FFI-safe adjudicated row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAdjudicationRow {
    pub bill_name: String,
    pub billed_amount: f64,
    pub status: String,
    pub admissible_amount: f64,
    pub is_consultation: bool,
    pub decision: String,
    pub reason: String,
    pub matched_with: Option<String>,
    pub matched_by: Option<String>,
}

impl From<AdjudicationRow> for FfiAdjudicationRow {
    fn from(row: AdjudicationRow) -> Self {
        Self {
            bill_name: row.bill_name,
            billed_amount: to_f64(row.billed_amount),
            status: format!("{:?}", row.status),
            admissible_amount: to_f64(row.admissible_amount),
            is_consultation: row.is_consultation,
            decision: format!("{:?}", row.decision.kind()),
            reason: row.reason,
            matched_with: row.matched_with,
            matched_by: row.matched_by.map(|s| s.as_str().to_string()),
        }
    }
}

/// FFI-safe claim totals and summary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiClaimTotals {
    pub total: f64,
    pub admissible: f64,
    pub inadmissible: f64,
    pub admissible_count: u32,
    pub inadmissible_count: u32,
    pub consultation_excess: f64,
}

/// FFI-safe adjudication result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAdjudication {
    pub rows: Vec<FfiAdjudicationRow>,
    pub totals: FfiClaimTotals,
}

impl From<Adjudication> for FfiAdjudication {
    fn from(result: Adjudication) -> Self {
        let totals = FfiClaimTotals {
            total: to_f64(result.totals.total),
            admissible: to_f64(result.totals.admissible),
            inadmissible: to_f64(result.totals.inadmissible),
            admissible_count: to_u32(result.summary.admissible_count),
            inadmissible_count: to_u32(result.summary.inadmissible_count),
            consultation_excess: to_f64(result.summary.consultation_excess),
        };

        Self {
            rows: result.rows.into_iter().map(Into::into).collect(),
            totals,
        }
    }
}
