//! Claim accumulator for multi-document submissions.

use serde::{Deserialize, Serialize};

use crate::adjudication::adjudicate_with_config;
use crate::config::AdjudicationConfig;
use crate::verification::{verify_claim, ClaimForm, Verification};

use super::{Adjudication, BillItem};

/// Prescriptions and bills uploaded for one claim.
///
/// A claim may span several prescriptions and several bills; they are
/// flattened in upload order before adjudication.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// Prescribed names, one list per prescription document
    pub prescriptions: Vec<Vec<String>>,
    /// Bill items, one list per bill document
    pub bills: Vec<Vec<BillItem>>,
    /// Claim form submitted with the documents; only the first one is kept
    #[serde(default)]
    pub claim_form: Option<ClaimForm>,
}

impl Claim {
    /// Create an empty claim.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the medicine names extracted from one prescription.
    pub fn add_prescription<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prescriptions
            .push(names.into_iter().map(Into::into).collect());
    }

    /// Add the line items extracted from one bill.
    pub fn add_bill(&mut self, items: Vec<BillItem>) {
        self.bills.push(items);
    }

    /// Attach a claim form. Returns `false` and keeps the existing form if
    /// one was already attached.
    pub fn attach_claim_form(&mut self, form: ClaimForm) -> bool {
        if self.claim_form.is_some() {
            return false;
        }
        self.claim_form = Some(form);
        true
    }

    /// All prescribed names, in upload order.
    pub fn prescribed_names(&self) -> Vec<&str> {
        self.prescriptions
            .iter()
            .flatten()
            .map(String::as_str)
            .collect()
    }

    /// All bill items, in upload order.
    pub fn bill_items(&self) -> Vec<BillItem> {
        self.bills.iter().flatten().cloned().collect()
    }

    /// Check whether both prescriptions and bills have been supplied.
    pub fn is_ready(&self) -> bool {
        !self.prescribed_names().is_empty() && !self.bill_items().is_empty()
    }

    /// Adjudicate the whole claim. The claim itself is not modified.
    pub fn adjudicate(&self, config: &AdjudicationConfig) -> Adjudication {
        adjudicate_with_config(&self.prescribed_names(), &self.bill_items(), config)
    }

    /// Adjudicate the claim and, when a claim form is attached, cross-verify
    /// it against the result.
    pub fn adjudicate_and_verify(
        &self,
        config: &AdjudicationConfig,
    ) -> (Adjudication, Option<Verification>) {
        let adjudication = self.adjudicate(config);
        let verification = self
            .claim_form
            .as_ref()
            .map(|form| verify_claim(form, &adjudication, config));
        (adjudication, verification)
    }
}
