//! Parsing of document-extraction responses.
//!
//! The extraction service returns one JSON object per uploaded image,
//! sometimes wrapped in prose or a markdown code fence.

use admissibility_core::models::coerce_amount;
use admissibility_core::{BillItem, Claim, ClaimForm};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::claim_form::parse_claim_form_text;

/// Extraction errors.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid response format: {0}")]
    InvalidFormat(String),
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Kind of document the extraction service recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    ClaimForm,
    Prescription,
    Bill,
    TestReport,
    ConsultationReceipt,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Structured output of one extraction call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractionOutput {
    #[serde(rename = "type")]
    pub document_type: DocumentType,
    pub raw_text: String,
    pub prescription_names: Vec<Value>,
    pub test_names: Vec<Value>,
    pub bill_items: Vec<ExtractedBillItem>,
}

/// A bill line as returned by the extraction service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractedBillItem {
    pub name: Option<String>,
    /// Raw amount; may be a number, a string or null
    pub amount: Value,
    pub is_consultation: bool,
    pub is_test: bool,
}

/// Parse extraction service output into structured form.
pub fn parse_extraction_output(response: &str) -> ExtractionResult<ExtractionOutput> {
    // Try to find JSON in the response (in case the model adds extra text)
    let json_start = response.find('{').ok_or_else(|| {
        ExtractionError::InvalidFormat("No JSON object found in response".into())
    })?;
    let json_end = response.rfind('}').ok_or_else(|| {
        ExtractionError::InvalidFormat("No closing brace found in response".into())
    })?;
    if json_end < json_start {
        return Err(ExtractionError::InvalidFormat(
            "Closing brace precedes opening brace".into(),
        ));
    }

    let output: ExtractionOutput = serde_json::from_str(&response[json_start..=json_end])?;
    tracing::debug!(
        document_type = ?output.document_type,
        prescriptions = output.prescription_names.len(),
        bill_items = output.bill_items.len(),
        "Parsed extraction output"
    );

    Ok(output)
}

impl ExtractionOutput {
    /// Prescribed medicine names, trimmed, non-string and blank entries dropped.
    pub fn prescribed_names(&self) -> Vec<String> {
        self.prescription_names
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Bill items in core form, amounts coerced. Names are kept as written;
    /// blank ones are skipped later by the adjudicator.
    pub fn bill_items(&self) -> Vec<BillItem> {
        self.bill_items
            .iter()
            .map(|item| BillItem {
                name: item.name.clone().unwrap_or_default(),
                amount: coerce_amount(&item.amount),
            })
            .collect()
    }

    /// Claim-form declarations, when this document is a claim form whose
    /// text could be read.
    pub fn claim_form(&self) -> Option<ClaimForm> {
        if self.document_type != DocumentType::ClaimForm || self.raw_text.trim().is_empty() {
            return None;
        }
        parse_claim_form_text(&self.raw_text)
    }

    /// Merge this document into a claim: prescribed names become a
    /// prescription, bill lines become a bill, and the first claim form is
    /// attached. Empty lists are not added.
    pub fn add_to_claim(&self, claim: &mut Claim) {
        let names = self.prescribed_names();
        if !names.is_empty() {
            claim.add_prescription(names);
        }

        let items = self.bill_items();
        if !items.is_empty() {
            claim.add_bill(items);
        }

        if let Some(form) = self.claim_form() {
            if !claim.attach_claim_form(form) {
                tracing::debug!("Additional claim form ignored");
            }
        }
    }
}

/// Build a claim from several extraction responses, in upload order.
///
/// Fails on the first response that cannot be parsed.
pub fn claim_from_responses<I, S>(responses: I) -> ExtractionResult<Claim>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut claim = Claim::new();
    for response in responses {
        parse_extraction_output(response.as_ref())?.add_to_claim(&mut claim);
    }
    Ok(claim)
}
