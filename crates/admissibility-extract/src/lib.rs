//! Extraction-response parsing for claim adjudication.
//!
//! Prescription and bill images are read by an external OCR/LLM service.
//! This crate turns its JSON responses into the inputs expected by
//! `admissibility-core`, including the declarations read from claim forms.

pub mod claim_form;
pub mod extraction;

pub use claim_form::{looks_like_claim_form, parse_claim_form_text};
pub use extraction::*;
