//! Domain models for claim adjudication.

mod adjudication;
mod bill;
mod claim;

pub use adjudication::*;
pub use bill::*;
pub use claim::*;
