//! Claim validation against ground truth.
//!
//! Every claim type has exactly one rule. Relationship claims pass when the
//! matching test is significant and agrees on direction; descriptive claims
//! pass when the claimed value is within tolerance of the statistic. Anything
//! that cannot be checked is UNVERIFIED, never guessed.

mod validator;
mod verdict;

pub use validator::{ClaimValidator, CorrelationMethod, DescriptiveGate, ValidationConfig};
pub use verdict::{ValidatedClaim, Verdict, VerdictReason};
