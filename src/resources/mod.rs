//! Resource model module.
//!
//! This module holds the thin schema layer the rest of the crate works
//! against: the [`FhirResource`] trait that user-defined resource types
//! implement, the type-erased [`AnyResource`] body that flows through
//! negotiation and composition, and the two wire envelopes the protocol
//! defines (`Bundle` for search results, `OperationOutcome` for errors).
//!
//! Field-level profile validation is out of scope; serde's structural
//! checks are the only validation performed here.

mod bundle;
mod model;
mod outcome;

pub use bundle::Bundle;
pub use model::{AnyResource, FhirResource, ResourceError};
pub use outcome::{IssueSeverity, OperationOutcome, OutcomeIssue};
