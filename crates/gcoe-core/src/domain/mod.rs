//! Domain records for GCOE.
//!
//! - `BusinessProfile`: immutable request input
//! - `JurisdictionId` / `JurisdictionPair`: identifiers
//! - `Assessment` / `JurisdictionResult`: per-jurisdiction outcomes
//! - `RequestError`: the boundary validation taxonomy

pub mod error;
pub mod jurisdiction;
pub mod profile;
pub mod result;

pub use error::{RequestError, RequestResult};
pub use jurisdiction::{JurisdictionId, JurisdictionPair};
pub use profile::{BusinessProfile, BusinessType, DEFAULT_PROFIT_MARGIN};
pub use result::{clamp_unit, Assessment, ExecutionStatus, FailureReason, JurisdictionResult};
