//! FHIR wire/boundary support for CareWatch.
//!
//! This crate provides **wire models** and **translation helpers** for the FHIR R4 JSON resources
//! the risk and schedule engines read:
//! - `Encounter` (class, type codes, period start, reason)
//! - `Condition` (display label)
//! - `MedicationRequest` (medication name, dosage text, dosage `Timing`)
//! - searchset `Bundle`s holding any mix of the above
//!
//! This crate focuses on:
//! - serialisation/deserialisation of the subset of elements the core reads
//! - translation from wire structs into flat domain-level carriers
//!
//! Unlike a strict on-disk format, these models accept unknown keys: FHIR servers return many
//! more elements than are read here. Individual unparseable values (timestamps, clock times)
//! become "absent" instead of failing the whole resource.

pub mod bundle;
mod codeable;
pub mod condition;
pub mod encounter;
pub mod medication;
pub mod timing;

// Re-export facades
pub use bundle::Bundle;
pub use condition::Condition;
pub use encounter::Encounter;
pub use medication::MedicationRequest;
pub use timing::Timing;

// Re-export public domain-level types
pub use bundle::ClinicalHistory;
pub use condition::ConditionData;
pub use encounter::EncounterData;
pub use medication::{DosageData, MedicationData};
pub use timing::TimingData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;

/// Deserialize JSON text into a wire struct, reporting the failing path on mismatch.
pub(crate) fn from_json_str<T: DeserializeOwned>(json_text: &str, what: &str) -> FhirResult<T> {
    let mut deserializer = serde_json::Deserializer::from_str(json_text);
    serde_path_to_error::deserialize::<_, T>(&mut deserializer)
        .map_err(|err| schema_mismatch(what, err))
}

/// Deserialize an already-parsed JSON value into a wire struct.
pub(crate) fn from_json_value<T: DeserializeOwned>(
    value: &serde_json::Value,
    what: &str,
) -> FhirResult<T> {
    serde_path_to_error::deserialize::<_, T>(value).map_err(|err| schema_mismatch(what, err))
}

fn schema_mismatch(what: &str, err: serde_path_to_error::Error<serde_json::Error>) -> FhirError {
    let path = err.path().to_string();
    let source = err.into_inner();
    let path = if path.is_empty() || path == "." {
        "<root>"
    } else {
        path.as_str()
    };
    FhirError::Translation(format!("{what} schema mismatch at {path}: {source}"))
}

/// Reject a resource whose `resourceType` is present and names something else.
pub(crate) fn check_resource_type(found: Option<&str>, expected: &str) -> FhirResult<()> {
    match found {
        Some(found) if found != expected => Err(FhirError::InvalidInput(format!(
            "Expected resourceType '{expected}', got '{found}'"
        ))),
        _ => Ok(()),
    }
}

/// Treat an explicit JSON `null` array the same as a missing one.
pub(crate) fn vec_or_null<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
