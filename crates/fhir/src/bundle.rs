//! FHIR searchset `Bundle` reading.
//!
//! A SMART client typically fetches a patient's encounters, conditions and medication requests
//! as one or more searchset bundles. This module sorts bundle entries by `resourceType` into a
//! [`ClinicalHistory`].
//!
//! Reading is deliberately partial: entries of other resource types are ignored, and entries that
//! fail translation are counted in [`ClinicalHistory::skipped_entries`] instead of failing the
//! whole bundle. Only a bundle that is not JSON, or not shaped like a bundle, is an error.

use crate::condition::{Condition, ConditionData};
use crate::encounter::{Encounter, EncounterData};
use crate::medication::{MedicationData, MedicationRequest};
use crate::{check_resource_type, from_json_str, from_json_value, FhirResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The three homogeneous collections the core reads for one patient.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClinicalHistory {
    pub encounters: Vec<EncounterData>,
    pub conditions: Vec<ConditionData>,
    pub medications: Vec<MedicationData>,

    /// Number of entries that looked like a supported resource but could not be translated.
    pub skipped_entries: usize,
}

impl ClinicalHistory {
    /// Build a history from three loosely-typed JSON collections.
    ///
    /// Each argument is expected to be an array of resources. Anything else (object, string,
    /// `null`) contributes nothing; array elements that fail translation are counted in
    /// `skipped_entries`. This never fails.
    pub fn from_values(encounters: &Value, conditions: &Value, medications: &Value) -> Self {
        let mut skipped_entries = 0;
        let encounters = collect_lenient(encounters, Encounter::from_value, &mut skipped_entries);
        let conditions = collect_lenient(conditions, Condition::from_value, &mut skipped_entries);
        let medications =
            collect_lenient(medications, MedicationRequest::from_value, &mut skipped_entries);

        ClinicalHistory {
            encounters,
            conditions,
            medications,
            skipped_entries,
        }
    }

    /// Append another history (for example the next page of a search).
    pub fn extend(&mut self, other: ClinicalHistory) {
        self.encounters.extend(other.encounters);
        self.conditions.extend(other.conditions);
        self.medications.extend(other.medications);
        self.skipped_entries += other.skipped_entries;
    }
}

/// Bundle resource operations.
pub struct Bundle;

impl Bundle {
    /// Parse a bundle from JSON text and sort its entries into a [`ClinicalHistory`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::FhirError`] if the text is not a bundle-shaped JSON object, or if
    /// `resourceType` is present and is not `"Bundle"`.
    pub fn parse(json_text: &str) -> FhirResult<ClinicalHistory> {
        let wire: BundleWire = from_json_str(json_text, "Bundle")?;
        wire_to_history(wire)
    }

    /// Sort the entries of an already-parsed bundle value.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Bundle::parse`].
    pub fn from_value(value: &Value) -> FhirResult<ClinicalHistory> {
        let wire: BundleWire = from_json_value(value, "Bundle")?;
        wire_to_history(wire)
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
struct BundleWire {
    #[serde(rename = "resourceType", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,

    #[serde(
        default,
        deserialize_with = "crate::vec_or_null",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub entry: Vec<BundleEntryWire>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
struct BundleEntryWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Value>,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn wire_to_history(wire: BundleWire) -> FhirResult<ClinicalHistory> {
    check_resource_type(wire.resource_type.as_deref(), "Bundle")?;

    let mut history = ClinicalHistory::default();
    for resource in wire.entry.iter().filter_map(|e| e.resource.as_ref()) {
        let resource_type = resource.get("resourceType").and_then(Value::as_str);
        let translated = match resource_type {
            Some("Encounter") => Encounter::from_value(resource).map(|e| history.encounters.push(e)),
            Some("Condition") => Condition::from_value(resource).map(|c| history.conditions.push(c)),
            Some("MedicationRequest") => {
                MedicationRequest::from_value(resource).map(|m| history.medications.push(m))
            }
            _ => continue,
        };
        if translated.is_err() {
            history.skipped_entries += 1;
        }
    }

    Ok(history)
}

fn collect_lenient<T>(
    value: &Value,
    translate: impl Fn(&Value) -> FhirResult<T>,
    skipped: &mut usize,
) -> Vec<T> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match translate(item) {
            Ok(data) => Some(data),
            Err(_) => {
                *skipped += 1;
                None
            }
        })
        .collect()
}
