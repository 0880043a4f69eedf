//! FHIR `MedicationRequest` wire model and translation helpers.
//!
//! Two things are read from a medication request:
//! - the medication's human-readable names, for high-risk keyword screening
//! - each `dosageInstruction` (free text and structured `timing`), for schedule resolution
//!
//! The medication may be given as R4 `medicationCodeableConcept` or as R5
//! `medication.concept`.

use crate::codeable::CodeableConceptWire;
use crate::timing::{TimingData, TimingWire};
use crate::{check_resource_type, from_json_str, from_json_value, FhirResult};
use carewatch_types::Label;
use serde::{Deserialize, Serialize};

// ============================================================================
// Public domain-level types
// ============================================================================

/// Domain-level carrier for a medication request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicationData {
    pub id: Option<String>,

    /// `text` then every `coding[].display`, blanks and repeats removed.
    pub names: Vec<Label>,

    /// One entry per `dosageInstruction`.
    pub dosages: Vec<DosageData>,
}

impl MedicationData {
    /// The preferred display name, if the request names its medication at all.
    pub fn primary_name(&self) -> Option<&Label> {
        self.names.first()
    }
}

/// Domain-level carrier for one dosage instruction.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DosageData {
    /// `dosageInstruction[].text`.
    pub text: Option<String>,

    /// `dosageInstruction[].timing`.
    pub timing: Option<TimingData>,
}

// ============================================================================
// Public MedicationRequest operations
// ============================================================================

/// MedicationRequest resource operations.
pub struct MedicationRequest;

impl MedicationRequest {
    /// Parse a medication request from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FhirError`] if the JSON does not match the wire schema or
    /// `resourceType` names another resource.
    pub fn parse(json_text: &str) -> FhirResult<MedicationData> {
        let wire: MedicationRequestWire = from_json_str(json_text, "MedicationRequest")?;
        wire_to_domain(wire)
    }

    /// Translate an already-parsed JSON value into a [`MedicationData`].
    ///
    /// # Errors
    ///
    /// Same conditions as [`MedicationRequest::parse`].
    pub fn from_value(value: &serde_json::Value) -> FhirResult<MedicationData> {
        let wire: MedicationRequestWire = from_json_value(value, "MedicationRequest")?;
        wire_to_domain(wire)
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
struct MedicationRequestWire {
    #[serde(rename = "resourceType", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(
        rename = "medicationCodeableConcept",
        skip_serializing_if = "Option::is_none"
    )]
    pub medication_codeable_concept: Option<CodeableConceptWire>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub medication: Option<CodeableReferenceWire>,

    #[serde(
        rename = "dosageInstruction",
        default,
        deserialize_with = "crate::vec_or_null",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub dosage_instruction: Vec<DosageWire>,
}

/// R5 `CodeableReference`; only the concept half is read.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
struct CodeableReferenceWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concept: Option<CodeableConceptWire>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
struct DosageWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<TimingWire>,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn wire_to_domain(wire: MedicationRequestWire) -> FhirResult<MedicationData> {
    check_resource_type(wire.resource_type.as_deref(), "MedicationRequest")?;

    let concept = wire
        .medication_codeable_concept
        .or_else(|| wire.medication.and_then(|m| m.concept));
    let names = concept
        .as_ref()
        .map(CodeableConceptWire::all_labels)
        .unwrap_or_default();

    let dosages = wire
        .dosage_instruction
        .into_iter()
        .map(|d| DosageData {
            text: d.text.filter(|t| !t.trim().is_empty()),
            timing: d.timing.map(TimingData::from),
        })
        .collect();

    Ok(MedicationData {
        id: wire.id,
        names,
        dosages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_r4_request_with_dosage() {
        let input = r#"{
  "resourceType": "MedicationRequest",
  "id": "mr-1",
  "status": "active",
  "medicationCodeableConcept": {"text": "Oxycodone 5mg", "coding": [{"display": "oxycodone hydrochloride 5 MG Oral Tablet"}]},
  "dosageInstruction": [
    {"text": "Take 1 tablet every 6 hours as needed for pain"},
    {"timing": {"repeat": {"when": ["HS"]}}}
  ]
}"#;
        let data = MedicationRequest::parse(input).expect("parse medication request");
        assert_eq!(data.id.as_deref(), Some("mr-1"));
        assert_eq!(
            data.primary_name().expect("name").as_str(),
            "Oxycodone 5mg"
        );
        assert_eq!(data.names.len(), 2);
        assert_eq!(data.dosages.len(), 2);
        assert_eq!(
            data.dosages[0].text.as_deref(),
            Some("Take 1 tablet every 6 hours as needed for pain")
        );
        assert!(data.dosages[0].timing.is_none());
        assert_eq!(
            data.dosages[1].timing.as_ref().expect("timing").when,
            vec!["HS"]
        );
    }

    #[test]
    fn parses_r5_medication_concept() {
        let input = r#"{"resourceType":"MedicationRequest","medication":{"concept":{"text":"Morphine"}}}"#;
        let data = MedicationRequest::parse(input).expect("parse medication request");
        assert_eq!(data.primary_name().expect("name").as_str(), "Morphine");
        assert!(data.dosages.is_empty());
    }

    #[test]
    fn blank_dosage_text_is_dropped() {
        let input = r#"{"dosageInstruction":[{"text":"   "}]}"#;
        let data = MedicationRequest::parse(input).expect("parse medication request");
        assert!(data.names.is_empty());
        assert_eq!(data.dosages, vec![DosageData::default()]);
    }
}
