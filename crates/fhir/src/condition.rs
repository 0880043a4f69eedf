//! FHIR `Condition` wire model and translation helpers.
//!
//! The risk engine only needs a human-readable label per condition: `code.text`, falling back
//! to the first non-blank `code.coding[].display`.

use crate::codeable::CodeableConceptWire;
use crate::{check_resource_type, from_json_str, from_json_value, FhirResult};
use carewatch_types::Label;
use serde::{Deserialize, Serialize};

/// Domain-level carrier for a condition.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionData {
    pub id: Option<String>,

    /// Display label; `None` when the resource carries no usable text.
    pub label: Option<Label>,
}

/// Condition resource operations.
pub struct Condition;

impl Condition {
    /// Parse a condition resource from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FhirError`] if the JSON does not match the wire schema or
    /// `resourceType` names another resource.
    pub fn parse(json_text: &str) -> FhirResult<ConditionData> {
        let wire: ConditionWire = from_json_str(json_text, "Condition")?;
        wire_to_domain(wire)
    }

    /// Translate an already-parsed JSON value into a [`ConditionData`].
    ///
    /// # Errors
    ///
    /// Same conditions as [`Condition::parse`].
    pub fn from_value(value: &serde_json::Value) -> FhirResult<ConditionData> {
        let wire: ConditionWire = from_json_value(value, "Condition")?;
        wire_to_domain(wire)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
struct ConditionWire {
    #[serde(rename = "resourceType", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConceptWire>,
}

fn wire_to_domain(wire: ConditionWire) -> FhirResult<ConditionData> {
    check_resource_type(wire.resource_type.as_deref(), "Condition")?;

    Ok(ConditionData {
        id: wire.id,
        label: wire.code.as_ref().and_then(CodeableConceptWire::label),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_code_text() {
        let data = Condition::parse(
            r#"{"resourceType":"Condition","id":"c1","code":{"text":"Diabetes","coding":[{"display":"Type 2 diabetes mellitus"}]}}"#,
        )
        .expect("parse condition");
        assert_eq!(data.id.as_deref(), Some("c1"));
        assert_eq!(data.label.expect("label").as_str(), "Diabetes");
    }

    #[test]
    fn falls_back_to_coding_display() {
        let data = Condition::parse(
            r#"{"code":{"coding":[{"code":"38341003","display":"Hypertension"}]}}"#,
        )
        .expect("parse condition");
        assert_eq!(data.label.expect("label").as_str(), "Hypertension");
    }

    #[test]
    fn missing_code_has_no_label() {
        let data = Condition::parse(r#"{"resourceType":"Condition"}"#).expect("parse condition");
        assert!(data.label.is_none());
    }

    #[test]
    fn from_value_matches_parse() {
        let value = serde_json::json!({"code": {"text": "Asthma"}});
        let data = Condition::from_value(&value).expect("translate value");
        assert_eq!(data.label.expect("label").as_str(), "Asthma");
    }
}
