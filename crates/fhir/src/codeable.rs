//! Shared wire types for FHIR `Coding` and `CodeableConcept`.

use carewatch_types::Label;
use serde::{Deserialize, Serialize};

/// Wire representation of a FHIR `Coding`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub(crate) struct CodingWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

/// Wire representation of a FHIR `CodeableConcept`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub(crate) struct CodeableConceptWire {
    #[serde(
        default,
        deserialize_with = "crate::vec_or_null",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub coding: Vec<CodingWire>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CodeableConceptWire {
    /// Non-blank `coding[].code` values, in order.
    pub fn codes(&self) -> impl Iterator<Item = &str> + '_ {
        self.coding
            .iter()
            .filter_map(|c| c.code.as_deref())
            .filter(|c| !c.trim().is_empty())
    }

    /// The concept's best display label: `text`, else the first non-blank `coding[].display`.
    pub fn label(&self) -> Option<Label> {
        Label::from_optional(self.text.as_deref()).or_else(|| {
            self.coding
                .iter()
                .find_map(|c| Label::from_optional(c.display.as_deref()))
        })
    }

    /// `text` followed by every `coding[].display`, blanks and repeats removed.
    pub fn all_labels(&self) -> Vec<Label> {
        let mut labels: Vec<Label> = Vec::new();
        let candidates = std::iter::once(self.text.as_deref())
            .chain(self.coding.iter().map(|c| c.display.as_deref()));
        for label in candidates.filter_map(Label::from_optional) {
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concept(json: &str) -> CodeableConceptWire {
        serde_json::from_str(json).expect("valid concept")
    }

    #[test]
    fn label_prefers_text_over_display() {
        let c = concept(r#"{"text":"Type 2 diabetes","coding":[{"display":"DM2"}]}"#);
        assert_eq!(c.label().expect("label").as_str(), "Type 2 diabetes");
    }

    #[test]
    fn label_falls_back_to_first_non_blank_display() {
        let c = concept(r#"{"text":"  ","coding":[{"display":""},{"display":"Hypertension"}]}"#);
        assert_eq!(c.label().expect("label").as_str(), "Hypertension");
    }

    #[test]
    fn null_coding_is_treated_as_empty() {
        let c = concept(r#"{"coding":null}"#);
        assert!(c.coding.is_empty());
        assert!(c.label().is_none());
    }

    #[test]
    fn all_labels_deduplicates() {
        let c = concept(
            r#"{"text":"Oxycodone 5mg","coding":[{"display":"Oxycodone 5mg"},{"display":"OxyContin"}]}"#,
        );
        let labels: Vec<String> = c.all_labels().into_iter().map(Label::into_string).collect();
        assert_eq!(labels, vec!["Oxycodone 5mg", "OxyContin"]);
    }
}
