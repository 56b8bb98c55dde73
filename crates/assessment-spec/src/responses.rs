use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::spec::question::QuestionId;

/// A candidate's answer to one question.
///
/// Text, single-choice, numeric and file-upload questions store a string;
/// multi-choice questions store the selected options in selection order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ResponseValue {
    Text(String),
    Choices(Vec<String>),
}

impl ResponseValue {
    pub fn is_empty(&self) -> bool {
        match self {
            ResponseValue::Text(text) => text.is_empty(),
            ResponseValue::Choices(choices) => choices.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseValue::Text(text) => Some(text),
            ResponseValue::Choices(_) => None,
        }
    }

    pub fn as_choices(&self) -> Option<&[String]> {
        match self {
            ResponseValue::Choices(choices) => Some(choices),
            ResponseValue::Text(_) => None,
        }
    }
}

impl From<&str> for ResponseValue {
    fn from(value: &str) -> Self {
        ResponseValue::Text(value.to_string())
    }
}

impl From<String> for ResponseValue {
    fn from(value: String) -> Self {
        ResponseValue::Text(value)
    }
}

impl From<Vec<String>> for ResponseValue {
    fn from(values: Vec<String>) -> Self {
        ResponseValue::Choices(values)
    }
}

impl From<Vec<&str>> for ResponseValue {
    fn from(values: Vec<&str>) -> Self {
        ResponseValue::Choices(values.into_iter().map(String::from).collect())
    }
}

/// In-progress answers keyed by question identity.
pub type ResponseMap = BTreeMap<QuestionId, ResponseValue>;

/// Flip one option of a multi-choice answer.
///
/// Unchecking the last option yields an empty list, never an absent value.
/// A text value in place of a list is treated as no selection.
pub fn toggle_choice(current: Option<&ResponseValue>, option: &str) -> ResponseValue {
    let mut selected = current
        .and_then(ResponseValue::as_choices)
        .map(<[String]>::to_vec)
        .unwrap_or_default();
    if let Some(position) = selected.iter().position(|value| value == option) {
        selected.remove(position);
    } else {
        selected.push(option.to_string());
    }
    ResponseValue::Choices(selected)
}

/// Why a response failed its question's constraints.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("This field is required")]
    Required,
    #[error("Minimum {min_length} characters required")]
    TooShort { min_length: usize, length: usize },
    #[error("Maximum {max_length} characters allowed")]
    TooLong { max_length: usize, length: usize },
    #[error("Please enter a valid number")]
    NotANumber,
    #[error("Minimum value is {min}")]
    BelowMin { min: f64, value: f64 },
    #[error("Maximum value is {max}")]
    AboveMax { max: f64, value: f64 },
    /// A list answer to a single-value question, or the other way round.
    #[error("This answer does not fit the question type")]
    WrongShape,
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::Required => "required",
            ValidationError::TooShort { .. } => "too_short",
            ValidationError::TooLong { .. } => "too_long",
            ValidationError::NotANumber => "not_a_number",
            ValidationError::BelowMin { .. } => "below_min",
            ValidationError::AboveMax { .. } => "above_max",
            ValidationError::WrongShape => "wrong_shape",
        }
    }
}

/// Submit-time failures keyed by question identity.
pub type ErrorMap = BTreeMap<QuestionId, ValidationError>;

/// A completed response set recorded for a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResponse {
    pub id: String,
    pub assessment_id: String,
    pub candidate_id: String,
    pub responses: ResponseMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl AssessmentResponse {
    /// Record a completed submission now.
    pub fn completed(
        assessment_id: impl Into<String>,
        candidate_id: impl Into<String>,
        responses: ResponseMap,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: format!("response_{}", Uuid::new_v4().simple()),
            assessment_id: assessment_id.into(),
            candidate_id: candidate_id.into(),
            responses,
            completed_at: Some(now),
            created_at: now,
        }
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>, serde_cbor::Error> {
        serde_cbor::to_vec(self)
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self, serde_cbor::Error> {
        serde_cbor::from_slice(bytes)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_twice_restores_selection() {
        let original = ResponseValue::from(vec!["Rust", "Go"]);
        let once = toggle_choice(Some(&original), "Python");
        assert_eq!(once, ResponseValue::from(vec!["Rust", "Go", "Python"]));
        let twice = toggle_choice(Some(&once), "Python");
        assert_eq!(twice, original);
    }

    #[test]
    fn toggle_off_last_option_keeps_empty_list() {
        let once = toggle_choice(None, "Rust");
        let twice = toggle_choice(Some(&once), "Rust");
        assert_eq!(twice, ResponseValue::Choices(Vec::new()));
        assert!(twice.is_empty());
    }

    #[test]
    fn response_value_deserializes_untagged() {
        let text: ResponseValue = serde_json::from_str("\"Yes\"").expect("text");
        assert_eq!(text, ResponseValue::from("Yes"));
        let choices: ResponseValue = serde_json::from_str("[\"a\",\"b\"]").expect("choices");
        assert_eq!(choices, ResponseValue::from(vec!["a", "b"]));
    }

    #[test]
    fn validation_error_messages_are_human_readable() {
        assert_eq!(
            ValidationError::TooShort {
                min_length: 5,
                length: 4
            }
            .to_string(),
            "Minimum 5 characters required"
        );
        assert_eq!(
            ValidationError::BelowMin {
                min: 50.0,
                value: 10.0
            }
            .to_string(),
            "Minimum value is 50"
        );
    }

    #[test]
    fn response_record_survives_cbor() {
        let mut responses = ResponseMap::new();
        responses.insert("q1".into(), ResponseValue::from("Yes"));
        responses.insert("q2".into(), ResponseValue::from(vec!["Rust"]));
        let record = AssessmentResponse::completed("assessment_1", "candidate_1", responses);
        let bytes = record.to_cbor().expect("encode");
        assert_eq!(AssessmentResponse::from_cbor(&bytes).expect("decode"), record);
    }
}
