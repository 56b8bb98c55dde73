use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::responses::{ErrorMap, ResponseMap, ResponseValue, ValidationError};
use crate::spec::assessment::Assessment;
use crate::spec::question::{Constraint, Question, QuestionId, QuestionType};
use crate::visibility::resolve_visibility;

/// Outcome of validating a whole response map against an assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: ErrorMap,
    /// Questions skipped because their conditional logic hides them.
    pub hidden: Vec<QuestionId>,
    /// Response keys that match no question in the assessment.
    pub unknown_fields: Vec<QuestionId>,
}

/// Check one response against its question. First failure wins.
pub fn validate(question: &Question, value: Option<&ResponseValue>) -> Option<ValidationError> {
    let present = value.filter(|value| !value.is_empty());

    let Some(value) = present else {
        return question.required.then_some(ValidationError::Required);
    };

    if !fits_kind(question.kind, value) {
        return Some(ValidationError::WrongShape);
    }

    let constraint = question.validation.as_ref();
    match question.kind {
        QuestionType::ShortText | QuestionType::LongText => {
            constraint.and_then(|constraint| enforce_length(constraint, value))
        }
        QuestionType::Numeric => enforce_number(constraint, value),
        QuestionType::SingleChoice | QuestionType::MultiChoice | QuestionType::FileUpload => None,
    }
}

/// Validate every visible question of the assessment.
pub fn validate_responses(assessment: &Assessment, responses: &ResponseMap) -> ValidationReport {
    let visibility = resolve_visibility(assessment, responses);

    let mut errors = ErrorMap::new();
    let mut hidden = Vec::new();
    for question in assessment.questions() {
        if !visibility.get(&question.id).copied().unwrap_or(true) {
            hidden.push(question.id.clone());
            continue;
        }
        if let Some(error) = validate(question, responses.get(&question.id)) {
            errors.insert(question.id.clone(), error);
        }
    }

    let known: BTreeSet<&str> = assessment
        .questions()
        .map(|question| question.id.as_str())
        .collect();
    let unknown_fields = responses
        .keys()
        .filter(|key| !known.contains(key.as_str()))
        .cloned()
        .collect();

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        hidden,
        unknown_fields,
    }
}

/// Multi-choice answers are lists; every other kind takes a single string.
fn fits_kind(kind: QuestionType, value: &ResponseValue) -> bool {
    match value {
        ResponseValue::Choices(_) => kind == QuestionType::MultiChoice,
        ResponseValue::Text(_) => kind != QuestionType::MultiChoice,
    }
}

fn enforce_length(constraint: &Constraint, value: &ResponseValue) -> Option<ValidationError> {
    let text = value.as_text()?;
    let length = text.chars().count();

    if let Some(min_length) = constraint.min_length
        && length < min_length
    {
        return Some(ValidationError::TooShort { min_length, length });
    }

    if let Some(max_length) = constraint.max_length
        && length > max_length
    {
        return Some(ValidationError::TooLong { max_length, length });
    }

    None
}

fn enforce_number(
    constraint: Option<&Constraint>,
    value: &ResponseValue,
) -> Option<ValidationError> {
    let Some(number) = value.as_text().and_then(parse_number) else {
        return Some(ValidationError::NotANumber);
    };
    let constraint = constraint?;

    if let Some(min) = constraint.min
        && number < min
    {
        return Some(ValidationError::BelowMin { min, value: number });
    }

    if let Some(max) = constraint.max
        && number > max
    {
        return Some(ValidationError::AboveMax { max, value: number });
    }

    None
}

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$")
            .expect("numeric pattern is valid")
    })
}

/// Parse a numeric answer. Decimal and exponent forms only; `NaN`, `inf`
/// and hex literals are rejected.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if !number_pattern().is_match(trimmed) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}
