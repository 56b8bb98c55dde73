use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Identifier used to address a question inside an assessment.
pub type QuestionId = String;

/// Supported question kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    SingleChoice,
    MultiChoice,
    #[default]
    ShortText,
    LongText,
    Numeric,
    FileUpload,
}

impl QuestionType {
    pub const ALL: [QuestionType; 6] = [
        QuestionType::SingleChoice,
        QuestionType::MultiChoice,
        QuestionType::ShortText,
        QuestionType::LongText,
        QuestionType::Numeric,
        QuestionType::FileUpload,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::SingleChoice => "single-choice",
            QuestionType::MultiChoice => "multi-choice",
            QuestionType::ShortText => "short-text",
            QuestionType::LongText => "long-text",
            QuestionType::Numeric => "numeric",
            QuestionType::FileUpload => "file-upload",
        }
    }

    /// Label shown in builder menus.
    pub fn label(&self) -> &'static str {
        match self {
            QuestionType::SingleChoice => "Single Choice",
            QuestionType::MultiChoice => "Multiple Choice",
            QuestionType::ShortText => "Short Text",
            QuestionType::LongText => "Long Text",
            QuestionType::Numeric => "Numeric",
            QuestionType::FileUpload => "File Upload",
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(self, QuestionType::SingleChoice | QuestionType::MultiChoice)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, QuestionType::ShortText | QuestionType::LongText)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for QuestionType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "single-choice" | "single" | "radio" => Ok(QuestionType::SingleChoice),
            "multi-choice" | "multi" | "checkbox" => Ok(QuestionType::MultiChoice),
            "short-text" | "text" => Ok(QuestionType::ShortText),
            "long-text" | "textarea" => Ok(QuestionType::LongText),
            "numeric" | "number" => Ok(QuestionType::Numeric),
            "file-upload" | "file" => Ok(QuestionType::FileUpload),
            _ => Err(format!("unknown question type '{}'", value)),
        }
    }
}

/// Type-dependent constraint bag.
///
/// `min_length`/`max_length` apply to text kinds, `min`/`max` to numeric
/// questions. Fields that do not apply to the question kind are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// Value (or set of values) the dependency response must match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ShowWhen {
    One(String),
    AnyOf(Vec<String>),
}

impl ShowWhen {
    pub fn matches(&self, response: &str) -> bool {
        match self {
            ShowWhen::One(expected) => expected == response,
            ShowWhen::AnyOf(candidates) => candidates.iter().any(|value| value == response),
        }
    }
}

impl From<&str> for ShowWhen {
    fn from(value: &str) -> Self {
        ShowWhen::One(value.to_string())
    }
}

impl From<Vec<String>> for ShowWhen {
    fn from(values: Vec<String>) -> Self {
        ShowWhen::AnyOf(values)
    }
}

/// Dependency edge making a question's display depend on another answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalLogic {
    pub depends_on: QuestionId,
    pub show_when: ShowWhen,
}

impl ConditionalLogic {
    pub fn new(depends_on: impl Into<QuestionId>, show_when: impl Into<ShowWhen>) -> Self {
        Self {
            depends_on: depends_on.into(),
            show_when: show_when.into(),
        }
    }
}

/// A single prompt with a typed answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<Constraint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional_logic: Option<ConditionalLogic>,
}

impl Question {
    pub fn new(id: impl Into<QuestionId>, kind: QuestionType, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            description: None,
            required: false,
            order: 0,
            options: None,
            validation: None,
            conditional_logic: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_validation(mut self, validation: Constraint) -> Self {
        self.validation = Some(validation);
        self
    }

    pub fn shown_when(mut self, logic: ConditionalLogic) -> Self {
        self.conditional_logic = Some(logic);
        self
    }

    /// Options offered by a choice question; empty for other kinds.
    pub fn choices(&self) -> &[String] {
        match (self.kind.is_choice(), &self.options) {
            (true, Some(options)) => options,
            _ => &[],
        }
    }
}
