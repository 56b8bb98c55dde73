use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spec::assessment::Assessment;
use crate::spec::question::QuestionId;

/// A structural problem that makes a document unsafe to save.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentIssue {
    #[error("question id '{question_id}' is used more than once")]
    DuplicateQuestionId { question_id: QuestionId },
    #[error("question '{question_id}' depends on unknown question '{depends_on}'")]
    UnknownDependency {
        question_id: QuestionId,
        depends_on: QuestionId,
    },
    #[error("question '{question_id}' depends on itself")]
    SelfDependency { question_id: QuestionId },
    #[error("question '{question_id}' depends on later question '{depends_on}'")]
    ForwardDependency {
        question_id: QuestionId,
        depends_on: QuestionId,
    },
    #[error("question '{question_id}' has minLength greater than maxLength")]
    InvertedLengthRange { question_id: QuestionId },
    #[error("question '{question_id}' has min greater than max")]
    InvertedValueRange { question_id: QuestionId },
    #[error("choice question '{question_id}' has no options")]
    MissingOptions { question_id: QuestionId },
}

/// Check the document graph.
///
/// Dependencies must point at a question earlier in document order, which
/// also rules out cycles.
pub fn check_document(assessment: &Assessment) -> Vec<DocumentIssue> {
    let mut issues = Vec::new();

    let mut seen = BTreeSet::new();
    let mut reported = BTreeSet::new();
    for question in assessment.questions() {
        if !seen.insert(question.id.as_str()) && reported.insert(question.id.as_str()) {
            issues.push(DocumentIssue::DuplicateQuestionId {
                question_id: question.id.clone(),
            });
        }
    }

    for (position, question) in assessment.questions().enumerate() {
        if let Some(logic) = &question.conditional_logic {
            let depends_on = &logic.depends_on;
            if *depends_on == question.id {
                issues.push(DocumentIssue::SelfDependency {
                    question_id: question.id.clone(),
                });
            } else {
                match first_position(assessment, depends_on) {
                    None => issues.push(DocumentIssue::UnknownDependency {
                        question_id: question.id.clone(),
                        depends_on: depends_on.clone(),
                    }),
                    Some(dependency) if dependency > position => {
                        issues.push(DocumentIssue::ForwardDependency {
                            question_id: question.id.clone(),
                            depends_on: depends_on.clone(),
                        })
                    }
                    Some(_) => {}
                }
            }
        }

        if question.kind.is_choice() && question.choices().is_empty() {
            issues.push(DocumentIssue::MissingOptions {
                question_id: question.id.clone(),
            });
        }

        if let Some(constraint) = &question.validation {
            if let (Some(min_length), Some(max_length)) =
                (constraint.min_length, constraint.max_length)
                && min_length > max_length
            {
                issues.push(DocumentIssue::InvertedLengthRange {
                    question_id: question.id.clone(),
                });
            }
            if let (Some(min), Some(max)) = (constraint.min, constraint.max)
                && min > max
            {
                issues.push(DocumentIssue::InvertedValueRange {
                    question_id: question.id.clone(),
                });
            }
        }
    }

    issues
}

fn first_position(assessment: &Assessment, question_id: &str) -> Option<usize> {
    assessment
        .questions()
        .position(|question| question.id == question_id)
}
