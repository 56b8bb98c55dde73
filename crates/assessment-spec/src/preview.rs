use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::responses::{
    AssessmentResponse, ErrorMap, ResponseMap, ResponseValue, ValidationError, toggle_choice,
};
use crate::spec::assessment::Assessment;
use crate::spec::question::{Question, QuestionId, QuestionType};
use crate::validate::validate_responses;
use crate::visibility::{VisibilityMap, is_visible, resolve_visibility};

/// Lifecycle of a preview/response session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Editing,
    Submitted,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("assessment responses were already submitted")]
    AlreadySubmitted,
    #[error("question '{0}' is not part of this assessment")]
    UnknownQuestion(QuestionId),
    #[error("question '{0}' is not a multi-choice question")]
    NotMultiChoice(QuestionId),
}

/// Result of a submit attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Every visible question passed; the session is now terminal.
    Submitted,
    /// At least one visible question failed; the session stays editable.
    Rejected(ErrorMap),
    /// The session had already been submitted; nothing changed.
    AlreadySubmitted,
}

impl SubmitOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, SubmitOutcome::Submitted)
    }
}

/// Collects responses for one assessment and evaluates visibility and
/// validation against them.
///
/// Errors are cleared per question as the candidate edits and only fully
/// recomputed on [`PreviewSession::submit`]. Answers to questions that become
/// hidden are kept, but hidden questions are never validated.
#[derive(Debug, Clone)]
pub struct PreviewSession<'a> {
    assessment: &'a Assessment,
    responses: ResponseMap,
    errors: ErrorMap,
    state: SessionState,
}

impl<'a> PreviewSession<'a> {
    pub fn new(assessment: &'a Assessment) -> Self {
        Self::with_responses(assessment, ResponseMap::new())
    }

    /// Start from previously collected answers.
    pub fn with_responses(assessment: &'a Assessment, responses: ResponseMap) -> Self {
        Self {
            assessment,
            responses,
            errors: ErrorMap::new(),
            state: SessionState::Editing,
        }
    }

    pub fn assessment(&self) -> &'a Assessment {
        self.assessment
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn responses(&self) -> &ResponseMap {
        &self.responses
    }

    pub fn response(&self, question_id: &str) -> Option<&ResponseValue> {
        self.responses.get(question_id)
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn error(&self, question_id: &str) -> Option<&ValidationError> {
        self.errors.get(question_id)
    }

    pub fn update_response(
        &mut self,
        question_id: &str,
        value: impl Into<ResponseValue>,
    ) -> Result<(), SessionError> {
        self.ensure_editable(question_id)?;
        self.responses.insert(question_id.to_string(), value.into());
        self.errors.remove(question_id);
        Ok(())
    }

    /// Check or uncheck one option of a multi-choice question.
    pub fn toggle_choice(&mut self, question_id: &str, option: &str) -> Result<(), SessionError> {
        self.ensure_editable(question_id)?;
        if self
            .assessment
            .find_question(question_id)
            .is_some_and(|question| question.kind != QuestionType::MultiChoice)
        {
            return Err(SessionError::NotMultiChoice(question_id.to_string()));
        }
        let next = toggle_choice(self.responses.get(question_id), option);
        self.update_response(question_id, next)
    }

    pub fn is_visible(&self, question_id: &str) -> bool {
        self.assessment
            .find_question(question_id)
            .is_some_and(|question| is_visible(question, &self.responses))
    }

    pub fn visibility(&self) -> VisibilityMap {
        resolve_visibility(self.assessment, &self.responses)
    }

    pub fn visible_questions(&self) -> impl Iterator<Item = &'a Question> + '_ {
        self.assessment
            .questions()
            .filter(|question| is_visible(question, &self.responses))
    }

    pub fn visible_count(&self) -> usize {
        self.visible_questions().count()
    }

    pub fn answered_count(&self) -> usize {
        self.visible_questions()
            .filter(|question| {
                self.responses
                    .get(&question.id)
                    .is_some_and(|value| !value.is_empty())
            })
            .count()
    }

    pub fn total_questions(&self) -> usize {
        self.assessment.question_count()
    }

    /// Validate every visible question and move to `Submitted` when all pass.
    pub fn submit(&mut self) -> SubmitOutcome {
        if self.state == SessionState::Submitted {
            return SubmitOutcome::AlreadySubmitted;
        }

        let report = validate_responses(self.assessment, &self.responses);
        self.errors = report.errors;
        if self.errors.is_empty() {
            self.state = SessionState::Submitted;
            SubmitOutcome::Submitted
        } else {
            SubmitOutcome::Rejected(self.errors.clone())
        }
    }

    /// Character-count hint shown under constrained text questions, e.g.
    /// `Min: 5 characters • Max: 10 characters • Current: 3 characters`.
    pub fn length_hint(&self, question_id: &str) -> Option<String> {
        let question = self.assessment.find_question(question_id)?;
        if !question.kind.is_text() {
            return None;
        }
        let constraint = question.validation.as_ref()?;

        let mut parts = Vec::new();
        if let Some(min_length) = constraint.min_length {
            parts.push(format!("Min: {} characters", min_length));
        }
        if let Some(max_length) = constraint.max_length {
            parts.push(format!("Max: {} characters", max_length));
        }
        if let Some(text) = self
            .responses
            .get(question_id)
            .and_then(ResponseValue::as_text)
            .filter(|text| !text.is_empty())
        {
            parts.push(format!("Current: {} characters", text.chars().count()));
        }

        (!parts.is_empty()).then(|| parts.join(" • "))
    }

    /// Snapshot the collected answers as a completed response record.
    pub fn response_record(&self, candidate_id: &str) -> AssessmentResponse {
        AssessmentResponse::completed(
            self.assessment.id.clone(),
            candidate_id,
            self.responses.clone(),
        )
    }

    fn ensure_editable(&self, question_id: &str) -> Result<(), SessionError> {
        if self.state == SessionState::Submitted {
            return Err(SessionError::AlreadySubmitted);
        }
        if self.assessment.find_question(question_id).is_none() {
            return Err(SessionError::UnknownQuestion(question_id.to_string()));
        }
        Ok(())
    }
}
