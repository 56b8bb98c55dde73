//! Immutable editing operations over an assessment document.
//!
//! Every operation borrows the current document and returns a new one, so
//! callers can keep the previous value for undo or change detection. Section
//! and question `order` values are rewritten from position after every
//! structural change and are never trusted as input.

use thiserror::Error;
use uuid::Uuid;

use crate::spec::assessment::Assessment;
use crate::spec::question::{ConditionalLogic, Constraint, Question, QuestionId, QuestionType};
use crate::spec::section::{Section, SectionId};

pub const NEW_SECTION_TITLE: &str = "New Section";
pub const NEW_QUESTION_TITLE: &str = "New Question";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("section '{0}' not found")]
    SectionNotFound(SectionId),
    #[error("question '{question_id}' not found in section '{section_id}'")]
    QuestionNotFound {
        section_id: SectionId,
        question_id: QuestionId,
    },
    #[error("index {index} out of range for {len} items")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("question '{0}' does not take options")]
    NotAChoiceQuestion(QuestionId),
}

/// Fields to overwrite on a section. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
}

impl SectionPatch {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    fn apply(&self, section: &mut Section) {
        if let Some(title) = &self.title {
            section.title = title.clone();
        }
        if let Some(description) = &self.description {
            section.description = description.clone();
        }
    }
}

/// Fields to overwrite on a question. `None` leaves the field untouched;
/// `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionPatch {
    pub kind: Option<QuestionType>,
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub required: Option<bool>,
    pub options: Option<Option<Vec<String>>>,
    pub validation: Option<Option<Constraint>>,
    pub conditional_logic: Option<Option<ConditionalLogic>>,
}

impl QuestionPatch {
    pub fn kind(mut self, kind: QuestionType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn options(mut self, options: Option<Vec<String>>) -> Self {
        self.options = Some(options);
        self
    }

    pub fn validation(mut self, validation: Option<Constraint>) -> Self {
        self.validation = Some(validation);
        self
    }

    pub fn conditional_logic(mut self, logic: Option<ConditionalLogic>) -> Self {
        self.conditional_logic = Some(logic);
        self
    }

    fn apply(&self, question: &mut Question) {
        if let Some(kind) = self.kind {
            question.kind = kind;
        }
        if let Some(title) = &self.title {
            question.title = title.clone();
        }
        if let Some(description) = &self.description {
            question.description = description.clone();
        }
        if let Some(required) = self.required {
            question.required = required;
        }
        if let Some(options) = &self.options {
            question.options = options.clone();
        }
        if let Some(validation) = &self.validation {
            question.validation = validation.clone();
        }
        if let Some(logic) = &self.conditional_logic {
            question.conditional_logic = logic.clone();
        }
    }
}

pub fn new_section_id() -> SectionId {
    format!("section_{}", Uuid::new_v4().simple())
}

pub fn new_question_id() -> QuestionId {
    format!("question_{}", Uuid::new_v4().simple())
}

/// Rewrite every section and question `order` from its position.
pub fn renumber(doc: &Assessment) -> Assessment {
    let mut next = doc.clone();
    renumber_sections(&mut next.sections);
    for section in &mut next.sections {
        renumber_questions(&mut section.questions);
    }
    next
}

pub fn set_details(
    doc: &Assessment,
    title: impl Into<String>,
    description: Option<String>,
) -> Assessment {
    let mut next = doc.clone();
    next.title = title.into();
    next.description = description;
    next
}

pub fn add_section(doc: &Assessment) -> Assessment {
    let mut next = doc.clone();
    next.sections.push(Section::new(new_section_id(), NEW_SECTION_TITLE));
    renumber_sections(&mut next.sections);
    next
}

pub fn update_section(
    doc: &Assessment,
    section_id: &str,
    patch: &SectionPatch,
) -> Result<Assessment, DocumentError> {
    with_section(doc, section_id, |section| {
        patch.apply(section);
        Ok(())
    })
}

pub fn delete_section(doc: &Assessment, section_id: &str) -> Result<Assessment, DocumentError> {
    let position = section_position(doc, section_id)?;
    let mut next = doc.clone();
    next.sections.remove(position);
    renumber_sections(&mut next.sections);
    Ok(next)
}

pub fn reorder_sections(
    doc: &Assessment,
    from_index: usize,
    to_index: usize,
) -> Result<Assessment, DocumentError> {
    let mut next = doc.clone();
    move_item(&mut next.sections, from_index, to_index)?;
    renumber_sections(&mut next.sections);
    Ok(next)
}

pub fn add_question(doc: &Assessment, section_id: &str) -> Result<Assessment, DocumentError> {
    with_section(doc, section_id, |section| {
        section.questions.push(Question::new(
            new_question_id(),
            QuestionType::ShortText,
            NEW_QUESTION_TITLE,
        ));
        renumber_questions(&mut section.questions);
        Ok(())
    })
}

pub fn update_question(
    doc: &Assessment,
    section_id: &str,
    question_id: &str,
    patch: &QuestionPatch,
) -> Result<Assessment, DocumentError> {
    with_question(doc, section_id, question_id, |question| {
        patch.apply(question);
        Ok(())
    })
}

pub fn delete_question(
    doc: &Assessment,
    section_id: &str,
    question_id: &str,
) -> Result<Assessment, DocumentError> {
    with_section(doc, section_id, |section| {
        let position = question_position(section, question_id)?;
        section.questions.remove(position);
        renumber_questions(&mut section.questions);
        Ok(())
    })
}

pub fn reorder_questions(
    doc: &Assessment,
    section_id: &str,
    from_index: usize,
    to_index: usize,
) -> Result<Assessment, DocumentError> {
    with_section(doc, section_id, |section| {
        move_item(&mut section.questions, from_index, to_index)?;
        renumber_questions(&mut section.questions);
        Ok(())
    })
}

pub fn add_option(
    doc: &Assessment,
    section_id: &str,
    question_id: &str,
    option: impl Into<String>,
) -> Result<Assessment, DocumentError> {
    let option = option.into();
    with_choice_question(doc, section_id, question_id, |options| {
        options.push(option);
        Ok(())
    })
}

pub fn update_option(
    doc: &Assessment,
    section_id: &str,
    question_id: &str,
    index: usize,
    option: impl Into<String>,
) -> Result<Assessment, DocumentError> {
    let option = option.into();
    with_choice_question(doc, section_id, question_id, |options| {
        let len = options.len();
        let slot = options
            .get_mut(index)
            .ok_or(DocumentError::IndexOutOfRange { index, len })?;
        *slot = option;
        Ok(())
    })
}

pub fn remove_option(
    doc: &Assessment,
    section_id: &str,
    question_id: &str,
    index: usize,
) -> Result<Assessment, DocumentError> {
    with_choice_question(doc, section_id, question_id, |options| {
        if index >= options.len() {
            return Err(DocumentError::IndexOutOfRange {
                index,
                len: options.len(),
            });
        }
        options.remove(index);
        Ok(())
    })
}

fn with_section(
    doc: &Assessment,
    section_id: &str,
    edit: impl FnOnce(&mut Section) -> Result<(), DocumentError>,
) -> Result<Assessment, DocumentError> {
    let position = section_position(doc, section_id)?;
    let mut next = doc.clone();
    edit(&mut next.sections[position])?;
    Ok(next)
}

fn with_question(
    doc: &Assessment,
    section_id: &str,
    question_id: &str,
    edit: impl FnOnce(&mut Question) -> Result<(), DocumentError>,
) -> Result<Assessment, DocumentError> {
    with_section(doc, section_id, |section| {
        let position = question_position(section, question_id)?;
        edit(&mut section.questions[position])
    })
}

fn with_choice_question(
    doc: &Assessment,
    section_id: &str,
    question_id: &str,
    edit: impl FnOnce(&mut Vec<String>) -> Result<(), DocumentError>,
) -> Result<Assessment, DocumentError> {
    with_question(doc, section_id, question_id, |question| {
        if !question.kind.is_choice() {
            return Err(DocumentError::NotAChoiceQuestion(question.id.clone()));
        }
        edit(question.options.get_or_insert_with(Vec::new))
    })
}

fn section_position(doc: &Assessment, section_id: &str) -> Result<usize, DocumentError> {
    doc.sections
        .iter()
        .position(|section| section.id == section_id)
        .ok_or_else(|| DocumentError::SectionNotFound(section_id.to_string()))
}

fn question_position(section: &Section, question_id: &str) -> Result<usize, DocumentError> {
    section
        .questions
        .iter()
        .position(|question| question.id == question_id)
        .ok_or_else(|| DocumentError::QuestionNotFound {
            section_id: section.id.clone(),
            question_id: question_id.to_string(),
        })
}

fn move_item<T>(
    items: &mut Vec<T>,
    from_index: usize,
    to_index: usize,
) -> Result<(), DocumentError> {
    let len = items.len();
    for index in [from_index, to_index] {
        if index >= len {
            return Err(DocumentError::IndexOutOfRange { index, len });
        }
    }
    let item = items.remove(from_index);
    items.insert(to_index, item);
    Ok(())
}

fn renumber_sections(sections: &mut [Section]) {
    for (index, section) in sections.iter_mut().enumerate() {
        section.order = order_for(index + 1);
    }
}

fn renumber_questions(questions: &mut [Question]) {
    for (index, question) in questions.iter_mut().enumerate() {
        question.order = order_for(index + 1);
    }
}

fn order_for(position: usize) -> u32 {
    u32::try_from(position).unwrap_or(u32::MAX)
}
