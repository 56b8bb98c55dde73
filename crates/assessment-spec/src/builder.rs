use crate::document::{self, DocumentError, QuestionPatch, SectionPatch};
use crate::spec::assessment::Assessment;
use crate::spec::question::QuestionId;
use crate::spec::section::SectionId;

const HISTORY_LIMIT: usize = 100;

/// In-memory editing session over one assessment document.
///
/// Wraps the immutable operations from [`crate::document`] with undo/redo
/// history, change detection against the last saved snapshot, and the
/// builder's expanded section/question state, which is never persisted.
#[derive(Debug, Clone)]
pub struct AssessmentBuilder {
    document: Assessment,
    baseline: Assessment,
    undo: Vec<Assessment>,
    redo: Vec<Assessment>,
    expanded_section: Option<SectionId>,
    expanded_question: Option<QuestionId>,
}

impl AssessmentBuilder {
    pub fn new(document: Assessment) -> Self {
        let document = document::renumber(&document);
        Self {
            baseline: document.clone(),
            document,
            undo: Vec::new(),
            redo: Vec::new(),
            expanded_section: None,
            expanded_question: None,
        }
    }

    pub fn document(&self) -> &Assessment {
        &self.document
    }

    pub fn into_document(self) -> Assessment {
        self.document
    }

    pub fn expanded_section(&self) -> Option<&str> {
        self.expanded_section.as_deref()
    }

    pub fn expanded_question(&self) -> Option<&str> {
        self.expanded_question.as_deref()
    }

    /// True when the document differs from the last saved (or loaded) one.
    pub fn is_dirty(&self) -> bool {
        self.document != self.baseline
    }

    /// Adopt the stored copy returned by a successful save.
    pub fn mark_saved(&mut self, stored: Assessment) {
        self.baseline = stored.clone();
        self.document = stored;
    }

    pub fn set_details(&mut self, title: impl Into<String>, description: Option<String>) {
        let next = document::set_details(&self.document, title, description);
        self.commit(next);
    }

    pub fn add_section(&mut self) -> SectionId {
        let next = document::add_section(&self.document);
        let section_id = next
            .sections
            .last()
            .map(|section| section.id.clone())
            .unwrap_or_default();
        self.commit(next);
        self.expanded_section = Some(section_id.clone());
        section_id
    }

    pub fn update_section(
        &mut self,
        section_id: &str,
        patch: &SectionPatch,
    ) -> Result<(), DocumentError> {
        let next = document::update_section(&self.document, section_id, patch)?;
        self.commit(next);
        Ok(())
    }

    pub fn delete_section(&mut self, section_id: &str) -> Result<(), DocumentError> {
        let next = document::delete_section(&self.document, section_id)?;
        self.commit(next);
        self.forget_missing_items();
        Ok(())
    }

    pub fn reorder_sections(
        &mut self,
        from_index: usize,
        to_index: usize,
    ) -> Result<(), DocumentError> {
        let next = document::reorder_sections(&self.document, from_index, to_index)?;
        self.commit(next);
        Ok(())
    }

    pub fn add_question(&mut self, section_id: &str) -> Result<QuestionId, DocumentError> {
        let next = document::add_question(&self.document, section_id)?;
        let question_id = next
            .section(section_id)
            .and_then(|section| section.questions.last())
            .map(|question| question.id.clone())
            .unwrap_or_default();
        self.commit(next);
        self.expanded_question = Some(question_id.clone());
        Ok(question_id)
    }

    pub fn update_question(
        &mut self,
        section_id: &str,
        question_id: &str,
        patch: &QuestionPatch,
    ) -> Result<(), DocumentError> {
        let next = document::update_question(&self.document, section_id, question_id, patch)?;
        self.commit(next);
        Ok(())
    }

    pub fn delete_question(
        &mut self,
        section_id: &str,
        question_id: &str,
    ) -> Result<(), DocumentError> {
        let next = document::delete_question(&self.document, section_id, question_id)?;
        self.commit(next);
        self.forget_missing_items();
        Ok(())
    }

    pub fn reorder_questions(
        &mut self,
        section_id: &str,
        from_index: usize,
        to_index: usize,
    ) -> Result<(), DocumentError> {
        let next = document::reorder_questions(&self.document, section_id, from_index, to_index)?;
        self.commit(next);
        Ok(())
    }

    pub fn add_option(
        &mut self,
        section_id: &str,
        question_id: &str,
        option: impl Into<String>,
    ) -> Result<(), DocumentError> {
        let next = document::add_option(&self.document, section_id, question_id, option)?;
        self.commit(next);
        Ok(())
    }

    pub fn update_option(
        &mut self,
        section_id: &str,
        question_id: &str,
        index: usize,
        option: impl Into<String>,
    ) -> Result<(), DocumentError> {
        let next = document::update_option(&self.document, section_id, question_id, index, option)?;
        self.commit(next);
        Ok(())
    }

    pub fn remove_option(
        &mut self,
        section_id: &str,
        question_id: &str,
        index: usize,
    ) -> Result<(), DocumentError> {
        let next = document::remove_option(&self.document, section_id, question_id, index)?;
        self.commit(next);
        Ok(())
    }

    /// Expand a section, or collapse it when it is already expanded.
    pub fn toggle_section(&mut self, section_id: &str) {
        self.expanded_section = toggle(self.expanded_section.take(), section_id);
    }

    /// Expand a question, or collapse it when it is already expanded.
    pub fn toggle_question(&mut self, question_id: &str) {
        self.expanded_question = toggle(self.expanded_question.take(), question_id);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.undo.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.document, previous);
        self.redo.push(current);
        self.forget_missing_items();
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.document, next);
        self.undo.push(current);
        self.forget_missing_items();
        true
    }

    fn commit(&mut self, next: Assessment) {
        if next == self.document {
            return;
        }
        let previous = std::mem::replace(&mut self.document, next);
        self.undo.push(previous);
        if self.undo.len() > HISTORY_LIMIT {
            self.undo.remove(0);
        }
        self.redo.clear();
    }

    fn forget_missing_items(&mut self) {
        if let Some(question_id) = &self.expanded_question
            && self.document.find_question(question_id).is_none()
        {
            self.expanded_question = None;
        }
        if let Some(section_id) = &self.expanded_section
            && self.document.section(section_id).is_none()
        {
            self.expanded_section = None;
        }
    }
}

fn toggle(current: Option<String>, id: &str) -> Option<String> {
    match current {
        Some(expanded) if expanded == id => None,
        _ => Some(id.to_string()),
    }
}
