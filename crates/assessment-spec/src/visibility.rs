use crate::responses::{ResponseMap, ResponseValue};
use crate::spec::assessment::Assessment;
use crate::spec::question::Question;

pub type VisibilityMap = std::collections::BTreeMap<String, bool>;

/// Decide whether a question is currently shown.
///
/// A missing or unanswered dependency hides the question, as does a
/// multi-choice dependency answer: only text answers are compared, and
/// strictly.
pub fn is_visible(question: &Question, responses: &ResponseMap) -> bool {
    let Some(logic) = &question.conditional_logic else {
        return true;
    };

    match responses.get(&logic.depends_on) {
        Some(ResponseValue::Text(answer)) => logic.show_when.matches(answer),
        Some(ResponseValue::Choices(_)) | None => false,
    }
}

pub fn resolve_visibility(assessment: &Assessment, responses: &ResponseMap) -> VisibilityMap {
    assessment
        .questions()
        .map(|question| (question.id.clone(), is_visible(question, responses)))
        .collect()
}
