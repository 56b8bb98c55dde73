#![allow(missing_docs)]

pub mod builder;
pub mod document;
pub mod graph;
pub mod preview;
pub mod responses;
pub mod spec;
pub mod validate;
pub mod visibility;

pub use builder::AssessmentBuilder;
pub use document::{DocumentError, QuestionPatch, SectionPatch};
pub use graph::{DocumentIssue, check_document};
pub use preview::{PreviewSession, SessionError, SessionState, SubmitOutcome};
pub use responses::{
    AssessmentResponse, ErrorMap, ResponseMap, ResponseValue, ValidationError, toggle_choice,
};
pub use spec::{
    Assessment, AssessmentDraft, ConditionalLogic, Constraint, JobId, Question, QuestionId,
    QuestionType, Section, SectionId, ShowWhen,
};
pub use validate::{ValidationReport, parse_number, validate, validate_responses};
pub use visibility::{VisibilityMap, is_visible, resolve_visibility};
