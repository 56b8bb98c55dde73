pub mod assessment;
pub mod question;
pub mod section;

pub use assessment::{Assessment, AssessmentDraft, JobId};
pub use question::{ConditionalLogic, Constraint, Question, QuestionId, QuestionType, ShowWhen};
pub use section::{Section, SectionId};
