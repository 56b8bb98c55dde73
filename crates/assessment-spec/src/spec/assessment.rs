use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::question::Question;
use crate::spec::section::Section;

/// Identifier of the job owning an assessment.
pub type JobId = String;

/// Top-level assessment document, one per job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    /// Empty until the store assigns an identity on first save.
    #[serde(default)]
    pub id: String,
    pub job_id: JobId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Assessment {
    /// Unsaved, empty document for a job.
    pub fn new(job_id: impl Into<JobId>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            job_id: job_id.into(),
            title: title.into(),
            description: None,
            sections: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_persisted(&self) -> bool {
        !self.id.is_empty()
    }

    pub fn section(&self, section_id: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.id == section_id)
    }

    /// Questions in document order: sections by position, then questions by position.
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.sections
            .iter()
            .flat_map(|section| section.questions.iter())
    }

    pub fn find_question(&self, question_id: &str) -> Option<&Question> {
        self.questions().find(|question| question.id == question_id)
    }

    pub fn question_count(&self) -> usize {
        self.sections
            .iter()
            .map(|section| section.questions.len())
            .sum()
    }

    /// The persisted payload of a save request.
    pub fn to_draft(&self) -> AssessmentDraft {
        AssessmentDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            sections: self.sections.clone(),
        }
    }
}

/// Fields a caller sends when upserting an assessment for a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentDraft {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
}
