use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use assessment_spec::{Assessment, AssessmentDraft, AssessmentResponse, JobId};
use chrono::Utc;
use uuid::Uuid;

use crate::error::StoreError;

/// Persistence collaborator for assessments and submitted responses.
///
/// Assessments are keyed by job: saving for a job that already has one
/// replaces it (last write wins) while keeping its identity and creation time.
pub trait AssessmentStore {
    fn load_assessment(&self, job_id: &str) -> Result<Option<Assessment>, StoreError>;

    fn save_assessment(
        &mut self,
        job_id: &str,
        draft: AssessmentDraft,
    ) -> Result<Assessment, StoreError>;

    fn submit_responses(&mut self, record: &AssessmentResponse) -> Result<(), StoreError>;
}

/// Build the stored document for an upsert.
pub fn upsert(existing: Option<&Assessment>, job_id: &str, draft: AssessmentDraft) -> Assessment {
    let now = Utc::now();
    Assessment {
        id: existing
            .map(|assessment| assessment.id.clone())
            .unwrap_or_else(|| format!("assessment_{}", Uuid::new_v4().simple())),
        job_id: job_id.to_string(),
        title: draft.title,
        description: draft.description,
        sections: draft.sections,
        created_at: existing
            .map(|assessment| assessment.created_at)
            .unwrap_or(now),
        updated_at: now,
    }
}

/// Process-local store, mainly for tests and previews.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    assessments: BTreeMap<JobId, Assessment>,
    responses: Vec<AssessmentResponse>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assessments(assessments: impl IntoIterator<Item = Assessment>) -> Self {
        Self {
            assessments: assessments
                .into_iter()
                .map(|assessment| (assessment.job_id.clone(), assessment))
                .collect(),
            responses: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.assessments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assessments.is_empty()
    }

    pub fn responses(&self) -> &[AssessmentResponse] {
        &self.responses
    }
}

impl AssessmentStore for MemoryStore {
    fn load_assessment(&self, job_id: &str) -> Result<Option<Assessment>, StoreError> {
        Ok(self.assessments.get(job_id).cloned())
    }

    fn save_assessment(
        &mut self,
        job_id: &str,
        draft: AssessmentDraft,
    ) -> Result<Assessment, StoreError> {
        let stored = upsert(self.assessments.get(job_id), job_id, draft);
        self.assessments.insert(job_id.to_string(), stored.clone());
        Ok(stored)
    }

    fn submit_responses(&mut self, record: &AssessmentResponse) -> Result<(), StoreError> {
        self.responses.push(record.clone());
        Ok(())
    }
}

/// Directory-backed store.
///
/// Layout: `<root>/assessments/<job>.assessment.json` and
/// `<root>/responses/<response id>.response.cbor`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn assessment_path(&self, job_id: &str) -> PathBuf {
        self.root
            .join("assessments")
            .join(format!("{}.assessment.json", sanitize_file_name(job_id)))
    }

    fn responses_dir(&self) -> PathBuf {
        self.root.join("responses")
    }

    /// Every stored assessment, ordered by job id.
    pub fn list_assessments(&self) -> Result<Vec<Assessment>, StoreError> {
        let dir = self.root.join("assessments");
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&dir).map_err(|source| io_error(&dir, source))?;
        let mut assessments = Vec::new();
        for entry in entries {
            let path = entry.map_err(|source| io_error(&dir, source))?.path();
            let is_assessment = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(".assessment.json"));
            if !is_assessment {
                continue;
            }
            let contents = fs::read_to_string(&path).map_err(|source| io_error(&path, source))?;
            let assessment: Assessment =
                serde_json::from_str(&contents).map_err(|source| StoreError::Json {
                    path: path.clone(),
                    source,
                })?;
            assessments.push(assessment);
        }
        assessments.sort_by(|left, right| left.job_id.cmp(&right.job_id));
        Ok(assessments)
    }

    /// Every stored response record, ordered by creation time.
    pub fn list_responses(&self) -> Result<Vec<AssessmentResponse>, StoreError> {
        let dir = self.responses_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&dir).map_err(|source| io_error(&dir, source))?;
        let mut records = Vec::new();
        for entry in entries {
            let path = entry.map_err(|source| io_error(&dir, source))?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("cbor") {
                continue;
            }
            let bytes = fs::read(&path).map_err(|source| io_error(&path, source))?;
            records.push(AssessmentResponse::from_cbor(&bytes)?);
        }
        records.sort_by_key(|record| record.created_at);
        Ok(records)
    }
}

impl AssessmentStore for FileStore {
    fn load_assessment(&self, job_id: &str) -> Result<Option<Assessment>, StoreError> {
        let path = self.assessment_path(job_id);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path).map_err(|source| io_error(&path, source))?;
        let assessment: Assessment =
            serde_json::from_str(&contents).map_err(|source| StoreError::Json {
                path: path.clone(),
                source,
            })?;
        if assessment.job_id != job_id {
            return Err(StoreError::Conflict {
                path,
                expected: job_id.to_string(),
                found: assessment.job_id,
            });
        }
        Ok(Some(assessment))
    }

    fn save_assessment(
        &mut self,
        job_id: &str,
        draft: AssessmentDraft,
    ) -> Result<Assessment, StoreError> {
        let existing = self.load_assessment(job_id)?;
        let stored = upsert(existing.as_ref(), job_id, draft);

        let path = self.assessment_path(job_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
        }
        let contents = serde_json::to_string_pretty(&stored).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, contents).map_err(|source| io_error(&path, source))?;
        Ok(stored)
    }

    fn submit_responses(&mut self, record: &AssessmentResponse) -> Result<(), StoreError> {
        let dir = self.responses_dir();
        fs::create_dir_all(&dir).map_err(|source| io_error(&dir, source))?;
        let path = dir.join(format!("{}.response.cbor", sanitize_file_name(&record.id)));
        fs::write(&path, record.to_cbor()?).map_err(|source| io_error(&path, source))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn sanitize_file_name(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "assessment".into()
    } else {
        cleaned
    }
}
