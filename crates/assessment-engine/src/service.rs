use assessment_spec::{
    Assessment, AssessmentBuilder, AssessmentResponse, PreviewSession, SubmitOutcome,
    check_document,
};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::store::AssessmentStore;

/// A submit attempt and, when it went through, the record that was stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub outcome: SubmitOutcome,
    pub record: Option<AssessmentResponse>,
}

/// Connects builder and preview sessions to a persistence collaborator.
pub struct AssessmentService<S> {
    store: S,
    config: EngineConfig,
}

impl<S: AssessmentStore> AssessmentService<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn load(&self, job_id: &str) -> Result<Option<Assessment>, EngineError> {
        if job_id.trim().is_empty() {
            return Err(EngineError::MissingJobId);
        }
        self.store.load_assessment(job_id).map_err(|source| {
            warn!("Loading assessment for job {} failed: {}", job_id, source);
            EngineError::LoadFailed {
                job_id: job_id.to_string(),
                source,
            }
        })
    }

    /// Like [`AssessmentService::load`], but a missing assessment is an error.
    pub fn require(&self, job_id: &str) -> Result<Assessment, EngineError> {
        self.load(job_id)?
            .ok_or_else(|| EngineError::AssessmentNotFound(job_id.to_string()))
    }

    /// Edit the job's assessment, or start an empty one titled after the job.
    pub fn open_builder(
        &self,
        job_id: &str,
        job_title: &str,
    ) -> Result<AssessmentBuilder, EngineError> {
        if let Some(existing) = self.load(job_id)? {
            info!(
                "Loaded assessment {} for job {} ({} sections)",
                existing.id,
                job_id,
                existing.sections.len()
            );
            return Ok(AssessmentBuilder::new(existing));
        }
        self.new_builder(job_id, job_title)
    }

    /// Start an empty document for the job, ignoring anything already stored.
    /// Saving it replaces the stored assessment but keeps its identity.
    pub fn new_builder(
        &self,
        job_id: &str,
        job_title: &str,
    ) -> Result<AssessmentBuilder, EngineError> {
        if job_id.trim().is_empty() {
            return Err(EngineError::MissingJobId);
        }
        let text = self.config.new_assessment_text(job_title)?;
        let mut assessment = Assessment::new(job_id, text.title);
        assessment.description = Some(text.description);
        info!("Starting new assessment for job {}", job_id);
        Ok(AssessmentBuilder::new(assessment))
    }

    /// Persist the builder's document.
    ///
    /// On success the builder adopts the stored copy (identity and
    /// timestamps) and is no longer dirty. On failure the builder is left
    /// exactly as it was.
    pub fn save(&mut self, builder: &mut AssessmentBuilder) -> Result<Assessment, EngineError> {
        let document = builder.document();
        let job_id = document.job_id.clone();
        if job_id.trim().is_empty() {
            return Err(EngineError::MissingJobId);
        }
        if self.config.require_title && document.title.trim().is_empty() {
            warn!("Refusing to save untitled assessment for job {}", job_id);
            return Err(EngineError::MissingTitle);
        }
        if self.config.check_dependencies {
            let issues = check_document(document);
            if !issues.is_empty() {
                warn!(
                    "Refusing to save assessment for job {}: {} structural issue(s)",
                    job_id,
                    issues.len()
                );
                return Err(EngineError::InvalidDocument(issues));
            }
        }

        let stored = self
            .store
            .save_assessment(&job_id, document.to_draft())
            .map_err(|source| {
                warn!("Saving assessment for job {} failed: {}", job_id, source);
                EngineError::SaveFailed {
                    job_id: job_id.clone(),
                    source,
                }
            })?;
        info!(
            "Saved assessment {} for job {} ({} sections, {} questions)",
            stored.id,
            job_id,
            stored.sections.len(),
            stored.question_count()
        );
        builder.mark_saved(stored.clone());
        Ok(stored)
    }

    /// Submit a preview session and record the responses on the
    /// `Editing -> Submitted` transition only.
    pub fn submit(
        &mut self,
        session: &mut PreviewSession<'_>,
        candidate_id: &str,
    ) -> Result<Submission, EngineError> {
        let outcome = session.submit();
        let mut record = None;
        match &outcome {
            SubmitOutcome::Submitted => {
                let completed = session.response_record(candidate_id);
                self.record_responses(&completed)?;
                record = Some(completed);
            }
            SubmitOutcome::Rejected(errors) => {
                debug!(
                    "Submission for assessment {} rejected with {} error(s)",
                    session.assessment().id,
                    errors.len()
                );
            }
            SubmitOutcome::AlreadySubmitted => {
                debug!(
                    "Ignoring repeated submission for assessment {}",
                    session.assessment().id
                );
            }
        }
        Ok(Submission { outcome, record })
    }

    /// Store a completed response record; also the retry path after
    /// [`EngineError::SubmitFailed`].
    pub fn record_responses(&mut self, record: &AssessmentResponse) -> Result<(), EngineError> {
        match self.store.submit_responses(record) {
            Ok(()) => {
                info!(
                    "Recorded response {} for assessment {} ({} answers)",
                    record.id,
                    record.assessment_id,
                    record.responses.len()
                );
                Ok(())
            }
            Err(source) => {
                warn!("Recording response {} failed: {}", record.id, source);
                Err(EngineError::SubmitFailed {
                    record: Box::new(record.clone()),
                    source,
                })
            }
        }
    }
}
