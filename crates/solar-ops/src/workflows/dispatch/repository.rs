use chrono::NaiveDate;

use super::domain::{AssignmentRecord, JobCandidate, JobId, Subcontractor, SubcontractorId};

/// Job-side queries in the shape the engine consumes.
pub trait JobRepository: Send + Sync {
    /// Open jobs scheduled on `date`, plus unscheduled early-pipeline jobs.
    fn dispatch_candidates(&self, date: NaiveDate) -> Result<Vec<JobCandidate>, RepositoryError>;
    fn fetch_candidate(&self, id: &JobId) -> Result<Option<JobCandidate>, RepositoryError>;
    fn schedule(&self, id: &JobId, date: NaiveDate) -> Result<(), RepositoryError>;
}

/// Crew-side queries and assignment writes.
pub trait CrewRepository: Send + Sync {
    /// Active subcontractors with their open assignments attached.
    fn active_roster(&self) -> Result<Vec<Subcontractor>, RepositoryError>;
    fn fetch(&self, id: &SubcontractorId) -> Result<Option<Subcontractor>, RepositoryError>;
    fn assignment_for(
        &self,
        job_id: &JobId,
        subcontractor_id: &SubcontractorId,
    ) -> Result<Option<AssignmentRecord>, RepositoryError>;
    fn assign(&self, record: AssignmentRecord) -> Result<AssignmentRecord, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
