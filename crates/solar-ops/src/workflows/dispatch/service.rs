use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::domain::{deserialize_date, AssignmentRecord, JobId, SubcontractorId};
use super::engine::{DispatchEngine, DispatchOverview, DispatchRecommendation};
use super::repository::{CrewRepository, JobRepository, RepositoryError};

/// Service composing the job and crew repositories with the recommendation engine.
pub struct DispatchService<J, C> {
    jobs: Arc<J>,
    crews: Arc<C>,
    clock: Arc<dyn Clock>,
    engine: DispatchEngine,
}

/// Accepted recommendation to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRequest {
    pub job_id: JobId,
    pub subcontractor_id: SubcontractorId,
    #[serde(deserialize_with = "deserialize_date")]
    pub scheduled_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitOutcome {
    pub job_id: JobId,
    pub subcontractor_id: SubcontractorId,
    pub scheduled_date: NaiveDate,
    pub assignment_created: bool,
}

impl<J, C> DispatchService<J, C>
where
    J: JobRepository + 'static,
    C: CrewRepository + 'static,
{
    pub fn new(jobs: Arc<J>, crews: Arc<C>, clock: Arc<dyn Clock>) -> Self {
        let engine = DispatchEngine::new(clock.clone());
        Self {
            jobs,
            crews,
            clock,
            engine,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Recommendations for every candidate job on `date` (default: today).
    pub fn overview(
        &self,
        date: Option<NaiveDate>,
    ) -> Result<DispatchOverview, DispatchServiceError> {
        let date = date.unwrap_or_else(|| self.today());
        let candidates = self.jobs.dispatch_candidates(date)?;
        let roster = self.crews.active_roster()?;

        debug!(
            %date,
            jobs = candidates.len(),
            crews = roster.len(),
            "computing dispatch overview"
        );
        let overview = self.engine.compute_overview(date, &candidates, &roster);

        info!(
            %date,
            total = overview.jobs_total,
            dispatchable = overview.jobs_dispatchable,
            blocked = overview.jobs_blocked,
            "dispatch overview computed"
        );
        Ok(overview)
    }

    /// Recommendation for one job, or `None` when the job is unknown.
    pub fn recommendation_for_job(
        &self,
        job_id: &JobId,
        date: Option<NaiveDate>,
    ) -> Result<Option<DispatchRecommendation>, DispatchServiceError> {
        let Some(job) = self.jobs.fetch_candidate(job_id)? else {
            debug!(job = %job_id, "recommendation requested for unknown job");
            return Ok(None);
        };

        let date = date.unwrap_or_else(|| self.today());
        let roster = self.crews.active_roster()?;
        let recommendation = self
            .engine
            .compute_recommendation_for_job(&job, &roster, date);

        debug!(
            job = %job_id,
            %date,
            can_start = recommendation.can_start,
            "job recommendation computed"
        );
        Ok(Some(recommendation))
    }

    /// Record the assignment unless it already exists, then schedule the job.
    pub fn commit(&self, request: CommitRequest) -> Result<CommitOutcome, DispatchServiceError> {
        let CommitRequest {
            job_id,
            subcontractor_id,
            scheduled_date,
        } = request;

        if self.jobs.fetch_candidate(&job_id)?.is_none() {
            warn!(job = %job_id, "commit rejected: unknown job");
            return Err(RepositoryError::NotFound.into());
        }

        let subcontractor = self
            .crews
            .fetch(&subcontractor_id)?
            .ok_or(RepositoryError::NotFound)?;
        if !subcontractor.active {
            warn!(subcontractor = %subcontractor_id, "commit rejected: inactive crew");
            return Err(DispatchServiceError::InactiveSubcontractor(subcontractor_id));
        }

        // A rejected assignment must leave the job's schedule unchanged.
        let assignment_created = match self.crews.assignment_for(&job_id, &subcontractor_id)? {
            Some(_) => false,
            None => {
                self.crews.assign(AssignmentRecord {
                    job_id: job_id.clone(),
                    subcontractor_id: subcontractor_id.clone(),
                    assigned_at: self.clock.now(),
                    unassigned_at: None,
                })?;
                true
            }
        };

        self.jobs.schedule(&job_id, scheduled_date)?;

        info!(
            job = %job_id,
            subcontractor = %subcontractor_id,
            %scheduled_date,
            assignment_created,
            "dispatch committed"
        );

        Ok(CommitOutcome {
            job_id,
            subcontractor_id,
            scheduled_date,
            assignment_created,
        })
    }
}

/// Error raised by the dispatch service.
#[derive(Debug, thiserror::Error)]
pub enum DispatchServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("subcontractor {0} is not active")]
    InactiveSubcontractor(SubcontractorId),
}
