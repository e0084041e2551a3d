//! Crew dispatch recommendations.
//!
//! Candidate jobs and the active subcontractor roster come from the repository
//! seams; the engine screens every crew against each job (compliance, then
//! performance, then capacity), scores the survivors with fixed additive weights,
//! and ranks them by confidence tier and matched-signal count. Nothing the
//! engine produces is persisted. Committing a recommendation is a separate write
//! on the service.

pub mod clock;
pub mod domain;
pub mod engine;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::{
    ActiveAssignment, AssignmentRecord, ComplianceStatus, FinancialSnapshot, IncidentSeverity,
    IncidentStatus, JobCandidate, JobId, JobRecord, JobStatus, MaterialOrder, MaterialOrderStatus,
    PerformanceStatus, QcCheck, QcCheckStatus, RiskLevel, SafetyIncident, Subcontractor,
    SubcontractorId,
};
pub use engine::{
    BlockingReason, Confidence, CrewOption, DispatchEngine, DispatchOverview,
    DispatchRecommendation, MaterialsEtaStatus, ReasonCode,
};
pub use repository::{CrewRepository, JobRepository, RepositoryError};
pub use router::dispatch_router;
pub use service::{CommitOutcome, CommitRequest, DispatchService, DispatchServiceError};
