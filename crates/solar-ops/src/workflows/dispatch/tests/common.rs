use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::dispatch::clock::FixedClock;
use crate::workflows::dispatch::domain::{
    ActiveAssignment, AssignmentRecord, ComplianceStatus, JobCandidate, JobId, JobRecord,
    JobStatus, MaterialOrder, MaterialOrderStatus, PerformanceStatus, RiskLevel, Subcontractor,
    SubcontractorId,
};
use crate::workflows::dispatch::engine::DispatchEngine;
use crate::workflows::dispatch::repository::{CrewRepository, JobRepository, RepositoryError};
use crate::workflows::dispatch::{dispatch_router, DispatchService};

pub(super) fn target_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 15).expect("valid date")
}

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 15, 8, 0, 0)
        .single()
        .expect("valid instant")
}

pub(super) fn engine() -> DispatchEngine {
    DispatchEngine::new(Arc::new(FixedClock(now())))
}

pub(super) fn job(id: &str) -> JobCandidate {
    JobCandidate {
        id: JobId(id.to_string()),
        job_number: format!("J-{id}"),
        customer_name: "Ramirez Residence".to_string(),
        city: Some("Phoenix".to_string()),
        status: JobStatus::Scheduled,
        risk_level: Some(RiskLevel::Low),
        scheduled_date: Some(target_date()),
        system_size_kw: Some(8.4),
        material_orders: Vec::new(),
        financial: None,
        has_failed_qc: false,
        has_safety_issues: false,
    }
}

pub(super) fn order(status: MaterialOrderStatus, eta_offset_hours: Option<i64>) -> MaterialOrder {
    MaterialOrder {
        status,
        expected_delivery_date: eta_offset_hours.map(|hours| now() + Duration::hours(hours)),
    }
}

pub(super) fn crew(
    id: &str,
    performance: Option<PerformanceStatus>,
    max_concurrent_jobs: Option<u32>,
    home_base_city: Option<&str>,
) -> Subcontractor {
    Subcontractor {
        id: SubcontractorId(id.to_string()),
        name: format!("Crew {id}"),
        active: true,
        performance_status: performance,
        last_compliance_status: Some(ComplianceStatus::Compliant),
        max_concurrent_jobs,
        home_base_city: home_base_city.map(str::to_string),
        active_assignments: Vec::new(),
    }
}

pub(super) fn busy_with(
    mut subcontractor: Subcontractor,
    job_id: &str,
    scheduled: Option<NaiveDate>,
    status: JobStatus,
) -> Subcontractor {
    subcontractor.active_assignments.push(ActiveAssignment {
        job_id: JobId(job_id.to_string()),
        job_scheduled_date: scheduled,
        job_status: status,
    });
    subcontractor
}

pub(super) fn job_record(id: &str, status: JobStatus, scheduled: Option<NaiveDate>) -> JobRecord {
    JobRecord {
        id: JobId(id.to_string()),
        job_number: format!("J-{id}"),
        customer_name: "Okafor Residence".to_string(),
        city: Some("Phoenix".to_string()),
        status,
        risk_level: Some(RiskLevel::Medium),
        scheduled_date: scheduled,
        system_size_kw: Some(6.2),
        material_orders: Vec::new(),
        financial: None,
        qc_checks: Vec::new(),
        safety_incidents: Vec::new(),
    }
}

#[derive(Default)]
pub(super) struct MemoryJobs {
    pub(super) records: Mutex<HashMap<JobId, JobRecord>>,
}

impl MemoryJobs {
    pub(super) fn with(records: Vec<JobRecord>) -> Self {
        let map = records
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();
        Self {
            records: Mutex::new(map),
        }
    }

    pub(super) fn scheduled_date(&self, id: &str) -> Option<NaiveDate> {
        self.records
            .lock()
            .expect("jobs mutex poisoned")
            .get(&JobId(id.to_string()))
            .and_then(|record| record.scheduled_date)
    }
}

impl JobRepository for MemoryJobs {
    fn dispatch_candidates(&self, date: NaiveDate) -> Result<Vec<JobCandidate>, RepositoryError> {
        let guard = self.records.lock().expect("jobs mutex poisoned");
        let mut candidates: Vec<JobCandidate> = guard
            .values()
            .filter(|record| record.is_dispatch_candidate(date))
            .map(JobRecord::to_candidate)
            .collect();
        candidates.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(candidates)
    }

    fn fetch_candidate(&self, id: &JobId) -> Result<Option<JobCandidate>, RepositoryError> {
        let guard = self.records.lock().expect("jobs mutex poisoned");
        Ok(guard.get(id).map(JobRecord::to_candidate))
    }

    fn schedule(&self, id: &JobId, date: NaiveDate) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("jobs mutex poisoned");
        let record = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        record.scheduled_date = Some(date);
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct MemoryCrews {
    pub(super) roster: Mutex<Vec<Subcontractor>>,
    pub(super) assignments: Mutex<Vec<AssignmentRecord>>,
}

impl MemoryCrews {
    pub(super) fn with(roster: Vec<Subcontractor>) -> Self {
        Self {
            roster: Mutex::new(roster),
            assignments: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn assignments(&self) -> Vec<AssignmentRecord> {
        self.assignments
            .lock()
            .expect("assignments mutex poisoned")
            .clone()
    }
}

impl CrewRepository for MemoryCrews {
    fn active_roster(&self) -> Result<Vec<Subcontractor>, RepositoryError> {
        let guard = self.roster.lock().expect("roster mutex poisoned");
        Ok(guard.iter().filter(|crew| crew.active).cloned().collect())
    }

    fn fetch(&self, id: &SubcontractorId) -> Result<Option<Subcontractor>, RepositoryError> {
        let guard = self.roster.lock().expect("roster mutex poisoned");
        Ok(guard.iter().find(|crew| &crew.id == id).cloned())
    }

    fn assignment_for(
        &self,
        job_id: &JobId,
        subcontractor_id: &SubcontractorId,
    ) -> Result<Option<AssignmentRecord>, RepositoryError> {
        let guard = self.assignments.lock().expect("assignments mutex poisoned");
        Ok(guard
            .iter()
            .find(|record| {
                record.is_active()
                    && &record.job_id == job_id
                    && &record.subcontractor_id == subcontractor_id
            })
            .cloned())
    }

    fn assign(&self, record: AssignmentRecord) -> Result<AssignmentRecord, RepositoryError> {
        self.assignments
            .lock()
            .expect("assignments mutex poisoned")
            .push(record.clone());
        Ok(record)
    }
}

pub(super) struct UnavailableJobs;

impl JobRepository for UnavailableJobs {
    fn dispatch_candidates(&self, _date: NaiveDate) -> Result<Vec<JobCandidate>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_candidate(&self, _id: &JobId) -> Result<Option<JobCandidate>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn schedule(&self, _id: &JobId, _date: NaiveDate) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Roster lookups succeed; every assignment write loses a race.
pub(super) struct ConflictingCrews(pub(super) MemoryCrews);

impl CrewRepository for ConflictingCrews {
    fn active_roster(&self) -> Result<Vec<Subcontractor>, RepositoryError> {
        self.0.active_roster()
    }

    fn fetch(&self, id: &SubcontractorId) -> Result<Option<Subcontractor>, RepositoryError> {
        self.0.fetch(id)
    }

    fn assignment_for(
        &self,
        job_id: &JobId,
        subcontractor_id: &SubcontractorId,
    ) -> Result<Option<AssignmentRecord>, RepositoryError> {
        self.0.assignment_for(job_id, subcontractor_id)
    }

    fn assign(&self, _record: AssignmentRecord) -> Result<AssignmentRecord, RepositoryError> {
        Err(RepositoryError::Conflict)
    }
}

pub(super) fn build_service() -> (
    DispatchService<MemoryJobs, MemoryCrews>,
    Arc<MemoryJobs>,
    Arc<MemoryCrews>,
) {
    let jobs = Arc::new(MemoryJobs::with(vec![
        job_record("job-1", JobStatus::Scheduled, Some(target_date())),
        job_record("job-2", JobStatus::ReadyToSchedule, None),
        job_record("job-3", JobStatus::Complete, Some(target_date())),
        job_record("job-4", JobStatus::Scheduled, target_date().succ_opt()),
    ]));

    let mut retired = crew("sub-retired", Some(PerformanceStatus::Green), Some(2), None);
    retired.active = false;
    let crews = Arc::new(MemoryCrews::with(vec![
        crew("sub-1", Some(PerformanceStatus::Green), Some(3), Some("Phoenix")),
        crew("sub-2", Some(PerformanceStatus::Yellow), Some(2), None),
        retired,
    ]));

    let service = DispatchService::new(jobs.clone(), crews.clone(), Arc::new(FixedClock(now())));
    (service, jobs, crews)
}

pub(super) fn router_with_service(
    service: DispatchService<MemoryJobs, MemoryCrews>,
) -> axum::Router {
    dispatch_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
