use chrono::{DateTime, Duration, NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use solar_ops::config::DispatchDataConfig;
use solar_ops::error::AppError;
use solar_ops::workflows::dispatch::{
    ActiveAssignment, AssignmentRecord, ComplianceStatus, CrewRepository, FinancialSnapshot,
    IncidentSeverity, IncidentStatus, JobCandidate, JobId, JobRecord, JobRepository, JobStatus,
    MaterialOrder, MaterialOrderStatus, PerformanceStatus, QcCheck, QcCheckStatus,
    RepositoryError, RiskLevel, SafetyIncident, Subcontractor, SubcontractorId,
};
use solar_ops::workflows::roster::{DispatchSnapshot, RosterImporter};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Jobs, crews, and assignments held in process memory.
#[derive(Default, Clone)]
pub(crate) struct InMemoryDispatchStore {
    jobs: Arc<Mutex<HashMap<JobId, JobRecord>>>,
    subcontractors: Arc<Mutex<Vec<Subcontractor>>>,
    assignments: Arc<Mutex<Vec<AssignmentRecord>>>,
}

impl InMemoryDispatchStore {
    pub(crate) fn from_snapshot(snapshot: DispatchSnapshot) -> Self {
        let DispatchSnapshot {
            jobs,
            subcontractors,
            assignments,
        } = snapshot;

        let jobs = jobs
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();

        Self {
            jobs: Arc::new(Mutex::new(jobs)),
            subcontractors: Arc::new(Mutex::new(subcontractors)),
            assignments: Arc::new(Mutex::new(assignments)),
        }
    }

    pub(crate) fn assignments(&self) -> Vec<AssignmentRecord> {
        self.assignments
            .lock()
            .expect("assignment mutex poisoned")
            .clone()
    }
}

impl JobRepository for InMemoryDispatchStore {
    fn dispatch_candidates(&self, date: NaiveDate) -> Result<Vec<JobCandidate>, RepositoryError> {
        let guard = self.jobs.lock().expect("job mutex poisoned");
        let mut candidates: Vec<JobCandidate> = guard
            .values()
            .filter(|record| record.is_dispatch_candidate(date))
            .map(JobRecord::to_candidate)
            .collect();
        candidates.sort_by(|a, b| a.job_number.cmp(&b.job_number));
        Ok(candidates)
    }

    fn fetch_candidate(&self, id: &JobId) -> Result<Option<JobCandidate>, RepositoryError> {
        let guard = self.jobs.lock().expect("job mutex poisoned");
        Ok(guard.get(id).map(JobRecord::to_candidate))
    }

    fn schedule(&self, id: &JobId, date: NaiveDate) -> Result<(), RepositoryError> {
        let mut guard = self.jobs.lock().expect("job mutex poisoned");
        let record = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        record.scheduled_date = Some(date);
        if record.status.is_early_pipeline() {
            record.status = JobStatus::Scheduled;
        }
        Ok(())
    }
}

impl CrewRepository for InMemoryDispatchStore {
    fn active_roster(&self) -> Result<Vec<Subcontractor>, RepositoryError> {
        let jobs = self.jobs.lock().expect("job mutex poisoned");
        let assignments = self.assignments.lock().expect("assignment mutex poisoned");
        let roster = self.subcontractors.lock().expect("roster mutex poisoned");

        Ok(roster
            .iter()
            .filter(|crew| crew.active)
            .map(|crew| {
                let mut crew = crew.clone();
                // Workload comes only from live assignment records.
                crew.active_assignments = assignments
                    .iter()
                    .filter(|record| record.is_active() && record.subcontractor_id == crew.id)
                    .filter_map(|record| jobs.get(&record.job_id))
                    .map(|job| ActiveAssignment {
                        job_id: job.id.clone(),
                        job_scheduled_date: job.scheduled_date,
                        job_status: job.status,
                    })
                    .collect();
                crew
            })
            .collect())
    }

    fn fetch(&self, id: &SubcontractorId) -> Result<Option<Subcontractor>, RepositoryError> {
        let guard = self.subcontractors.lock().expect("roster mutex poisoned");
        Ok(guard.iter().find(|crew| &crew.id == id).cloned())
    }

    fn assignment_for(
        &self,
        job_id: &JobId,
        subcontractor_id: &SubcontractorId,
    ) -> Result<Option<AssignmentRecord>, RepositoryError> {
        let guard = self.assignments.lock().expect("assignment mutex poisoned");
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
        let mut guard = self.assignments.lock().expect("assignment mutex poisoned");
        if guard.iter().any(|existing| {
            existing.is_active()
                && existing.job_id == record.job_id
                && existing.subcontractor_id == record.subcontractor_id
        }) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(record.clone());
        Ok(record)
    }
}

/// Snapshot named by the configuration, or the built-in sample board, with any
/// roster export overlaid.
pub(crate) fn load_snapshot(
    config: &DispatchDataConfig,
    date: NaiveDate,
    now: DateTime<Utc>,
) -> Result<DispatchSnapshot, AppError> {
    let mut snapshot = match &config.snapshot_path {
        Some(path) => {
            info!(path = %path.display(), "loading dispatch snapshot");
            DispatchSnapshot::from_path(path)?
        }
        None => sample_snapshot(date, now),
    };

    if let Some(path) = &config.roster_csv {
        let roster = RosterImporter::from_path(path)?;
        info!(path = %path.display(), crews = roster.len(), "merging roster export");
        snapshot.merge_roster(roster);
    }

    Ok(snapshot)
}

/// Phoenix-area board used when no snapshot is configured.
pub(crate) fn sample_snapshot(date: NaiveDate, now: DateTime<Utc>) -> DispatchSnapshot {
    let yesterday = date.pred_opt();

    let jobs = vec![
        JobRecord {
            id: JobId("job-1001".to_string()),
            job_number: "SO-1001".to_string(),
            customer_name: "Ramirez Residence".to_string(),
            city: Some("Phoenix".to_string()),
            status: JobStatus::Scheduled,
            risk_level: Some(RiskLevel::Low),
            scheduled_date: Some(date),
            system_size_kw: Some(8.4),
            material_orders: vec![MaterialOrder {
                status: MaterialOrderStatus::Delivered,
                expected_delivery_date: Some(now - Duration::days(2)),
            }],
            financial: Some(FinancialSnapshot {
                contract_value: 24_800.0,
                amount_collected: 7_440.0,
            }),
            qc_checks: Vec::new(),
            safety_incidents: Vec::new(),
        },
        JobRecord {
            id: JobId("job-1002".to_string()),
            job_number: "SO-1002".to_string(),
            customer_name: "Chen Residence".to_string(),
            city: Some("Tempe".to_string()),
            status: JobStatus::ReadyToSchedule,
            risk_level: Some(RiskLevel::Medium),
            scheduled_date: None,
            system_size_kw: Some(6.1),
            material_orders: vec![MaterialOrder {
                status: MaterialOrderStatus::Shipped,
                expected_delivery_date: Some(now + Duration::days(2)),
            }],
            financial: None,
            qc_checks: Vec::new(),
            safety_incidents: Vec::new(),
        },
        JobRecord {
            id: JobId("job-1003".to_string()),
            job_number: "SO-1003".to_string(),
            customer_name: "Okafor Residence".to_string(),
            city: Some("Mesa".to_string()),
            status: JobStatus::Scheduled,
            risk_level: Some(RiskLevel::High),
            scheduled_date: Some(date),
            system_size_kw: Some(11.2),
            material_orders: vec![MaterialOrder {
                status: MaterialOrderStatus::Ordered,
                expected_delivery_date: Some(now - Duration::days(5)),
            }],
            financial: None,
            qc_checks: vec![QcCheck {
                category: "roof attachment".to_string(),
                status: QcCheckStatus::Failed,
            }],
            safety_incidents: Vec::new(),
        },
        JobRecord {
            id: JobId("job-1004".to_string()),
            job_number: "SO-1004".to_string(),
            customer_name: "Patel Residence".to_string(),
            city: Some("Phoenix".to_string()),
            status: JobStatus::New,
            risk_level: Some(RiskLevel::Low),
            scheduled_date: None,
            system_size_kw: Some(7.0),
            material_orders: Vec::new(),
            financial: None,
            qc_checks: Vec::new(),
            safety_incidents: vec![SafetyIncident {
                severity: IncidentSeverity::High,
                status: IncidentStatus::Investigating,
                summary: "unsecured ladder on prior site visit".to_string(),
            }],
        },
        JobRecord {
            id: JobId("job-1005".to_string()),
            job_number: "SO-1005".to_string(),
            customer_name: "Nguyen Residence".to_string(),
            city: Some("Mesa".to_string()),
            status: JobStatus::InProgress,
            risk_level: Some(RiskLevel::Medium),
            scheduled_date: yesterday,
            system_size_kw: Some(9.6),
            material_orders: Vec::new(),
            financial: None,
            qc_checks: Vec::new(),
            safety_incidents: Vec::new(),
        },
    ];

    let subcontractors = vec![
        sample_crew(
            "sub-101",
            "Desert Sun Installers",
            Some(PerformanceStatus::Green),
            Some(ComplianceStatus::Compliant),
            Some(3),
            Some("Phoenix"),
        ),
        sample_crew(
            "sub-102",
            "Valley Mounts",
            Some(PerformanceStatus::Yellow),
            Some(ComplianceStatus::Compliant),
            Some(2),
            Some("Tempe"),
        ),
        sample_crew(
            "sub-103",
            "Red Rock Electric",
            Some(PerformanceStatus::Red),
            Some(ComplianceStatus::Compliant),
            Some(4),
            Some("Mesa"),
        ),
        sample_crew(
            "sub-104",
            "Copper State Solar",
            Some(PerformanceStatus::Green),
            Some(ComplianceStatus::NonCompliant),
            Some(2),
            Some("Phoenix"),
        ),
        sample_crew(
            "sub-105",
            "Saguaro Power",
            None,
            Some(ComplianceStatus::Compliant),
            None,
            Some("Mesa"),
        ),
    ];

    let assignments = vec![AssignmentRecord {
        job_id: JobId("job-1005".to_string()),
        subcontractor_id: SubcontractorId("sub-105".to_string()),
        assigned_at: now - Duration::days(3),
        unassigned_at: None,
    }];

    DispatchSnapshot {
        jobs,
        subcontractors,
        assignments,
    }
}

fn sample_crew(
    id: &str,
    name: &str,
    performance_status: Option<PerformanceStatus>,
    compliance: Option<ComplianceStatus>,
    max_concurrent_jobs: Option<u32>,
    home_base_city: Option<&str>,
) -> Subcontractor {
    Subcontractor {
        id: SubcontractorId(id.to_string()),
        name: name.to_string(),
        active: true,
        performance_status,
        last_compliance_status: compliance,
        max_concurrent_jobs,
        home_base_city: home_base_city.map(str::to_string),
        active_assignments: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_store() -> (InMemoryDispatchStore, NaiveDate) {
        let now = Utc
            .with_ymd_and_hms(2025, 10, 15, 15, 0, 0)
            .single()
            .expect("valid instant");
        let date = now.date_naive();
        (
            InMemoryDispatchStore::from_snapshot(sample_snapshot(date, now)),
            date,
        )
    }

    #[test]
    fn candidates_cover_scheduled_and_unscheduled_early_jobs() {
        let (store, date) = sample_store();

        let candidates = store.dispatch_candidates(date).expect("candidates load");
        let numbers: Vec<&str> = candidates
            .iter()
            .map(|job| job.job_number.as_str())
            .collect();

        assert_eq!(numbers, vec!["SO-1001", "SO-1002", "SO-1003", "SO-1004"]);
        assert!(candidates[2].has_failed_qc);
        assert!(candidates[3].has_safety_issues);
    }

    #[test]
    fn roster_joins_active_assignments_to_job_state() {
        let (store, date) = sample_store();

        let roster = store.active_roster().expect("roster loads");
        let saguaro = roster
            .iter()
            .find(|crew| crew.id.0 == "sub-105")
            .expect("crew present");

        assert_eq!(saguaro.active_assignments.len(), 1);
        assert_eq!(saguaro.active_assignments[0].job_status, JobStatus::InProgress);
        assert_eq!(saguaro.active_assignments[0].job_scheduled_date, date.pred_opt());
    }

    #[test]
    fn roster_ignores_workload_embedded_in_snapshot() {
        let date = NaiveDate::from_ymd_opt(2025, 10, 15).expect("valid date");
        let mut crew = sample_crew(
            "sub-1",
            "Desert Sun Installers",
            Some(PerformanceStatus::Green),
            Some(ComplianceStatus::Compliant),
            Some(1),
            Some("Phoenix"),
        );
        crew.active_assignments.push(ActiveAssignment {
            job_id: JobId("job-9".to_string()),
            job_scheduled_date: Some(date),
            job_status: JobStatus::Scheduled,
        });
        let mut finished = sample_snapshot(date, Utc::now()).jobs.remove(0);
        finished.id = JobId("job-9".to_string());
        finished.status = JobStatus::Complete;
        let store = InMemoryDispatchStore::from_snapshot(DispatchSnapshot {
            jobs: vec![finished],
            subcontractors: vec![crew],
            assignments: Vec::new(),
        });

        let roster = store.active_roster().expect("roster loads");

        assert_eq!(roster.len(), 1);
        assert!(roster[0].active_assignments.is_empty());
    }

    #[test]
    fn roster_reflects_current_job_state_and_unassignment() {
        let (store, date) = sample_store();
        let id = JobId("job-1002".to_string());
        let crew_id = SubcontractorId("sub-102".to_string());
        store
            .assign(AssignmentRecord {
                job_id: id.clone(),
                subcontractor_id: crew_id.clone(),
                assigned_at: Utc::now(),
                unassigned_at: None,
            })
            .expect("assignment recorded");
        store.schedule(&id, date).expect("job scheduled");

        let roster = store.active_roster().expect("roster loads");
        let valley = roster
            .iter()
            .find(|crew| crew.id == crew_id)
            .expect("crew present");
        assert_eq!(valley.active_assignments.len(), 1);
        assert_eq!(valley.active_assignments[0].job_scheduled_date, Some(date));
        assert_eq!(valley.active_assignments[0].job_status, JobStatus::Scheduled);

        for record in store
            .assignments
            .lock()
            .expect("assignment mutex poisoned")
            .iter_mut()
            .filter(|record| record.subcontractor_id == crew_id)
        {
            record.unassigned_at = Some(Utc::now());
        }

        let roster = store.active_roster().expect("roster loads");
        let valley = roster
            .iter()
            .find(|crew| crew.id == crew_id)
            .expect("crew present");
        assert!(valley.active_assignments.is_empty());
    }

    #[test]
    fn scheduling_moves_early_jobs_onto_the_calendar() {
        let (store, date) = sample_store();
        let id = JobId("job-1002".to_string());

        store.schedule(&id, date).expect("job scheduled");

        let job = store
            .fetch_candidate(&id)
            .expect("lookup succeeds")
            .expect("job exists");
        assert_eq!(job.scheduled_date, Some(date));
        assert_eq!(job.status, JobStatus::Scheduled);
        assert!(matches!(
            store.schedule(&JobId("job-404".to_string()), date),
            Err(RepositoryError::NotFound)
        ));
    }

    #[test]
    fn duplicate_active_assignment_conflicts() {
        let (store, _) = sample_store();
        let existing = store.assignments()[0].clone();

        assert!(matches!(
            store.assign(existing),
            Err(RepositoryError::Conflict)
        ));
    }

    #[test]
    fn load_snapshot_falls_back_to_sample_board() {
        let (_, date) = sample_store();
        let config = DispatchDataConfig::default();

        let snapshot = load_snapshot(&config, date, Utc::now()).expect("sample loads");

        assert_eq!(snapshot.jobs.len(), 5);
        assert_eq!(snapshot.subcontractors.len(), 5);
    }
}
