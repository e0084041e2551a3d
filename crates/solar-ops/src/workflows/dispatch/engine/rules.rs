use chrono::NaiveDate;
use tracing::trace;

use super::super::domain::{JobCandidate, PerformanceStatus, RiskLevel, Subcontractor};
use super::{Confidence, CrewOption, ReasonCode};

const BASE_SCORE: u16 = 50;
const GREEN_PERFORMANCE_BONUS: u16 = 30;
const YELLOW_PERFORMANCE_BONUS: u16 = 10;
const CAPACITY_BONUS: u16 = 20;
const LOW_RISK_BONUS: u16 = 10;
const SERVICE_AREA_BONUS: u16 = 15;

/// Why a crew never became an option for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Exclusion {
    NotCompliant,
    RedPerformance,
    AtCapacity { open_jobs: u32, capacity: u32 },
}

/// Workload of a crew that passed every guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CrewLoad {
    pub open_jobs: u32,
    pub capacity: u32,
}

/// Assignments that count against the crew's capacity on `target_date`.
///
/// An assignment counts when its job is on the same calendar day, or when the
/// job is SCHEDULED or IN_PROGRESS on any date.
pub(crate) fn open_jobs_on(subcontractor: &Subcontractor, target_date: NaiveDate) -> u32 {
    subcontractor
        .active_assignments
        .iter()
        .filter(|assignment| {
            assignment.job_scheduled_date == Some(target_date)
                || assignment.job_status.occupies_crew()
        })
        .count() as u32
}

/// Guards run in order: compliance, performance, capacity.
pub(crate) fn screen(
    subcontractor: &Subcontractor,
    target_date: NaiveDate,
) -> Result<CrewLoad, Exclusion> {
    if !subcontractor.is_compliant() {
        return Err(Exclusion::NotCompliant);
    }

    if subcontractor.performance_status == Some(PerformanceStatus::Red) {
        return Err(Exclusion::RedPerformance);
    }

    let open_jobs = open_jobs_on(subcontractor, target_date);
    let capacity = subcontractor.capacity();
    if open_jobs >= capacity {
        return Err(Exclusion::AtCapacity {
            open_jobs,
            capacity,
        });
    }

    Ok(CrewLoad {
        open_jobs,
        capacity,
    })
}

pub(crate) fn score_option(
    subcontractor: &Subcontractor,
    job: &JobCandidate,
    load: CrewLoad,
) -> CrewOption {
    let mut score = BASE_SCORE;
    let mut reasons = Vec::new();

    match subcontractor.performance_status {
        Some(PerformanceStatus::Green) => {
            score += GREEN_PERFORMANCE_BONUS;
            reasons.push(ReasonCode::HighPerformanceMatch);
        }
        Some(PerformanceStatus::Yellow) => score += YELLOW_PERFORMANCE_BONUS,
        _ => {}
    }

    // at least two free slots
    if load.open_jobs + 1 < load.capacity {
        score += CAPACITY_BONUS;
        reasons.push(ReasonCode::CapacityAvailable);
    }

    if matches!(job.risk_level, Some(RiskLevel::Low | RiskLevel::Medium)) {
        score += LOW_RISK_BONUS;
        reasons.push(ReasonCode::LowRiskMatch);
    }

    if serves_city(subcontractor.home_base_city.as_deref(), job.city.as_deref()) {
        score += SERVICE_AREA_BONUS;
        reasons.push(ReasonCode::ServiceAreaMatch);
    }

    if reasons.is_empty() {
        reasons.push(ReasonCode::Other);
    }

    CrewOption {
        subcontractor_id: subcontractor.id.clone(),
        subcontractor_name: subcontractor.name.clone(),
        performance_status: subcontractor.performance_status,
        is_compliant: true,
        distance_km: None,
        jobs_on_date: load.open_jobs,
        max_concurrent_jobs: load.capacity,
        reasons,
        confidence: Confidence::from_score(score),
        score,
    }
}

pub(crate) fn evaluate_crew(
    subcontractor: &Subcontractor,
    job: &JobCandidate,
    target_date: NaiveDate,
) -> Option<CrewOption> {
    match screen(subcontractor, target_date) {
        Ok(load) => Some(score_option(subcontractor, job, load)),
        Err(exclusion) => {
            trace!(
                job = %job.id,
                subcontractor = %subcontractor.id,
                ?exclusion,
                "crew excluded"
            );
            None
        }
    }
}

fn serves_city(home_base: Option<&str>, job_city: Option<&str>) -> bool {
    match (home_base, job_city) {
        (Some(home), Some(city)) if !home.is_empty() => home.to_lowercase() == city.to_lowercase(),
        _ => false,
    }
}
