mod materials;
mod policy;
mod rules;

pub use materials::MaterialsEtaStatus;

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::clock::Clock;
use super::domain::{JobCandidate, PerformanceStatus, Subcontractor, SubcontractorId};

/// Condition that keeps a job off the board regardless of crew availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockingReason {
    MaterialsNotReady,
    ComplianceIssue,
}

impl BlockingReason {
    pub const fn label(self) -> &'static str {
        match self {
            BlockingReason::MaterialsNotReady => "MATERIALS_NOT_READY",
            BlockingReason::ComplianceIssue => "COMPLIANCE_ISSUE",
        }
    }
}

/// Signal explaining why a crew scored the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    HighPerformanceMatch,
    CapacityAvailable,
    LowRiskMatch,
    ServiceAreaMatch,
    Other,
}

impl ReasonCode {
    pub const fn label(self) -> &'static str {
        match self {
            ReasonCode::HighPerformanceMatch => "HIGH_PERFORMANCE_MATCH",
            ReasonCode::CapacityAvailable => "CAPACITY_AVAILABLE",
            ReasonCode::LowRiskMatch => "LOW_RISK_MATCH",
            ReasonCode::ServiceAreaMatch => "SERVICE_AREA_MATCH",
            ReasonCode::Other => "OTHER",
        }
    }

    pub const fn is_positive(self) -> bool {
        !matches!(self, ReasonCode::Other)
    }
}

/// Coarse bucket used as the primary ranking key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub const fn label(self) -> &'static str {
        match self {
            Confidence::Low => "LOW",
            Confidence::Medium => "MEDIUM",
            Confidence::High => "HIGH",
        }
    }

    pub const fn from_score(score: u16) -> Self {
        if score >= 80 {
            Confidence::High
        } else if score >= 60 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    pub const fn rank(self) -> u8 {
        match self {
            Confidence::High => 3,
            Confidence::Medium => 2,
            Confidence::Low => 1,
        }
    }
}

/// A qualifying crew proposed for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewOption {
    pub subcontractor_id: SubcontractorId,
    pub subcontractor_name: String,
    pub performance_status: Option<PerformanceStatus>,
    pub is_compliant: bool,
    /// Not computed; no geocoding backs the roster yet.
    pub distance_km: Option<f64>,
    pub jobs_on_date: u32,
    pub max_concurrent_jobs: u32,
    pub reasons: Vec<ReasonCode>,
    pub confidence: Confidence,
    pub score: u16,
}

impl CrewOption {
    pub fn positive_reason_count(&self) -> usize {
        self.reasons
            .iter()
            .filter(|reason| reason.is_positive())
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchRecommendation {
    pub job: JobCandidate,
    pub materials_eta: MaterialsEtaStatus,
    pub recommended_subcontractor: Option<CrewOption>,
    pub alternatives: Vec<CrewOption>,
    pub scheduled_date: NaiveDate,
    pub can_start: bool,
    pub blocking_reasons: Vec<BlockingReason>,
}

impl DispatchRecommendation {
    pub fn summary(&self) -> String {
        if !self.blocking_reasons.is_empty() {
            let labels: Vec<&str> = self
                .blocking_reasons
                .iter()
                .map(|reason| reason.label())
                .collect();
            return format!("blocked: {}", labels.join(", "));
        }

        match &self.recommended_subcontractor {
            Some(option) => format!(
                "ready: {} ({} confidence)",
                option.subcontractor_name,
                option.confidence.label()
            ),
            None => "no qualifying crew available".to_string(),
        }
    }
}

/// Dispatch board for a single day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchOverview {
    pub date: NaiveDate,
    pub jobs_total: usize,
    pub jobs_dispatchable: usize,
    pub jobs_blocked: usize,
    pub recommendations: Vec<DispatchRecommendation>,
}

/// Rule-based crew recommender. Pure apart from reading the clock.
pub struct DispatchEngine {
    clock: Arc<dyn Clock>,
}

impl DispatchEngine {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn compute_overview(
        &self,
        target_date: NaiveDate,
        candidate_jobs: &[JobCandidate],
        subcontractors: &[Subcontractor],
    ) -> DispatchOverview {
        let now = self.clock.now();
        let recommendations: Vec<DispatchRecommendation> = candidate_jobs
            .iter()
            .map(|job| recommend(job, subcontractors, target_date, now))
            .collect();

        let jobs_total = recommendations.len();
        let jobs_dispatchable = recommendations
            .iter()
            .filter(|recommendation| recommendation.can_start)
            .count();

        DispatchOverview {
            date: target_date,
            jobs_total,
            jobs_dispatchable,
            jobs_blocked: jobs_total - jobs_dispatchable,
            recommendations,
        }
    }

    pub fn compute_recommendation_for_job(
        &self,
        job: &JobCandidate,
        subcontractors: &[Subcontractor],
        target_date: NaiveDate,
    ) -> DispatchRecommendation {
        recommend(job, subcontractors, target_date, self.clock.now())
    }
}

fn recommend(
    job: &JobCandidate,
    subcontractors: &[Subcontractor],
    target_date: NaiveDate,
    now: DateTime<Utc>,
) -> DispatchRecommendation {
    let materials_eta = materials::classify_materials(&job.material_orders, now);
    let blocking_reasons = policy::blocking_reasons(job, materials_eta);

    let options = subcontractors
        .iter()
        .filter_map(|subcontractor| rules::evaluate_crew(subcontractor, job, target_date))
        .collect();
    let (recommended_subcontractor, alternatives) = policy::rank_options(options);

    let can_start = blocking_reasons.is_empty() && recommended_subcontractor.is_some();

    DispatchRecommendation {
        job: job.clone(),
        materials_eta,
        recommended_subcontractor,
        alternatives,
        scheduled_date: target_date,
        can_start,
        blocking_reasons,
    }
}
