use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for installation jobs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

/// Identifier wrapper for subcontracted crews.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubcontractorId(pub String);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for SubcontractorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of an installation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    New,
    ReadyToSchedule,
    Scheduled,
    InProgress,
    OnHold,
    Complete,
    Cancelled,
}

impl JobStatus {
    pub const fn label(self) -> &'static str {
        match self {
            JobStatus::New => "NEW",
            JobStatus::ReadyToSchedule => "READY_TO_SCHEDULE",
            JobStatus::Scheduled => "SCHEDULED",
            JobStatus::InProgress => "IN_PROGRESS",
            JobStatus::OnHold => "ON_HOLD",
            JobStatus::Complete => "COMPLETE",
            JobStatus::Cancelled => "CANCELLED",
        }
    }

    /// Jobs that have not been put on a calendar yet.
    pub const fn is_early_pipeline(self) -> bool {
        matches!(self, JobStatus::New | JobStatus::ReadyToSchedule)
    }

    pub const fn is_closed(self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Cancelled)
    }

    /// Statuses that occupy a crew regardless of calendar date.
    pub const fn occupies_crew(self) -> bool {
        matches!(self, JobStatus::Scheduled | JobStatus::InProgress)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PerformanceStatus {
    Green,
    Yellow,
    Red,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaterialOrderStatus {
    Pending,
    Ordered,
    Shipped,
    Delivered,
    Backordered,
}

/// Purchase order line tracked against a job's install materials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialOrder {
    pub status: MaterialOrderStatus,
    #[serde(default)]
    pub expected_delivery_date: Option<DateTime<Utc>>,
}

/// Contract figures carried alongside a job for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    pub contract_value: f64,
    pub amount_collected: f64,
}

/// Dispatch-eligible job as consumed by the recommendation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobCandidate {
    pub id: JobId,
    pub job_number: String,
    pub customer_name: String,
    pub city: Option<String>,
    pub status: JobStatus,
    pub risk_level: Option<RiskLevel>,
    pub scheduled_date: Option<NaiveDate>,
    pub system_size_kw: Option<f64>,
    pub material_orders: Vec<MaterialOrder>,
    pub financial: Option<FinancialSnapshot>,
    pub has_failed_qc: bool,
    pub has_safety_issues: bool,
}

/// Open assignment joined to the status and date of the job it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveAssignment {
    pub job_id: JobId,
    pub job_scheduled_date: Option<NaiveDate>,
    pub job_status: JobStatus,
}

/// Subcontracted crew with its current workload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subcontractor {
    pub id: SubcontractorId,
    pub name: String,
    pub active: bool,
    pub performance_status: Option<PerformanceStatus>,
    pub last_compliance_status: Option<ComplianceStatus>,
    pub max_concurrent_jobs: Option<u32>,
    pub home_base_city: Option<String>,
    #[serde(default)]
    pub active_assignments: Vec<ActiveAssignment>,
}

impl Subcontractor {
    pub const DEFAULT_MAX_CONCURRENT_JOBS: u32 = 1;

    pub fn capacity(&self) -> u32 {
        self.max_concurrent_jobs
            .unwrap_or(Self::DEFAULT_MAX_CONCURRENT_JOBS)
    }

    pub fn is_compliant(&self) -> bool {
        self.last_compliance_status == Some(ComplianceStatus::Compliant)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QcCheckStatus {
    Pending,
    Passed,
    Failed,
}

/// Photo QC review recorded against a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QcCheck {
    pub category: String,
    pub status: QcCheckStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentStatus {
    Open,
    Investigating,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyIncident {
    pub severity: IncidentSeverity,
    pub status: IncidentStatus,
    #[serde(default)]
    pub summary: String,
}

impl SafetyIncident {
    /// Unresolved incident at HIGH severity or above.
    pub fn blocks_dispatch(&self) -> bool {
        self.status != IncidentStatus::Closed && self.severity >= IncidentSeverity::High
    }
}

/// Stored job with its raw QC and safety history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub job_number: String,
    pub customer_name: String,
    #[serde(default)]
    pub city: Option<String>,
    pub status: JobStatus,
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
    #[serde(default)]
    pub scheduled_date: Option<NaiveDate>,
    #[serde(default)]
    pub system_size_kw: Option<f64>,
    #[serde(default)]
    pub material_orders: Vec<MaterialOrder>,
    #[serde(default)]
    pub financial: Option<FinancialSnapshot>,
    #[serde(default)]
    pub qc_checks: Vec<QcCheck>,
    #[serde(default)]
    pub safety_incidents: Vec<SafetyIncident>,
}

impl JobRecord {
    /// Scheduled for `date`, or unscheduled and still early in the pipeline.
    pub fn is_dispatch_candidate(&self, date: NaiveDate) -> bool {
        if self.status.is_closed() {
            return false;
        }

        match self.scheduled_date {
            Some(scheduled) => scheduled == date,
            None => self.status.is_early_pipeline(),
        }
    }

    pub fn to_candidate(&self) -> JobCandidate {
        JobCandidate {
            id: self.id.clone(),
            job_number: self.job_number.clone(),
            customer_name: self.customer_name.clone(),
            city: self.city.clone(),
            status: self.status,
            risk_level: self.risk_level,
            scheduled_date: self.scheduled_date,
            system_size_kw: self.system_size_kw,
            material_orders: self.material_orders.clone(),
            financial: self.financial.clone(),
            has_failed_qc: self
                .qc_checks
                .iter()
                .any(|check| check.status == QcCheckStatus::Failed),
            has_safety_issues: self
                .safety_incidents
                .iter()
                .any(SafetyIncident::blocks_dispatch),
        }
    }
}

/// Link between a crew and a job. Active until `unassigned_at` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub job_id: JobId,
    pub subcontractor_id: SubcontractorId,
    pub assigned_at: DateTime<Utc>,
    #[serde(default)]
    pub unassigned_at: Option<DateTime<Utc>>,
}

impl AssignmentRecord {
    pub fn is_active(&self) -> bool {
        self.unassigned_at.is_none()
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).map_err(serde::de::Error::custom)
}

pub fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.filter(|value| !value.trim().is_empty())
        .map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}
