use crate::workflows::dispatch::domain::{
    ComplianceStatus, PerformanceStatus, Subcontractor, SubcontractorId,
};

use super::parser::RosterRow;
use super::RosterImportError;

pub(crate) fn subcontractor_from_row(row: RosterRow) -> Result<Subcontractor, RosterImportError> {
    let line = row.line;
    let invalid = |reason: String| RosterImportError::InvalidRecord { line, reason };

    if row.id.trim().is_empty() {
        return Err(invalid("missing subcontractor id".to_string()));
    }

    let active = match row.active.as_deref() {
        Some(raw) => parse_flag(raw)
            .ok_or_else(|| invalid(format!("unrecognized active flag '{raw}'")))?,
        None => true,
    };

    let performance_status = row
        .performance
        .as_deref()
        .map(|raw| {
            performance_from_code(raw)
                .ok_or_else(|| invalid(format!("unknown performance status '{raw}'")))
        })
        .transpose()?;

    let last_compliance_status = row
        .compliance
        .as_deref()
        .map(|raw| {
            compliance_from_code(raw)
                .ok_or_else(|| invalid(format!("unknown compliance status '{raw}'")))
        })
        .transpose()?;

    let max_concurrent_jobs = row
        .max_concurrent_jobs
        .as_deref()
        .map(|raw| {
            raw.trim()
                .parse::<u32>()
                .map_err(|_| invalid(format!("max concurrent jobs '{raw}' is not a count")))
        })
        .transpose()?;

    Ok(Subcontractor {
        id: SubcontractorId(row.id),
        name: row.name,
        active,
        performance_status,
        last_compliance_status,
        max_concurrent_jobs,
        home_base_city: row.home_base_city,
        active_assignments: Vec::new(),
    })
}

fn normalize_code(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|ch| match ch {
            '-' | ' ' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}

pub(crate) fn performance_from_code(raw: &str) -> Option<PerformanceStatus> {
    match normalize_code(raw).as_str() {
        "GREEN" => Some(PerformanceStatus::Green),
        "YELLOW" => Some(PerformanceStatus::Yellow),
        "RED" => Some(PerformanceStatus::Red),
        _ => None,
    }
}

pub(crate) fn compliance_from_code(raw: &str) -> Option<ComplianceStatus> {
    match normalize_code(raw).as_str() {
        "COMPLIANT" => Some(ComplianceStatus::Compliant),
        "NON_COMPLIANT" | "NONCOMPLIANT" => Some(ComplianceStatus::NonCompliant),
        _ => None,
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}
