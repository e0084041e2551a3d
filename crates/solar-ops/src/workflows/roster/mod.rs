//! Seed data for the dispatch data layer: subcontractor roster CSV exports and
//! JSON snapshots of jobs, crews, and assignments.

mod mapping;
mod parser;

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::workflows::dispatch::domain::{AssignmentRecord, JobRecord, Subcontractor};

#[derive(Debug)]
pub enum RosterImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
    InvalidRecord { line: u64, reason: String },
    DuplicateSubcontractor(String),
}

impl std::fmt::Display for RosterImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterImportError::Io(err) => write!(f, "failed to read roster data: {}", err),
            RosterImportError::Csv(err) => write!(f, "invalid roster CSV data: {}", err),
            RosterImportError::Json(err) => write!(f, "invalid dispatch snapshot: {}", err),
            RosterImportError::InvalidRecord { line, reason } => {
                write!(f, "roster line {}: {}", line, reason)
            }
            RosterImportError::DuplicateSubcontractor(id) => {
                write!(f, "subcontractor {} appears more than once", id)
            }
        }
    }
}

impl std::error::Error for RosterImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RosterImportError::Io(err) => Some(err),
            RosterImportError::Csv(err) => Some(err),
            RosterImportError::Json(err) => Some(err),
            RosterImportError::InvalidRecord { .. }
            | RosterImportError::DuplicateSubcontractor(_) => None,
        }
    }
}

impl From<std::io::Error> for RosterImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for RosterImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<serde_json::Error> for RosterImportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// Reads subcontractor roster exports.
pub struct RosterImporter;

impl RosterImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Subcontractor>, RosterImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Subcontractor>, RosterImportError> {
        let mut seen = HashSet::new();
        let mut roster = Vec::new();

        for row in parser::parse_rows(reader)? {
            let subcontractor = mapping::subcontractor_from_row(row)?;
            if !seen.insert(subcontractor.id.clone()) {
                return Err(RosterImportError::DuplicateSubcontractor(
                    subcontractor.id.0,
                ));
            }
            roster.push(subcontractor);
        }

        Ok(roster)
    }
}

/// Point-in-time export of the dispatch data layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchSnapshot {
    #[serde(default)]
    pub jobs: Vec<JobRecord>,
    #[serde(default)]
    pub subcontractors: Vec<Subcontractor>,
    #[serde(default)]
    pub assignments: Vec<AssignmentRecord>,
}

impl DispatchSnapshot {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, RosterImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RosterImportError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Overlay a roster export; entries with a known id replace the stored crew.
    pub fn merge_roster(&mut self, roster: Vec<Subcontractor>) {
        for incoming in roster {
            match self
                .subcontractors
                .iter_mut()
                .find(|existing| existing.id == incoming.id)
            {
                Some(existing) => *existing = incoming,
                None => self.subcontractors.push(incoming),
            }
        }
    }
}
