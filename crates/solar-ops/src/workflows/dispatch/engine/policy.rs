use std::cmp::Ordering;

use super::super::domain::JobCandidate;
use super::materials::MaterialsEtaStatus;
use super::{BlockingReason, CrewOption};

const MAX_ALTERNATIVES: usize = 3;

pub(crate) fn blocking_reasons(
    job: &JobCandidate,
    materials: MaterialsEtaStatus,
) -> Vec<BlockingReason> {
    let mut reasons = Vec::new();

    if materials == MaterialsEtaStatus::Late {
        reasons.push(BlockingReason::MaterialsNotReady);
    }

    if job.has_safety_issues {
        reasons.push(BlockingReason::ComplianceIssue);
    }

    reasons
}

/// Confidence tier first, then the number of positive reasons. Both descending.
pub(crate) fn compare_options(a: &CrewOption, b: &CrewOption) -> Ordering {
    b.confidence
        .rank()
        .cmp(&a.confidence.rank())
        .then_with(|| b.positive_reason_count().cmp(&a.positive_reason_count()))
}

/// Split ranked options into the pick and up to three runners-up.
pub(crate) fn rank_options(mut options: Vec<CrewOption>) -> (Option<CrewOption>, Vec<CrewOption>) {
    options.sort_by(compare_options);

    let mut ranked = options.into_iter();
    let recommended = ranked.next();
    let alternatives = ranked.take(MAX_ALTERNATIVES).collect();

    (recommended, alternatives)
}
