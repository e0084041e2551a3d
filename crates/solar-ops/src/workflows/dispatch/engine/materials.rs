use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::super::domain::{MaterialOrder, MaterialOrderStatus};

/// Orders landing within this window are treated as at risk.
const AT_RISK_WINDOW_DAYS: i64 = 3;

/// Readiness of a job's install materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaterialsEtaStatus {
    OnTrack,
    AtRisk,
    Late,
    Unknown,
}

impl MaterialsEtaStatus {
    pub const fn label(self) -> &'static str {
        match self {
            MaterialsEtaStatus::OnTrack => "ON_TRACK",
            MaterialsEtaStatus::AtRisk => "AT_RISK",
            MaterialsEtaStatus::Late => "LATE",
            MaterialsEtaStatus::Unknown => "UNKNOWN",
        }
    }
}

pub(crate) fn classify_materials(
    orders: &[MaterialOrder],
    now: DateTime<Utc>,
) -> MaterialsEtaStatus {
    if orders.is_empty() {
        return MaterialsEtaStatus::Unknown;
    }

    let horizon = now + Duration::days(AT_RISK_WINDOW_DAYS);
    let mut at_risk = false;

    for order in orders
        .iter()
        .filter(|order| order.status != MaterialOrderStatus::Delivered)
    {
        match order.expected_delivery_date {
            Some(eta) if eta < now => return MaterialsEtaStatus::Late,
            Some(eta) if eta <= horizon => at_risk = true,
            Some(_) => {}
            None => at_risk = true,
        }
    }

    if at_risk {
        MaterialsEtaStatus::AtRisk
    } else {
        MaterialsEtaStatus::OnTrack
    }
}
