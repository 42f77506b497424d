//! Plan reference data.

use super::PlanType;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A plan and the amount paid to the top of a completed triangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub plan_type: PlanType,
    pub payout: Decimal,
}

impl Plan {
    pub fn new(plan_type: impl Into<PlanType>, payout: Decimal) -> Self {
        Self {
            plan_type: plan_type.into(),
            payout,
        }
    }
}
