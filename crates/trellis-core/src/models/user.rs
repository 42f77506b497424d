//! User records.

use super::{PlanType, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A participant in the matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Shareable code other users may give as their referrer
    pub referral_code: Option<String>,
    pub plan: PlanType,
    /// The user who referred this one
    pub upline_id: Option<UserId>,
    pub balance: Decimal,
    pub total_earned: Decimal,
    pub created_at: DateTime<Utc>,
    /// Store-assigned creation sequence
    pub seq: u64,
}

impl User {
    /// Credit an amount to both the spendable balance and lifetime earnings.
    pub fn credit(&mut self, amount: Decimal) {
        self.balance += amount;
        self.total_earned += amount;
    }
}

/// Registration request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub plan: PlanType,
    pub referral_code: Option<String>,
    /// Referral token as typed by the user; resolved before storing
    pub referrer_token: Option<String>,
}
