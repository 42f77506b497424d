//! Triangle lifecycle engine.
//!
//! The component functions take the store scope as an explicit argument:
//!
//! - [`resolver`] - referral token to user
//! - [`placement`] - choose triangle and slot, record the assignment
//! - [`completion`] - mark a full triangle complete, trigger payout and cycling
//! - [`payout`] - credit the top occupant, record a pending withdrawal
//! - [`cycling`] - split a completed triangle and delete it
//!
//! [`Engine`] owns a [`Store`] and runs each public operation in one atomic
//! scope, so a placement together with any completion, payout and split it
//! triggers commits as a unit.

pub mod completion;
pub mod cycling;
pub mod payout;
pub mod placement;
pub mod resolver;

pub use completion::Completion;
pub use placement::Assignment;
pub use resolver::MatchedBy;

use crate::error::{Error, Result};
use crate::models::{
    NewUser, Plan, PlanType, Position, Transaction, TransactionKind, TransactionStatus, Triangle,
    TriangleId, TriangleInfo, User, UserId,
};
use crate::store::{Store, TransactionQuery, TriangleQuery};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

/// A newly registered user and where they were placed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub user: User,
    pub assignment: Assignment,
}

/// A triangle with all of its positions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriangleView {
    pub triangle: Triangle,
    pub positions: Vec<Position>,
}

/// Store-wide counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub users: usize,
    pub open_triangles: usize,
    pub pending_withdrawals: usize,
    pub pending_amount: Decimal,
}

/// Entry point for callers: HTTP handlers, admin tooling, tests.
pub struct Engine<S: Store> {
    store: S,
}

impl<S: Store> Engine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Place a user; see [`placement::assign`].
    pub fn assign(&self, user_id: UserId, referrer_id: Option<UserId>) -> Result<Position> {
        Ok(self.place(user_id, referrer_id)?.position)
    }

    /// Place a user and report any completion it triggered.
    pub fn place(&self, user_id: UserId, referrer_id: Option<UserId>) -> Result<Assignment> {
        self.store
            .atomic(|tx| placement::assign(tx, user_id, referrer_id))
    }

    pub fn create_triangle(&self, plan_type: &PlanType) -> Result<Triangle> {
        self.store
            .atomic(|tx| placement::create_triangle(tx, plan_type))
    }

    /// The user's most recent triangle with fill progress.
    pub fn user_triangle_info(&self, user_id: UserId) -> Result<Option<TriangleInfo>> {
        self.store.atomic(|tx| {
            let Some(position) = tx.find_most_recent_position_for_user(user_id)? else {
                return Ok(None);
            };
            let Some(triangle) = tx.get_triangle(position.triangle_id)? else {
                return Ok(None);
            };
            let filled = tx.count_occupied(triangle.id)?;
            Ok(Some(TriangleInfo {
                triangle,
                user_position: position,
                completion_percent: TriangleInfo::completion_percent(filled),
                filled_count: filled,
            }))
        })
    }

    pub fn resolve_referrer(&self, token: &str) -> Result<Option<User>> {
        self.store.atomic(|tx| resolver::resolve(tx, token))
    }

    /// Store a new user under the resolved referrer and place them.
    pub fn register_user(&self, new: NewUser) -> Result<Registration> {
        if new.username.trim().is_empty() {
            return Err(Error::InvalidInput("username must not be empty".to_string()));
        }
        self.store.atomic(|tx| {
            if tx.get_plan(&new.plan)?.is_none() {
                return Err(Error::NotFound(format!("plan {}", new.plan)));
            }
            let upline = match new.referrer_token.as_deref() {
                Some(token) => resolver::resolve(tx, token)?.map(|u| u.id),
                None => None,
            };
            let user = tx.create_user(
                &new.username,
                new.referral_code.as_deref(),
                &new.plan,
                upline,
            )?;
            info!(user = %user.id, username = %user.username, upline = ?upline, "user registered");
            let assignment = placement::assign(tx, user.id, None)?;
            // re-read: completing a triangle may already have credited this user
            let user = tx
                .get_user(user.id)?
                .ok_or_else(|| Error::user_not_found(user.id))?;
            Ok(Registration { user, assignment })
        })
    }

    pub fn user(&self, user_id: UserId) -> Result<Option<User>> {
        self.store.atomic(|tx| tx.get_user(user_id))
    }

    pub fn put_plan(&self, plan_type: &PlanType, payout: Decimal) -> Result<Plan> {
        if plan_type.as_str().is_empty() {
            return Err(Error::InvalidInput("plan type must not be empty".to_string()));
        }
        if payout.is_sign_negative() {
            return Err(Error::InvalidInput(format!("negative payout {payout}")));
        }
        let plan = Plan::new(plan_type.clone(), payout);
        self.store.atomic(|tx| tx.put_plan(&plan))?;
        info!(plan = %plan_type, %payout, "plan stored");
        Ok(plan)
    }

    pub fn plans(&self) -> Result<Vec<Plan>> {
        self.store.atomic(|tx| tx.list_plans())
    }

    pub fn triangle(&self, id: TriangleId) -> Result<Option<TriangleView>> {
        self.store.atomic(|tx| {
            let Some(triangle) = tx.get_triangle(id)? else {
                return Ok(None);
            };
            let positions = tx.list_positions(id)?;
            Ok(Some(TriangleView {
                triangle,
                positions,
            }))
        })
    }

    pub fn triangles(&self, query: &TriangleQuery) -> Result<Vec<Triangle>> {
        self.store.atomic(|tx| tx.find_triangles(query))
    }

    /// A user's transactions, newest first.
    pub fn transactions_for(&self, user_id: UserId) -> Result<Vec<Transaction>> {
        let query = TransactionQuery::new().user(user_id).newest_first();
        self.store.atomic(|tx| tx.find_transactions(&query))
    }

    pub fn stats(&self) -> Result<Stats> {
        self.store.atomic(|tx| {
            let users = tx.list_users()?.len();
            let open_triangles = tx
                .find_triangles(&TriangleQuery::new().complete(false))?
                .len();
            let pending = tx.find_transactions(
                &TransactionQuery::new()
                    .kind(TransactionKind::Withdrawal)
                    .status(TransactionStatus::Pending),
            )?;
            Ok(Stats {
                users,
                open_triangles,
                pending_withdrawals: pending.len(),
                pending_amount: pending.iter().map(|t| t.amount).sum(),
            })
        })
    }
}
