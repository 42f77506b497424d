//! Typed query builders, one closed field set per entity.

use crate::models::{
    PlanType, Transaction, TransactionKind, TransactionStatus, Triangle, UserId,
};

/// Creation-order direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Order {
    #[default]
    Oldest,
    Newest,
}

/// Exact-match user lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserLookup {
    Id(UserId),
    Username(String),
    ReferralCode(String),
}

/// Filter over triangles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriangleQuery {
    pub plan: Option<PlanType>,
    pub complete: Option<bool>,
    pub order: Order,
    pub limit: Option<usize>,
}

impl TriangleQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plan(mut self, plan: impl Into<PlanType>) -> Self {
        self.plan = Some(plan.into());
        self
    }

    pub fn complete(mut self, complete: bool) -> Self {
        self.complete = Some(complete);
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.order = Order::Newest;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, triangle: &Triangle) -> bool {
        self.plan.as_ref().map_or(true, |p| *p == triangle.plan_type)
            && self.complete.map_or(true, |c| c == triangle.is_complete)
    }

    /// Filter, order and truncate triangles given in creation order.
    pub fn apply(&self, triangles: Vec<Triangle>) -> Vec<Triangle> {
        let mut out: Vec<_> = triangles.into_iter().filter(|t| self.matches(t)).collect();
        if self.order == Order::Newest {
            out.reverse();
        }
        if let Some(limit) = self.limit {
            out.truncate(limit);
        }
        out
    }
}

/// Filter over transactions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionQuery {
    pub user: Option<UserId>,
    pub kind: Option<TransactionKind>,
    pub status: Option<TransactionStatus>,
    pub order: Order,
}

impl TransactionQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(mut self, user: UserId) -> Self {
        self.user = Some(user);
        self
    }

    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn status(mut self, status: TransactionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.order = Order::Newest;
        self
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        self.user.map_or(true, |u| u == tx.user_id)
            && self.kind.map_or(true, |k| k == tx.kind)
            && self.status.map_or(true, |s| s == tx.status)
    }

    /// Filter and order transactions given in creation order.
    pub fn apply(&self, txs: Vec<Transaction>) -> Vec<Transaction> {
        let mut out: Vec<_> = txs.into_iter().filter(|t| self.matches(t)).collect();
        if self.order == Order::Newest {
            out.reverse();
        }
        out
    }
}
