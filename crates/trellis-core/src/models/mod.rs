//! Records owned by the store.
//!
//! Entities reference each other by identity only; every lookup goes through
//! the store.
//!
//! - [`User`] - a participant with a plan, an optional upline and a balance
//! - [`Triangle`] / [`Position`] - one 15-slot structure and its slots
//! - [`Plan`] - payout reference data
//! - [`Transaction`] - payout records

mod ids;
mod plan;
mod transaction;
mod triangle;
mod user;

pub use ids::{PlanType, PositionId, TransactionId, TriangleId, UserId};
pub use plan::Plan;
pub use transaction::{NewTransaction, Transaction, TransactionKind, TransactionStatus};
pub use triangle::{Position, Triangle, TriangleInfo};
pub use user::{NewUser, User};
