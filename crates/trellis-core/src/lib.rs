//! Trellis core - the triangle lifecycle engine.
//!
//! Users are placed into fixed 15-slot triangles. When a triangle fills, its
//! top occupant is paid and the triangle splits into two successors that
//! inherit part of its membership.
//!
//! # Architecture
//!
//! - **Structure**: the fixed slot table and fill order
//! - **Models**: records owned by the store (users, triangles, positions, ...)
//! - **Store**: atomic scopes over entity operations, plus an in-memory backend
//! - **Engine**: placement, completion, payout, cycling and referrer resolution
//!
//! # Example
//!
//! ```
//! use rust_decimal::Decimal;
//! use trellis_core::{Engine, MemoryStore, NewUser, PlanType};
//!
//! let engine = Engine::new(MemoryStore::new());
//! let plan = PlanType::from("bronze");
//! engine.put_plan(&plan, Decimal::from(100)).unwrap();
//!
//! let reg = engine
//!     .register_user(NewUser {
//!         username: "ana".into(),
//!         plan,
//!         ..Default::default()
//!     })
//!     .unwrap();
//! assert_eq!(reg.assignment.position.position_key.as_str(), "A");
//! ```

pub mod engine;
pub mod error;
pub mod models;
pub mod store;
pub mod structure;

pub use engine::{Assignment, Completion, Engine, MatchedBy, Registration, Stats, TriangleView};
pub use error::{Error, Result};
pub use models::{
    NewTransaction, NewUser, Plan, PlanType, Position, PositionId, Transaction, TransactionId,
    TransactionKind, TransactionStatus, Triangle, TriangleId, TriangleInfo, User, UserId,
};
pub use store::{MemoryStore, Order, Store, StoreTx, TransactionQuery, TriangleQuery, UserLookup};
pub use structure::{PositionKey, SLOT_COUNT};
