//! Store abstraction.
//!
//! The engine never holds entities; it reads and writes them through a
//! [`StoreTx`] handed to it for the duration of one atomic scope. A [`Store`]
//! hands out those scopes and guarantees they are serialisable: every write of a
//! scope becomes visible at once when the closure returns `Ok`, and none of
//! them do when it returns `Err`.

mod memory;
mod overlay;
mod query;
mod records;

pub use memory::MemoryStore;
pub use overlay::{Kv, KvRead, Overlay, Write};
pub use query::{Order, TransactionQuery, TriangleQuery, UserLookup};
pub use records::Records;

use crate::error::Result;
use crate::models::{
    NewTransaction, Plan, PlanType, Position, PositionId, Transaction, Triangle, TriangleId,
    User, UserId,
};

/// Source of atomic scopes.
pub trait Store: Send + Sync {
    /// Run `f` as one atomic, isolated unit of work.
    fn atomic<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut dyn StoreTx) -> Result<R>;
}

/// Entity operations available inside an atomic scope.
pub trait StoreTx {
    // --- Users ---

    /// Insert a new user with zero balance.
    fn create_user(
        &mut self,
        username: &str,
        referral_code: Option<&str>,
        plan: &PlanType,
        upline_id: Option<UserId>,
    ) -> Result<User>;

    fn get_user(&self, id: UserId) -> Result<Option<User>>;

    /// Exact match on one user field.
    fn find_user(&self, lookup: &UserLookup) -> Result<Option<User>>;

    /// Overwrite a stored user.
    fn update_user(&mut self, user: &User) -> Result<()>;

    /// All users in creation order.
    fn list_users(&self) -> Result<Vec<User>>;

    // --- Plans ---

    fn put_plan(&mut self, plan: &Plan) -> Result<()>;

    fn get_plan(&self, plan_type: &PlanType) -> Result<Option<Plan>>;

    fn list_plans(&self) -> Result<Vec<Plan>>;

    // --- Triangles ---

    /// Create an empty triangle together with its 15 positions in fill order.
    fn create_triangle(&mut self, plan_type: &PlanType) -> Result<Triangle>;

    fn get_triangle(&self, id: TriangleId) -> Result<Option<Triangle>>;

    fn update_triangle(&mut self, triangle: &Triangle) -> Result<()>;

    /// Remove the triangle record. Positions are removed by [`Self::delete_positions`].
    fn delete_triangle(&mut self, id: TriangleId) -> Result<()>;

    fn find_triangles(&self, query: &TriangleQuery) -> Result<Vec<Triangle>>;

    /// Oldest incomplete triangle of a plan that still has an open slot.
    fn find_oldest_open(&self, plan_type: &PlanType) -> Result<Option<Triangle>> {
        let query = TriangleQuery::new().plan(plan_type.clone()).complete(false);
        for triangle in self.find_triangles(&query)? {
            if self.find_open_slot(triangle.id)?.is_some() {
                return Ok(Some(triangle));
            }
        }
        Ok(None)
    }

    /// The most recently created position the user occupies, if any.
    fn find_most_recent_position_for_user(&self, user_id: UserId) -> Result<Option<Position>>;

    // --- Positions ---

    /// All positions of a triangle in fill order.
    fn list_positions(&self, triangle_id: TriangleId) -> Result<Vec<Position>>;

    /// First open position in fill order.
    fn find_open_slot(&self, triangle_id: TriangleId) -> Result<Option<Position>> {
        Ok(self
            .list_positions(triangle_id)?
            .into_iter()
            .find(Position::is_open))
    }

    /// Occupy a position. Fails with `SlotOccupied` if it already has an occupant.
    fn set_occupant(&mut self, position: PositionId, user_id: UserId) -> Result<Position>;

    fn count_occupied(&self, triangle_id: TriangleId) -> Result<usize> {
        Ok(self
            .list_positions(triangle_id)?
            .iter()
            .filter(|p| !p.is_open())
            .count())
    }

    /// Occupied positions of a triangle in fill order.
    fn list_with_occupants(&self, triangle_id: TriangleId) -> Result<Vec<Position>> {
        Ok(self
            .list_positions(triangle_id)?
            .into_iter()
            .filter(|p| !p.is_open())
            .collect())
    }

    /// Remove every position of a triangle.
    fn delete_positions(&mut self, triangle_id: TriangleId) -> Result<()>;

    // --- Transactions ---

    fn create_transaction(&mut self, tx: NewTransaction) -> Result<Transaction>;

    fn find_transactions(&self, query: &TransactionQuery) -> Result<Vec<Transaction>>;
}
