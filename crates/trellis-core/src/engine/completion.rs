//! Completion of a full triangle.

use super::cycling;
use super::payout;
use crate::error::{Error, Result};
use crate::models::{Transaction, TriangleId, UserId};
use crate::store::StoreTx;
use crate::structure::PositionKey;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

/// What happened when a triangle completed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub triangle_id: TriangleId,
    /// Occupant of the top slot
    pub top: Option<UserId>,
    /// Withdrawal recorded for the top occupant; absent when the plan is missing
    pub payout: Option<Transaction>,
    /// Triangles created by the split, empty when no split happened
    pub successors: Vec<TriangleId>,
}

/// Mark a triangle complete, pay its top occupant and cycle it.
///
/// Cycling runs even when there is nobody at the top to pay.
pub fn on_complete(tx: &mut dyn StoreTx, triangle_id: TriangleId) -> Result<Completion> {
    let mut triangle = tx
        .get_triangle(triangle_id)?
        .ok_or_else(|| Error::triangle_not_found(triangle_id))?;
    if triangle.is_complete {
        return Err(Error::InvalidInput(format!(
            "triangle {triangle_id} is already complete"
        )));
    }

    triangle.is_complete = true;
    triangle.completed_at = Some(Utc::now());
    tx.update_triangle(&triangle)?;
    info!(triangle = %triangle_id, plan = %triangle.plan_type, "triangle complete");

    let top = tx
        .list_with_occupants(triangle_id)?
        .into_iter()
        .find(|p| p.position_key == PositionKey::A)
        .and_then(|p| p.occupant_id);

    let payout = match top {
        Some(user_id) => match tx.get_user(user_id)? {
            Some(user) => payout::pay(tx, user, &triangle.plan_type)?,
            None => {
                warn!(triangle = %triangle_id, user = %user_id, "top occupant has no user record");
                None
            }
        },
        None => {
            warn!(triangle = %triangle_id, "completed triangle has no top occupant");
            None
        }
    };

    if payout.is_some() {
        triangle.payout_processed = true;
        tx.update_triangle(&triangle)?;
    }

    let successors = cycling::cycle(tx, triangle_id)?;

    Ok(Completion {
        triangle_id,
        top,
        payout,
        successors,
    })
}
