//! Slot placement.
//!
//! Target triangle, in order of preference:
//!
//! 1. the referrer's most recent triangle, if it is the user's plan, still
//!    incomplete and has room;
//! 2. the oldest incomplete triangle of the plan with room;
//! 3. a brand-new triangle.
//!
//! Within the target the first open slot in fill order is taken. Filling the
//! last slot runs completion before returning.

use super::completion::{self, Completion};
use crate::error::{Error, Result};
use crate::models::{PlanType, Position, Triangle, UserId};
use crate::store::StoreTx;
use crate::structure::SLOT_COUNT;
use serde::Serialize;
use tracing::{debug, info};

/// Result of placing one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    /// The slot that was filled, as it was when filled
    pub position: Position,
    /// Present when this placement filled the triangle
    pub completion: Option<Completion>,
}

/// Place a user into a triangle of their plan.
///
/// `referrer_id` overrides the user's stored upline for the affinity step.
pub fn assign(
    tx: &mut dyn StoreTx,
    user_id: UserId,
    referrer_id: Option<UserId>,
) -> Result<Assignment> {
    let user = tx
        .get_user(user_id)?
        .ok_or_else(|| Error::user_not_found(user_id))?;

    let referrer = referrer_id.or(user.upline_id);
    let target = match referrer_triangle(tx, referrer, &user.plan)? {
        Some(triangle) => triangle,
        None => match tx.find_oldest_open(&user.plan)? {
            Some(triangle) => triangle,
            None => create_triangle(tx, &user.plan)?,
        },
    };

    let slot = tx
        .find_open_slot(target.id)?
        .ok_or(Error::NoAvailablePosition(target.id))?;
    let position = tx.set_occupant(slot.id(), user.id)?;
    debug!(
        user = %user.id,
        triangle = %target.id,
        key = %position.position_key,
        "slot assigned"
    );

    let completion = if tx.count_occupied(target.id)? == SLOT_COUNT {
        Some(completion::on_complete(tx, target.id)?)
    } else {
        None
    };

    Ok(Assignment {
        position,
        completion,
    })
}

/// Create an empty triangle for a plan.
pub fn create_triangle(tx: &mut dyn StoreTx, plan_type: &PlanType) -> Result<Triangle> {
    if plan_type.as_str().is_empty() {
        return Err(Error::InvalidInput("plan type must not be empty".to_string()));
    }
    let triangle = tx.create_triangle(plan_type)?;
    info!(triangle = %triangle.id, plan = %plan_type, "triangle created");
    Ok(triangle)
}

fn referrer_triangle(
    tx: &dyn StoreTx,
    referrer: Option<UserId>,
    plan_type: &PlanType,
) -> Result<Option<Triangle>> {
    let Some(referrer) = referrer else {
        return Ok(None);
    };
    let Some(position) = tx.find_most_recent_position_for_user(referrer)? else {
        return Ok(None);
    };
    let Some(triangle) = tx.get_triangle(position.triangle_id)? else {
        return Ok(None);
    };
    if triangle.plan_type != *plan_type || triangle.is_complete {
        return Ok(None);
    }
    if tx.find_open_slot(triangle.id)?.is_none() {
        return Ok(None);
    }
    Ok(Some(triangle))
}
