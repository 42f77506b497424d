//! Splitting a completed triangle.
//!
//! When both level-2 slots are occupied, each of them heads a new triangle and
//! the members below them move up one level into that triangle, keeping the
//! side of the original they came from. The paid top occupant does not carry
//! over. When either level-2 slot is empty nothing carries over.
//!
//! Either way the old triangle and its positions are deleted.

use crate::error::{Error, Result};
use crate::models::{PlanType, PositionId, TriangleId, UserId};
use crate::store::StoreTx;
use crate::structure::PositionKey::{self, *};
use std::collections::HashMap;
use tracing::{info, warn};

/// Old key to new key, for the triangle headed by the `AB1` occupant.
pub const LEFT_PROMOTIONS: [(PositionKey, PositionKey); 6] = [
    (B1C1, AB1),
    (B1C2, AB2),
    (C1D1, B1C1),
    (C1D2, B1C2),
    (C2D1, B2C1),
    (C2D2, B2C2),
];

/// Old key to new key, for the triangle headed by the `AB2` occupant.
pub const RIGHT_PROMOTIONS: [(PositionKey, PositionKey); 6] = [
    (B2C1, AB1),
    (B2C2, AB2),
    (C3D1, B1C1),
    (C3D2, B1C2),
    (C4D1, B2C1),
    (C4D2, B2C2),
];

/// Split a triangle and delete it. Returns the successor triangles, left first.
pub fn cycle(tx: &mut dyn StoreTx, triangle_id: TriangleId) -> Result<Vec<TriangleId>> {
    let triangle = tx
        .get_triangle(triangle_id)?
        .ok_or_else(|| Error::triangle_not_found(triangle_id))?;

    let occupants: HashMap<PositionKey, UserId> = tx
        .list_with_occupants(triangle_id)?
        .into_iter()
        .filter_map(|p| p.occupant_id.map(|user| (p.position_key, user)))
        .collect();

    let successors = match (occupants.get(&AB1), occupants.get(&AB2)) {
        (Some(&left), Some(&right)) => vec![
            spawn(tx, &triangle.plan_type, left, &LEFT_PROMOTIONS, &occupants)?,
            spawn(tx, &triangle.plan_type, right, &RIGHT_PROMOTIONS, &occupants)?,
        ],
        _ => {
            warn!(
                triangle = %triangle_id,
                dropped = occupants.len(),
                "level 2 incomplete, no split"
            );
            Vec::new()
        }
    };

    tx.delete_positions(triangle_id)?;
    tx.delete_triangle(triangle_id)?;
    info!(triangle = %triangle_id, successors = successors.len(), "triangle cycled");

    Ok(successors)
}

fn spawn(
    tx: &mut dyn StoreTx,
    plan_type: &PlanType,
    head: UserId,
    promotions: &[(PositionKey, PositionKey)],
    occupants: &HashMap<PositionKey, UserId>,
) -> Result<TriangleId> {
    let successor = tx.create_triangle(plan_type)?;
    tx.set_occupant(PositionId::new(successor.id, A), head)?;
    for (from, to) in promotions {
        if let Some(&user) = occupants.get(from) {
            tx.set_occupant(PositionId::new(successor.id, *to), user)?;
        }
    }
    Ok(successor.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn promotions_move_up_one_level() {
        for (from, to) in LEFT_PROMOTIONS.iter().chain(RIGHT_PROMOTIONS.iter()) {
            assert_eq!(from.level(), to.level() + 1, "{from} -> {to}");
        }
    }

    #[test]
    fn each_map_fills_distinct_slots() {
        for map in [LEFT_PROMOTIONS, RIGHT_PROMOTIONS] {
            let targets: HashSet<_> = map.iter().map(|(_, to)| *to).collect();
            assert_eq!(targets.len(), map.len());
            assert!(!targets.contains(&A));
        }
    }

    #[test]
    fn sides_do_not_overlap() {
        let left: HashSet<_> = LEFT_PROMOTIONS.iter().map(|(from, _)| *from).collect();
        let right: HashSet<_> = RIGHT_PROMOTIONS.iter().map(|(from, _)| *from).collect();
        assert!(left.is_disjoint(&right));
        // left half of the old triangle sits at lower indices
        assert!(left.iter().all(|k| k.index() < (1 << (k.level() - 1)) / 2));
        assert!(right.iter().all(|k| k.index() >= (1 << (k.level() - 1)) / 2));
    }
}
