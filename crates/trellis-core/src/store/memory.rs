//! In-memory store.

use super::overlay::{apply_writes, Overlay};
use super::{Records, Store, StoreTx};
use crate::error::Result;
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// Store kept entirely in process memory.
///
/// One mutex guards the data; an atomic scope holds it from first read to
/// commit, so scopes run one at a time.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys (records and indexes).
    pub fn key_count(&self) -> usize {
        self.data.lock().len()
    }
}

impl Store for MemoryStore {
    fn atomic<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut dyn StoreTx) -> Result<R>,
    {
        let mut data = self.data.lock();
        let (result, writes) = {
            let mut records = Records::new(Overlay::new(&*data));
            let result = f(&mut records)?;
            (result, records.into_inner().into_writes())
        };
        apply_writes(&mut data, writes);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::{PlanType, UserId};
    use crate::store::UserLookup;
    use crate::structure::PositionKey;

    #[test]
    fn failed_scope_leaves_no_trace() {
        let store = MemoryStore::new();
        let plan = PlanType::from("bronze");

        let result: Result<()> = store.atomic(|tx| {
            tx.create_triangle(&plan)?;
            tx.create_user("ana", None, &plan, None)?;
            Err(Error::InvalidInput("abort".into()))
        });
        assert!(result.is_err());
        assert_eq!(store.key_count(), 0);
    }

    #[test]
    fn committed_scope_is_visible() {
        let store = MemoryStore::new();
        let plan = PlanType::from("bronze");

        let user = store
            .atomic(|tx| tx.create_user("ana", Some("ANA1"), &plan, None))
            .unwrap();
        let found = store
            .atomic(|tx| tx.find_user(&UserLookup::ReferralCode("ANA1".into())))
            .unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
    }

    #[test]
    fn duplicate_username_rejected() {
        let store = MemoryStore::new();
        let plan = PlanType::from("bronze");
        store.atomic(|tx| tx.create_user("ana", None, &plan, None)).unwrap();
        let err = store
            .atomic(|tx| tx.create_user("ana", None, &plan, None))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)), "got {err:?}");
    }

    #[test]
    fn set_occupant_is_conditional() {
        let store = MemoryStore::new();
        let plan = PlanType::from("bronze");
        let (first, second) = (UserId::new(), UserId::new());

        let err = store
            .atomic(|tx| {
                let t = tx.create_triangle(&plan)?;
                let slot = tx.find_open_slot(t.id)?.expect("fresh triangle has room");
                assert_eq!(slot.position_key, PositionKey::A);
                tx.set_occupant(slot.id(), first)?;
                tx.set_occupant(slot.id(), second)
            })
            .unwrap_err();
        assert!(matches!(err, Error::SlotOccupied(_)), "got {err:?}");
    }

    #[test]
    fn most_recent_position_follows_creation_order() {
        let store = MemoryStore::new();
        let plan = PlanType::from("bronze");
        let user = UserId::new();

        let (older, newer) = store
            .atomic(|tx| {
                let older = tx.create_triangle(&plan)?;
                let newer = tx.create_triangle(&plan)?;
                // fill the newer triangle first; creation order still decides
                let slot = tx.find_open_slot(newer.id)?.expect("open");
                tx.set_occupant(slot.id(), user)?;
                let slot = tx.find_open_slot(older.id)?.expect("open");
                tx.set_occupant(slot.id(), user)?;
                Ok((older.id, newer.id))
            })
            .unwrap();

        let recent = store
            .atomic(|tx| tx.find_most_recent_position_for_user(user))
            .unwrap()
            .expect("user holds positions");
        assert_eq!(recent.triangle_id, newer);

        store
            .atomic(|tx| {
                tx.delete_positions(newer)?;
                tx.delete_triangle(newer)
            })
            .unwrap();
        let recent = store
            .atomic(|tx| tx.find_most_recent_position_for_user(user))
            .unwrap()
            .expect("older position remains");
        assert_eq!(recent.triangle_id, older);
    }
}
