//! Persistent store using RocksDB.
//!
//! Records use the key layout of [`trellis_core::store::Records`]. An atomic
//! scope reads committed data through an overlay and lands as a single
//! `WriteBatch`; a writer lock keeps scopes from interleaving.

use parking_lot::Mutex;
use rocksdb::{Options, WriteBatch, DB};
use std::path::Path;
use trellis_core::store::{KvRead, Overlay, Records, Store, StoreTx, Write};

fn storage_err(e: rocksdb::Error) -> trellis_core::Error {
    trellis_core::Error::Storage(e.to_string())
}

/// RocksDB-backed engine store.
pub struct RocksStore {
    db: DB,
    writer: Mutex<()>,
}

impl RocksStore {
    /// Open or create storage at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> crate::error::Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path)?;
        Ok(Self {
            db,
            writer: Mutex::new(()),
        })
    }
}

/// Read-only view of committed data.
struct Committed<'a>(&'a DB);

impl KvRead for Committed<'_> {
    fn get(&self, key: &str) -> trellis_core::Result<Option<Vec<u8>>> {
        self.0.get(key.as_bytes()).map_err(storage_err)
    }

    fn scan_prefix(&self, prefix: &str) -> trellis_core::Result<Vec<(String, Vec<u8>)>> {
        let mut entries = Vec::new();
        for item in self.0.prefix_iterator(prefix.as_bytes()) {
            let (key, value) = item.map_err(storage_err)?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            let key = String::from_utf8(key.to_vec())
                .map_err(|e| trellis_core::Error::Corrupt(format!("non-utf8 key: {e}")))?;
            entries.push((key, value.to_vec()));
        }
        Ok(entries)
    }
}

impl Store for RocksStore {
    fn atomic<R, F>(&self, f: F) -> trellis_core::Result<R>
    where
        F: FnOnce(&mut dyn StoreTx) -> trellis_core::Result<R>,
    {
        let _writer = self.writer.lock();
        let base = Committed(&self.db);
        let mut records = Records::new(Overlay::new(&base));
        let result = f(&mut records)?;

        let mut batch = WriteBatch::default();
        for (key, write) in records.into_inner().into_writes() {
            match write {
                Write::Put(value) => batch.put(key.as_bytes(), value),
                Write::Delete => batch.delete(key.as_bytes()),
            }
        }
        self.db.write(batch).map_err(storage_err)?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;
    use trellis_core::{Engine, PlanType, PositionKey, TriangleQuery, SLOT_COUNT};

    #[test]
    fn triangle_roundtrip() {
        let dir = tempdir().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        let plan = PlanType::from("bronze");

        let triangle = store.atomic(|tx| tx.create_triangle(&plan)).unwrap();
        let loaded = store
            .atomic(|tx| tx.get_triangle(triangle.id))
            .unwrap()
            .unwrap();
        assert_eq!(triangle, loaded);

        let positions = store.atomic(|tx| tx.list_positions(triangle.id)).unwrap();
        assert_eq!(positions.len(), SLOT_COUNT);
        assert_eq!(positions[0].position_key, PositionKey::A);
    }

    #[test]
    fn failed_scope_is_not_written() {
        let dir = tempdir().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        let plan = PlanType::from("bronze");

        let result: trellis_core::Result<()> = store.atomic(|tx| {
            tx.create_triangle(&plan)?;
            Err(trellis_core::Error::InvalidInput("abort".into()))
        });
        assert!(result.is_err());
        let all = store
            .atomic(|tx| tx.find_triangles(&TriangleQuery::new()))
            .unwrap();
        assert!(all.is_empty());
    }

    #[test]
    fn survives_reopen() {
        let dir = tempdir().unwrap();
        let plan = PlanType::from("bronze");
        let user = {
            let engine = Engine::new(RocksStore::open(dir.path()).unwrap());
            engine.put_plan(&plan, dec!(100)).unwrap();
            let user = engine
                .store()
                .atomic(|tx| tx.create_user("ana", None, &plan, None))
                .unwrap();
            engine.assign(user.id, None).unwrap();
            user
        };

        let engine = Engine::new(RocksStore::open(dir.path()).unwrap());
        let info = engine.user_triangle_info(user.id).unwrap().unwrap();
        assert_eq!(info.filled_count, 1);
        assert_eq!(engine.plans().unwrap().len(), 1);
    }

    #[test]
    fn full_cycle_on_disk() {
        let dir = tempdir().unwrap();
        let engine = Engine::new(RocksStore::open(dir.path()).unwrap());
        let plan = PlanType::from("bronze");
        engine.put_plan(&plan, dec!(100)).unwrap();

        let mut last = None;
        for i in 0..SLOT_COUNT {
            let user = engine
                .store()
                .atomic(|tx| tx.create_user(&format!("u{i}"), None, &plan, None))
                .unwrap();
            last = Some(engine.place(user.id, None).unwrap());
        }
        let completion = last.unwrap().completion.expect("completed");
        assert_eq!(completion.successors.len(), 2);
        assert_eq!(engine.triangles(&TriangleQuery::new()).unwrap().len(), 2);
        assert_eq!(engine.stats().unwrap().pending_withdrawals, 1);
    }
}
