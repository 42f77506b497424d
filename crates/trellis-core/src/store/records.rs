//! Entity records over a key-value scope.
//!
//! Key layout (all values JSON):
//!
//! | key                               | value          |
//! |-----------------------------------|----------------|
//! | `meta:seq`                        | last sequence  |
//! | `user:{id}`                       | `User`         |
//! | `user-seq:{seq}`                  | `UserId`       |
//! | `user-name:{username}`            | `UserId`       |
//! | `user-code:{code}`                | `UserId`       |
//! | `plan:{plan}`                     | `Plan`         |
//! | `triangle:{id}`                   | `Triangle`     |
//! | `triangle-seq:{seq}`              | `TriangleId`   |
//! | `slot:{triangle}:{ordinal}`       | `Position`     |
//! | `occupancy:{user}:{position_seq}` | `PositionId`   |
//! | `tx:{seq}`                        | `Transaction`  |
//!
//! Sequence numbers are zero-padded so key order is creation order.

use super::{Kv, StoreTx, TransactionQuery, TriangleQuery, UserLookup};
use crate::error::{Error, Result};
use crate::models::{
    NewTransaction, Plan, PlanType, Position, PositionId, Transaction, TransactionId, Triangle,
    TriangleId, User, UserId,
};
use crate::structure::{PositionKey, SLOT_COUNT};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;

const SEQ_KEY: &str = "meta:seq";

fn seq_key(prefix: &str, seq: u64) -> String {
    format!("{prefix}:{seq:020}")
}

fn slot_key(triangle_id: TriangleId, key: PositionKey) -> String {
    format!("slot:{}:{:02}", triangle_id, key.ordinal())
}

fn occupancy_key(user_id: UserId, position_seq: u64) -> String {
    format!("occupancy:{}:{:020}", user_id, position_seq)
}

/// [`StoreTx`] implemented over any [`Kv`].
pub struct Records<K: Kv> {
    kv: K,
}

impl<K: Kv> Records<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }

    pub fn into_inner(self) -> K {
        self.kv
    }

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.kv.get(key)? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    fn put_json<T: Serialize>(&mut self, key: String, value: &T) -> Result<()> {
        let data = serde_json::to_vec(value)?;
        self.kv.put(key, data);
        Ok(())
    }

    fn scan_json<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>> {
        self.kv
            .scan_prefix(prefix)?
            .into_iter()
            .map(|(_, data)| serde_json::from_slice(&data).map_err(Error::from))
            .collect()
    }

    fn next_seq(&mut self) -> Result<u64> {
        let seq = self.get_json::<u64>(SEQ_KEY)?.unwrap_or(0) + 1;
        self.put_json(SEQ_KEY.to_string(), &seq)?;
        Ok(seq)
    }

    fn user_by_index(&self, key: &str) -> Result<Option<User>> {
        match self.get_json::<UserId>(key)? {
            Some(id) => self.get_user(id),
            None => Ok(None),
        }
    }

    fn get_position(&self, id: PositionId) -> Result<Option<Position>> {
        self.get_json(&slot_key(id.triangle_id, id.key))
    }
}

impl<K: Kv> StoreTx for Records<K> {
    fn create_user(
        &mut self,
        username: &str,
        referral_code: Option<&str>,
        plan: &PlanType,
        upline_id: Option<UserId>,
    ) -> Result<User> {
        let name_key = format!("user-name:{username}");
        if self.kv.get(&name_key)?.is_some() {
            return Err(Error::InvalidInput(format!("username {username:?} is taken")));
        }
        let code_key = referral_code.map(|code| format!("user-code:{code}"));
        if let (Some(code), Some(key)) = (referral_code, &code_key) {
            if self.kv.get(key)?.is_some() {
                return Err(Error::InvalidInput(format!("referral code {code:?} is taken")));
            }
        }

        let seq = self.next_seq()?;
        let user = User {
            id: UserId::new(),
            username: username.to_string(),
            referral_code: referral_code.map(str::to_string),
            plan: plan.clone(),
            upline_id,
            balance: Decimal::ZERO,
            total_earned: Decimal::ZERO,
            created_at: Utc::now(),
            seq,
        };
        self.put_json(format!("user:{}", user.id), &user)?;
        self.put_json(seq_key("user-seq", seq), &user.id)?;
        self.put_json(name_key, &user.id)?;
        if let Some(key) = code_key {
            self.put_json(key, &user.id)?;
        }
        Ok(user)
    }

    fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.get_json(&format!("user:{id}"))
    }

    fn find_user(&self, lookup: &UserLookup) -> Result<Option<User>> {
        match lookup {
            UserLookup::Id(id) => self.get_user(*id),
            UserLookup::Username(name) => self.user_by_index(&format!("user-name:{name}")),
            UserLookup::ReferralCode(code) => self.user_by_index(&format!("user-code:{code}")),
        }
    }

    fn update_user(&mut self, user: &User) -> Result<()> {
        let key = format!("user:{}", user.id);
        let stored: User = self
            .get_json(&key)?
            .ok_or_else(|| Error::user_not_found(user.id))?;
        if stored.username != user.username || stored.referral_code != user.referral_code {
            return Err(Error::InvalidInput(
                "username and referral code are immutable".to_string(),
            ));
        }
        self.put_json(key, user)
    }

    fn list_users(&self) -> Result<Vec<User>> {
        let ids: Vec<UserId> = self.scan_json("user-seq:")?;
        let mut users = Vec::with_capacity(ids.len());
        for id in ids {
            let user = self
                .get_user(id)?
                .ok_or_else(|| Error::Corrupt(format!("dangling user index {id}")))?;
            users.push(user);
        }
        Ok(users)
    }

    fn put_plan(&mut self, plan: &Plan) -> Result<()> {
        self.put_json(format!("plan:{}", plan.plan_type), plan)
    }

    fn get_plan(&self, plan_type: &PlanType) -> Result<Option<Plan>> {
        self.get_json(&format!("plan:{plan_type}"))
    }

    fn list_plans(&self) -> Result<Vec<Plan>> {
        self.scan_json("plan:")
    }

    fn create_triangle(&mut self, plan_type: &PlanType) -> Result<Triangle> {
        let seq = self.next_seq()?;
        let triangle = Triangle {
            id: TriangleId::new(),
            plan_type: plan_type.clone(),
            is_complete: false,
            completed_at: None,
            payout_processed: false,
            created_at: Utc::now(),
            seq,
        };
        self.put_json(format!("triangle:{}", triangle.id), &triangle)?;
        self.put_json(seq_key("triangle-seq", seq), &triangle.id)?;
        for key in PositionKey::ALL {
            let position = Position::empty(triangle.id, seq, key);
            self.put_json(slot_key(triangle.id, key), &position)?;
        }
        Ok(triangle)
    }

    fn get_triangle(&self, id: TriangleId) -> Result<Option<Triangle>> {
        self.get_json(&format!("triangle:{id}"))
    }

    fn update_triangle(&mut self, triangle: &Triangle) -> Result<()> {
        let key = format!("triangle:{}", triangle.id);
        if self.kv.get(&key)?.is_none() {
            return Err(Error::triangle_not_found(triangle.id));
        }
        self.put_json(key, triangle)
    }

    fn delete_triangle(&mut self, id: TriangleId) -> Result<()> {
        let triangle = self
            .get_triangle(id)?
            .ok_or_else(|| Error::triangle_not_found(id))?;
        self.kv.delete(seq_key("triangle-seq", triangle.seq));
        self.kv.delete(format!("triangle:{id}"));
        Ok(())
    }

    fn find_triangles(&self, query: &TriangleQuery) -> Result<Vec<Triangle>> {
        let ids: Vec<TriangleId> = self.scan_json("triangle-seq:")?;
        let mut triangles = Vec::with_capacity(ids.len());
        for id in ids {
            let triangle = self
                .get_triangle(id)?
                .ok_or_else(|| Error::Corrupt(format!("dangling triangle index {id}")))?;
            triangles.push(triangle);
        }
        Ok(query.apply(triangles))
    }

    fn find_most_recent_position_for_user(&self, user_id: UserId) -> Result<Option<Position>> {
        let held: Vec<PositionId> = self.scan_json(&format!("occupancy:{user_id}:"))?;
        match held.last() {
            Some(id) => self.get_position(*id),
            None => Ok(None),
        }
    }

    fn list_positions(&self, triangle_id: TriangleId) -> Result<Vec<Position>> {
        let positions: Vec<Position> = self.scan_json(&format!("slot:{triangle_id}:"))?;
        if !positions.is_empty() && positions.len() != SLOT_COUNT {
            return Err(Error::Corrupt(format!(
                "triangle {triangle_id} has {} positions",
                positions.len()
            )));
        }
        Ok(positions)
    }

    fn set_occupant(&mut self, id: PositionId, user_id: UserId) -> Result<Position> {
        let mut position = self
            .get_position(id)?
            .ok_or_else(|| Error::NotFound(format!("position {id}")))?;
        if position.occupant_id.is_some() {
            return Err(Error::SlotOccupied(id));
        }
        position.occupant_id = Some(user_id);
        self.put_json(slot_key(id.triangle_id, id.key), &position)?;
        self.put_json(occupancy_key(user_id, position.seq), &id)?;
        Ok(position)
    }

    fn delete_positions(&mut self, triangle_id: TriangleId) -> Result<()> {
        for position in self.list_positions(triangle_id)? {
            if let Some(user_id) = position.occupant_id {
                self.kv.delete(occupancy_key(user_id, position.seq));
            }
            self.kv.delete(slot_key(triangle_id, position.position_key));
        }
        Ok(())
    }

    fn create_transaction(&mut self, new: NewTransaction) -> Result<Transaction> {
        let seq = self.next_seq()?;
        let tx = Transaction {
            id: TransactionId::new(),
            user_id: new.user_id,
            kind: new.kind,
            amount: new.amount,
            status: new.status,
            description: new.description,
            created_at: Utc::now(),
            seq,
        };
        self.put_json(seq_key("tx", seq), &tx)?;
        Ok(tx)
    }

    fn find_transactions(&self, query: &TransactionQuery) -> Result<Vec<Transaction>> {
        Ok(query.apply(self.scan_json("tx:")?))
    }
}
