//! Payout to the top of a completed triangle.
//!
//! The user is credited at once while the withdrawal stays `PENDING`; the
//! balance reflects the payout before the withdrawal is confirmed.

use crate::error::Result;
use crate::models::{
    NewTransaction, PlanType, Transaction, TransactionKind, TransactionStatus, User,
};
use crate::store::StoreTx;
use tracing::{info, warn};

/// Description carried by every automatic completion payout.
pub const PAYOUT_DESCRIPTION: &str = "Automatic payout: triangle completion";

/// Record a pending withdrawal of the plan's payout and credit the user.
///
/// A missing plan skips the payout without error.
pub fn pay(tx: &mut dyn StoreTx, mut user: User, plan_type: &PlanType) -> Result<Option<Transaction>> {
    let Some(plan) = tx.get_plan(plan_type)? else {
        warn!(user = %user.id, plan = %plan_type, "plan missing, payout skipped");
        return Ok(None);
    };

    let withdrawal = tx.create_transaction(NewTransaction {
        user_id: user.id,
        kind: TransactionKind::Withdrawal,
        amount: plan.payout,
        status: TransactionStatus::Pending,
        description: format!("{PAYOUT_DESCRIPTION} ({plan_type})"),
    })?;

    user.credit(plan.payout);
    tx.update_user(&user)?;
    info!(
        user = %user.id,
        amount = %plan.payout,
        transaction = %withdrawal.id,
        "completion payout credited"
    );

    Ok(Some(withdrawal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Plan;
    use crate::store::{MemoryStore, Store, TransactionQuery};
    use rust_decimal_macros::dec;

    #[test]
    fn credits_before_settlement() {
        let store = MemoryStore::new();
        let plan = PlanType::from("bronze");
        let user = store
            .atomic(|tx| {
                tx.put_plan(&Plan::new("bronze", dec!(250)))?;
                tx.create_user("ana", None, &plan, None)
            })
            .unwrap();

        let paid = store
            .atomic(|tx| pay(tx, user.clone(), &plan))
            .unwrap()
            .expect("plan exists");
        assert_eq!(paid.amount, dec!(250));
        assert_eq!(paid.status, TransactionStatus::Pending);
        assert_eq!(paid.kind, TransactionKind::Withdrawal);
        assert!(paid.description.starts_with(PAYOUT_DESCRIPTION));

        let stored = store.atomic(|tx| tx.get_user(user.id)).unwrap().unwrap();
        assert_eq!(stored.balance, dec!(250));
        assert_eq!(stored.total_earned, dec!(250));
    }

    #[test]
    fn missing_plan_is_a_silent_skip() {
        let store = MemoryStore::new();
        let plan = PlanType::from("ghost");
        let user = store
            .atomic(|tx| tx.create_user("ana", None, &plan, None))
            .unwrap();

        let paid = store.atomic(|tx| pay(tx, user.clone(), &plan)).unwrap();
        assert!(paid.is_none());

        let txs = store
            .atomic(|tx| tx.find_transactions(&TransactionQuery::new().user(user.id)))
            .unwrap();
        assert!(txs.is_empty());
        let stored = store.atomic(|tx| tx.get_user(user.id)).unwrap().unwrap();
        assert!(stored.balance.is_zero());
    }
}
