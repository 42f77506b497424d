//! Referral token resolution.
//!
//! A token may be a user id, a username, a referral code, or the tail end of a
//! user id (people paste truncated links). Strategies are tried in that order
//! and the first hit wins.

use crate::error::Result;
use crate::models::{User, UserId};
use crate::store::{StoreTx, UserLookup};
use serde::Serialize;
use tracing::{debug, warn};

/// Which strategy produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedBy {
    Id,
    Username,
    ReferralCode,
    IdSuffix,
}

/// Resolve a referral token to a user.
pub fn resolve(tx: &dyn StoreTx, token: &str) -> Result<Option<User>> {
    Ok(resolve_match(tx, token)?.map(|(user, _)| user))
}

/// Resolve a referral token, reporting which strategy matched.
pub fn resolve_match(tx: &dyn StoreTx, token: &str) -> Result<Option<(User, MatchedBy)>> {
    if token.is_empty() {
        return Ok(None);
    }

    if let Ok(id) = token.parse::<UserId>() {
        if let Some(user) = tx.get_user(id)? {
            debug!(%token, "referrer resolved by id");
            return Ok(Some((user, MatchedBy::Id)));
        }
    }

    if let Some(user) = tx.find_user(&UserLookup::Username(token.to_string()))? {
        debug!(%token, "referrer resolved by username");
        return Ok(Some((user, MatchedBy::Username)));
    }

    if let Some(user) = tx.find_user(&UserLookup::ReferralCode(token.to_string()))? {
        debug!(%token, "referrer resolved by referral code");
        return Ok(Some((user, MatchedBy::ReferralCode)));
    }

    // Last resort: linear scan over every user.
    let needle = token.to_lowercase();
    let found = tx
        .list_users()?
        .into_iter()
        .find(|u| u.id.to_string().to_lowercase().ends_with(&needle));
    if let Some(user) = found {
        warn!(%token, user = %user.id, "referrer resolved by id suffix scan");
        return Ok(Some((user, MatchedBy::IdSuffix)));
    }

    debug!(%token, "referrer not found");
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlanType;
    use crate::store::{MemoryStore, Store};

    fn plan() -> PlanType {
        PlanType::from("bronze")
    }

    #[test]
    fn precedence_id_then_username_then_code() {
        let store = MemoryStore::new();
        let (by_id, by_name) = store
            .atomic(|tx| {
                let by_id = tx.create_user("first", None, &plan(), None)?;
                let token = by_id.id.to_string();
                // the same token as another user's username and a third's code
                let by_name = tx.create_user(&token, None, &plan(), None)?;
                tx.create_user("third", Some(&token), &plan(), None)?;
                Ok((by_id, by_name))
            })
            .unwrap();

        let token = by_id.id.to_string();
        let (user, how) = store
            .atomic(|tx| resolve_match(tx, &token))
            .unwrap()
            .unwrap();
        assert_eq!((user.id, how), (by_id.id, MatchedBy::Id));

        // a well-formed id that belongs to nobody falls through to username
        let unused = UserId::new().to_string();
        let by_unused = store
            .atomic(|tx| {
                let named = tx.create_user(&unused, None, &plan(), None)?;
                tx.create_user("fourth", Some(&unused), &plan(), None)?;
                Ok(named)
            })
            .unwrap();
        let (user, how) = store
            .atomic(|tx| resolve_match(tx, &unused))
            .unwrap()
            .unwrap();
        assert_eq!((user.id, how), (by_unused.id, MatchedBy::Username));
        assert_ne!(user.id, by_name.id);
    }

    #[test]
    fn referral_code_then_suffix() {
        let store = MemoryStore::new();
        let user = store
            .atomic(|tx| tx.create_user("ana", Some("ANA-2024"), &plan(), None))
            .unwrap();

        let (found, how) = store
            .atomic(|tx| resolve_match(tx, "ANA-2024"))
            .unwrap()
            .unwrap();
        assert_eq!((found.id, how), (user.id, MatchedBy::ReferralCode));

        let id = user.id.to_string();
        let tail = id[id.len() - 8..].to_uppercase();
        let (found, how) = store
            .atomic(|tx| resolve_match(tx, &tail))
            .unwrap()
            .unwrap();
        assert_eq!((found.id, how), (user.id, MatchedBy::IdSuffix));
    }

    #[test]
    fn unknown_and_empty_tokens() {
        let store = MemoryStore::new();
        store
            .atomic(|tx| tx.create_user("ana", None, &plan(), None))
            .unwrap();
        assert!(store.atomic(|tx| resolve(tx, "")).unwrap().is_none());
        assert!(store.atomic(|tx| resolve(tx, "nobody-zz")).unwrap().is_none());
    }
}
