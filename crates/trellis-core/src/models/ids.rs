//! Identity types.

use crate::structure::PositionKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Fresh random identity.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = crate::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|e| crate::Error::InvalidInput(format!("{}: {e}", stringify!($name))))
            }
        }
    };
}

uuid_id!(
    /// Identity of a user.
    UserId
);
uuid_id!(
    /// Identity of a triangle.
    TriangleId
);
uuid_id!(
    /// Identity of a payout transaction.
    TransactionId
);

/// Identity of a slot: the owning triangle plus the slot's fixed key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionId {
    pub triangle_id: TriangleId,
    pub key: PositionKey,
}

impl PositionId {
    pub fn new(triangle_id: TriangleId, key: PositionKey) -> Self {
        Self { triangle_id, key }
    }
}

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.triangle_id, self.key)
    }
}

/// Name of a plan; triangles and users belong to exactly one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanType(pub String);

impl PlanType {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlanType {
    fn from(s: &str) -> Self {
        PlanType(s.to_string())
    }
}

impl From<String> for PlanType {
    fn from(s: String) -> Self {
        PlanType(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_user_id() {
        let id = UserId::new();
        assert_eq!(id.to_string().parse::<UserId>().unwrap(), id);
        assert!("not-a-uuid".parse::<UserId>().is_err());
    }

    #[test]
    fn position_id_display() {
        let t = TriangleId::new();
        let id = PositionId::new(t, PositionKey::B1C2);
        assert_eq!(id.to_string(), format!("{t}/B1C2"));
    }
}
