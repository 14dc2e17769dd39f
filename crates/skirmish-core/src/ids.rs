//! Identifier newtypes.
//!
//! Ids are plain `u64` wrappers. They order numerically, which keeps every
//! `BTreeMap` keyed by them deterministic.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            /// Creates an id from its raw value.
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Returns the raw value.
            #[must_use]
            pub const fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self::new(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

id_newtype!(
    /// Identifies a battle across the registry, the store and the event stream.
    BattleId
);

id_newtype!(
    /// Identifies a combat unit within its battle.
    UnitId
);

id_newtype!(
    /// Identifies a side (a player or an AI faction). One entry per side in the action order.
    OwnerId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_order_numerically() {
        assert!(UnitId::new(1) < UnitId::new(2));
        assert_eq!(OwnerId::from(7).as_u64(), 7);
        assert_eq!(u64::from(BattleId::new(9)), 9);
    }

    #[test]
    fn debug_names_the_kind() {
        assert_eq!(format!("{:?}", UnitId::new(3)), "UnitId(3)");
        assert_eq!(format!("{}", OwnerId::new(3)), "3");
    }
}
