//! Type-safe identifier wrappers around the service's raw numeric ids.
//!
//! The external service identifies items and skills by small integers.
//! Wrapping them in distinct newtypes prevents accidental mixing at
//! compile time (an item id passed where a skill id belongs is a type
//! error, not a silent wrong form field). Ids are never generated
//! locally; they always originate from the service's own tables.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around a raw `u32` service id.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Wrap a raw service-side identifier.
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Return the raw numeric identifier.
            pub const fn into_inner(self) -> u32 {
                self.0
            }
        }

        impl Default for $name {
            /// The service reserves id 0 as "nothing"; an unconfigured
            /// id compares equal to no real table row.
            fn default() -> Self {
                Self(0)
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Identifier for an item. Items double as resources: the ledger,
    /// the recipe table, and the item catalog are all keyed by this id.
    ItemId
}

define_id! {
    /// Identifier for a combat skill.
    SkillId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let item = ItemId::new(25);
        let skill = SkillId::new(5003);
        // Different types -- the compiler enforces no mixing.
        assert_eq!(item.into_inner(), 25);
        assert_eq!(skill.into_inner(), 5003);
    }

    #[test]
    fn display_renders_raw_id() {
        assert_eq!(ItemId::new(536).to_string(), "536");
    }
}
