//! Strongly-typed identifiers for case-management entities
//!
//! Identifiers are owned by the external case-management system: numeric keys
//! for cases and actors, textual keys for logins, work codes and states.
//! Wrapping them in newtypes prevents accidentally passing a case-type id
//! where an application-type id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! define_numeric_id {
    ($name:ident, $inner:ty, $label:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name($inner);

        impl $name {
            /// Wraps a raw key
            pub const fn new(value: $inner) -> Self {
                Self(value)
            }

            /// Returns the raw key
            pub const fn value(&self) -> $inner {
                self.0
            }

            /// Returns the entity label used in messages
            pub fn label() -> &'static str {
                $label
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.trim().parse()?))
            }
        }

        impl From<$inner> for $name {
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }

        impl From<$name> for $inner {
            fn from(id: $name) -> $inner {
                id.0
            }
        }
    };
}

macro_rules! define_text_id {
    ($name:ident, $label:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw key, trimming surrounding whitespace
            pub fn new(value: impl Into<String>) -> Self {
                let value = value.into();
                Self(value.trim().to_string())
            }

            /// Returns the raw key
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true if the key is empty after trimming
            pub fn is_blank(&self) -> bool {
                self.0.is_empty()
            }

            /// Returns the entity label used in messages
            pub fn label() -> &'static str {
                $label
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Case identifiers
define_numeric_id!(CaseId, i64, "case");
define_numeric_id!(CaseTypeId, i32, "case type");
define_numeric_id!(ApplicationTypeId, i32, "application type");
define_text_id!(StateId, "state");

// Party identifiers
define_numeric_id!(ActorId, i64, "actor");
define_numeric_id!(RoleTypeId, i32, "role type");
define_text_id!(LoginId, "login");

// Billing identifiers
define_text_id!(WorkCodeId, "work code");
define_numeric_id!(DiscountId, i32, "discount");

impl LoginId {
    /// Compares two logins the way the case-management system does,
    /// ignoring ASCII case
    pub fn matches(&self, other: &LoginId) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}
