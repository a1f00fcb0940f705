//! Newtype wrappers for identifiers to ensure type safety.
//!
//! Providers, agreements and activities are named by the marketplace, so most
//! of these are created from strings. `generate()` exists for ids the requestor
//! mints itself (tasks, locally signed agreements).

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new id from a string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generate a new random id.
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Get the inner string reference.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_id!(
    /// Node id of a provider issuing offers.
    ProviderId
);

string_id!(
    /// Unique identifier of a single offer (proposal).
    OfferId
);

string_id!(
    /// Identifier of a binding agreement with one provider.
    AgreementId
);

string_id!(
    /// Identifier of one execution context under an agreement.
    ActivityId
);

string_id!(
    /// Identifier of a queued task.
    TaskId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_unique() {
        assert_ne!(TaskId::generate(), TaskId::generate());
        assert_ne!(AgreementId::generate(), AgreementId::generate());
    }

    #[test]
    fn test_id_display() {
        let id = ProviderId::new("0x1234");
        assert_eq!(format!("{}", id), "0x1234");
    }

    #[test]
    fn test_serde_transparent() {
        let id = ActivityId::from("act-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"act-1\"");
        let back: ActivityId = serde_json::from_str("\"act-1\"").unwrap();
        assert_eq!(back, id);
    }
}
