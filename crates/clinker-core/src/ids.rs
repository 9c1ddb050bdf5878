//! Opaque identifiers used across crate boundaries.
//!
//! Batch and job identifiers are caller-opaque strings rather than
//! database-assigned integers, since both are minted before any row is
//! written (the batch id is returned from `ingest` before the staging
//! transaction commits; the job id is returned from `submit` before the
//! job is picked up by a worker).

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! opaque_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Mint a fresh, random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
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

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

opaque_id!(BatchId, "Identifier for a `ValidationBatch`.");
opaque_id!(JobId, "Identifier for a `Job`.");
opaque_id!(RunId, "Identifier for an `OptimizationRun`.");
