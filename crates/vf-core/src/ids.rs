//! Typed ID wrappers providing compile-time safety for entity identifiers.
//!
//! Identifiers in this system are opaque strings: job ids may be supplied by
//! the caller or derived from a remote task id, and remote ids are whatever
//! the indexing service hands back. Each wrapper is a newtype over `String`,
//! preventing accidental misuse (e.g., passing a `VideoId` where a `TaskId`
//! is expected).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Generate a newtype ID wrapper over `String`.
///
/// The macro produces a struct with:
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `Serialize`, `Deserialize`
/// - `as_str()` borrowing the inner value
/// - `Display` and `FromStr` delegating to the inner string
/// - `From<String>` / `From<&str>` conversions
macro_rules! string_id {
    ($($(#[doc = $doc:expr])* $name:ident),+ $(,)?) => {
        $(
            $(#[doc = $doc])*
            #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(String);

            impl $name {
                /// Return the inner string value.
                #[must_use]
                pub fn as_str(&self) -> &str {
                    &self.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl FromStr for $name {
                type Err = std::convert::Infallible;

                fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                    Ok(Self(s.to_string()))
                }
            }

            impl From<String> for $name {
                fn from(s: String) -> Self {
                    Self(s)
                }
            }

            impl From<&str> for $name {
                fn from(s: &str) -> Self {
                    Self(s.to_string())
                }
            }

            impl From<$name> for String {
                fn from(id: $name) -> Self {
                    id.0
                }
            }
        )+
    };
}

string_id! {
    /// Identifier of one end-to-end pipeline run.
    JobId,
    /// Identifier of a remote indexing task.
    TaskId,
    /// Identifier of an indexed video resource on the remote service.
    VideoId,
}

impl JobId {
    /// Create a new random job ID (UUIDv4 rendered as a string).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&TaskId> for JobId {
    fn from(task: &TaskId) -> Self {
        Self(task.0.clone())
    }
}
