//! Origin matching for inbound traffic

use serde::{Deserialize, Serialize};
use std::fmt;

/// Origin string that accepts traffic from any origin
pub const WILDCARD_ORIGIN: &str = "*";

/// The origin a channel accepts messages from
///
/// Serialises as a plain string, with `*` standing for [`RemoteOrigin::Any`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RemoteOrigin {
    /// Accept any origin
    Any,
    /// Accept exactly this origin
    Exact(String),
}

impl RemoteOrigin {
    /// Parses a configured origin
    ///
    /// Returns `None` for an empty string, which marks a channel whose
    /// remote origin is not configured yet.
    pub fn parse(origin: &str) -> Option<Self> {
        match origin {
            "" => None,
            WILDCARD_ORIGIN => Some(Self::Any),
            exact => Some(Self::Exact(exact.to_string())),
        }
    }

    /// Returns true if `origin` is accepted
    pub fn matches(&self, origin: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => expected == origin,
        }
    }

    /// Returns true for the wildcard
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// The target-origin string handed to the transport when posting
    pub fn as_str(&self) -> &str {
        match self {
            Self::Any => WILDCARD_ORIGIN,
            Self::Exact(origin) => origin,
        }
    }
}

impl From<String> for RemoteOrigin {
    fn from(origin: String) -> Self {
        if origin == WILDCARD_ORIGIN {
            Self::Any
        } else {
            Self::Exact(origin)
        }
    }
}

impl From<RemoteOrigin> for String {
    fn from(origin: RemoteOrigin) -> Self {
        match origin {
            RemoteOrigin::Any => WILDCARD_ORIGIN.to_string(),
            RemoteOrigin::Exact(origin) => origin,
        }
    }
}

impl fmt::Display for RemoteOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
