//! Composite container IDs and random UID generation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{PodletError, PodletResult};

/// A container ID qualified by the runtime that owns it.
///
/// Rendered as `<runtime-type>://<id>`, e.g. `docker://4f2a...`. The pair is the
/// stable key for reference tracking and event attribution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerId {
    /// The runtime-type tag (e.g., "docker", "remote").
    #[serde(rename = "type")]
    pub runtime_type: String,
    /// The opaque identifier assigned by the runtime.
    pub id: String,
}

impl ContainerId {
    /// Separator between the runtime type and the opaque ID.
    pub const SEPARATOR: &'static str = "://";

    /// Create a composite container ID.
    #[must_use]
    pub fn new(runtime_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            runtime_type: runtime_type.into(),
            id: id.into(),
        }
    }

    /// Parse a `<runtime-type>://<id>` string.
    ///
    /// # Errors
    ///
    /// Returns an error if either half is missing.
    pub fn parse(s: &str) -> PodletResult<Self> {
        match s.split_once(Self::SEPARATOR) {
            Some((runtime_type, id)) if !runtime_type.is_empty() && !id.is_empty() => {
                Ok(Self::new(runtime_type, id))
            }
            _ => Err(PodletError::InvalidContainerId { id: s.to_string() }),
        }
    }

    /// Returns true if no opaque ID has been assigned.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    /// Returns a short version of the opaque ID (first 12 characters).
    #[must_use]
    pub fn short(&self) -> &str {
        self.id.get(..12).unwrap_or(&self.id)
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.runtime_type, Self::SEPARATOR, self.id)
    }
}

impl FromStr for ContainerId {
    type Err = PodletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Generate a random 8-character hex string.
///
/// Used as a collision-avoiding suffix for per-instance host files; the
/// value carries no meaning and need not be unpredictable.
#[must_use]
pub fn make_uid() -> String {
    let uuid = uuid::Uuid::new_v4();
    hex::encode(&uuid.as_bytes()[..4])
}
