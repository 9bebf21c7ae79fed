//! Open, string-valued artifact type tag

use crate::{ArtifactError, ArtifactResult};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Kind of an artifact ("requirement", "task", "bug", ...).
///
/// Not a closed enumeration: any non-empty tag is accepted and stored
/// verbatim. Equality and hashing are by the underlying string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactType(String);

impl ArtifactType {
    pub fn new(value: impl Into<String>) -> ArtifactResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ArtifactError::InvalidValue {
                field: "type".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(Self(value))
    }

    pub fn requirement() -> Self {
        Self("requirement".to_string())
    }

    pub fn task() -> Self {
        Self("task".to_string())
    }

    pub fn test_case() -> Self {
        Self("test_case".to_string())
    }

    pub fn issue() -> Self {
        Self("issue".to_string())
    }

    pub fn bug() -> Self {
        Self("bug".to_string())
    }

    pub fn feature() -> Self {
        Self("feature".to_string())
    }

    pub fn story() -> Self {
        Self("story".to_string())
    }

    pub fn aspect() -> Self {
        Self("aspect".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ArtifactType {
    type Error = ArtifactError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ArtifactType {
    type Error = ArtifactError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ArtifactType> for String {
    fn from(t: ArtifactType) -> Self {
        t.0
    }
}

impl AsRef<str> for ArtifactType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ArtifactType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ArtifactType {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ArtifactType {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl PartialEq<String> for ArtifactType {
    fn eq(&self, other: &String) -> bool {
        &self.0 == other
    }
}
