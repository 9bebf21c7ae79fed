//! Identity and timestamp types for artifacts

use crate::{ArtifactError, ArtifactResult};
use chrono::{DateTime, Local, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Timezone-naive wall-clock timestamp, as recorded in artifact files.
pub type Timestamp = NaiveDateTime;

/// Width of a stored artifact id.
pub const ID_WIDTH: usize = 5;

/// Largest number representable in a 5-digit id.
pub const MAX_ARTIFACT_NUMBER: u32 = 99_999;

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const ISO_SPACE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Current local time, truncated to microseconds.
pub fn now_timestamp() -> Timestamp {
    Local::now().naive_local().trunc_subsecs(6)
}

/// Render a timestamp as ISO-8601 (`2024-03-01T09:30:00.125`).
pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.format(ISO_FORMAT).to_string()
}

/// Parse an ISO-8601 timestamp. Fractional seconds are optional; an offset
/// suffix is accepted and its local wall-clock value kept.
pub fn parse_timestamp(field: &str, value: &str) -> ArtifactResult<Timestamp> {
    let trimmed = value.trim();
    NaiveDateTime::parse_from_str(trimmed, ISO_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, ISO_SPACE_FORMAT))
        .or_else(|err| {
            DateTime::parse_from_rfc3339(trimmed)
                .map(|dt| dt.naive_local())
                .map_err(|_| err)
        })
        .map_err(|e| ArtifactError::DateParse {
            field: field.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Repository-wide artifact identifier: five zero-padded digits.
///
/// `"00000"` is reserved as the placeholder carried by artifacts that have
/// not been persisted yet; the store replaces it on first save.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactId(String);

impl ArtifactId {
    pub const PLACEHOLDER: &'static str = "00000";

    /// The not-yet-allocated id.
    pub fn placeholder() -> Self {
        Self(Self::PLACEHOLDER.to_string())
    }

    /// Build an id from its numeric value, zero-padded to five digits.
    pub fn from_number(number: u32) -> ArtifactResult<Self> {
        if number > MAX_ARTIFACT_NUMBER {
            return Err(ArtifactError::InvalidId {
                value: number.to_string(),
                reason: format!("exceeds {}", MAX_ARTIFACT_NUMBER),
            });
        }
        Ok(Self(format!("{:0width$}", number, width = ID_WIDTH)))
    }

    /// Parse an id. Accepts `"00042"`, the unpadded `"42"`, and the legacy
    /// `"<type>/00042"` form.
    pub fn parse(value: &str) -> ArtifactResult<Self> {
        let trimmed = value.trim();
        let digits = trimmed.rsplit('/').next().unwrap_or(trimmed);
        let invalid = |reason: &str| ArtifactError::InvalidId {
            value: value.to_string(),
            reason: reason.to_string(),
        };

        if digits.is_empty() {
            return Err(invalid("empty"));
        }
        if digits.len() > ID_WIDTH {
            return Err(invalid("more than five digits"));
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("must contain only digits"));
        }
        let number: u32 = digits.parse().map_err(|_| invalid("not a number"))?;
        Self::from_number(number)
    }

    pub fn is_placeholder(&self) -> bool {
        self.0 == Self::PLACEHOLDER
    }

    pub fn number(&self) -> u32 {
        // Construction guarantees five ASCII digits.
        self.0.parse().unwrap_or(0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ArtifactId {
    fn default() -> Self {
        Self::placeholder()
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ArtifactId {
    type Err = ArtifactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ArtifactId {
    type Error = ArtifactError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ArtifactId> for String {
    fn from(id: ArtifactId) -> Self {
        id.0
    }
}

impl AsRef<str> for ArtifactId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ArtifactId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ArtifactId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

// ============================================================================
// TESTS
// ============================================================================
