//! Execution identifiers
//!
//! An [`ExecutionId`] names one run of a step. Every host-side path of the
//! run is derived from it, so re-parsing the same identifier later (to poll
//! status or read the log) reconstructs the original workspace exactly.

use crate::step::StepError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

static ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("valid execution id pattern"));

/// Number of trailing UUID hex digits used as the random suffix
const SUFFIX_LEN: usize = 8;

/// Validated, opaque identifier of one execution
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExecutionId(String);

impl ExecutionId {
    /// Validates a raw identifier
    ///
    /// # Errors
    ///
    /// Returns [`StepError::InvalidIdentifier`] when `raw` is empty or holds
    /// a character outside `[A-Za-z0-9_.-]`.
    pub fn validate(raw: impl Into<String>) -> Result<Self, StepError> {
        let raw = raw.into();
        if ID_PATTERN.is_match(&raw) {
            Ok(Self(raw))
        } else {
            Err(StepError::InvalidIdentifier { value: raw })
        }
    }

    /// Generates a fresh identifier: `prefix` followed by the low-order
    /// hex digits of a random UUID
    ///
    /// # Errors
    ///
    /// Returns [`StepError::InvalidIdentifier`] if the prefix is not made of
    /// identifier characters.
    pub fn generate(prefix: &str) -> Result<Self, StepError> {
        let uuid = Uuid::new_v4().simple().to_string();
        let suffix = &uuid[uuid.len() - SUFFIX_LEN..];
        Self::validate(format!("{prefix}{suffix}"))
    }

    /// Returns the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ExecutionId {
    type Err = StepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::validate(s)
    }
}

impl TryFrom<String> for ExecutionId {
    type Error = StepError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::validate(value)
    }
}

impl From<ExecutionId> for String {
    fn from(id: ExecutionId) -> Self {
        id.0
    }
}

impl AsRef<str> for ExecutionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
