use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Opaque job posting identifier.
///
/// Backends hand out either numeric or string ids; both normalize to the
/// same value, so `JobId::from(42)` equals `JobId::from("42")`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for JobId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<u64> for JobId {
    fn from(raw: u64) -> Self {
        Self(raw.to_string())
    }
}

impl<'de> Deserialize<'de> for JobId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(JobIdVisitor)
    }
}

struct JobIdVisitor;

impl Visitor<'_> for JobIdVisitor {
    type Value = JobId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a job id as string or integer")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<JobId, E> {
        Ok(JobId::from(value))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<JobId, E> {
        Ok(JobId::from(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<JobId, E> {
        Ok(JobId::from(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<JobId, E> {
        Ok(JobId(value.to_string()))
    }
}
