//! Domain models for retention runs.
//!
//! Canonical definitions for the core entities:
//! - `PolicyConfig`: Validated retention parameters
//! - `Verdict`: Keep/delete decision for one image
//! - `RetentionError`: Fatal run errors

pub mod error;
pub mod policy;
pub mod verdict;

// Re-export main types and errors
pub use error::{ConfigError, Result, RetentionError};
pub use policy::{
    parse_prefix_list, parse_retention, AgeUnit, PolicyConfig, RetentionPeriod,
};
pub use verdict::{KeepReason, Verdict};

/// Serde adapter storing a `chrono::Duration` as whole seconds.
pub(crate) mod duration_secs {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(d.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = i64::deserialize(d)?;
        Duration::try_seconds(secs)
            .ok_or_else(|| serde::de::Error::custom(format!("duration out of range: {secs}s")))
    }
}
