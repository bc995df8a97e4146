//! Per-image retention verdicts.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an image is kept. Every keep carries one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeepReason {
    /// Age is at or below the threshold.
    NotYetExpired,
    /// Expired, but `tag` starts with the keep-prefix `prefix`.
    PrefixMatched { tag: String, prefix: String },
}

impl fmt::Display for KeepReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeepReason::NotYetExpired => write!(f, "not yet expired"),
            KeepReason::PrefixMatched { .. } => write!(f, "prefix matched"),
        }
    }
}

/// Outcome of classifying one image against a policy.
///
/// `DeleteUntagged` is produced iff the image has no tags; it never
/// coexists with `DeleteExpired`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Keep(KeepReason),
    DeleteUntagged,
    DeleteExpired {
        #[serde(with = "super::duration_secs", rename = "age_secs")]
        age: Duration,
    },
}

impl Verdict {
    pub fn is_delete(&self) -> bool {
        !matches!(self, Verdict::Keep(_))
    }

    /// Stable short label used in logs and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Keep(_) => "keep",
            Verdict::DeleteUntagged => "delete-untagged",
            Verdict::DeleteExpired { .. } => "delete-expired",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Keep(reason) => write!(f, "keep ({reason})"),
            Verdict::DeleteUntagged => write!(f, "delete (untagged)"),
            Verdict::DeleteExpired { .. } => write!(f, "delete (expired)"),
        }
    }
}
