//! Validated retention parameters for a cleanup run.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::ConfigError;

/// Granularity in which image age is measured and the threshold is expressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeUnit {
    Minutes,
    #[default]
    Days,
}

impl AgeUnit {
    /// `amount` units as a duration, or `None` if it does not fit.
    pub fn duration(self, amount: i64) -> Option<Duration> {
        match self {
            AgeUnit::Minutes => Duration::try_minutes(amount),
            AgeUnit::Days => Duration::try_days(amount),
        }
    }

    /// Number of whole units in `elapsed`, truncated toward zero.
    pub fn whole_units(self, elapsed: Duration) -> i64 {
        match self {
            AgeUnit::Minutes => elapsed.num_minutes(),
            AgeUnit::Days => elapsed.num_days(),
        }
    }

    /// Drop everything below one unit from `elapsed`.
    pub fn truncate(self, elapsed: Duration) -> Duration {
        let units = self.whole_units(elapsed);
        // `units` never exceeds `elapsed`, so this cannot overflow.
        self.duration(units).unwrap_or(elapsed)
    }

    /// Render `d` as a count of whole units, e.g. `30 days`.
    pub fn format(self, d: Duration) -> String {
        format!("{} {}", self.whole_units(d), self)
    }
}

impl fmt::Display for AgeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgeUnit::Minutes => write!(f, "minutes"),
            AgeUnit::Days => write!(f, "days"),
        }
    }
}

impl FromStr for AgeUnit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "m" | "min" | "mins" | "minute" | "minutes" => Ok(AgeUnit::Minutes),
            "d" | "day" | "days" => Ok(AgeUnit::Days),
            _ => Err(ConfigError::InvalidUnit(s.to_string())),
        }
    }
}

/// A retention threshold as the operator supplied it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPeriod {
    pub amount: u64,
    pub unit: AgeUnit,
}

impl RetentionPeriod {
    pub fn new(amount: u64, unit: AgeUnit) -> Self {
        Self { amount, unit }
    }

    pub fn minutes(amount: u64) -> Self {
        Self::new(amount, AgeUnit::Minutes)
    }

    pub fn days(amount: u64) -> Self {
        Self::new(amount, AgeUnit::Days)
    }

    /// Normalise to a single duration.
    pub fn to_duration(&self) -> Result<Duration, ConfigError> {
        i64::try_from(self.amount)
            .ok()
            .and_then(|amount| self.unit.duration(amount))
            .ok_or_else(|| ConfigError::RetentionOverflow {
                amount: self.amount,
                unit: self.unit.to_string(),
            })
    }
}

impl fmt::Display for RetentionPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.unit)
    }
}

/// Parse an operator-supplied retention amount.
pub fn parse_retention(input: &str) -> Result<u64, ConfigError> {
    input
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidRetention(input.to_string()))
}

/// Split a comma-separated prefix list.
///
/// Segments are kept exactly as written: no trimming, and empty segments are
/// preserved. An empty segment is the empty prefix and matches every tag.
pub fn parse_prefix_list(input: &str) -> Vec<String> {
    input.split(',').map(str::to_string).collect()
}

/// Retention parameters for one run. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyConfig {
    region: String,
    #[serde(with = "super::duration_secs", rename = "max_age_secs")]
    max_age: Duration,
    age_unit: AgeUnit,
    keep_prefixes: Vec<String>,
    dry_run: bool,
}

impl PolicyConfig {
    /// Validate and build a policy.
    ///
    /// Fails if the region is blank or the retention period does not fit in a
    /// duration.
    pub fn new(
        region: impl Into<String>,
        retention: RetentionPeriod,
        keep_prefixes: Vec<String>,
        dry_run: bool,
    ) -> Result<Self, ConfigError> {
        let region = region.into().trim().to_string();
        if region.is_empty() {
            return Err(ConfigError::EmptyRegion);
        }
        let max_age = retention.to_duration()?;

        Ok(Self {
            region,
            max_age,
            age_unit: retention.unit,
            keep_prefixes,
            dry_run,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    pub fn age_unit(&self) -> AgeUnit {
        self.age_unit
    }

    pub fn keep_prefixes(&self) -> &[String] {
        &self.keep_prefixes
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// True when some keep-prefix is empty, which protects every tagged image.
    pub fn has_empty_prefix(&self) -> bool {
        self.keep_prefixes.iter().any(String::is_empty)
    }

    /// Threshold rendered in the configured unit, e.g. `10 days`.
    pub fn max_age_display(&self) -> String {
        self.age_unit.format(self.max_age)
    }
}
