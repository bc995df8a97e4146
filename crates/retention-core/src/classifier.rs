//! Retention classification: one image + policy + instant -> verdict.
//!
//! Rules, in order:
//! 1. No push time: indeterminate, the image is not classified.
//! 2. No tags: `DeleteUntagged`, regardless of age.
//! 3. Age (whole units, truncated) at or below the threshold: keep.
//! 4. Any tag starting with any keep-prefix: keep.
//! 5. Otherwise: `DeleteExpired`.
//!
//! `now` is fixed for the lifetime of a classifier so every image in a run is
//! judged against the same instant.

use chrono::{DateTime, Duration, Utc};
use registry_gateway::ImageRecord;

use crate::domain::{KeepReason, PolicyConfig, Verdict};

/// Classifies images against a policy at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct RetentionClassifier<'a> {
    policy: &'a PolicyConfig,
    now: DateTime<Utc>,
}

impl<'a> RetentionClassifier<'a> {
    pub fn new(policy: &'a PolicyConfig, now: DateTime<Utc>) -> Self {
        Self { policy, now }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Age of `image` in whole policy units, or `None` without a push time.
    ///
    /// Negative when the push time is in the future (clock skew).
    pub fn age_of(&self, image: &ImageRecord) -> Option<Duration> {
        let pushed_at = image.pushed_at?;
        Some(self.policy.age_unit().truncate(self.now - pushed_at))
    }

    /// Classify one image. Returns `None` when the push time is missing.
    pub fn classify(&self, image: &ImageRecord) -> Option<Verdict> {
        let age = self.age_of(image)?;

        if image.tags.is_empty() {
            return Some(Verdict::DeleteUntagged);
        }

        if age <= self.policy.max_age() {
            return Some(Verdict::Keep(KeepReason::NotYetExpired));
        }

        let verdict = match matching_prefix(&image.tags, self.policy.keep_prefixes()) {
            Some((tag, prefix)) => Verdict::Keep(KeepReason::PrefixMatched {
                tag: tag.to_string(),
                prefix: prefix.to_string(),
            }),
            None => Verdict::DeleteExpired { age },
        };
        Some(verdict)
    }
}

/// Classify a single image without holding a classifier.
pub fn classify_at(
    image: &ImageRecord,
    policy: &PolicyConfig,
    now: DateTime<Utc>,
) -> Option<Verdict> {
    RetentionClassifier::new(policy, now).classify(image)
}

/// First `(tag, prefix)` pair, in tag-major order, where the tag starts with
/// the prefix. Byte-wise and case-sensitive; the empty prefix matches all.
pub fn matching_prefix<'t>(tags: &'t [String], prefixes: &'t [String]) -> Option<(&'t str, &'t str)> {
    tags.iter()
        .flat_map(|tag| prefixes.iter().map(move |prefix| (tag.as_str(), prefix.as_str())))
        .find(|(tag, prefix)| tag.starts_with(prefix))
}
