//! Usage counters and quota decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Feature, PlanTier, UsageLimit, UserId};

/// Persisted consumption counter for one `(user, feature)` pair.
///
/// `count` never decreases; there is no period reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    /// Counted user.
    pub user_id: UserId,
    /// Counted feature.
    pub feature: Feature,
    /// Number of recorded uses.
    pub count: u64,
    /// Time of the most recent use.
    pub last_used_at: DateTime<Utc>,
    /// Plan the user held at the most recent use.
    pub plan: PlanTier,
}

/// Outcome of a quota check.
///
/// # Examples
/// ```
/// use receipt_tracker::domain::{UsageCheck, UsageLimit};
///
/// let check = UsageCheck::evaluate(UsageLimit::Bounded(5), 2);
/// assert!(check.allowed);
/// assert_eq!(check.remaining, UsageLimit::Bounded(3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageCheck {
    /// Whether one more use is permitted.
    pub allowed: bool,
    /// Uses recorded so far.
    pub current: u64,
    /// Plan allowance for the feature.
    pub limit: UsageLimit,
    /// Allowance left, never below zero.
    pub remaining: UsageLimit,
}

impl UsageCheck {
    /// Compare a counter against a limit.
    #[must_use]
    pub fn evaluate(limit: UsageLimit, current: u64) -> Self {
        Self {
            allowed: limit.admits(current),
            current,
            limit,
            remaining: limit.remaining_after(current),
        }
    }

    /// Decision returned when the counter store could not be read.
    #[must_use]
    pub fn fail_open(limit: UsageLimit) -> Self {
        Self {
            allowed: true,
            current: 0,
            limit,
            remaining: limit,
        }
    }
}

/// Usage report line for one feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureUsage {
    /// Reported feature.
    pub feature: Feature,
    /// Uses recorded so far.
    pub current: u64,
    /// Plan allowance.
    pub limit: UsageLimit,
    /// Allowance left.
    pub remaining: UsageLimit,
    /// Most recent use, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

/// Usage report across every metered feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    /// Plan the limits were computed for.
    pub plan: PlanTier,
    /// One entry per metered feature.
    pub features: Vec<FeatureUsage>,
}
