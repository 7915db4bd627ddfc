//! Plan tiers, metered features, and the static limit table.
//!
//! The limit table is the single source of truth for how many times a user on
//! a given plan may consume a metered feature. Enterprise plans are
//! unbounded for every feature.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Billing tier resolved from the entitlement provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    /// Default tier for users without a paid entitlement.
    #[default]
    Free,
    /// Paid tier with raised limits.
    Pro,
    /// Unbounded tier.
    Enterprise,
}

impl PlanTier {
    /// Every tier, cheapest first.
    pub const ALL: [Self; 3] = [Self::Free, Self::Pro, Self::Enterprise];

    /// Stable lowercase label stored alongside usage counters.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
            Self::Enterprise => "enterprise",
        }
    }

    /// Look up the limit for `feature` on this plan.
    ///
    /// # Examples
    /// ```
    /// use receipt_tracker::domain::{Feature, PlanTier, UsageLimit};
    ///
    /// assert_eq!(PlanTier::Free.limit_for(Feature::ReceiptScan), UsageLimit::Bounded(5));
    /// assert_eq!(PlanTier::Enterprise.limit_for(Feature::AiInsights), UsageLimit::Unbounded);
    /// ```
    #[must_use]
    pub const fn limit_for(self, feature: Feature) -> UsageLimit {
        match (self, feature) {
            (Self::Enterprise, _) => UsageLimit::Unbounded,
            (Self::Free, Feature::MonthlyUploads) => UsageLimit::Bounded(10),
            (Self::Free, _) => UsageLimit::Bounded(5),
            (Self::Pro, Feature::MonthlyUploads) => UsageLimit::Bounded(1000),
            (Self::Pro, _) => UsageLimit::Bounded(100),
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown plan or feature label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanParseError {
    /// Plan label is not recognised.
    #[error("unknown plan tier: {0}")]
    UnknownPlan(String),
    /// Feature label is not recognised.
    #[error("unknown feature: {0}")]
    UnknownFeature(String),
}

impl FromStr for PlanTier {
    type Err = PlanParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "pro" => Ok(Self::Pro),
            "enterprise" => Ok(Self::Enterprise),
            _ => Err(PlanParseError::UnknownPlan(s.to_owned())),
        }
    }
}

/// Metered feature gated by the usage quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
    /// LLM extraction of an uploaded receipt.
    ReceiptScan,
    /// AI insight generation for a receipt.
    AiInsights,
    /// AI summary generation for a receipt.
    AiSummary,
    /// Raw upload count.
    MonthlyUploads,
}

impl Feature {
    /// Every metered feature in reporting order.
    pub const ALL: [Self; 4] = [
        Self::ReceiptScan,
        Self::AiInsights,
        Self::AiSummary,
        Self::MonthlyUploads,
    ];

    /// Stable wire and storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReceiptScan => "ai-scans",
            Self::AiInsights => "ai-insights",
            Self::AiSummary => "ai-summary",
            Self::MonthlyUploads => "monthly-uploads",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = PlanParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|feature| feature.as_str() == s)
            .ok_or_else(|| PlanParseError::UnknownFeature(s.to_owned()))
    }
}

impl Serialize for Feature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Feature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Per-plan allowance for a feature.
///
/// Serialises as a JSON number for bounded limits and as the string
/// `"unbounded"` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UsageLimit {
    /// At most `n` uses.
    Bounded(u32),
    /// No limit.
    Unbounded,
}

const UNBOUNDED_LABEL: &str = "unbounded";

impl UsageLimit {
    /// Whether `current` uses still leave room for one more.
    #[must_use]
    pub fn admits(self, current: u64) -> bool {
        match self {
            Self::Bounded(limit) => current < u64::from(limit),
            Self::Unbounded => true,
        }
    }

    /// Remaining allowance after `current` uses, saturating at zero.
    #[must_use]
    pub fn remaining_after(self, current: u64) -> Self {
        match self {
            Self::Bounded(limit) => {
                let left = u64::from(limit).saturating_sub(current);
                Self::Bounded(u32::try_from(left).unwrap_or(limit))
            }
            Self::Unbounded => Self::Unbounded,
        }
    }
}

impl fmt::Display for UsageLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bounded(limit) => write!(f, "{limit}"),
            Self::Unbounded => f.write_str(UNBOUNDED_LABEL),
        }
    }
}

impl Serialize for UsageLimit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bounded(limit) => serializer.serialize_u32(*limit),
            Self::Unbounded => serializer.serialize_str(UNBOUNDED_LABEL),
        }
    }
}

struct UsageLimitVisitor;

impl Visitor<'_> for UsageLimitVisitor {
    type Value = UsageLimit;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a non-negative integer or \"unbounded\"")
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        u32::try_from(value)
            .map(UsageLimit::Bounded)
            .map_err(|_| E::custom("usage limit out of range"))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        u32::try_from(value)
            .map(UsageLimit::Bounded)
            .map_err(|_| E::custom("usage limit out of range"))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        if value == UNBOUNDED_LABEL {
            Ok(UsageLimit::Unbounded)
        } else {
            Err(E::invalid_value(de::Unexpected::Str(value), &self))
        }
    }
}

impl<'de> Deserialize<'de> for UsageLimit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(UsageLimitVisitor)
    }
}
