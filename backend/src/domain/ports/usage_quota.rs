//! Driving port for the usage quota gate.
//!
//! Receipt upload and insight generation consult this port before doing
//! metered work, and HTTP handlers use it to report usage.

use async_trait::async_trait;

use crate::domain::{Feature, PlanTier, UsageCheck, UsageSummary, UserId};

/// Quota decisions and usage accounting.
///
/// Store failures never surface from [`UsageQuota::check_limit`] or
/// [`UsageQuota::increment`]: checks fail open and increments are dropped,
/// both with a warning.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsageQuota: Send + Sync {
    /// Resolve the user's plan, defaulting to free when billing is down.
    async fn resolve_plan(&self, user_id: &UserId) -> PlanTier;

    /// Decide whether the user may consume one more unit of `feature`.
    async fn check_limit(&self, user_id: &UserId, feature: Feature, plan: PlanTier) -> UsageCheck;

    /// Record one unit of consumption.
    async fn increment(&self, user_id: &UserId, feature: Feature, plan: PlanTier);

    /// Report usage for every metered feature.
    async fn usage_summary(&self, user_id: &UserId, plan: PlanTier) -> UsageSummary;
}

/// Fixture implementation that always allows and records nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureUsageQuota;

#[async_trait]
impl UsageQuota for FixtureUsageQuota {
    async fn resolve_plan(&self, _user_id: &UserId) -> PlanTier {
        PlanTier::Free
    }

    async fn check_limit(&self, _user_id: &UserId, feature: Feature, plan: PlanTier) -> UsageCheck {
        UsageCheck::evaluate(plan.limit_for(feature), 0)
    }

    async fn increment(&self, _user_id: &UserId, _feature: Feature, _plan: PlanTier) {}

    async fn usage_summary(&self, _user_id: &UserId, plan: PlanTier) -> UsageSummary {
        UsageSummary {
            plan,
            features: Vec::new(),
        }
    }
}
