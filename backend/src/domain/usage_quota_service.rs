//! Usage quota gate implementing the [`UsageQuota`] driving port.
//!
//! The gate compares a persisted per-feature counter with the plan's limit.
//! It is deliberately not transactional: callers check, perform the metered
//! work, then increment, so concurrent requests may overshoot a limit.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{debug, warn};

use crate::domain::ports::{
    ENTERPRISE_PLAN_FLAG, EntitlementProvider, PRO_PLAN_FLAG, UsageQuota, UsageRepository,
};
use crate::domain::receipt_service::USAGE_LIMIT_EXCEEDED_MESSAGE;
use crate::domain::{Error, Feature, FeatureUsage, PlanTier, UsageCheck, UsageSummary, UserId};

/// Gate one use of `feature` on the caller's plan.
///
/// Returns the resolved plan so the caller can record the use once the
/// metered work is under way. A spent allowance is `403 Forbidden` with the
/// [`UsageCheck`] under `details.usageCheck`.
pub async fn admit_use(
    quota: &dyn UsageQuota,
    user_id: &UserId,
    feature: Feature,
) -> Result<PlanTier, Error> {
    let plan = quota.resolve_plan(user_id).await;
    let check = quota.check_limit(user_id, feature, plan).await;
    if !check.allowed {
        debug!(%user_id, %feature, current = check.current, "usage allowance spent");
        return Err(Error::forbidden(USAGE_LIMIT_EXCEEDED_MESSAGE)
            .with_details(json!({ "usageCheck": check })));
    }
    Ok(plan)
}

/// Quota service backed by a usage repository and entitlement provider.
#[derive(Clone)]
pub struct UsageQuotaService<U: ?Sized, E: ?Sized> {
    usage_repo: Arc<U>,
    entitlements: Arc<E>,
    clock: Arc<dyn Clock>,
}

impl<U: ?Sized, E: ?Sized> UsageQuotaService<U, E> {
    /// Create a new quota service.
    /// ```rust,no_run
    /// # use std::sync::Arc;
    /// # use mockable::DefaultClock;
    /// # use receipt_tracker::domain::UsageQuotaService;
    /// # use receipt_tracker::domain::ports::{FixtureEntitlementProvider, FixtureUsageRepository};
    /// let _service = UsageQuotaService::new(
    ///     Arc::new(FixtureUsageRepository),
    ///     Arc::new(FixtureEntitlementProvider),
    ///     Arc::new(DefaultClock),
    /// );
    /// ```
    pub fn new(usage_repo: Arc<U>, entitlements: Arc<E>, clock: Arc<dyn Clock>) -> Self {
        Self {
            usage_repo,
            entitlements,
            clock,
        }
    }
}

#[async_trait]
impl<U, E> UsageQuota for UsageQuotaService<U, E>
where
    U: UsageRepository + ?Sized,
    E: EntitlementProvider + ?Sized,
{
    async fn resolve_plan(&self, user_id: &UserId) -> PlanTier {
        for (flag, plan) in [
            (ENTERPRISE_PLAN_FLAG, PlanTier::Enterprise),
            (PRO_PLAN_FLAG, PlanTier::Pro),
        ] {
            match self.entitlements.check_flag(user_id, flag).await {
                Ok(true) => return plan,
                Ok(false) => {}
                Err(error) => {
                    warn!(%user_id, %error, "plan lookup failed; defaulting to free");
                    return PlanTier::Free;
                }
            }
        }
        PlanTier::Free
    }

    async fn check_limit(&self, user_id: &UserId, feature: Feature, plan: PlanTier) -> UsageCheck {
        let limit = plan.limit_for(feature);
        match self.usage_repo.find(user_id, feature).await {
            Ok(record) => {
                let current = record.map_or(0, |record| record.count);
                UsageCheck::evaluate(limit, current)
            }
            Err(error) => {
                warn!(
                    %user_id,
                    %feature,
                    %error,
                    "usage counter unavailable; allowing request"
                );
                UsageCheck::fail_open(limit)
            }
        }
    }

    async fn increment(&self, user_id: &UserId, feature: Feature, plan: PlanTier) {
        match self
            .usage_repo
            .increment(user_id, feature, plan, self.clock.utc())
            .await
        {
            Ok(record) => debug!(%user_id, %feature, count = record.count, "usage incremented"),
            Err(error) => warn!(%user_id, %feature, %error, "failed to record usage"),
        }
    }

    async fn usage_summary(&self, user_id: &UserId, plan: PlanTier) -> UsageSummary {
        let records = self
            .usage_repo
            .list_for_user(user_id)
            .await
            .unwrap_or_else(|error| {
                warn!(%user_id, %error, "usage counters unavailable; reporting zero usage");
                Vec::new()
            });

        let features = Feature::ALL
            .into_iter()
            .map(|feature| {
                let record = records.iter().find(|record| record.feature == feature);
                let current = record.map_or(0, |record| record.count);
                let check = UsageCheck::evaluate(plan.limit_for(feature), current);
                FeatureUsage {
                    feature,
                    current,
                    limit: check.limit,
                    remaining: check.remaining,
                    last_used_at: record.map(|record| record.last_used_at),
                }
            })
            .collect();

        UsageSummary { plan, features }
    }
}

#[cfg(test)]
#[path = "usage_quota_service_tests.rs"]
mod tests;
