//! Port for per-user feature usage counters.
//!
//! Counters are keyed by `(user, feature)` and only ever grow. Adapters must
//! perform [`UsageRepository::increment`] as a single atomic upsert so two
//! concurrent increments never lose a write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Feature, PlanTier, UsageRecord, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by usage counter adapters.
    pub enum UsageRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "usage repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "usage repository query failed: {message}",
    }
}

/// Port for reading and bumping usage counters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsageRepository: Send + Sync {
    /// Fetch the counter for one feature.
    ///
    /// Returns `None` when the user has never consumed the feature.
    async fn find(
        &self,
        user_id: &UserId,
        feature: Feature,
    ) -> Result<Option<UsageRecord>, UsageRepositoryError>;

    /// Fetch every counter recorded for a user.
    async fn list_for_user(&self, user_id: &UserId)
    -> Result<Vec<UsageRecord>, UsageRepositoryError>;

    /// Create the counter at 1 or add 1, stamping time and plan.
    ///
    /// Returns the counter as stored after the increment.
    async fn increment(
        &self,
        user_id: &UserId,
        feature: Feature,
        plan: PlanTier,
        used_at: DateTime<Utc>,
    ) -> Result<UsageRecord, UsageRepositoryError>;
}

/// Fixture implementation reporting no usage and discarding increments.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureUsageRepository;

#[async_trait]
impl UsageRepository for FixtureUsageRepository {
    async fn find(
        &self,
        _user_id: &UserId,
        _feature: Feature,
    ) -> Result<Option<UsageRecord>, UsageRepositoryError> {
        Ok(None)
    }

    async fn list_for_user(
        &self,
        _user_id: &UserId,
    ) -> Result<Vec<UsageRecord>, UsageRepositoryError> {
        Ok(Vec::new())
    }

    async fn increment(
        &self,
        user_id: &UserId,
        feature: Feature,
        plan: PlanTier,
        used_at: DateTime<Utc>,
    ) -> Result<UsageRecord, UsageRepositoryError> {
        Ok(UsageRecord {
            user_id: user_id.clone(),
            feature,
            count: 1,
            last_used_at: used_at,
            plan,
        })
    }
}
