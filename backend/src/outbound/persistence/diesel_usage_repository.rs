//! PostgreSQL-backed `UsageRepository` implementation using Diesel ORM.
//!
//! `increment` is a single `INSERT .. ON CONFLICT DO UPDATE .. RETURNING`
//! statement, so concurrent increments serialise on the row lock and none are
//! lost.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UsageRepository, UsageRepositoryError};
use crate::domain::{Feature, PlanParseError, PlanTier, UsageRecord, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewUsageRecordRow, UsageRecordRow};
use super::pool::{DbPool, PoolError};
use super::schema::usage_records;

/// Diesel-backed implementation of the `UsageRepository` port.
#[derive(Clone)]
pub struct DieselUsageRepository {
    pool: DbPool,
}

impl DieselUsageRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> UsageRepositoryError {
    map_pool_error(error, UsageRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> UsageRepositoryError {
    map_diesel_error(
        error,
        UsageRepositoryError::query,
        UsageRepositoryError::connection,
    )
}

fn row_to_record(row: UsageRecordRow) -> Result<UsageRecord, UsageRepositoryError> {
    let invalid = |field: &str, detail: String| {
        UsageRepositoryError::query(format!("stored usage record has invalid {field}: {detail}"))
    };
    Ok(UsageRecord {
        user_id: UserId::new(&row.user_id).map_err(|err| invalid("user_id", err.to_string()))?,
        feature: row
            .feature
            .parse()
            .map_err(|err: PlanParseError| invalid("feature", err.to_string()))?,
        count: u64::try_from(row.count).map_err(|err| invalid("count", err.to_string()))?,
        last_used_at: row.last_used_at,
        plan: row
            .plan
            .parse()
            .map_err(|err: PlanParseError| invalid("plan", err.to_string()))?,
    })
}

#[async_trait]
impl UsageRepository for DieselUsageRepository {
    async fn find(
        &self,
        user_id: &UserId,
        feature: Feature,
    ) -> Result<Option<UsageRecord>, UsageRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<UsageRecordRow> = usage_records::table
            .find((user_id.as_ref(), feature.as_str()))
            .select(UsageRecordRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(row_to_record).transpose()
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<UsageRecord>, UsageRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<UsageRecordRow> = usage_records::table
            .filter(usage_records::user_id.eq(user_id.as_ref()))
            .order(usage_records::feature.asc())
            .select(UsageRecordRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        rows.into_iter().map(row_to_record).collect()
    }

    async fn increment(
        &self,
        user_id: &UserId,
        feature: Feature,
        plan: PlanTier,
        used_at: DateTime<Utc>,
    ) -> Result<UsageRecord, UsageRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let seed = NewUsageRecordRow {
            user_id: user_id.as_ref(),
            feature: feature.as_str(),
            count: 1,
            last_used_at: used_at,
            plan: plan.as_str(),
        };

        let row: UsageRecordRow = diesel::insert_into(usage_records::table)
            .values(&seed)
            .on_conflict((usage_records::user_id, usage_records::feature))
            .do_update()
            .set((
                usage_records::count.eq(usage_records::count + 1),
                usage_records::last_used_at.eq(excluded(usage_records::last_used_at)),
                usage_records::plan.eq(excluded(usage_records::plan)),
            ))
            .returning(UsageRecordRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;
        row_to_record(row)
    }
}
