//! Tests for the usage quota service.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{
    EntitlementProviderError, FixtureEntitlementProvider, FixtureUsageRepository,
    MockEntitlementProvider, MockUsageQuota, MockUsageRepository, UsageRepositoryError,
};
use crate::domain::{UsageLimit, UsageRecord};

struct FixtureClock(DateTime<Utc>);

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

#[fixture]
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

fn record(user_id: &UserId, feature: Feature, count: u64, at: DateTime<Utc>) -> UsageRecord {
    UsageRecord {
        user_id: user_id.clone(),
        feature,
        count,
        last_used_at: at,
        plan: PlanTier::Free,
    }
}

fn with_repo(
    repo: MockUsageRepository,
    now: DateTime<Utc>,
) -> UsageQuotaService<MockUsageRepository, FixtureEntitlementProvider> {
    UsageQuotaService::new(
        Arc::new(repo),
        Arc::new(FixtureEntitlementProvider),
        Arc::new(FixtureClock(now)),
    )
}

fn with_entitlements(
    provider: MockEntitlementProvider,
    now: DateTime<Utc>,
) -> UsageQuotaService<FixtureUsageRepository, MockEntitlementProvider> {
    UsageQuotaService::new(
        Arc::new(FixtureUsageRepository),
        Arc::new(provider),
        Arc::new(FixtureClock(now)),
    )
}

#[rstest]
#[tokio::test]
async fn check_below_limit_reports_remaining(now: DateTime<Utc>) {
    let user_id = UserId::random();
    let stored = record(&user_id, Feature::ReceiptScan, 2, now);
    let mut repo = MockUsageRepository::new();
    repo.expect_find()
        .withf(|_, feature| *feature == Feature::ReceiptScan)
        .times(1)
        .return_once(move |_, _| Ok(Some(stored)));

    let check = with_repo(repo, now)
        .check_limit(&user_id, Feature::ReceiptScan, PlanTier::Free)
        .await;

    assert!(check.allowed);
    assert_eq!(check.current, 2);
    assert_eq!(check.limit, UsageLimit::Bounded(5));
    assert_eq!(check.remaining, UsageLimit::Bounded(3));
}

#[rstest]
#[tokio::test]
async fn check_at_limit_denies(now: DateTime<Utc>) {
    let user_id = UserId::random();
    let stored = record(&user_id, Feature::MonthlyUploads, 12, now);
    let mut repo = MockUsageRepository::new();
    repo.expect_find()
        .times(1)
        .return_once(move |_, _| Ok(Some(stored)));

    let check = with_repo(repo, now)
        .check_limit(&user_id, Feature::MonthlyUploads, PlanTier::Free)
        .await;

    assert!(!check.allowed);
    assert_eq!(check.remaining, UsageLimit::Bounded(0));
}

#[rstest]
#[tokio::test]
async fn unbounded_plans_always_allow(now: DateTime<Utc>) {
    let user_id = UserId::random();
    let stored = record(&user_id, Feature::AiInsights, 50_000, now);
    let mut repo = MockUsageRepository::new();
    repo.expect_find()
        .times(1)
        .return_once(move |_, _| Ok(Some(stored)));

    let check = with_repo(repo, now)
        .check_limit(&user_id, Feature::AiInsights, PlanTier::Enterprise)
        .await;

    assert!(check.allowed);
    assert_eq!(check.current, 50_000);
    assert_eq!(check.remaining, UsageLimit::Unbounded);
}

#[rstest]
#[tokio::test]
async fn check_fails_open_when_store_is_down(now: DateTime<Utc>) {
    let mut repo = MockUsageRepository::new();
    repo.expect_find()
        .times(1)
        .return_once(|_, _| Err(UsageRepositoryError::connection("refused")));

    let check = with_repo(repo, now)
        .check_limit(&UserId::random(), Feature::AiInsights, PlanTier::Pro)
        .await;

    assert_eq!(check, UsageCheck::fail_open(UsageLimit::Bounded(100)));
}

#[rstest]
#[tokio::test]
async fn increment_stamps_clock_time_and_plan(now: DateTime<Utc>) {
    let user_id = UserId::random();
    let expected_user = user_id.clone();
    let mut repo = MockUsageRepository::new();
    repo.expect_increment()
        .withf(move |user, feature, plan, at| {
            *user == expected_user
                && *feature == Feature::ReceiptScan
                && *plan == PlanTier::Pro
                && *at == now
        })
        .times(1)
        .returning(move |user, feature, plan, at| {
            Ok(UsageRecord {
                user_id: user.clone(),
                feature,
                count: 1,
                last_used_at: at,
                plan,
            })
        });

    with_repo(repo, now)
        .increment(&user_id, Feature::ReceiptScan, PlanTier::Pro)
        .await;
}

#[rstest]
#[tokio::test]
async fn increment_swallows_store_errors(now: DateTime<Utc>) {
    let mut repo = MockUsageRepository::new();
    repo.expect_increment()
        .times(1)
        .return_once(|_, _, _, _| Err(UsageRepositoryError::query("deadlock")));

    with_repo(repo, now)
        .increment(&UserId::random(), Feature::AiSummary, PlanTier::Free)
        .await;
}

#[rstest]
#[case(true, false, PlanTier::Enterprise)]
#[case(false, true, PlanTier::Pro)]
#[case(false, false, PlanTier::Free)]
#[tokio::test]
async fn resolve_plan_checks_highest_tier_first(
    now: DateTime<Utc>,
    #[case] enterprise: bool,
    #[case] pro: bool,
    #[case] expected: PlanTier,
) {
    let mut provider = MockEntitlementProvider::new();
    provider
        .expect_check_flag()
        .withf(|_, flag| flag == ENTERPRISE_PLAN_FLAG)
        .times(1)
        .return_once(move |_, _| Ok(enterprise));
    provider
        .expect_check_flag()
        .withf(|_, flag| flag == PRO_PLAN_FLAG)
        .times(usize::from(!enterprise))
        .return_once(move |_, _| Ok(pro));

    let plan = with_entitlements(provider, now)
        .resolve_plan(&UserId::random())
        .await;

    assert_eq!(plan, expected);
}

#[rstest]
#[tokio::test]
async fn resolve_plan_defaults_to_free_on_error(now: DateTime<Utc>) {
    let mut provider = MockEntitlementProvider::new();
    provider
        .expect_check_flag()
        .times(1)
        .return_once(|_, _| Err(EntitlementProviderError::timeout("5s")));

    let plan = with_entitlements(provider, now)
        .resolve_plan(&UserId::random())
        .await;

    assert_eq!(plan, PlanTier::Free);
}

#[rstest]
#[tokio::test]
async fn summary_reports_every_feature(now: DateTime<Utc>) {
    let user_id = UserId::random();
    let stored = vec![
        record(&user_id, Feature::ReceiptScan, 7, now),
        record(&user_id, Feature::MonthlyUploads, 3, now),
    ];
    let mut repo = MockUsageRepository::new();
    repo.expect_list_for_user()
        .times(1)
        .return_once(move |_| Ok(stored));

    let summary = with_repo(repo, now)
        .usage_summary(&user_id, PlanTier::Free)
        .await;

    assert_eq!(summary.plan, PlanTier::Free);
    let features: Vec<_> = summary.features.iter().map(|line| line.feature).collect();
    assert_eq!(features, Feature::ALL.to_vec());

    let scans = &summary.features[0];
    assert_eq!(scans.current, 7);
    assert_eq!(scans.remaining, UsageLimit::Bounded(0));
    assert_eq!(scans.last_used_at, Some(now));

    let insights = &summary.features[1];
    assert_eq!(insights.current, 0);
    assert_eq!(insights.remaining, UsageLimit::Bounded(5));
    assert!(insights.last_used_at.is_none());
}

#[rstest]
#[tokio::test]
async fn summary_reports_zero_usage_when_store_is_down(now: DateTime<Utc>) {
    let mut repo = MockUsageRepository::new();
    repo.expect_list_for_user()
        .times(1)
        .return_once(|_| Err(UsageRepositoryError::connection("refused")));

    let summary = with_repo(repo, now)
        .usage_summary(&UserId::random(), PlanTier::Pro)
        .await;

    assert!(summary.features.iter().all(|line| line.current == 0));
}

#[rstest]
#[tokio::test]
async fn admit_use_returns_plan_while_allowance_remains() {
    let mut quota = MockUsageQuota::new();
    quota.expect_resolve_plan().return_const(PlanTier::Pro);
    quota
        .expect_check_limit()
        .withf(|_, feature, plan| *feature == Feature::AiInsights && *plan == PlanTier::Pro)
        .return_const(UsageCheck::evaluate(UsageLimit::Bounded(100), 99));
    quota.expect_increment().times(0);

    let plan = admit_use(&quota, &UserId::random(), Feature::AiInsights)
        .await
        .expect("allowed");

    assert_eq!(plan, PlanTier::Pro);
}

#[rstest]
#[tokio::test]
async fn admit_use_forbids_spent_allowance() {
    let mut quota = MockUsageQuota::new();
    quota.expect_resolve_plan().return_const(PlanTier::Free);
    quota
        .expect_check_limit()
        .return_const(UsageCheck::evaluate(UsageLimit::Bounded(5), 5));

    let error = admit_use(&quota, &UserId::random(), Feature::ReceiptScan)
        .await
        .expect_err("denied");

    assert_eq!(error.code(), crate::domain::ErrorCode::Forbidden);
    assert_eq!(error.message(), USAGE_LIMIT_EXCEEDED_MESSAGE);
    let details = error.details().expect("usage check attached");
    assert_eq!(details["usageCheck"]["remaining"], 0);
}
