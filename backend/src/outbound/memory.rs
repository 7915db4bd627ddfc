//! In-process repositories used when no database is configured.
//!
//! State lives for the lifetime of the process. Both adapters honour the same
//! ordering and scoping rules as their Diesel counterparts so the server
//! behaves identically in development.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{
    ReceiptRepository, ReceiptRepositoryError, UsageRepository, UsageRepositoryError,
};
use crate::domain::{Feature, PlanTier, Receipt, ReceiptId, ReceiptStatus, UsageRecord, UserId};

fn lock<'a, T, E>(
    mutex: &'a Mutex<T>,
    poisoned: impl FnOnce(&'static str) -> E,
) -> Result<MutexGuard<'a, T>, E> {
    mutex.lock().map_err(|_| poisoned("in-memory store poisoned"))
}

/// Receipt repository backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct InMemoryReceiptRepository {
    receipts: Mutex<HashMap<ReceiptId, Receipt>>,
}

impl InMemoryReceiptRepository {
    fn store(&self) -> Result<MutexGuard<'_, HashMap<ReceiptId, Receipt>>, ReceiptRepositoryError> {
        lock(&self.receipts, ReceiptRepositoryError::query)
    }
}

#[async_trait]
impl ReceiptRepository for InMemoryReceiptRepository {
    async fn insert(&self, receipt: &Receipt) -> Result<(), ReceiptRepositoryError> {
        let mut store = self.store()?;
        if store.contains_key(&receipt.id) {
            return Err(ReceiptRepositoryError::query("duplicate record"));
        }
        store.insert(receipt.id, receipt.clone());
        Ok(())
    }

    async fn update(&self, receipt: &Receipt) -> Result<(), ReceiptRepositoryError> {
        let mut store = self.store()?;
        match store.get_mut(&receipt.id) {
            Some(existing) => {
                *existing = receipt.clone();
                Ok(())
            }
            None => Err(ReceiptRepositoryError::missing(receipt.id.to_string())),
        }
    }

    async fn set_status(
        &self,
        id: &ReceiptId,
        from: ReceiptStatus,
        to: ReceiptStatus,
    ) -> Result<bool, ReceiptRepositoryError> {
        let mut store = self.store()?;
        match store.get_mut(id) {
            Some(receipt) if receipt.status == from => {
                receipt.status = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_by_id(&self, id: &ReceiptId) -> Result<Option<Receipt>, ReceiptRepositoryError> {
        Ok(self.store()?.get(id).cloned())
    }

    async fn find_for_user(
        &self,
        user_id: &UserId,
        id: &ReceiptId,
    ) -> Result<Option<Receipt>, ReceiptRepositoryError> {
        Ok(self
            .store()?
            .get(id)
            .filter(|receipt| &receipt.user_id == user_id)
            .cloned())
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Receipt>, ReceiptRepositoryError> {
        let mut receipts: Vec<Receipt> = self
            .store()?
            .values()
            .filter(|receipt| &receipt.user_id == user_id)
            .cloned()
            .collect();
        receipts.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at).then(b.id.cmp(&a.id)));
        Ok(receipts)
    }

    async fn delete_for_user(
        &self,
        user_id: &UserId,
        id: &ReceiptId,
    ) -> Result<bool, ReceiptRepositoryError> {
        let mut store = self.store()?;
        let owned = store
            .get(id)
            .is_some_and(|receipt| &receipt.user_id == user_id);
        if owned {
            store.remove(id);
        }
        Ok(owned)
    }
}

/// Usage counters backed by a `HashMap` keyed by `(user, feature)`.
#[derive(Debug, Default)]
pub struct InMemoryUsageRepository {
    records: Mutex<HashMap<(UserId, Feature), UsageRecord>>,
}

impl InMemoryUsageRepository {
    fn store(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<(UserId, Feature), UsageRecord>>, UsageRepositoryError> {
        lock(&self.records, UsageRepositoryError::query)
    }
}

#[async_trait]
impl UsageRepository for InMemoryUsageRepository {
    async fn find(
        &self,
        user_id: &UserId,
        feature: Feature,
    ) -> Result<Option<UsageRecord>, UsageRepositoryError> {
        Ok(self.store()?.get(&(user_id.clone(), feature)).cloned())
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<UsageRecord>, UsageRepositoryError> {
        let mut records: Vec<UsageRecord> = self
            .store()?
            .values()
            .filter(|record| &record.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by_key(|record| record.feature.as_str());
        Ok(records)
    }

    async fn increment(
        &self,
        user_id: &UserId,
        feature: Feature,
        plan: PlanTier,
        used_at: DateTime<Utc>,
    ) -> Result<UsageRecord, UsageRepositoryError> {
        let mut store = self.store()?;
        let record = store
            .entry((user_id.clone(), feature))
            .and_modify(|record| {
                record.count = record.count.saturating_add(1);
                record.last_used_at = used_at;
                record.plan = plan;
            })
            .or_insert_with(|| UsageRecord {
                user_id: user_id.clone(),
                feature,
                count: 1,
                last_used_at: used_at,
                plan,
            });
        Ok(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;

    use crate::domain::{NewReceipt, StorageKey};

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 10, minute, 0)
            .single()
            .expect("valid timestamp")
    }

    fn receipt_for(user_id: &UserId, uploaded_at: DateTime<Utc>) -> Receipt {
        Receipt::new_upload(
            NewReceipt {
                user_id: user_id.clone(),
                storage_key: StorageKey::generate_pdf(),
                file_name: "r.pdf".to_owned(),
                size_bytes: 1,
                mime_type: "application/pdf".to_owned(),
            },
            uploaded_at,
        )
    }

    #[rstest]
    #[tokio::test]
    async fn lists_newest_first_and_only_for_owner() {
        let repo = InMemoryReceiptRepository::default();
        let owner = UserId::random();
        let older = receipt_for(&owner, at(1));
        let newer = receipt_for(&owner, at(1) + Duration::minutes(5));
        let foreign = receipt_for(&UserId::random(), at(9));
        for receipt in [&older, &newer, &foreign] {
            repo.insert(receipt).await.expect("insert");
        }

        let listed = repo.list_for_user(&owner).await.expect("list");

        let ids: Vec<ReceiptId> = listed.iter().map(|receipt| receipt.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
    }

    #[rstest]
    #[tokio::test]
    async fn foreign_receipts_are_invisible_and_undeletable() {
        let repo = InMemoryReceiptRepository::default();
        let receipt = receipt_for(&UserId::random(), at(0));
        repo.insert(&receipt).await.expect("insert");
        let stranger = UserId::random();

        assert!(
            repo.find_for_user(&stranger, &receipt.id)
                .await
                .expect("find")
                .is_none()
        );
        assert!(
            !repo
                .delete_for_user(&stranger, &receipt.id)
                .await
                .expect("delete")
        );
        assert!(repo.find_by_id(&receipt.id).await.expect("find").is_some());
    }

    #[rstest]
    #[tokio::test]
    async fn update_of_missing_receipt_fails() {
        let repo = InMemoryReceiptRepository::default();
        let receipt = receipt_for(&UserId::random(), at(0));

        let error = repo.update(&receipt).await.expect_err("missing");

        assert!(matches!(error, ReceiptRepositoryError::Missing { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn status_moves_only_from_the_expected_state() {
        let repo = InMemoryReceiptRepository::default();
        let mut receipt = receipt_for(&UserId::random(), at(0));
        receipt.merchant_name = Some("Fresh Market".to_owned());
        repo.insert(&receipt).await.expect("insert");

        let moved = repo
            .set_status(&receipt.id, ReceiptStatus::Processing, ReceiptStatus::Completed)
            .await
            .expect("first move");
        let repeated = repo
            .set_status(&receipt.id, ReceiptStatus::Processing, ReceiptStatus::Failed)
            .await
            .expect("second move");

        assert!(moved);
        assert!(!repeated);
        let stored = repo
            .find_by_id(&receipt.id)
            .await
            .expect("find")
            .expect("present");
        assert_eq!(stored.status, ReceiptStatus::Completed);
        assert_eq!(stored.merchant_name.as_deref(), Some("Fresh Market"));
    }

    #[rstest]
    #[tokio::test]
    async fn increments_accumulate_and_restamp() {
        let repo = InMemoryUsageRepository::default();
        let user = UserId::random();

        repo.increment(&user, Feature::AiInsights, PlanTier::Free, at(1))
            .await
            .expect("first");
        let second = repo
            .increment(&user, Feature::AiInsights, PlanTier::Pro, at(2))
            .await
            .expect("second");

        assert_eq!(second.count, 2);
        assert_eq!(second.plan, PlanTier::Pro);
        assert_eq!(second.last_used_at, at(2));
        assert!(
            repo.find(&user, Feature::ReceiptScan)
                .await
                .expect("find")
                .is_none()
        );
    }
}
