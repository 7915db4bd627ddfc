//! Port and runtime dependency bundles for the receipt workflow.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::domain::ports::{
    FileStorage, InsightsCommand, ReceiptCommand, ReceiptExtractor, ReceiptRepository,
};

use super::{BackoffJitter, RetrySleeper};

/// Port bundle required by the receipt workflow.
pub struct ReceiptWorkflowPorts {
    /// Receipt lookup by identifier.
    pub receipts: Arc<dyn ReceiptRepository>,
    /// Stored PDF access.
    pub storage: Arc<dyn FileStorage>,
    /// LLM extraction adapter.
    pub extractor: Arc<dyn ReceiptExtractor>,
    /// Receipt mutations (apply extraction, mark failed).
    pub commands: Arc<dyn ReceiptCommand>,
    /// Insight pipeline for analysis events.
    pub insights: Arc<dyn InsightsCommand>,
}

/// Runtime helpers used by the retry loop.
pub struct ReceiptWorkflowRuntime {
    /// Async sleep implementation.
    pub sleeper: Arc<dyn RetrySleeper>,
    /// Jitter strategy for retry delays.
    pub jitter: Arc<dyn BackoffJitter>,
}

impl Default for ReceiptWorkflowRuntime {
    fn default() -> Self {
        Self {
            sleeper: Arc::new(TokioSleeper),
            jitter: Arc::new(EntropyJitter),
        }
    }
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl RetrySleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Adds up to a quarter of the base delay, drawn from a clock-seeded RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntropyJitter;

impl BackoffJitter for EntropyJitter {
    fn jittered_delay(&self, base: Duration, attempt: u32, now: DateTime<Utc>) -> Duration {
        let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
        let max_extra = (base_ms / 4).max(1);
        let seed = u64::from(now.timestamp_subsec_nanos()) ^ u64::from(attempt);
        let extra = SmallRng::seed_from_u64(seed).gen_range(0..=max_extra);
        Duration::from_millis(base_ms.saturating_add(extra))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case(Duration::from_millis(200), 1)]
    #[case(Duration::from_millis(800), 3)]
    #[case(Duration::from_millis(0), 2)]
    fn entropy_jitter_stays_within_a_quarter(#[case] base: Duration, #[case] attempt: u32) {
        let now = Utc
            .with_ymd_and_hms(2026, 5, 1, 12, 0, 0)
            .single()
            .expect("valid time");
        let delay = EntropyJitter.jittered_delay(base, attempt, now);
        let base_ms = u64::try_from(base.as_millis()).expect("fits");
        let ceiling = base_ms + (base_ms / 4).max(1);
        let delay_ms = u64::try_from(delay.as_millis()).expect("fits");
        assert!(delay_ms >= base_ms && delay_ms <= ceiling, "{delay_ms} outside range");
    }
}
