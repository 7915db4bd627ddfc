//! Builders selecting an adapter for each port and assembling HTTP state.
//!
//! Every integration has a development fallback: in-memory stores without a
//! database, template insights without a Gemini key, the free plan without a
//! billing key and the in-process queue without a hosted workflow key.

use std::io;
use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tracing::info;

use receipt_tracker::domain::ports::{
    EntitlementProvider, FileStorage, FixtureEntitlementProvider, FixtureInsightGenerator,
    FixtureReceiptExtractor, InsightGenerator, InsightsCommand, ReceiptCommand, ReceiptExtractor,
    ReceiptQuery, ReceiptRepository, UsageQuota, UsageRepository, WorkflowDispatcher,
    WorkflowEventHandler,
};
use receipt_tracker::domain::{
    InsightsService, ReceiptService, ReceiptServiceConfig, ReceiptServicePorts, ReceiptWorkflow,
    ReceiptWorkflowConfig, ReceiptWorkflowPorts, UsageQuotaService,
};
use receipt_tracker::inbound::http::debug::{ConfigPresence, IntegrationStatus};
use receipt_tracker::inbound::http::state::{HttpState, HttpStateExtras, HttpStatePorts};
use receipt_tracker::inbound::http::workflows::WorkflowSigningKey;
use receipt_tracker::outbound::billing::BillingHttpClient;
use receipt_tracker::outbound::gemini::{GeminiClient, GeminiSettings};
use receipt_tracker::outbound::memory::{InMemoryReceiptRepository, InMemoryUsageRepository};
use receipt_tracker::outbound::persistence::{
    DbPool, DieselReceiptRepository, DieselUsageRepository,
};
use receipt_tracker::outbound::storage::LocalFileStorage;
use receipt_tracker::outbound::workflow::{
    HttpWorkflowDispatcher, WorkflowReceiver, spawn_workflow_worker, workflow_channel,
};

use super::config::AdapterSettings;

type Stores = (Arc<dyn ReceiptRepository>, Arc<dyn UsageRepository>);
type AiAdapters = (Arc<dyn ReceiptExtractor>, Arc<dyn InsightGenerator>);

fn build_stores(pool: Option<&DbPool>) -> Stores {
    match pool {
        Some(pool) => (
            Arc::new(DieselReceiptRepository::new(pool.clone())),
            Arc::new(DieselUsageRepository::new(pool.clone())),
        ),
        None => {
            info!("no database configured; receipts and usage are held in memory");
            (
                Arc::new(InMemoryReceiptRepository::default()),
                Arc::new(InMemoryUsageRepository::default()),
            )
        }
    }
}

fn build_ai_adapters(adapters: &AdapterSettings) -> io::Result<AiAdapters> {
    let Some(api_key) = adapters.gemini_api_key.clone() else {
        info!("no Gemini key configured; extraction is empty and insights use templates");
        return Ok((
            Arc::new(FixtureReceiptExtractor),
            Arc::new(FixtureInsightGenerator),
        ));
    };
    let client = Arc::new(
        GeminiClient::new(GeminiSettings {
            api_key,
            base_url: adapters.gemini_base_url.clone(),
            extraction_model: adapters.extraction_model.clone(),
            insight_model: adapters.insight_model.clone(),
            timeout: adapters.http_timeout,
        })
        .map_err(io::Error::other)?,
    );
    Ok((client.clone(), client))
}

fn build_entitlements(adapters: &AdapterSettings) -> io::Result<Arc<dyn EntitlementProvider>> {
    match &adapters.billing_api_key {
        Some(key) => Ok(Arc::new(
            BillingHttpClient::new(
                adapters.billing_base_url.clone(),
                Some(key.clone()),
                adapters.http_timeout,
            )
            .map_err(io::Error::other)?,
        )),
        None => {
            info!("no billing key configured; every user is on the free plan");
            Ok(Arc::new(FixtureEntitlementProvider))
        }
    }
}

fn build_dispatcher(
    adapters: &AdapterSettings,
) -> io::Result<(Arc<dyn WorkflowDispatcher>, Option<WorkflowReceiver>)> {
    match &adapters.workflow_event_key {
        Some(key) => {
            let dispatcher =
                HttpWorkflowDispatcher::new(&adapters.workflow_base_url, key, adapters.http_timeout)
                    .map_err(io::Error::other)?;
            Ok((Arc::new(dispatcher), None))
        }
        None => {
            let (dispatcher, receiver) = workflow_channel(adapters.workflow_queue_capacity);
            Ok((Arc::new(dispatcher), Some(receiver)))
        }
    }
}

fn integration_status(adapters: &AdapterSettings) -> IntegrationStatus {
    let hosted = adapters.workflow_event_key.is_some();
    IntegrationStatus {
        workflow_signing_key: ConfigPresence::from(adapters.workflow_signing_key.is_some()),
        workflow_event_key: ConfigPresence::from(hosted),
        workflow_base_url: hosted.then(|| adapters.workflow_base_url.to_string()),
        gemini_api_key: ConfigPresence::from(adapters.gemini_api_key.is_some()),
        billing_api_key: ConfigPresence::from(adapters.billing_api_key.is_some()),
    }
}

/// Build the shared HTTP state, spawning the in-process workflow worker when
/// no hosted runtime is configured.
///
/// Must be called inside a tokio runtime.
///
/// # Errors
///
/// Returns [`io::Error`] when the storage directory cannot be opened or an
/// HTTP client cannot be constructed.
pub(super) fn build_http_state(
    adapters: &AdapterSettings,
    pool: Option<&DbPool>,
) -> io::Result<web::Data<HttpState>> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let (receipts_repo, usage_repo) = build_stores(pool);
    let storage: Arc<dyn FileStorage> = Arc::new(LocalFileStorage::open(
        &adapters.storage_dir,
        adapters.public_base_url.clone(),
    )?);
    let (extractor, generator) = build_ai_adapters(adapters)?;
    let entitlements = build_entitlements(adapters)?;
    let (dispatcher, receiver) = build_dispatcher(adapters)?;

    let usage: Arc<dyn UsageQuota> = Arc::new(UsageQuotaService::new(
        usage_repo,
        entitlements.clone(),
        clock.clone(),
    ));
    let receipt_service = Arc::new(ReceiptService::new(
        ReceiptServicePorts {
            receipts: receipts_repo.clone(),
            storage: storage.clone(),
            quota: usage.clone(),
            dispatcher: dispatcher.clone(),
            entitlements,
        },
        clock.clone(),
        ReceiptServiceConfig {
            max_upload_bytes: adapters.max_upload_bytes,
        },
    ));
    let insights: Arc<dyn InsightsCommand> = Arc::new(InsightsService::new(
        receipts_repo.clone(),
        usage.clone(),
        generator,
        clock.clone(),
    ));
    let workflow: Arc<dyn WorkflowEventHandler> = Arc::new(ReceiptWorkflow::new(
        ReceiptWorkflowPorts {
            receipts: receipts_repo,
            storage: storage.clone(),
            extractor,
            commands: receipt_service.clone(),
            insights: insights.clone(),
        },
        clock,
        ReceiptWorkflowConfig::default(),
    ));

    if let Some(receiver) = receiver {
        let _worker = spawn_workflow_worker(receiver, workflow.clone());
        info!("in-process workflow worker started");
    }

    Ok(web::Data::new(HttpState::new_with_extra(
        HttpStatePorts {
            receipts: receipt_service.clone() as Arc<dyn ReceiptCommand>,
            receipts_query: receipt_service as Arc<dyn ReceiptQuery>,
            insights,
            usage,
            files: storage,
            workflow_events: workflow,
            dispatcher,
        },
        HttpStateExtras {
            workflow_signing_key: adapters
                .workflow_signing_key
                .as_deref()
                .and_then(|key| WorkflowSigningKey::new(key)),
            integrations: integration_status(adapters),
        },
    )))
}
