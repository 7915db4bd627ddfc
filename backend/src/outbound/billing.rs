//! Reqwest-backed billing adapter for the `EntitlementProvider` port.
//!
//! Users are identified to the billing service as both a company and a user
//! keyed by the same id. Flag checks read `data.value` from the check
//! response; events are posted as `track` envelopes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use crate::domain::UserId;
use crate::domain::ports::{EntitlementProvider, EntitlementProviderError};
use crate::outbound::http_status::{
    FailureKind, classify_status, classify_transport, status_message,
};

/// Public billing API endpoint.
pub const DEFAULT_BILLING_BASE_URL: &str = "https://api.schematichq.com/";
const API_KEY_HEADER: &str = "X-Schematic-Api-Key";

#[derive(Debug, Serialize)]
struct KeysDto<'a> {
    id: &'a str,
}

#[derive(Debug, Serialize)]
struct CheckFlagRequestDto<'a> {
    company: KeysDto<'a>,
    user: KeysDto<'a>,
}

#[derive(Debug, Serialize)]
struct TrackBodyDto<'a> {
    event: &'a str,
    company: KeysDto<'a>,
    user: KeysDto<'a>,
}

#[derive(Debug, Serialize)]
struct TrackEventDto<'a> {
    event_type: &'static str,
    body: TrackBodyDto<'a>,
}

#[derive(Debug, Deserialize)]
struct CheckFlagResponseDto {
    data: CheckFlagDataDto,
}

#[derive(Debug, Deserialize)]
struct CheckFlagDataDto {
    #[serde(default)]
    value: bool,
}

/// Entitlement provider talking to the billing REST API.
///
/// Built without an API key, every call fails with
/// [`EntitlementProviderError::NotConfigured`], which the quota service
/// treats as the free plan.
pub struct BillingHttpClient {
    client: Client,
    base_url: Url,
    api_key: Option<Zeroizing<String>>,
}

impl BillingHttpClient {
    /// Build the adapter.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        base_url: Url,
        api_key: Option<Zeroizing<String>>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, EntitlementProviderError> {
        self.base_url
            .join(path)
            .map_err(|err| EntitlementProviderError::rejected(format!("invalid URL {path}: {err}")))
    }

    async fn post<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Vec<u8>, EntitlementProviderError> {
        let key = self
            .api_key
            .as_ref()
            .ok_or_else(EntitlementProviderError::not_configured)?;
        let response = self
            .client
            .post(self.endpoint(path)?)
            .header(API_KEY_HEADER, key.as_str())
            .json(body)
            .send()
            .await
            .map_err(|err| map_transport_error(&err))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| map_transport_error(&err))?;
        if !status.is_success() {
            return Err(map_failure(
                classify_status(status),
                status_message(status, bytes.as_ref()),
            ));
        }
        Ok(bytes.to_vec())
    }
}

fn map_failure(kind: FailureKind, message: String) -> EntitlementProviderError {
    match kind {
        FailureKind::Timeout => EntitlementProviderError::timeout(message),
        FailureKind::Transport => EntitlementProviderError::transport(message),
        FailureKind::RateLimited | FailureKind::Rejected => {
            EntitlementProviderError::rejected(message)
        }
    }
}

fn map_transport_error(error: &reqwest::Error) -> EntitlementProviderError {
    map_failure(classify_transport(error), error.to_string())
}

fn parse_flag_value(body: &[u8]) -> Result<bool, EntitlementProviderError> {
    serde_json::from_slice::<CheckFlagResponseDto>(body)
        .map(|decoded| decoded.data.value)
        .map_err(|err| EntitlementProviderError::decode(err.to_string()))
}

#[async_trait]
impl EntitlementProvider for BillingHttpClient {
    async fn check_flag(
        &self,
        user_id: &UserId,
        flag: &str,
    ) -> Result<bool, EntitlementProviderError> {
        let id = user_id.as_ref();
        let body = CheckFlagRequestDto {
            company: KeysDto { id },
            user: KeysDto { id },
        };
        let bytes = self.post(&format!("flags/{flag}/check"), &body).await?;
        let value = parse_flag_value(&bytes)?;
        debug!(%user_id, flag, value, "entitlement flag checked");
        Ok(value)
    }

    async fn track_event(
        &self,
        user_id: &UserId,
        event: &str,
    ) -> Result<(), EntitlementProviderError> {
        let id = user_id.as_ref();
        let body = TrackEventDto {
            event_type: "track",
            body: TrackBodyDto {
                event,
                company: KeysDto { id },
                user: KeysDto { id },
            },
        };
        self.post("events", &body).await.map(|_| ())
    }
}
