//! Workflow delivery through an external event API.
//!
//! Events are posted as `{name, data}` envelopes to `{base}/e/{event_key}`;
//! the workflow service later calls back into `/api/v1/workflows/events`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;
use zeroize::Zeroizing;

use crate::domain::ports::{
    DispatchedEvent, WorkflowDispatchError, WorkflowDispatcher, WorkflowEvent,
};
use crate::outbound::http_status::{
    FailureKind, classify_status, classify_transport, status_message,
};

/// Hosted event API endpoint.
pub const DEFAULT_WORKFLOW_BASE_URL: &str = "https://inn.gs/";

/// Dispatcher posting events to the hosted workflow service.
pub struct HttpWorkflowDispatcher {
    client: Client,
    endpoint: Zeroizing<String>,
}

impl HttpWorkflowDispatcher {
    /// Build the dispatcher for `event_key`.
    ///
    /// The key is part of the URL path, so the endpoint is held zeroized.
    ///
    /// # Errors
    ///
    /// Returns an error message when the endpoint cannot be formed or the
    /// reqwest client cannot be constructed.
    pub fn new(base_url: &Url, event_key: &str, timeout: Duration) -> Result<Self, String> {
        let endpoint = event_endpoint(base_url, event_key)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| err.to_string())?;
        Ok(Self {
            client,
            endpoint: Zeroizing::new(endpoint.into()),
        })
    }
}

fn event_endpoint(base_url: &Url, event_key: &str) -> Result<Url, String> {
    let key = event_key.trim();
    if key.is_empty() || key.contains('/') {
        return Err("workflow event key must be a single non-empty path segment".to_owned());
    }
    base_url
        .join(&format!("e/{key}"))
        .map_err(|err| format!("invalid workflow base URL: {err}"))
}

fn map_failure(kind: FailureKind, message: String) -> WorkflowDispatchError {
    match kind {
        FailureKind::Transport | FailureKind::Timeout => WorkflowDispatchError::transport(message),
        FailureKind::RateLimited => WorkflowDispatchError::unavailable(message),
        FailureKind::Rejected => WorkflowDispatchError::rejected(message),
    }
}

fn parse_ack(body: &[u8]) -> Result<DispatchedEvent, WorkflowDispatchError> {
    serde_json::from_slice(body)
        .map_err(|err| WorkflowDispatchError::rejected(format!("unreadable acknowledgement: {err}")))
}

#[async_trait]
impl WorkflowDispatcher for HttpWorkflowDispatcher {
    async fn dispatch(&self, event: WorkflowEvent) -> Result<DispatchedEvent, WorkflowDispatchError> {
        let transport =
            |err: reqwest::Error| map_failure(classify_transport(&err), err.without_url().to_string());
        let response = self
            .client
            .post(self.endpoint.as_str())
            .json(&event)
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(transport)?;
        if !status.is_success() {
            return Err(map_failure(
                classify_status(status),
                status_message(status, bytes.as_ref()),
            ));
        }
        let ack = parse_ack(bytes.as_ref())?;
        debug!(event = event.name(), ids = ?ack.ids, "workflow event sent");
        Ok(ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::bare("https://inn.gs", "https://inn.gs/e/key-1")]
    #[case::nested("http://localhost:8288/", "http://localhost:8288/e/key-1")]
    fn endpoint_appends_event_key(#[case] base: &str, #[case] expected: &str) {
        let base = Url::parse(base).expect("url");
        let endpoint = event_endpoint(&base, "key-1").expect("endpoint");
        assert_eq!(endpoint.as_str(), expected);
    }

    #[rstest]
    #[case::blank("  ")]
    #[case::path("a/b")]
    fn malformed_event_keys_are_rejected(#[case] key: &str) {
        let base = Url::parse(DEFAULT_WORKFLOW_BASE_URL).expect("url");
        assert!(event_endpoint(&base, key).is_err());
    }

    #[rstest]
    fn acknowledgement_ids_are_read() {
        let ack = parse_ack(br#"{"ids":["01HX"],"status":200}"#).expect("ack");
        assert_eq!(ack.ids, vec!["01HX".to_owned()]);
    }

    #[rstest]
    fn rate_limits_report_unavailable() {
        assert!(matches!(
            map_failure(FailureKind::RateLimited, "429".to_owned()),
            WorkflowDispatchError::Unavailable { .. }
        ));
    }
}
