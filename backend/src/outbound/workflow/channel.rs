//! In-process workflow delivery over a bounded tokio channel.
//!
//! The dispatcher captures the caller's [`TraceId`] with each event and the
//! worker re-enters it, so log lines from background extraction correlate
//! with the upload request that triggered them.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::TraceId;
use crate::domain::ports::{
    DispatchedEvent, WorkflowDispatchError, WorkflowDispatcher, WorkflowEvent, WorkflowEventHandler,
};

#[derive(Debug)]
struct QueuedEvent {
    id: String,
    event: WorkflowEvent,
    trace_id: Option<TraceId>,
}

/// Sending half of the in-process workflow queue.
#[derive(Debug, Clone)]
pub struct ChannelWorkflowDispatcher {
    sender: mpsc::Sender<QueuedEvent>,
}

/// Receiving half, consumed by [`spawn_workflow_worker`].
#[derive(Debug)]
pub struct WorkflowReceiver(mpsc::Receiver<QueuedEvent>);

/// Create a bounded queue holding at most `capacity` pending events.
///
/// # Panics
///
/// Panics when `capacity` is zero, as [`mpsc::channel`] does.
#[must_use]
pub fn workflow_channel(capacity: usize) -> (ChannelWorkflowDispatcher, WorkflowReceiver) {
    let (sender, receiver) = mpsc::channel(capacity);
    (
        ChannelWorkflowDispatcher { sender },
        WorkflowReceiver(receiver),
    )
}

#[async_trait]
impl WorkflowDispatcher for ChannelWorkflowDispatcher {
    async fn dispatch(&self, event: WorkflowEvent) -> Result<DispatchedEvent, WorkflowDispatchError> {
        let id = Uuid::new_v4().to_string();
        let queued = QueuedEvent {
            id: id.clone(),
            event,
            trace_id: TraceId::current(),
        };
        self.sender
            .send(queued)
            .await
            .map_err(|_| WorkflowDispatchError::unavailable("workflow worker has stopped"))?;
        Ok(DispatchedEvent { ids: vec![id] })
    }
}

/// Run `handler` over queued events, one at a time, until every dispatcher
/// has been dropped.
pub fn spawn_workflow_worker(
    receiver: WorkflowReceiver,
    handler: Arc<dyn WorkflowEventHandler>,
) -> JoinHandle<()> {
    let WorkflowReceiver(mut receiver) = receiver;
    tokio::spawn(async move {
        while let Some(queued) = receiver.recv().await {
            let QueuedEvent {
                id,
                event,
                trace_id,
            } = queued;
            let name = event.name();
            let run = handler.handle(event);
            let outcome = match trace_id {
                Some(trace_id) => TraceId::scope(trace_id, run).await,
                None => run.await,
            };
            match outcome {
                Ok(()) => info!(event_id = %id, event = name, "workflow event handled"),
                Err(error) => warn!(
                    event_id = %id,
                    event = name,
                    code = ?error.code(),
                    message = error.message(),
                    "workflow event failed"
                ),
            }
        }
        info!("workflow worker stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Error, ReceiptId};
    use rstest::rstest;
    use url::Url;

    struct ForwardingHandler(mpsc::UnboundedSender<(WorkflowEvent, Option<TraceId>)>);

    #[async_trait]
    impl WorkflowEventHandler for ForwardingHandler {
        async fn handle(&self, event: WorkflowEvent) -> Result<(), Error> {
            self.0
                .send((event, TraceId::current()))
                .map_err(|err| Error::internal(err.to_string()))
        }
    }

    fn extract_event() -> WorkflowEvent {
        WorkflowEvent::ExtractReceipt {
            url: Url::parse("http://localhost/files/a.pdf").expect("url"),
            receipt_id: ReceiptId::random(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn worker_handles_events_inside_dispatch_trace() {
        let (dispatcher, receiver) = workflow_channel(4);
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
        let worker = spawn_workflow_worker(receiver, Arc::new(ForwardingHandler(seen_tx)));
        let trace_id = TraceId::generate();
        let event = extract_event();

        let ack = TraceId::scope(trace_id, dispatcher.dispatch(event.clone()))
            .await
            .expect("dispatch");
        let (handled, observed_trace) = seen_rx.recv().await.expect("handled event");

        assert_eq!(ack.ids.len(), 1);
        assert_eq!(handled, event);
        assert_eq!(observed_trace, Some(trace_id));

        drop(dispatcher);
        worker.await.expect("worker exits once senders drop");
    }

    #[rstest]
    #[tokio::test]
    async fn dispatch_fails_once_worker_is_gone() {
        let (dispatcher, receiver) = workflow_channel(1);
        drop(receiver);

        let error = dispatcher
            .dispatch(extract_event())
            .await
            .expect_err("closed queue");

        assert!(matches!(error, WorkflowDispatchError::Unavailable { .. }));
    }
}
