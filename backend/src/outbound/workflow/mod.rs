//! Workflow dispatch adapters.

mod channel;
mod http;

pub use channel::{
    ChannelWorkflowDispatcher, WorkflowReceiver, spawn_workflow_worker, workflow_channel,
};
pub use http::{DEFAULT_WORKFLOW_BASE_URL, HttpWorkflowDispatcher};
