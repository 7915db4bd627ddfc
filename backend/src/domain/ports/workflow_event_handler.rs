//! Driving port invoked for each delivered workflow event.

use async_trait::async_trait;

use crate::domain::Error;

use super::WorkflowEvent;

/// Consumer of workflow events, whichever transport delivered them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkflowEventHandler: Send + Sync {
    /// Run the work described by `event` to completion.
    async fn handle(&self, event: WorkflowEvent) -> Result<(), Error>;
}

/// Fixture implementation that acknowledges and ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureWorkflowEventHandler;

#[async_trait]
impl WorkflowEventHandler for FixtureWorkflowEventHandler {
    async fn handle(&self, _event: WorkflowEvent) -> Result<(), Error> {
        Ok(())
    }
}
