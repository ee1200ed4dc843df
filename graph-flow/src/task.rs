use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Result of a task execution
#[derive(Debug, Clone)]
pub struct TaskResult<S> {
    /// State produced by the task, handed to the next one
    pub state: S,
    /// Next action to take
    pub next_action: NextAction,
    /// Optional human readable status for logs
    pub status_message: Option<String>,
}

impl<S> TaskResult<S> {
    pub fn new(state: S, next_action: NextAction) -> Self {
        Self {
            state,
            next_action,
            status_message: None,
        }
    }

    pub fn new_with_status(state: S, next_action: NextAction, status_message: Option<String>) -> Self {
        Self {
            state,
            next_action,
            status_message,
        }
    }
}

/// Defines what should happen after a task completes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NextAction {
    /// Continue to the next task along the outgoing edge
    Continue,
    /// End the graph execution
    End,
}

/// Core trait that all tasks must implement.
///
/// A task owns nothing of the workflow state: it receives the state by value
/// and returns the (possibly updated) state in its [`TaskResult`].
#[async_trait]
pub trait Task<S>: Send + Sync
where
    S: Send + 'static,
{
    /// Unique identifier for this task
    fn id(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Execute the task over the given state
    async fn run(&self, state: S) -> Result<TaskResult<S>>;
}
