use thiserror::Error;

/// Errors raised while building or executing a graph
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Graph {0} has no start task")]
    NoStartTask(String),

    #[error("Task {task_id} failed: {source}")]
    TaskFailed {
        task_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Step limit of {0} exceeded")]
    StepLimitExceeded(usize),
}

impl GraphError {
    /// Wrap an arbitrary error as the failure of `task_id`
    pub fn task_failed(task_id: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::TaskFailed {
            task_id: task_id.into(),
            source: source.into(),
        }
    }

    /// Id of the task that failed, if this is a task failure
    pub fn task_id(&self) -> Option<&str> {
        match self {
            Self::TaskFailed { task_id, .. } => Some(task_id),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;
