use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::{
    error::{GraphError, Result},
    task::{NextAction, Task},
};

/// Upper bound on tasks executed by a single [`Graph::execute`] call
pub const DEFAULT_MAX_STEPS: usize = 64;

/// Edge between tasks in the graph
#[derive(Debug, Clone)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

/// A graph of tasks that are executed over a state of type `S`
pub struct Graph<S: Send + 'static> {
    pub id: String,
    tasks: HashMap<String, Arc<dyn Task<S>>>,
    edges: Vec<Edge>,
    start_task_id: Option<String>,
    max_steps: usize,
}

impl<S: Send + 'static> Graph<S> {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tasks: HashMap::new(),
            edges: Vec::new(),
            start_task_id: None,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Add a task to the graph. The first task added becomes the start task.
    pub fn add_task(&mut self, task: Arc<dyn Task<S>>) -> &mut Self {
        let task_id = task.id().to_string();
        if self.tasks.is_empty() {
            self.start_task_id = Some(task_id.clone());
        }
        self.tasks.insert(task_id, task);
        self
    }

    /// Add an edge between tasks
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.edges.push(Edge {
            from: from.into(),
            to: to.into(),
        });
        self
    }

    /// Run the graph from its start task until a task ends it or no edge
    /// leads further. The state returned by each task is handed to the next.
    pub async fn execute(&self, state: S) -> Result<ExecutionResult<S>> {
        let mut task_id = self
            .start_task_id
            .clone()
            .ok_or_else(|| GraphError::NoStartTask(self.id.clone()))?;
        let mut state = state;
        let mut visited = Vec::new();

        loop {
            if visited.len() >= self.max_steps {
                return Err(GraphError::StepLimitExceeded(self.max_steps));
            }

            let task = self
                .get_task(&task_id)
                .ok_or_else(|| GraphError::TaskNotFound(task_id.clone()))?;

            debug!(graph_id = %self.id, task_id = %task_id, "Executing task");
            let result = task.run(state).await?;
            state = result.state;
            visited.push(task_id.clone());

            if let Some(status) = &result.status_message {
                debug!(graph_id = %self.id, task_id = %task_id, status = %status, "Task finished");
            }

            match result.next_action {
                NextAction::End => break,
                NextAction::Continue => match self.find_next_task(&task_id) {
                    Some(next_task_id) => task_id = next_task_id,
                    None => break,
                },
            }
        }

        Ok(ExecutionResult { state, visited })
    }

    /// Find the next task along the first outgoing edge
    pub fn find_next_task(&self, current_task_id: &str) -> Option<String> {
        self.edges
            .iter()
            .find(|edge| edge.from == current_task_id)
            .map(|edge| edge.to.clone())
    }

    /// Get the start task ID
    pub fn start_task_id(&self) -> Option<&str> {
        self.start_task_id.as_deref()
    }

    /// Get a task by ID
    pub fn get_task(&self, task_id: &str) -> Option<Arc<dyn Task<S>>> {
        self.tasks.get(task_id).cloned()
    }
}

/// Builder for creating graphs
pub struct GraphBuilder<S: Send + 'static> {
    graph: Graph<S>,
}

impl<S: Send + 'static> GraphBuilder<S> {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            graph: Graph::new(id),
        }
    }

    pub fn add_task(mut self, task: Arc<dyn Task<S>>) -> Self {
        self.graph.add_task(task);
        self
    }

    pub fn add_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.graph.add_edge(from, to);
        self
    }

    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.graph.max_steps = max_steps;
        self
    }

    pub fn build(self) -> Graph<S> {
        self.graph
    }
}

/// Outcome of a completed graph execution
#[derive(Debug, Clone)]
pub struct ExecutionResult<S> {
    /// Final state after the last task
    pub state: S,
    /// Ids of the tasks that ran, in execution order
    pub visited: Vec<String>,
}
