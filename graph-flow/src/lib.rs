pub mod error;
pub mod graph;
pub mod task;

// Re-export commonly used types
pub use error::{GraphError, Result};
pub use graph::{ExecutionResult, Graph, GraphBuilder};
pub use task::{NextAction, Task, TaskResult};

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct AppendTask {
        id: String,
        suffix: &'static str,
        next: NextAction,
    }

    #[async_trait]
    impl Task<Vec<String>> for AppendTask {
        fn id(&self) -> &str {
            &self.id
        }

        async fn run(&self, mut state: Vec<String>) -> Result<TaskResult<Vec<String>>> {
            state.push(self.suffix.to_string());
            Ok(TaskResult::new(state, self.next.clone()))
        }
    }

    struct FailingTask;

    #[async_trait]
    impl Task<Vec<String>> for FailingTask {
        async fn run(&self, _state: Vec<String>) -> Result<TaskResult<Vec<String>>> {
            Err(GraphError::task_failed(self.id(), anyhow::anyhow!("boom")))
        }
    }

    fn append(id: &str, suffix: &'static str, next: NextAction) -> Arc<AppendTask> {
        Arc::new(AppendTask {
            id: id.to_string(),
            suffix,
            next,
        })
    }

    #[tokio::test]
    async fn test_linear_graph_threads_state() {
        let graph = GraphBuilder::new("linear")
            .add_task(append("a", "first", NextAction::Continue))
            .add_task(append("b", "second", NextAction::Continue))
            .add_task(append("c", "third", NextAction::End))
            .add_edge("a", "b")
            .add_edge("b", "c")
            .build();

        let result = graph.execute(Vec::new()).await.unwrap();

        assert_eq!(result.state, vec!["first", "second", "third"]);
        assert_eq!(result.visited, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_end_stops_before_outgoing_edge() {
        let graph = GraphBuilder::new("short")
            .add_task(append("a", "first", NextAction::End))
            .add_task(append("b", "second", NextAction::Continue))
            .add_edge("a", "b")
            .build();

        let result = graph.execute(Vec::new()).await.unwrap();
        assert_eq!(result.visited, vec!["a"]);
    }

    #[tokio::test]
    async fn test_task_failure_carries_task_id() {
        let failing = Arc::new(FailingTask);
        let failing_id = failing.id().to_string();
        let graph = GraphBuilder::new("failing")
            .add_task(append("a", "first", NextAction::Continue))
            .add_task(failing)
            .add_edge("a", failing_id.clone())
            .build();

        let err = graph.execute(Vec::new()).await.unwrap_err();
        assert_eq!(err.task_id(), Some(failing_id.as_str()));
    }

    #[tokio::test]
    async fn test_cycle_hits_step_limit() {
        let graph = GraphBuilder::new("cycle")
            .add_task(append("a", "x", NextAction::Continue))
            .add_edge("a", "a")
            .max_steps(5)
            .build();

        let err = graph.execute(Vec::new()).await.unwrap_err();
        assert!(matches!(err, GraphError::StepLimitExceeded(5)));
    }

    #[tokio::test]
    async fn test_empty_graph_has_no_start() {
        let graph: Graph<Vec<String>> = GraphBuilder::new("empty").build();
        let err = graph.execute(Vec::new()).await.unwrap_err();
        assert!(matches!(err, GraphError::NoStartTask(_)));
    }
}
