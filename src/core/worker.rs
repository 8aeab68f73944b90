use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::llm::LlmHandle;
use crate::tools::Tool;

pub const DEFAULT_MAX_ITERATIONS: usize = 15;

/// Persona of a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub role: String,
    pub goal: String,
    pub backstory: String,
}

/// A role/goal/backstory persona bound to an LLM backend, optionally equipped
/// with tools.
///
/// The `id` is the worker's identity: two units of work are executed by the
/// same worker exactly when their workers share an id.
#[derive(Clone)]
pub struct Worker {
    id: Uuid,
    config: WorkerConfig,
    llm: LlmHandle,
    tools: Vec<Arc<dyn Tool>>,
    reasoning_attempts: Option<u8>,
    max_iterations: usize,
}

impl Worker {
    pub fn new(config: WorkerConfig, llm: LlmHandle) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            llm,
            tools: Vec::new(),
            reasoning_attempts: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        if self.tool(tool.name()).is_some() {
            log::warn!(
                "Worker '{}' already has a tool named '{}', replacing it.",
                self.config.role,
                tool.name()
            );
            self.tools.retain(|t| t.name() != tool.name());
        }
        self.tools.push(tool);
        self
    }

    /// Plan before executing, refining the plan at most `attempts` times.
    pub fn with_reasoning(mut self, attempts: u8) -> Self {
        self.reasoning_attempts = (attempts > 0).then_some(attempts);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn role(&self) -> &str {
        &self.config.role
    }

    pub fn goal(&self) -> &str {
        &self.config.goal
    }

    pub fn backstory(&self) -> &str {
        &self.config.backstory
    }

    pub fn llm(&self) -> &LlmHandle {
        &self.llm
    }

    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    pub fn tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn reasoning_attempts(&self) -> Option<u8> {
        self.reasoning_attempts
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }
}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field("role", &self.config.role)
            .field("llm", &self.llm)
            .field(
                "tools",
                &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .field("reasoning_attempts", &self.reasoning_attempts)
            .field("max_iterations", &self.max_iterations)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::llm::{CompletionBackend, CompletionRequest, LLMError};
    use async_trait::async_trait;

    pub(crate) struct NullBackend;

    #[async_trait]
    impl CompletionBackend for NullBackend {
        async fn complete(&self, _request: CompletionRequest) -> Result<String, LLMError> {
            Ok(String::new())
        }

        fn provider(&self) -> &str {
            "null"
        }
    }

    pub(crate) fn test_worker(role: &str) -> Worker {
        Worker::new(
            WorkerConfig {
                role: role.to_string(),
                goal: "test".to_string(),
                backstory: "test".to_string(),
            },
            LlmHandle::new(Arc::new(NullBackend), "null-model"),
        )
    }

    #[test]
    fn test_workers_have_distinct_identity() {
        let a = test_worker("a");
        let b = test_worker("a");
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn test_reasoning_zero_disables() {
        assert_eq!(test_worker("a").with_reasoning(0).reasoning_attempts(), None);
        assert_eq!(test_worker("a").with_reasoning(3).reasoning_attempts(), Some(3));
    }

    #[test]
    fn test_max_iterations_floor() {
        assert_eq!(test_worker("a").with_max_iterations(0).max_iterations(), 1);
        assert_eq!(test_worker("a").max_iterations(), DEFAULT_MAX_ITERATIONS);
    }
}
