//! Tool dispatcher: resolves, validates, and executes tool invocations.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::task::JoinSet;

use crate::config::ExecutionPolicy;
use crate::tools::ToolRegistry;
use crate::types::FailureKind;

use super::validator::validate_arguments;

/// Most detached executions tracked at once; overflow runs untracked.
pub const DEFAULT_DETACHED_CAPACITY: usize = 1024;

/// Result of dispatching a tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationOutcome {
    Success(Value),
    Failure(FailureKind, String),
}

/// Bounded set of in-flight detached executions, drained on shutdown.
pub struct DetachedTasks {
    tasks: Mutex<JoinSet<()>>,
    capacity: usize,
}

impl DetachedTasks {
    pub fn new(capacity: usize) -> Self {
        Self {
            tasks: Mutex::new(JoinSet::new()),
            capacity,
        }
    }

    /// Spawn `work` on the runtime. Finished tasks are reaped first so the set
    /// only holds live work.
    pub fn spawn<F>(&self, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        while tasks.try_join_next().is_some() {}

        if tasks.len() >= self.capacity {
            tracing::warn!(
                "Detached task set full ({} in flight); running untracked",
                tasks.len()
            );
            tokio::spawn(work);
            return;
        }
        tasks.spawn(work);
    }

    pub fn in_flight(&self) -> usize {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        while tasks.try_join_next().is_some() {}
        tasks.len()
    }

    /// Wait up to `timeout` for tracked work, then abort the rest.
    /// Returns the number of executions aborted.
    pub async fn drain(&self, timeout: Duration) -> usize {
        let mut tasks = {
            let mut guard = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *guard)
        };

        if tasks.is_empty() {
            return 0;
        }

        tracing::info!("Draining {} detached tool executions", tasks.len());
        let drained = tokio::time::timeout(timeout, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;

        if drained.is_ok() {
            return 0;
        }

        let remaining = tasks.len();
        tracing::warn!("Aborting {remaining} detached tool executions still running");
        tasks.abort_all();
        while tasks.join_next().await.is_some() {}
        remaining
    }
}

impl Default for DetachedTasks {
    fn default() -> Self {
        Self::new(DEFAULT_DETACHED_CAPACITY)
    }
}

/// Resolves tool invocations against the registry under one execution policy.
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    policy: ExecutionPolicy,
    detached: DetachedTasks,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>, policy: ExecutionPolicy) -> Self {
        Self {
            registry,
            policy,
            detached: DetachedTasks::default(),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn policy(&self) -> ExecutionPolicy {
        self.policy
    }

    pub fn detached(&self) -> &DetachedTasks {
        &self.detached
    }

    /// Dispatch under the configured policy.
    pub async fn dispatch(&self, name: &str, arguments: Value) -> InvocationOutcome {
        self.dispatch_with(name, arguments, self.policy).await
    }

    pub async fn dispatch_with(
        &self,
        name: &str,
        arguments: Value,
        policy: ExecutionPolicy,
    ) -> InvocationOutcome {
        let Some(entry) = self.registry.resolve(name) else {
            return InvocationOutcome::Failure(
                FailureKind::MethodNotFound,
                format!("Unknown tool: {name}"),
            );
        };

        if let Err(missing) = validate_arguments(entry.definition(), &arguments) {
            return InvocationOutcome::Failure(FailureKind::InvalidParams, missing.to_string());
        }

        let tool = entry.tool();
        match policy {
            ExecutionPolicy::Sync => match tool.execute(arguments).await {
                Ok(result) => InvocationOutcome::Success(result),
                Err(e) => {
                    tracing::error!("Tool '{name}' failed: {e}");
                    InvocationOutcome::Failure(FailureKind::InternalError, format!("API error: {e}"))
                }
            },
            ExecutionPolicy::Detached => {
                let tool_name = name.to_string();
                self.detached.spawn(async move {
                    tracing::info!("Tool started: {tool_name}");
                    match tool.execute(arguments).await {
                        Ok(_) => tracing::info!("Tool finished: {tool_name}"),
                        Err(e) => tracing::error!("Tool error: {tool_name}: {e}"),
                    }
                });
                InvocationOutcome::Success(json!({ "status": "started", "tool": name }))
            }
        }
    }
}
