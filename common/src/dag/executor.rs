use crate::dag::graph::Dag;
use crate::dag::state::QaState;
use crate::dag::task::{Task, TaskContext, TaskResult};
use crate::error::{Result, SqlChatError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::Instrument;

/// executes a dag of tasks level by level, merging outputs into the turn state
pub struct DagExecutor {
    dag: Dag,
    levels: Vec<Vec<String>>,
}

impl DagExecutor {
    /// create a new executor for the given dag
    pub fn new(dag: Dag) -> Result<Self> {
        dag.validate()?;
        let levels = dag.topological_levels()?;
        Ok(Self { dag, levels })
    }

    /// run every task. each level sees the state left by the previous ones;
    /// on failure `state` keeps whatever earlier levels produced.
    pub async fn execute(
        &self,
        tasks: &HashMap<String, Arc<dyn Task>>,
        ctx: &TaskContext,
        state: &mut QaState,
    ) -> Result<HashMap<String, TaskResult>> {
        let span = tracing::info_span!("dag_executor::execute", dag.task_count = self.dag.len());

        async {
            let mut results = HashMap::new();
            tracing::debug!(levels = self.levels.len(), "executing dag");

            for (level_idx, task_ids) in self.levels.iter().enumerate() {
                let level_span = tracing::info_span!(
                    "dag_level",
                    dag.level = level_idx,
                    dag.level_task_count = task_ids.len()
                );

                let mut join_set = JoinSet::new();

                for task_id in task_ids {
                    let task = Arc::clone(tasks.get(task_id).ok_or_else(|| {
                        SqlChatError::Task(format!("task not found: {}", task_id))
                    })?);

                    let task_ctx = ctx.clone();
                    let task_state = state.clone();
                    let task_id_owned = task_id.clone();

                    let task_span = tracing::info_span!(
                        parent: &level_span,
                        "task",
                        task.id = %task_id_owned,
                        otel.kind = "internal"
                    );

                    let task_future = async move {
                        let start = std::time::Instant::now();

                        let output = task.execute(task_ctx, task_state).await?;

                        let duration_ms = start.elapsed().as_millis() as u64;
                        tracing::debug!(task.duration_ms = duration_ms, "task completed");

                        Ok::<_, SqlChatError>(TaskResult {
                            task_id: task_id_owned,
                            output,
                            duration_ms,
                        })
                    }
                    .instrument(task_span);

                    join_set.spawn(task_future);
                }

                // collect all results from this level before merging them
                let mut level_results = Vec::with_capacity(task_ids.len());
                while let Some(joined) = join_set.join_next().await {
                    let task_result = joined.map_err(|e| {
                        SqlChatError::Task(format!("task join error: {}", e))
                    })??;
                    level_results.push(task_result);
                }

                for task_result in level_results {
                    state.apply(task_result.output.clone());
                    results.insert(task_result.task_id.clone(), task_result);
                }
            }

            tracing::debug!(completed_tasks = results.len(), "dag execution complete");
            Ok::<_, SqlChatError>(results)
        }
        .instrument(span)
        .await
    }
}
