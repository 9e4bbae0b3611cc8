use crate::agent::executor::{generate_answer, generate_sql};
use crate::dag::graph::Dag;
use crate::dag::state::QaState;
use crate::db::executor::SqlRunner;
use crate::error::{Result, SqlChatError};
use crate::llm::model::CompletionClient;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

pub const GENERATE_SQL: &str = "generate_sql";
pub const EXECUTE_SQL: &str = "execute_sql";
pub const GENERATE_ANSWER: &str = "generate_answer";

/// shared collaborators passed to each task during execution
#[derive(Clone)]
pub struct TaskContext {
    /// rendered schema document
    pub schema: Arc<str>,
    pub model: Arc<dyn CompletionClient>,
    pub runner: Arc<dyn SqlRunner>,
}

/// output from a task execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutput {
    Sql(String),
    Results(String),
    Answer(String),
}

/// result of a task execution including metadata
#[derive(Debug, Clone)]
pub struct TaskResult {
    pub task_id: String,
    pub output: TaskOutput,
    pub duration_ms: u64,
}

/// trait for tasks that can be executed in the dag
#[async_trait]
pub trait Task: Send + Sync {
    /// unique identifier for this task
    fn id(&self) -> &str;

    /// execute the task against a snapshot of the turn state
    async fn execute(&self, ctx: TaskContext, state: QaState) -> Result<TaskOutput>;
}

fn require<'a>(value: &'a Option<String>, field: &str, task: &str) -> Result<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| SqlChatError::Task(format!("{} requires {} in state", task, field)))
}

/// turns the question into sql
pub struct GenerateSqlTask;

#[async_trait]
impl Task for GenerateSqlTask {
    fn id(&self) -> &str {
        GENERATE_SQL
    }

    #[tracing::instrument(skip_all, fields(task.id = %self.id()))]
    async fn execute(&self, ctx: TaskContext, state: QaState) -> Result<TaskOutput> {
        let sql = generate_sql(
            ctx.model.as_ref(),
            &ctx.schema,
            &state.chat_history,
            &state.question,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "failed to generate sql query");
            e
        })?;

        Ok(TaskOutput::Sql(sql))
    }
}

/// runs the generated sql
pub struct ExecuteSqlTask;

#[async_trait]
impl Task for ExecuteSqlTask {
    fn id(&self) -> &str {
        EXECUTE_SQL
    }

    #[tracing::instrument(skip_all, fields(task.id = %self.id()))]
    async fn execute(&self, ctx: TaskContext, state: QaState) -> Result<TaskOutput> {
        let sql = require(&state.sql_query, "sql_query", self.id())?;

        tracing::info!("executing sql query");
        let results = ctx.runner.run(sql).await.map_err(|e| {
            tracing::error!(sql = %sql, error = %e, "failed to execute sql query");
            e
        })?;

        tracing::info!(results = %results, "sql query executed");
        Ok(TaskOutput::Results(results))
    }
}

/// summarizes the query output as the final answer
pub struct GenerateAnswerTask;

#[async_trait]
impl Task for GenerateAnswerTask {
    fn id(&self) -> &str {
        GENERATE_ANSWER
    }

    #[tracing::instrument(skip_all, fields(task.id = %self.id()))]
    async fn execute(&self, ctx: TaskContext, state: QaState) -> Result<TaskOutput> {
        let sql = require(&state.sql_query, "sql_query", self.id())?;
        let results = require(&state.results, "results", self.id())?;

        let answer = generate_answer(
            ctx.model.as_ref(),
            sql,
            results,
            &state.question,
            &state.chat_history,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "failed to generate final answer");
            e
        })?;

        Ok(TaskOutput::Answer(answer))
    }
}

/// generate_sql -> execute_sql -> generate_answer
pub fn build_sql_qa_pipeline() -> (Dag, HashMap<String, Arc<dyn Task>>) {
    let mut dag = Dag::new();
    dag.add_task(GENERATE_SQL.to_string(), vec![]);
    dag.add_task(EXECUTE_SQL.to_string(), vec![GENERATE_SQL.to_string()]);
    dag.add_task(GENERATE_ANSWER.to_string(), vec![EXECUTE_SQL.to_string()]);

    let tasks: Vec<Arc<dyn Task>> = vec![
        Arc::new(GenerateSqlTask),
        Arc::new(ExecuteSqlTask),
        Arc::new(GenerateAnswerTask),
    ];

    let tasks = tasks
        .into_iter()
        .map(|task| (task.id().to_string(), task))
        .collect();

    (dag, tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tracing_subscriber::fmt::MakeWriter;

    struct FixedModel(&'static str);

    #[async_trait]
    impl CompletionClient for FixedModel {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingRunner;

    #[async_trait]
    impl SqlRunner for FailingRunner {
        async fn run(&self, _sql: &str) -> Result<String> {
            Err(SqlChatError::Task("relation \"nowhere\" does not exist".to_string()))
        }
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn ctx(model: &'static str) -> TaskContext {
        TaskContext {
            schema: Arc::from("Table 'locations' in schema 'location_management' has columns: id (int)."),
            model: Arc::new(FixedModel(model)),
            runner: Arc::new(FailingRunner),
        }
    }

    #[test]
    fn test_pipeline_is_a_chain() {
        let (dag, tasks) = build_sql_qa_pipeline();
        assert_eq!(tasks.len(), 3);

        let levels = dag.topological_levels().unwrap();
        assert_eq!(
            levels,
            vec![vec![GENERATE_SQL], vec![EXECUTE_SQL], vec![GENERATE_ANSWER]]
        );
    }

    #[tokio::test]
    async fn test_generate_sql_task() {
        let output = GenerateSqlTask
            .execute(ctx("```sql\nSELECT 1\n```"), QaState::new("q", ""))
            .await
            .unwrap();
        assert_eq!(output, TaskOutput::Sql("SELECT 1".to_string()));
    }

    #[tokio::test]
    async fn test_execute_sql_failure_logs_sql() {
        let buffer = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(buffer.clone())
            .with_ansi(false)
            .finish();
        let _default = tracing::subscriber::set_default(subscriber);

        let mut state = QaState::new("list all locations", "");
        state.sql_query = Some("SELECT * FROM nowhere".to_string());

        let result = ExecuteSqlTask.execute(ctx(""), state).await;
        assert!(result.is_err());

        let logs = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("failed to execute sql query"));
        assert!(logs.contains("SELECT * FROM nowhere"));
    }

    #[tokio::test]
    async fn test_execute_sql_requires_query() {
        let result = ExecuteSqlTask.execute(ctx(""), QaState::new("q", "")).await;
        assert!(matches!(result, Err(SqlChatError::Task(_))));
    }
}
