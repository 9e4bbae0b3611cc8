use crate::dag::{build_sql_qa_pipeline, DagExecutor, QaState, Task, TaskContext};
use crate::db::executor::SqlRunner;
use crate::error::{Result, SqlChatError};
use crate::llm::model::CompletionClient;
use crate::schema::SchemaDocument;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// running record of every answered turn in the session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript(String);

impl Transcript {
    pub fn push_turn(&mut self, question: &str, answer: &str) {
        self.0.push_str("\nUser: ");
        self.0.push_str(question);
        self.0.push_str("\nAssistant: ");
        self.0.push_str(answer);
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn is_exit_command(line: &str) -> bool {
    let line = line.trim();
    line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit")
}

pub struct SqlChatBot {
    ctx: TaskContext,
    executor: DagExecutor,
    tasks: HashMap<String, Arc<dyn Task>>,
    transcript: Transcript,
}

impl SqlChatBot {
    pub fn new(
        schema: &SchemaDocument,
        model: Arc<dyn CompletionClient>,
        runner: Arc<dyn SqlRunner>,
    ) -> Result<Self> {
        if schema.is_empty() {
            tracing::warn!("schema document is empty, generated sql will be unguided");
        }

        let (dag, tasks) = build_sql_qa_pipeline();
        let executor = DagExecutor::new(dag)?;

        let ctx = TaskContext {
            schema: Arc::from(schema.to_prompt_text()),
            model,
            runner,
        };

        tracing::info!(tables = schema.tables().len(), "chatbot initialized");

        Ok(Self {
            ctx,
            executor,
            tasks,
            transcript: Transcript::default(),
        })
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// run the pipeline over `state`. on error the state keeps the fields that
    /// were produced before the failing stage.
    pub async fn run_pipeline(&self, state: &mut QaState) -> Result<()> {
        self.executor.execute(&self.tasks, &self.ctx, state).await?;
        Ok(())
    }

    /// answer one question and record the turn in the transcript
    #[tracing::instrument(skip(self), fields(turn.history_len = self.transcript.as_str().len()))]
    pub async fn ask(&mut self, question: &str) -> Result<QaState> {
        let mut state = QaState::new(question, self.transcript.as_str());
        self.run_pipeline(&mut state).await?;

        let answer = state
            .answer
            .as_deref()
            .ok_or_else(|| SqlChatError::Task("pipeline finished without an answer".to_string()))?;
        self.transcript.push_turn(question, answer);

        Ok(state)
    }

    /// read questions line by line until `exit`/`quit` or end of input.
    /// a failed turn is reported and the loop keeps going.
    pub async fn chat<R, W>(&mut self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tracing::info!("starting chat session. type 'exit' or 'quit' to end.");
        let mut buf = Vec::new();

        loop {
            writer.write_all(b"\nUser: ").await?;
            writer.flush().await?;

            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                tracing::info!("input closed, ending chat session");
                break;
            }

            // invalid utf-8 is replaced rather than ending the session
            let line = String::from_utf8_lossy(&buf);
            if std::str::from_utf8(&buf).is_err() {
                tracing::warn!("input line was not valid utf-8, decoded lossily");
            }

            if is_exit_command(&line) {
                tracing::info!("chat session ended by user");
                break;
            }

            let question = line.trim();
            if question.is_empty() {
                continue;
            }

            match self.ask(question).await {
                Ok(state) => {
                    let answer = state.answer.unwrap_or_default();
                    writer
                        .write_all(format!("\nAssistant: {}\n", answer).as_bytes())
                        .await?;
                }
                Err(e) => {
                    tracing::error!(error = %e, "turn failed");
                    writer
                        .write_all(format!("\nError: {}\n", e).as_bytes())
                        .await?;
                }
            }
            writer.flush().await?;
        }

        Ok(())
    }
}
