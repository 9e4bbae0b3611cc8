use crate::agent::parser::extract_sql;
use crate::agent::prompt::{build_answer_prompt, build_sql_prompt};
use crate::error::Result;
use crate::llm::model::CompletionClient;

/// ask the model for a query and pull the sql out of its reply
#[tracing::instrument(skip_all, fields(question_len = question.len(), history_len = chat_history.len()))]
pub async fn generate_sql(
    model: &dyn CompletionClient,
    schema: &str,
    chat_history: &str,
    question: &str,
) -> Result<String> {
    let prompt = build_sql_prompt(schema, chat_history, question);

    tracing::info!("generating sql query");
    let output = model.complete(&prompt).await?;

    let sql = extract_sql(&output);
    tracing::info!(sql = %sql, "sql query generated");
    Ok(sql)
}

/// ask the model to answer the question from the query output
#[tracing::instrument(skip_all, fields(results_len = results.len()))]
pub async fn generate_answer(
    model: &dyn CompletionClient,
    sql_query: &str,
    results: &str,
    question: &str,
    chat_history: &str,
) -> Result<String> {
    let prompt = build_answer_prompt(sql_query, results, question, chat_history);

    tracing::info!("generating final answer");
    let answer = model.complete(&prompt).await?;

    tracing::info!(answer_len = answer.len(), "final answer generated");
    Ok(answer.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingModel {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CompletionClient for RecordingModel {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    fn model(reply: &str) -> RecordingModel {
        RecordingModel {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    #[tokio::test]
    async fn test_generate_sql_extracts_fenced_query() {
        let model = model("Sure!\n```sql\nSELECT * FROM locations;\n```");
        let sql = generate_sql(&model, "schema text", "", "list all locations")
            .await
            .unwrap();

        assert_eq!(sql, "SELECT * FROM locations;");
        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].contains("schema text"));
        assert!(prompts[0].contains("list all locations"));
    }

    #[tokio::test]
    async fn test_generate_answer_embeds_results() {
        let model = model("  There are 3 locations.\n");
        let answer = generate_answer(&model, "SELECT count(*) FROM locations", "count\n3", "how many?", "")
            .await
            .unwrap();

        assert_eq!(answer, "There are 3 locations.");
        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].contains("count\n3"));
    }
}
