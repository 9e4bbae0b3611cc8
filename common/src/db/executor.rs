use crate::config::DbConfig;
use crate::db::connection::PgConnection;
use crate::error::Result;
use async_trait::async_trait;
use tokio_postgres::SimpleQueryMessage;

/// runs a sql string and returns its result as flat text
#[async_trait]
pub trait SqlRunner: Send + Sync {
    async fn run(&self, sql: &str) -> Result<String>;
}

/// result of one statement in a simple query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementOutput {
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<Option<String>>>,
    },
    Command {
        affected: u64,
    },
}

impl StatementOutput {
    fn render(&self) -> String {
        match self {
            StatementOutput::Rows { rows, .. } if rows.is_empty() => "(no rows)".to_string(),
            StatementOutput::Rows { columns, rows } => {
                let mut lines = Vec::with_capacity(rows.len() + 1);
                lines.push(columns.join(" | "));
                for row in rows {
                    let values: Vec<&str> = row
                        .iter()
                        .map(|v| v.as_deref().unwrap_or("NULL"))
                        .collect();
                    lines.push(values.join(" | "));
                }
                lines.join("\n")
            }
            StatementOutput::Command { affected } => format!("OK ({} rows affected)", affected),
        }
    }
}

/// flatten the outputs of every statement into the text handed to the answer prompt
pub fn render_outputs(outputs: &[StatementOutput]) -> String {
    if outputs.is_empty() {
        return "(no rows)".to_string();
    }

    outputs
        .iter()
        .map(StatementOutput::render)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// group simple query protocol messages into one output per statement
pub fn collect_outputs(messages: Vec<SimpleQueryMessage>) -> Vec<StatementOutput> {
    let mut outputs = Vec::new();
    let mut columns: Option<Vec<String>> = None;
    let mut rows: Vec<Vec<Option<String>>> = Vec::new();

    for message in messages {
        match message {
            SimpleQueryMessage::RowDescription(desc) => {
                columns = Some(desc.iter().map(|c| c.name().to_string()).collect());
            }
            SimpleQueryMessage::Row(row) => {
                if columns.is_none() {
                    columns = Some(row.columns().iter().map(|c| c.name().to_string()).collect());
                }
                rows.push((0..row.len()).map(|i| row.get(i).map(str::to_string)).collect());
            }
            SimpleQueryMessage::CommandComplete(affected) => {
                let output = match columns.take() {
                    Some(columns) => StatementOutput::Rows {
                        columns,
                        rows: std::mem::take(&mut rows),
                    },
                    None => StatementOutput::Command { affected },
                };
                outputs.push(output);
            }
            _ => {}
        }
    }

    outputs
}

/// executes sql against postgres with `search_path` pinned to one schema
pub struct PgSqlRunner {
    config: DbConfig,
    schema: String,
}

impl PgSqlRunner {
    pub fn new(config: DbConfig, schema: impl Into<String>) -> Self {
        Self {
            config,
            schema: schema.into(),
        }
    }
}

#[async_trait]
impl SqlRunner for PgSqlRunner {
    #[tracing::instrument(skip(self, sql), fields(db.schema = %self.schema, sql_len = sql.len()))]
    async fn run(&self, sql: &str) -> Result<String> {
        let conn = PgConnection::open(&self.config).await?;

        let result: Result<String> = async {
            conn.client()
                .batch_execute(&format!("SET search_path TO {}", quote_ident(&self.schema)))
                .await?;
            let messages = conn.client().simple_query(sql).await?;
            Ok(render_outputs(&collect_outputs(messages)))
        }
        .await;

        conn.close().await;
        result
    }
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(columns: &[&str], rows: &[&[Option<&str>]]) -> StatementOutput {
        StatementOutput::Rows {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|v| v.map(str::to_string)).collect())
                .collect(),
        }
    }

    #[test]
    fn test_render_rows() {
        let output = rows(
            &["id", "name"],
            &[&[Some("1"), Some("Paris")], &[Some("2"), None]],
        );
        assert_eq!(render_outputs(&[output]), "id | name\n1 | Paris\n2 | NULL");
    }

    #[test]
    fn test_render_empty_result_set() {
        let output = rows(&["id"], &[]);
        assert_eq!(render_outputs(&[output]), "(no rows)");
        assert_eq!(render_outputs(&[]), "(no rows)");
    }

    #[test]
    fn test_render_command() {
        let output = StatementOutput::Command { affected: 3 };
        assert_eq!(render_outputs(&[output]), "OK (3 rows affected)");
    }

    #[test]
    fn test_render_multiple_statements() {
        let outputs = vec![
            StatementOutput::Command { affected: 1 },
            rows(&["count"], &[&[Some("4")]]),
        ];
        assert_eq!(render_outputs(&outputs), "OK (1 rows affected)\n\ncount\n4");
    }

    #[test]
    fn test_collect_command_only() {
        let outputs = collect_outputs(vec![SimpleQueryMessage::CommandComplete(2)]);
        assert_eq!(outputs, vec![StatementOutput::Command { affected: 2 }]);
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("location_management"), "\"location_management\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
