use crate::dag::task::TaskOutput;

/// state of one question/answer turn as it moves through the pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QaState {
    pub question: String,
    pub chat_history: String,
    pub sql_query: Option<String>,
    pub results: Option<String>,
    pub answer: Option<String>,
}

impl QaState {
    pub fn new(question: impl Into<String>, chat_history: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            chat_history: chat_history.into(),
            ..Self::default()
        }
    }

    /// merge a task's output into the state
    pub fn apply(&mut self, output: TaskOutput) {
        match output {
            TaskOutput::Sql(sql) => self.sql_query = Some(sql),
            TaskOutput::Results(results) => self.results = Some(results),
            TaskOutput::Answer(answer) => self.answer = Some(answer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_outputs() {
        let mut state = QaState::new("list all locations", "");
        assert!(state.sql_query.is_none());

        state.apply(TaskOutput::Sql("SELECT * FROM locations".to_string()));
        state.apply(TaskOutput::Results("id | name".to_string()));

        assert_eq!(state.sql_query.as_deref(), Some("SELECT * FROM locations"));
        assert_eq!(state.results.as_deref(), Some("id | name"));
        assert!(state.answer.is_none());

        state.apply(TaskOutput::Answer("none".to_string()));
        assert_eq!(state.answer.as_deref(), Some("none"));
    }
}
