use crate::error::{Result, SqlChatError};
use std::collections::HashMap;

/// task dependency graph for the turn pipeline
#[derive(Debug, Clone)]
pub struct Dag {
    /// task_id -> list of task_ids it depends on
    dependencies: HashMap<String, Vec<String>>,
}

impl Dag {
    pub fn new() -> Self {
        Self {
            dependencies: HashMap::new(),
        }
    }

    /// add a task with its dependencies
    pub fn add_task(&mut self, id: String, dependencies: Vec<String>) {
        self.dependencies.insert(id, dependencies);
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// every dependency must name a known task and the graph must be acyclic
    pub fn validate(&self) -> Result<()> {
        for (task_id, deps) in &self.dependencies {
            if let Some(dep) = deps.iter().find(|d| !self.dependencies.contains_key(*d)) {
                return Err(SqlChatError::Task(format!(
                    "task '{}' depends on non-existent task '{}'",
                    task_id, dep
                )));
            }
        }

        self.topological_levels().map(|_| ())
    }

    /// returns tasks grouped by execution level using kahn's algorithm
    /// level 0: tasks with no dependencies
    /// level 1: tasks that depend only on level 0 tasks
    /// etc.
    pub fn topological_levels(&self) -> Result<Vec<Vec<String>>> {
        // in-degree is the number of unfinished dependencies of each task
        let mut in_degree: HashMap<&str, usize> = self
            .dependencies
            .iter()
            .map(|(id, deps)| (id.as_str(), deps.len()))
            .collect();

        // start with tasks that have no dependencies
        let mut ready: Vec<&str> = in_degree
            .iter()
            .filter(|(_, &degree)| degree == 0)
            .map(|(&id, _)| id)
            .collect();

        let mut levels: Vec<Vec<String>> = Vec::new();
        let mut processed = 0;

        while !ready.is_empty() {
            // deterministic order within a level
            ready.sort_unstable();
            processed += ready.len();

            let mut next = Vec::new();
            for task_id in &ready {
                // release tasks whose last dependency just finished
                for (id, deps) in &self.dependencies {
                    if deps.iter().any(|d| d == task_id) {
                        if let Some(degree) = in_degree.get_mut(id.as_str()) {
                            *degree -= 1;
                            if *degree == 0 {
                                next.push(id.as_str());
                            }
                        }
                    }
                }
            }

            levels.push(ready.iter().map(|id| id.to_string()).collect());
            ready = next;
        }

        // verify all tasks were processed
        if processed != self.dependencies.len() {
            return Err(SqlChatError::Task(
                "dag contains a cycle".to_string(),
            ));
        }

        Ok(levels)
    }
}

impl Default for Dag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dag(edges: &[(&str, &[&str])]) -> Dag {
        let mut dag = Dag::new();
        for (id, deps) in edges {
            dag.add_task(id.to_string(), deps.iter().map(|d| d.to_string()).collect());
        }
        dag
    }

    #[test]
    fn test_independent_tasks_share_a_level() {
        let dag = dag(&[("load_schema", &[]), ("warm_model", &[])]);

        assert_eq!(
            dag.topological_levels().unwrap(),
            vec![vec!["load_schema", "warm_model"]]
        );
    }

    #[test]
    fn test_chain_runs_one_task_per_level() {
        let dag = dag(&[
            ("generate_answer", &["execute_sql"]),
            ("execute_sql", &["generate_sql"]),
            ("generate_sql", &[]),
        ]);

        assert!(dag.validate().is_ok());
        assert_eq!(
            dag.topological_levels().unwrap(),
            vec![vec!["generate_sql"], vec!["execute_sql"], vec!["generate_answer"]]
        );
    }

    #[test]
    fn test_fan_out_and_join() {
        let dag = dag(&[
            ("generate", &[]),
            ("left", &["generate"]),
            ("right", &["generate"]),
            ("join", &["left", "right"]),
        ]);

        assert_eq!(
            dag.topological_levels().unwrap(),
            vec![vec!["generate"], vec!["left", "right"], vec!["join"]]
        );
    }

    #[test]
    fn test_cycle_is_rejected() {
        let dag = dag(&[
            ("generate_sql", &[]),
            ("execute_sql", &["generate_sql", "generate_answer"]),
            ("generate_answer", &["execute_sql"]),
        ]);

        match dag.validate() {
            Err(SqlChatError::Task(msg)) => assert_eq!(msg, "dag contains a cycle"),
            other => panic!("expected cycle error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_dependency_is_named() {
        let dag = dag(&[("execute_sql", &["generate_sql"])]);

        match dag.validate() {
            Err(SqlChatError::Task(msg)) => assert!(msg.contains("'generate_sql'")),
            other => panic!("expected missing task error, got {:?}", other),
        }
    }
}
