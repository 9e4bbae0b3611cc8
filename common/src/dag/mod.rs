pub mod executor;
pub mod graph;
pub mod state;
pub mod task;

pub use executor::DagExecutor;
pub use graph::Dag;
pub use state::QaState;
pub use task::{build_sql_qa_pipeline, Task, TaskContext, TaskOutput, TaskResult};
