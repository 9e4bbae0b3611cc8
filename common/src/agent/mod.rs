pub mod executor;
pub mod parser;
pub mod prompt;

pub use executor::{generate_answer, generate_sql};
pub use parser::extract_sql;
pub use prompt::{build_answer_prompt, build_sql_prompt};
