pub mod agent;
pub mod chat;
pub mod config;
pub mod dag;
pub mod db;
pub mod error;
pub mod llm;
pub mod schema;
pub mod tracing;

pub use chat::{SqlChatBot, Transcript};
pub use config::AppConfig;
pub use error::{Result, SqlChatError};
