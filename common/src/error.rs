use thiserror::Error;

#[derive(Error, Debug)]
pub enum SqlChatError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("llm error: {0}")]
    Llm(String),

    #[error("unsupported llm provider: {0}")]
    UnsupportedProvider(String),

    #[error("task error: {0}")]
    Task(String),

    #[error("tracing initialization failed: {0}")]
    Tracing(String),
}

pub type Result<T> = std::result::Result<T, SqlChatError>;
