pub mod init;

pub use init::{init_tracing, init_tracing_with, TracingGuard, TracingSettings};
