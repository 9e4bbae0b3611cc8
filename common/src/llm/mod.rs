pub mod gemini;
pub mod model;
pub mod provider;

pub use gemini::GeminiClient;
pub use model::{CompletionClient, ModelConfig};
pub use provider::{build_completion_client, Provider};
