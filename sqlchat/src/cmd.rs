use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sqlchat")]
#[command(about = "ask questions about a postgres database in plain language", long_about = None)]
pub struct Cli {
    /// Environment file with database and api credentials
    #[arg(long, default_value = common::config::DEFAULT_ENV_FILE)]
    env_file: PathBuf,

    /// Schemas to introspect (repeatable; overrides SQLCHAT_SCHEMAS)
    #[arg(long = "schema")]
    schemas: Vec<String>,

    /// Schema generated queries run against
    #[arg(long, env = "SQLCHAT_TARGET_SCHEMA")]
    target_schema: Option<String>,

    /// LLM provider id
    #[arg(long, env = "SQLCHAT_PROVIDER")]
    provider: Option<String>,

    /// Model identifier passed to the provider
    #[arg(long, env = "SQLCHAT_MODEL")]
    model: Option<String>,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        use common::tracing::init_tracing;
        use common::AppConfig;

        // the env file may carry RUST_LOG and the log settings
        let env_loaded = AppConfig::load_env_file(&self.env_file);
        let _guard = init_tracing("sqlchat")?;

        let result = async {
            match env_loaded? {
                true => tracing::info!("loaded environment from {}", self.env_file.display()),
                false => tracing::debug!("no env file at {}", self.env_file.display()),
            }

            let mut config = AppConfig::from_env()?;
            self.apply_overrides(&mut config);

            let mut bot = build_chatbot(&config).await?;

            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            bot.chat(stdin, tokio::io::stdout()).await?;

            Ok::<_, anyhow::Error>(())
        }
        .await;

        if let Err(e) = &result {
            tracing::error!("unhandled error in the main application: {:#}", e);
        }
        result
    }

    fn apply_overrides(&self, config: &mut common::AppConfig) {
        if !self.schemas.is_empty() {
            config.schemas = self.schemas.clone();
        }
        if let Some(target_schema) = &self.target_schema {
            config.target_schema = target_schema.clone();
        }
        if let Some(provider) = &self.provider {
            config.llm.provider = provider.clone();
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
    }
}

/// wire the model, schema document and runner into a chatbot.
/// the completion client is built first so missing credentials fail
/// before the database is contacted.
async fn build_chatbot(config: &common::AppConfig) -> Result<common::SqlChatBot> {
    use common::db::PgSqlRunner;
    use common::llm::build_completion_client;
    use common::schema::load_schema_definitions;
    use std::sync::Arc;

    tracing::info!("initializing chatbot components");

    let model = build_completion_client(&config.llm)?;

    let schema = load_schema_definitions(&config.db, &config.schemas)
        .await
        .context("failed to load schema definitions")?;

    let runner = Arc::new(PgSqlRunner::new(config.db.clone(), &config.target_schema));

    let bot = common::SqlChatBot::new(&schema, model, runner)?;
    tracing::info!("chatbot initialized successfully");
    Ok(bot)
}
