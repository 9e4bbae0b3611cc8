use crate::config::DbConfig;
use crate::error::Result;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls};

/// a single unpooled connection. dropping it (or the client) ends the driver task,
/// so the connection is released on every exit path.
pub struct PgConnection {
    client: Client,
    driver: JoinHandle<()>,
}

impl PgConnection {
    pub async fn open(config: &DbConfig) -> Result<Self> {
        tracing::debug!(
            "connecting to postgres at {}:{}/{}",
            config.host,
            config.port,
            config.database
        );

        let (client, connection) = config.to_pg_config().connect(NoTls).await?;

        // drive the connection in the background until the client goes away
        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("database connection error: {}", e);
            }
        });

        Ok(Self { client, driver })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// drop the client and wait for the driver task to finish the terminate handshake
    pub async fn close(self) {
        let Self { client, driver } = self;
        drop(client);
        if let Err(e) = driver.await {
            tracing::warn!("database driver task failed: {}", e);
        }
    }
}
