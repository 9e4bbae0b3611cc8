use crate::config::DbConfig;
use crate::db::connection::PgConnection;
use crate::error::Result;
use crate::schema::document::{CatalogColumn, CatalogForeignKey, SchemaDocument};
use tokio_postgres::Client;

const SCHEMATA_QUERY: &str = "SELECT schema_name::text
     FROM information_schema.schemata
     WHERE schema_name NOT IN ('information_schema', 'pg_catalog')";

const COLUMNS_QUERY: &str = "SELECT table_name::text, column_name::text, data_type::text
     FROM information_schema.columns
     WHERE table_schema::text = $1::text
     ORDER BY table_name, ordinal_position";

const FOREIGN_KEYS_QUERY: &str = "SELECT
        tc.table_schema::text AS source_schema,
        tc.table_name::text AS source_table,
        kcu.column_name::text AS source_column,
        ccu.table_schema::text AS target_schema,
        ccu.table_name::text AS target_table,
        ccu.column_name::text AS target_column
     FROM information_schema.table_constraints AS tc
     JOIN information_schema.key_column_usage AS kcu
         ON tc.constraint_name = kcu.constraint_name
         AND tc.table_schema = kcu.table_schema
     JOIN information_schema.constraint_column_usage AS ccu
         ON ccu.constraint_name = tc.constraint_name
         AND ccu.table_schema = tc.table_schema
     WHERE tc.constraint_type = 'FOREIGN KEY'
         AND tc.table_schema::text = ANY($1::text[])";

/// introspect tables, columns and foreign keys of `schemas`.
/// an empty list selects every schema except the two system ones.
#[tracing::instrument(skip(config), fields(db.host = %config.host, db.name = %config.database))]
pub async fn load_schema_definitions(config: &DbConfig, schemas: &[String]) -> Result<SchemaDocument> {
    let conn = PgConnection::open(config).await?;
    let result = introspect(conn.client(), schemas).await;
    conn.close().await;

    let document = result?;
    tracing::info!(tables = document.tables().len(), "schema introspection complete");
    Ok(document)
}

async fn introspect(client: &Client, schemas: &[String]) -> Result<SchemaDocument> {
    let schemas = if schemas.is_empty() {
        let rows = client.query(SCHEMATA_QUERY, &[]).await?;
        let all: Vec<String> = rows.iter().map(|row| row.get(0)).collect();
        tracing::info!("no schemas configured, using all {} user schemas", all.len());
        all
    } else {
        schemas.to_vec()
    };

    let mut columns = Vec::new();
    for schema in &schemas {
        let rows = client.query(COLUMNS_QUERY, &[&schema]).await?;
        tracing::debug!("schema {} returned {} column rows", schema, rows.len());

        columns.extend(rows.iter().map(|row| CatalogColumn {
            schema: schema.clone(),
            table: row.get(0),
            column: row.get(1),
            data_type: row.get(2),
        }));
    }

    let fk_rows = client.query(FOREIGN_KEYS_QUERY, &[&schemas]).await?;
    let foreign_keys = fk_rows.iter().map(|row| CatalogForeignKey {
        source_schema: row.get(0),
        source_table: row.get(1),
        source_column: row.get(2),
        target_schema: row.get(3),
        target_table: row.get(4),
        target_column: row.get(5),
    });

    Ok(SchemaDocument::from_catalog(columns, foreign_keys))
}
