pub mod connection;
pub mod executor;

pub use connection::PgConnection;
pub use executor::{PgSqlRunner, SqlRunner, StatementOutput};
