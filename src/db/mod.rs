mod mysql_store;
mod schema;

pub use mysql_store::MySqlStore;

use sqlx::MySqlPool;
use tracing::info;

pub async fn init_db(database_url: &str) -> Result<MySqlPool, sqlx::Error> {
    MySqlPool::connect(database_url).await
}

/// Creates any missing table. Safe to run on every start.
pub async fn init_schema(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    for (table, ddl) in schema::TABLES {
        sqlx::query(ddl).execute(pool).await?;
        info!(table, "Table ready");
    }
    Ok(())
}
