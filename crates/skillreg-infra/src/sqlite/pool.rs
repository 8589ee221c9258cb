//! Database pool with split reader/writer connections in WAL mode.
//!
//! SQLite allows only one writer at a time. `DatabasePool` pairs a
//! multi-connection reader pool for concurrent SELECTs with a
//! single-connection writer pool for serialized INSERT/UPDATE/DELETE.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

#[derive(Clone)]
pub struct DatabasePool {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Opens both pools and runs migrations on the writer before the
    /// reader pool is allowed to connect.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let base_opts = SqliteConnectOptions::from_str(database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(std::time::Duration::from_secs(5))
            .create_if_missing(true);

        let read_opts = base_opts.clone().read_only(true);
        let write_opts = base_opts;

        let writer = SqlitePoolOptions::new().max_connections(1).connect_with(write_opts).await?;

        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new().max_connections(8).connect_with(read_opts).await?;

        Ok(Self { reader, writer })
    }
}

/// `sqlite://{data_dir}/skillreg.db`, honoring `SKILLREG_DATA_DIR`.
pub fn default_database_url() -> String {
    let data_dir = crate::config::default_data_dir();
    format!("sqlite://{}/skillreg.db", data_dir.display())
}
