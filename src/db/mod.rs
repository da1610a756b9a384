use std::{
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    SqlitePool,
};

use tracing::{debug, info};

use crate::core::errors::{AppError, AppResult};

pub mod repositories;

const DB_FILE_NAME: &str = "sectionmap.sqlite";
const FILE_POOL_SIZE: u32 = 10;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(data_dir: &Path) -> AppResult<Self> {
        std::fs::create_dir_all(data_dir)?;
        let db_path = database_path(data_dir);
        let options = SqliteConnectOptions::from_str(&format!(
            "sqlite:{}",
            db_path.to_string_lossy().replace('\\', "/")
        ))
        .map_err(|err| AppError::Database(format!("bad database path {}: {err}", db_path.display())))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal);
        let db = Self::connect(options, SqlitePoolOptions::new().max_connections(FILE_POOL_SIZE)).await?;
        info!(path = %db_path.display(), "document store opened");
        Ok(db)
    }

    /// Private store for tests and one-shot runs. A single pinned connection keeps the
    /// in-memory database alive for the pool's lifetime.
    pub async fn in_memory() -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool_options = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
        Self::connect(options, pool_options).await
    }

    async fn connect(options: SqliteConnectOptions, pool_options: SqlitePoolOptions) -> AppResult<Self> {
        let options = options.foreign_keys(true).busy_timeout(BUSY_TIMEOUT);
        let pool = pool_options.connect_with(options).await?;
        sqlx::migrate!("./src/db/migrations").run(&pool).await?;
        debug!("database migrations applied");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

pub fn database_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DB_FILE_NAME)
}
