//! Connection pool for SQLite.
//!
//! Hands out [`SqliteConnection`]s opened from one [`ConnectionInfo`]. Note
//! that every `:memory:` connection is its own private database, so pooling
//! only shares data when the name points at a file.

use async_trait::async_trait;
use deadpool::managed::{Manager, Metrics, Object, Pool, PoolError, RecycleError};

use crate::connection::SqliteConnection;
use crate::database::ConnectionInfo;
use crate::error::SqliteError;

/// Configuration for a SQLite connection pool.
#[derive(Debug, Clone)]
pub struct SqlitePoolConfig {
    /// Parameters every pooled connection is opened with
    pub info: ConnectionInfo,
    /// Maximum pool size (default: 16)
    pub max_size: usize,
}

impl Default for SqlitePoolConfig {
    fn default() -> Self {
        Self {
            info: ConnectionInfo::new(":memory:"),
            max_size: 16,
        }
    }
}

/// Pooled connection; returned to the pool when dropped.
pub type PooledSqliteConnection = Object<SqlitePoolManager>;

/// deadpool manager opening and health-checking connections.
#[derive(Debug)]
pub struct SqlitePoolManager {
    info: ConnectionInfo,
}

impl SqlitePoolManager {
    pub fn new(info: ConnectionInfo) -> Self {
        Self { info }
    }
}

#[async_trait]
impl Manager for SqlitePoolManager {
    type Type = SqliteConnection;
    type Error = SqliteError;

    async fn create(&self) -> Result<Self::Type, Self::Error> {
        crate::open(&self.info)
    }

    async fn recycle(&self, conn: &mut Self::Type, _: &Metrics) -> Result<(), RecycleError<Self::Error>> {
        if conn.is_closed() {
            return Err(RecycleError::StaticMessage("pooled connection was closed"));
        }
        conn.execute_direct("SELECT 1", &[] as &[&str])
            .map_err(RecycleError::Backend)?;
        Ok(())
    }
}

/// SQLite connection pool.
///
/// # Example
/// ```ignore
/// let pool = SqlitePool::new(ConnectionInfo::new("app.db"))?;
/// let conn = pool.get().await?;
/// let rows = conn.execute_direct("SELECT count(*) FROM users", &[] as &[&str])?;
/// // Connection is returned to pool when dropped
/// ```
#[derive(Clone)]
pub struct SqlitePool {
    pool: Pool<SqlitePoolManager>,
}

impl std::fmt::Debug for SqlitePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlitePool")
            .field("status", &self.pool.status())
            .finish()
    }
}

impl SqlitePool {
    /// Creates a pool with the default size.
    ///
    /// # Errors
    /// Returns error if pool configuration fails
    pub fn new(info: ConnectionInfo) -> Result<Self, deadpool::managed::BuildError> {
        Self::with_config(SqlitePoolConfig {
            info,
            ..Default::default()
        })
    }

    /// Creates a pool with custom configuration.
    ///
    /// # Errors
    /// Returns error if pool configuration fails
    pub fn with_config(config: SqlitePoolConfig) -> Result<Self, deadpool::managed::BuildError> {
        let manager = SqlitePoolManager::new(config.info);

        let pool = Pool::builder(manager).max_size(config.max_size).build()?;

        Ok(Self { pool })
    }

    /// Gets a connection from the pool, opening one if none is idle.
    ///
    /// # Errors
    /// Returns the open error if a new connection could not be created
    pub async fn get(&self) -> Result<PooledSqliteConnection, SqliteError> {
        self.pool.get().await.map_err(|e| match e {
            PoolError::Backend(e) => e,
            PoolError::Timeout(e) => SqliteError::usage(format!("Pool timeout: {:?}", e)),
            PoolError::Closed => SqliteError::usage("Pool closed"),
            PoolError::NoRuntimeSpecified => SqliteError::usage("No runtime specified"),
            PoolError::PostCreateHook(_) => SqliteError::usage("Post create hook failed"),
        })
    }

    /// Returns pool status information.
    pub fn status(&self) -> deadpool::Status {
        self.pool.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_config_default() {
        let config = SqlitePoolConfig::default();
        assert_eq!(config.max_size, 16);
        assert_eq!(config.info.name(), ":memory:");
    }

    #[tokio::test]
    async fn test_pool_hands_out_working_connections() {
        let pool = SqlitePool::new(ConnectionInfo::new(":memory:")).unwrap();
        let conn = pool.get().await.unwrap();
        let rows = conn.execute_direct("SELECT 40 + 2", &[] as &[&str]).unwrap();
        assert_eq!(rows, vec![vec!["42"]]);
        assert_eq!(pool.status().size, 1);
    }

    #[tokio::test]
    async fn test_closed_connection_is_not_recycled() {
        let pool = SqlitePool::with_config(SqlitePoolConfig {
            max_size: 1,
            ..Default::default()
        })
        .unwrap();

        {
            let mut conn = pool.get().await.unwrap();
            conn.close().unwrap();
        }

        // the closed connection is discarded and a fresh one opened
        let conn = pool.get().await.unwrap();
        assert!(!conn.is_closed());
    }

    #[tokio::test]
    async fn test_open_error_surfaces() {
        let pool = SqlitePool::new(ConnectionInfo::new("")).unwrap();
        let err = pool.get().await.unwrap_err();
        assert!(err.is_config());
    }
}

// Rust guideline compliant 2026-10-19
