//! Common utilities for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use adbc_core::{Database, Driver, Optionable};
use adbc_sqlite3::{ConnectionInfo, SqliteConnection, SqliteDriver};

/// Test configuration loaded from environment.
pub struct TestConfig {
    /// Parent directory for scratch databases; the system temp dir if unset.
    pub scratch_root: Option<PathBuf>,
}

impl TestConfig {
    /// Loads test configuration from environment variables.
    ///
    /// Falls back to defaults if variables are not set.
    pub fn from_env() -> Self {
        // Try to load .env file first
        let _ = dotenvy::dotenv();

        Self {
            scratch_root: std::env::var_os("SQLITE3_TEST_DIR").map(PathBuf::from),
        }
    }
}

impl Default for TestConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Per-test directory for database files, removed when dropped.
pub struct Scratch {
    dir: tempfile::TempDir,
}

impl Scratch {
    pub fn new() -> Self {
        let config = TestConfig::default();
        let dir = match config.scratch_root {
            Some(root) => {
                std::fs::create_dir_all(&root).expect("Failed to create SQLITE3_TEST_DIR");
                tempfile::tempdir_in(root)
            }
            None => tempfile::tempdir(),
        }
        .expect("Failed to create scratch directory");
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a database file inside the scratch directory.
    pub fn db_path(&self, file: &str) -> PathBuf {
        self.dir.path().join(file)
    }

    /// `sqlite3://` URI for a database file inside the scratch directory.
    pub fn uri(&self, file: &str) -> String {
        let path = self.db_path(file);
        format!("sqlite3://{}", urlencoding::encode(&path.to_string_lossy()))
    }

    pub fn info(&self, file: &str) -> ConnectionInfo {
        ConnectionInfo::new(self.db_path(file).to_string_lossy().into_owned())
    }
}

/// Installs a `tracing` subscriber honoring `RUST_LOG`, once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Opens a connection to `file` in a fresh scratch directory.
///
/// The scratch directory must outlive the connection.
pub fn create_test_connection(file: &str) -> (Scratch, SqliteConnection) {
    init_tracing();
    let scratch = Scratch::new();
    let conn = adbc_sqlite3::open(&scratch.info(file)).expect("Failed to open connection");
    (scratch, conn)
}

/// Opens `file` through the ADBC driver and database objects.
pub fn create_adbc_connection(scratch: &Scratch, file: &str) -> SqliteConnection {
    let mut driver = SqliteDriver::default();

    let mut db = driver.new_database().expect("Failed to create database");
    db.set_option(
        adbc_core::options::OptionDatabase::Uri,
        adbc_core::options::OptionValue::String(scratch.uri(file)),
    )
    .expect("Failed to set URI");

    db.new_connection().expect("Failed to create connection")
}

/// Creates `users (id, name)` holding a single row.
pub fn create_users_table(conn: &SqliteConnection) {
    conn.execute_direct(
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
        &[] as &[&str],
    )
    .expect("Failed to create users table");
    conn.execute_direct("INSERT INTO users (id, name) VALUES (?, ?)", &["1", "alice"])
        .expect("Failed to insert user");
}
