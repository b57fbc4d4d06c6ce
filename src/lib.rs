//! ADBC-SQLite3: SQLite driver with a connection/statement/cursor API and an
//! Arrow Database Connectivity facade.
//!
//! The core is a thin layer over SQLite's C interface: open a connection,
//! compile a statement once, execute it with positional text parameters as
//! often as needed, and walk the rows through a cursor. Every value crosses
//! the boundary as text; SQL NULL reads as the empty string.
//!
//! # Features
//!
//! - Pull cursors, classic `more`/`fetch` result sets and a push stream
//! - Backend-neutral traits in [`dbapi`]
//! - Connection parameters from a struct, a `sqlite3://` URI or options
//! - ADBC Core API over the same protocol, results as `Utf8` Arrow batches
//! - Connection pooling via `deadpool`
//!
//! # Quick Start
//!
//! ```ignore
//! use adbc_sqlite3::ConnectionInfo;
//!
//! let conn = adbc_sqlite3::open(&ConnectionInfo::from_uri("sqlite3://app.db")?)?;
//! let mut stmt = conn.prepare("SELECT id, name FROM users WHERE id > ?")?;
//!
//! if let Some(mut cursor) = conn.execute(&mut stmt, &["10"])? {
//!     for row in cursor.fetch_all()? {
//!         println!("{} {}", row[0], row[1]);
//!     }
//! }
//! stmt.close()?;
//! ```
//!
//! # ADBC
//!
//! ```ignore
//! use adbc_core::{Connection, Database, Driver, Statement};
//! use adbc_core::options::{OptionDatabase, OptionValue};
//!
//! let mut driver = adbc_sqlite3::SqliteDriver::default();
//! let db = driver.new_database_with_opts([(
//!     OptionDatabase::Uri,
//!     OptionValue::String("sqlite3://app.db".to_string()),
//! )])?;
//!
//! let mut conn = db.new_connection()?;
//! let mut stmt = conn.new_statement()?;
//! stmt.set_sql_query("SELECT * FROM users")?;
//! for batch in stmt.execute()? {
//!     println!("Got {} rows", batch?.num_rows());
//! }
//! ```
//!
//! # Module Structure
//!
//! - [`driver`]: `open`, `version` and the ADBC driver
//! - [`database`]: Connection parameters and URI parsing
//! - [`connection`]: Active connection, core protocol and ADBC metadata
//! - [`statement`]: Compiled, reusable statements
//! - [`cursor`]: Cursors, result sets and the push stream
//! - [`query`]: ADBC statement
//! - [`reader`]: Arrow RecordBatch streaming
//! - [`pool`]: Connection pooling utilities
//! - [`error`]: Error types

pub mod connection;
pub mod cursor;
pub mod database;
pub mod dbapi;
pub mod driver;
mod engine;
pub mod error;
pub mod pool;
pub mod query;
pub mod reader;
pub mod statement;
pub mod types;
pub mod utils;

pub use connection::SqliteConnection;
pub use cursor::{Cursor, FetchResult, NamedRow, ResultSet, ResultStream, Row};
pub use database::{ConnectionInfo, DRIVER_SCHEME, SqliteDatabase};
pub use driver::{SqliteDriver, open, version};
pub use engine::{DEFAULT_BUSY_TIMEOUT, initialize};
pub use error::{Result, SqliteError};
pub use pool::{PooledSqliteConnection, SqlitePool, SqlitePoolConfig};
pub use query::QueryStatement;
pub use statement::SqliteStatement;
pub use types::OpenFlags;
pub use utils::Runtime;
