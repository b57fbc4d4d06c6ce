//! Driver entry points: opening connections and reporting the engine version.

use std::collections::HashMap;

use adbc_core::{Driver, Optionable, options::OptionValue};

use crate::connection::SqliteConnection;
use crate::database::{ConnectionInfo, SqliteDatabase};
use crate::engine::{self, Session};
use crate::error::Result;

/// Opens a connection.
///
/// Switches the engine into serialized mode first (once per process). The
/// no-mutex flag is always cleared and the full-mutex flag set, whatever the
/// caller asked for. Every connection gets the default busy timeout and
/// extended result codes.
///
/// # Example
/// ```ignore
/// let conn = adbc_sqlite3::open(&ConnectionInfo::new("app.db"))?;
/// ```
pub fn open(info: &ConnectionInfo) -> Result<SqliteConnection> {
    let (name, vfs) = info.c_strings()?;
    engine::initialize()?;

    let flags = info.flags().serialized();
    let session = Session::open(&name, flags.bits(), vfs.as_deref())?;
    tracing::debug!(name = info.name(), ?flags, vfs = info.vfs(), "connection opened");

    Ok(SqliteConnection::new(session))
}

/// Reports the linked engine's version.
///
/// Keys: `version`, `sqlite3.versionnumber`, and `sqlite3.sourceid` when the
/// engine reports one.
pub fn version() -> Result<HashMap<String, String>> {
    let linked = engine::library_version();

    let mut info = HashMap::new();
    info.insert("version".to_string(), linked.version.unwrap_or_default());
    info.insert("sqlite3.versionnumber".to_string(), linked.number.to_string());
    if let Some(source_id) = linked.source_id {
        info.insert("sqlite3.sourceid".to_string(), source_id);
    }
    Ok(info)
}

#[derive(Default)]
pub struct SqliteDriver {}

impl Driver for SqliteDriver {
    type DatabaseType = SqliteDatabase;

    fn new_database(&mut self) -> adbc_core::error::Result<Self::DatabaseType> {
        Ok(Self::DatabaseType::default())
    }

    fn new_database_with_opts(
        &mut self,
        opts: impl IntoIterator<Item = (<Self::DatabaseType as Optionable>::Option, OptionValue)>,
    ) -> adbc_core::error::Result<Self::DatabaseType> {
        let mut database = Self::DatabaseType::default();
        for (key, value) in opts {
            database.set_option(key, value)?;
        }
        Ok(database)
    }
}
