//! Connection configuration for the SQLite driver.
//!
//! [`ConnectionInfo`] is the validated parameter set [`crate::open`] takes. It
//! can be built directly, from a `sqlite3://` URI, or from key/value options.
//! `SqliteDatabase` is the ADBC database object holding the same settings as
//! ADBC options.

use std::ffi::CString;
use std::fmt;

use adbc_core::error::{Error as AdbcError, Status};
use adbc_core::options::{OptionConnection, OptionDatabase, OptionValue};
use adbc_core::{Database, Optionable};

use crate::connection::SqliteConnection;
use crate::error::{Result, SqliteError};
use crate::pool::{SqlitePool, SqlitePoolConfig};
use crate::types::OpenFlags;

/// URI scheme this driver registers.
pub const DRIVER_SCHEME: &str = "sqlite3";

/// ADBC option key for the open-mode bitmask.
pub const OPTION_FLAGS: &str = "sqlite3.flags";

/// ADBC option key for the VFS name.
pub const OPTION_VFS: &str = "sqlite3.vfs";

/// Parameters for opening one connection.
///
/// # Example
/// ```ignore
/// let info = ConnectionInfo::from_uri("sqlite3:///var/data/app.db?flags=0x1")?;
/// assert!(info.flags().contains(OpenFlags::READ_ONLY));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    name: String,
    flags: Option<OpenFlags>,
    vfs: Option<String>,
}

impl ConnectionInfo {
    /// Database path or identifier, e.g. a file path or `:memory:`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flags: None,
            vfs: None,
        }
    }

    pub fn with_flags(mut self, flags: OpenFlags) -> Self {
        self.flags = Some(flags);
        self
    }

    pub fn with_vfs(mut self, vfs: impl Into<String>) -> Self {
        self.vfs = Some(vfs.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Flags as given, `READ_WRITE | CREATE` when none were.
    pub fn flags(&self) -> OpenFlags {
        self.flags.unwrap_or_default()
    }

    pub fn vfs(&self) -> Option<&str> {
        self.vfs.as_deref()
    }

    /// Parses `sqlite3://<path>?flags=<int>&vfs=<name>`.
    ///
    /// The scheme may be omitted. Path and query values are percent-decoded.
    /// Unknown query keys are ignored.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let rest = match uri.split_once("://") {
            Some((scheme, rest)) if scheme == DRIVER_SCHEME => rest,
            Some((scheme, _)) => {
                return Err(SqliteError::config(format!(
                    "unsupported URI scheme '{}', expected '{}'",
                    scheme, DRIVER_SCHEME
                )));
            }
            None => uri,
        };

        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rest, None),
        };

        let name = decode(path)?;
        if name.is_empty() {
            return Err(SqliteError::config(format!("URI '{}' has an empty path", uri)));
        }
        let mut info = Self::new(name);

        for pair in query.into_iter().flat_map(|q| q.split('&')).filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = decode(value)?;
            match decode(key)?.as_str() {
                "flags" => info.flags = Some(value.parse()?),
                "vfs" => info.vfs = Some(value),
                other => tracing::debug!(key = other, "ignoring unknown URI parameter"),
            }
        }

        info.validate()?;
        Ok(info)
    }

    /// Builds connection parameters from key/value options.
    ///
    /// Accepted keys are `name` (required), `flags` or `sqlite3.flags`, and
    /// `vfs` or `sqlite3.vfs`. Other keys are ignored.
    pub fn from_options<I, K, V>(options: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut name = None;
        let mut flags = None;
        let mut vfs = None;

        for (key, value) in options {
            match key.as_ref() {
                "name" => name = Some(value.into()),
                "flags" | OPTION_FLAGS => flags = Some(value.into().parse::<OpenFlags>()?),
                "vfs" | OPTION_VFS => vfs = Some(value.into()),
                other => tracing::debug!(key = other, "ignoring unknown connection option"),
            }
        }

        let info = Self {
            name: name.ok_or_else(|| SqliteError::config("missing required option 'name'"))?,
            flags,
            vfs,
        };
        info.validate()?;
        Ok(info)
    }

    /// Checks what can be checked without the engine.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(SqliteError::config("database name is empty"));
        }
        if self.name.contains('\0') {
            return Err(SqliteError::config("database name contains a NUL byte"));
        }
        if self.vfs.as_deref().is_some_and(|vfs| vfs.contains('\0')) {
            return Err(SqliteError::config("VFS name contains a NUL byte"));
        }
        Ok(())
    }

    /// Name and VFS as C strings, after validation.
    pub(crate) fn c_strings(&self) -> Result<(CString, Option<CString>)> {
        self.validate()?;
        let name = CString::new(self.name.as_str())
            .map_err(|e| SqliteError::config(format!("invalid database name: {}", e)))?;
        let vfs = self
            .vfs
            .as_deref()
            .map(CString::new)
            .transpose()
            .map_err(|e| SqliteError::config(format!("invalid VFS name: {}", e)))?;
        Ok((name, vfs))
    }
}

impl fmt::Debug for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionInfo")
            .field("name", &self.name)
            .field("flags", &self.flags())
            .field("vfs", &self.vfs)
            .finish()
    }
}

fn decode(part: &str) -> Result<String> {
    urlencoding::decode(part)
        .map(|s| s.into_owned())
        .map_err(|e| SqliteError::config(format!("invalid percent-encoding in '{}': {}", part, e)))
}

/// ADBC database object.
///
/// Holds the URI (default `:memory:`) plus optional flags and VFS set
/// through ADBC options; options override the URI's query parameters.
#[derive(Debug, Clone)]
pub struct SqliteDatabase {
    /// Database URI, `sqlite3://<path>?flags=..&vfs=..` or a bare path.
    pub uri: String,
    flags: Option<OpenFlags>,
    vfs: Option<String>,
}

impl Default for SqliteDatabase {
    fn default() -> Self {
        Self {
            uri: ":memory:".to_string(),
            flags: None,
            vfs: None,
        }
    }
}

impl SqliteDatabase {
    /// Connection parameters built from the URI and options.
    pub fn connection_info(&self) -> Result<ConnectionInfo> {
        let mut info = ConnectionInfo::from_uri(&self.uri)?;
        if let Some(flags) = self.flags {
            info.flags = Some(flags);
        }
        if let Some(vfs) = &self.vfs {
            info.vfs = Some(vfs.clone());
        }
        info.validate()?;
        Ok(info)
    }

    /// Builds a pool of up to `max_size` connections with this database's
    /// settings.
    ///
    /// # Example
    /// ```ignore
    /// let pool = db.pool(4)?;
    /// let conn = pool.get().await?;
    /// ```
    pub fn pool(&self, max_size: usize) -> adbc_core::error::Result<SqlitePool> {
        let config = SqlitePoolConfig {
            info: self.connection_info()?,
            max_size,
        };
        SqlitePool::with_config(config).map_err(|e| {
            AdbcError::with_message_and_status(
                format!("Failed to create pool: {}", e),
                Status::InvalidArguments,
            )
        })
    }
}

fn is_known(key: &OptionDatabase) -> bool {
    match key {
        OptionDatabase::Uri => true,
        OptionDatabase::Other(name) => name == OPTION_FLAGS || name == OPTION_VFS,
        _ => false,
    }
}

fn unsupported(key: &OptionDatabase) -> AdbcError {
    AdbcError::with_message_and_status(
        format!("Unsupported database option {:?}", key),
        Status::NotImplemented,
    )
}

impl Optionable for SqliteDatabase {
    type Option = OptionDatabase;

    fn set_option(&mut self, key: Self::Option, value: OptionValue) -> adbc_core::error::Result<()> {
        match (&key, value) {
            (OptionDatabase::Uri, OptionValue::String(uri)) => self.uri = uri,
            (OptionDatabase::Other(name), OptionValue::String(flags)) if name == OPTION_FLAGS => {
                self.flags = Some(flags.parse()?);
            }
            (OptionDatabase::Other(name), OptionValue::Int(bits)) if name == OPTION_FLAGS => {
                let bits = i32::try_from(bits).map_err(|_| {
                    SqliteError::config(format!("flags value {} out of range", bits))
                })?;
                self.flags = Some(OpenFlags::from_bits_retain(bits));
            }
            (OptionDatabase::Other(name), OptionValue::String(vfs)) if name == OPTION_VFS => {
                self.vfs = Some(vfs);
            }
            _ if is_known(&key) => {
                return Err(SqliteError::config(format!(
                    "unexpected value type for database option {:?}",
                    key
                ))
                .into());
            }
            _ => return Err(unsupported(&key)),
        }
        Ok(())
    }

    fn get_option_string(&self, key: Self::Option) -> adbc_core::error::Result<String> {
        match &key {
            OptionDatabase::Uri => Ok(self.uri.clone()),
            OptionDatabase::Other(name) if name == OPTION_FLAGS => {
                Ok(self.flags.unwrap_or_default().bits().to_string())
            }
            OptionDatabase::Other(name) if name == OPTION_VFS => self.vfs.clone().ok_or_else(|| {
                AdbcError::with_message_and_status("No VFS option set", Status::NotFound)
            }),
            _ => Err(unsupported(&key)),
        }
    }

    fn get_option_bytes(&self, key: Self::Option) -> adbc_core::error::Result<Vec<u8>> {
        Err(unsupported(&key))
    }

    fn get_option_double(&self, key: Self::Option) -> adbc_core::error::Result<f64> {
        Err(unsupported(&key))
    }

    fn get_option_int(&self, key: Self::Option) -> adbc_core::error::Result<i64> {
        match &key {
            OptionDatabase::Other(name) if name == OPTION_FLAGS => {
                Ok(i64::from(self.flags.unwrap_or_default().bits()))
            }
            _ => Err(unsupported(&key)),
        }
    }
}

impl Database for SqliteDatabase {
    type ConnectionType = SqliteConnection;

    fn new_connection(&self) -> adbc_core::error::Result<Self::ConnectionType> {
        self.new_connection_with_opts(std::iter::empty())
    }

    fn new_connection_with_opts(
        &self,
        opts: impl IntoIterator<Item = (OptionConnection, OptionValue)>,
    ) -> adbc_core::error::Result<Self::ConnectionType> {
        let info = self.connection_info()?;
        let mut conn = crate::open(&info)?;
        for (key, value) in opts {
            conn.set_option(key, value)?;
        }
        Ok(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_uri_full() {
        let info = ConnectionInfo::from_uri("sqlite3:///tmp/my%20db.sqlite?flags=1&vfs=unix-dotfile")
            .unwrap();
        assert_eq!(info.name(), "/tmp/my db.sqlite");
        assert_eq!(info.flags(), OpenFlags::READ_ONLY);
        assert_eq!(info.vfs(), Some("unix-dotfile"));
    }

    #[test]
    fn test_from_uri_without_scheme() {
        let info = ConnectionInfo::from_uri("test.db").unwrap();
        assert_eq!(info.name(), "test.db");
        assert_eq!(info.flags(), OpenFlags::READ_WRITE | OpenFlags::CREATE);
        assert_eq!(info.vfs(), None);
    }

    #[test]
    fn test_from_uri_hex_flags_and_unknown_keys() {
        let info = ConnectionInfo::from_uri("sqlite3://:memory:?flags=0x6&cache=shared").unwrap();
        assert_eq!(info.name(), ":memory:");
        assert_eq!(info.flags(), OpenFlags::READ_WRITE | OpenFlags::CREATE);
    }

    #[test]
    fn test_from_uri_errors() {
        assert!(ConnectionInfo::from_uri("postgres://localhost/db").unwrap_err().is_config());
        assert!(ConnectionInfo::from_uri("sqlite3://").unwrap_err().is_config());
        assert!(ConnectionInfo::from_uri("sqlite3://?flags=2").unwrap_err().is_config());
        assert!(ConnectionInfo::from_uri("sqlite3://x.db?flags=rw").unwrap_err().is_config());
        assert!(ConnectionInfo::from_uri("sqlite3://x%00.db").unwrap_err().is_config());
    }

    #[test]
    fn test_from_options() {
        let info = ConnectionInfo::from_options([
            ("name", "app.db"),
            ("sqlite3.flags", "0x1"),
            ("vfs", "unix"),
            ("timeout", "ignored"),
        ])
        .unwrap();
        assert_eq!(info.name(), "app.db");
        assert_eq!(info.flags(), OpenFlags::READ_ONLY);
        assert_eq!(info.vfs(), Some("unix"));

        let err = ConnectionInfo::from_options([("flags", "2")]).unwrap_err();
        assert!(err.is_config());
        let err = ConnectionInfo::from_options([("name", "")]).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_default_database() {
        let db = SqliteDatabase::default();
        assert_eq!(db.uri, ":memory:");
        assert_eq!(db.connection_info().unwrap().name(), ":memory:");
    }

    #[test]
    fn test_options_override_uri() {
        let mut db = SqliteDatabase::default();
        db.set_option(OptionDatabase::Uri, OptionValue::String("sqlite3://a.db?flags=6".into()))
            .unwrap();
        db.set_option(OptionDatabase::Other(OPTION_FLAGS.into()), OptionValue::Int(1))
            .unwrap();
        db.set_option(OptionDatabase::Other(OPTION_VFS.into()), OptionValue::String("unix".into()))
            .unwrap();

        let info = db.connection_info().unwrap();
        assert_eq!(info.name(), "a.db");
        assert_eq!(info.flags(), OpenFlags::READ_ONLY);
        assert_eq!(info.vfs(), Some("unix"));
        assert_eq!(db.get_option_int(OptionDatabase::Other(OPTION_FLAGS.into())).unwrap(), 1);
    }

    #[test]
    fn test_unsupported_options() {
        let mut db = SqliteDatabase::default();
        let err = db
            .set_option(OptionDatabase::Username, OptionValue::String("root".into()))
            .unwrap_err();
        assert_eq!(err.status, Status::NotImplemented);

        let err = db
            .set_option(OptionDatabase::Uri, OptionValue::Int(3))
            .unwrap_err();
        assert_eq!(err.status, Status::InvalidArguments);
    }

    #[test]
    fn test_new_connection() {
        let db = SqliteDatabase::default();
        let conn = db.new_connection().unwrap();
        assert!(!conn.is_closed());
    }
}

// Rust guideline compliant 2026-10-19
