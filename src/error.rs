//! Error types for the SQLite driver.
//!
//! Failures fall into three disjoint kinds: usage errors raised locally by
//! the driver, configuration errors raised while parsing connection
//! parameters, and engine errors carrying SQLite's result codes. All of them
//! convert into ADBC errors with a matching status code.

use std::backtrace::Backtrace;
use std::fmt::{Display, Formatter};

use libsqlite3_sys as ffi;

/// Result alias used throughout the driver.
pub type Result<T> = std::result::Result<T, SqliteError>;

/// Error type for driver operations.
///
/// Contains the error classification plus a backtrace captured when the
/// error was created.
#[derive(Debug)]
pub struct SqliteError {
    kind: ErrorKind,
    backtrace: Backtrace,
}

impl SqliteError {
    /// Creates a usage error (caller misuse detected without asking the engine).
    pub(crate) fn usage(msg: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Usage(msg.into()),
            backtrace: Backtrace::capture(),
        }
    }

    /// Creates a configuration error (malformed or missing connection parameter).
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Config(msg.into()),
            backtrace: Backtrace::capture(),
        }
    }

    /// Creates an engine error from an extended result code.
    ///
    /// Extended result codes are always enabled on our sessions, so the
    /// basic code is the low byte of the extended one.
    pub(crate) fn engine(extended: i32, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Engine {
                basic: extended & 0xff,
                extended,
                message: message.into(),
            },
            backtrace: Backtrace::capture(),
        }
    }

    /// Returns the backtrace captured when this error was created.
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Returns true if this is a usage error.
    pub fn is_usage(&self) -> bool {
        matches!(self.kind, ErrorKind::Usage(_))
    }

    /// Returns true if this is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self.kind, ErrorKind::Config(_))
    }

    /// Returns true if this error was reported by the engine.
    pub fn is_engine(&self) -> bool {
        matches!(self.kind, ErrorKind::Engine { .. })
    }

    /// Basic SQLite result code, for engine errors.
    pub fn basic_code(&self) -> Option<i32> {
        match &self.kind {
            ErrorKind::Engine { basic, .. } => Some(*basic),
            _ => None,
        }
    }

    /// Extended SQLite result code, for engine errors.
    pub fn extended_code(&self) -> Option<i32> {
        match &self.kind {
            ErrorKind::Engine { extended, .. } => Some(*extended),
            _ => None,
        }
    }

    /// Human-readable message without the kind prefix.
    pub fn message(&self) -> &str {
        match &self.kind {
            ErrorKind::Usage(msg) | ErrorKind::Config(msg) => msg,
            ErrorKind::Engine { message, .. } => message,
        }
    }

    /// Returns the corresponding ADBC status code.
    pub fn adbc_status(&self) -> adbc_core::error::Status {
        use adbc_core::error::Status;

        match &self.kind {
            ErrorKind::Usage(_) => Status::InvalidState,
            ErrorKind::Config(_) => Status::InvalidArguments,
            ErrorKind::Engine { basic, .. } => match *basic {
                ffi::SQLITE_BUSY | ffi::SQLITE_LOCKED | ffi::SQLITE_IOERR => Status::IO,
                ffi::SQLITE_CONSTRAINT => Status::Integrity,
                ffi::SQLITE_NOTFOUND | ffi::SQLITE_CANTOPEN => Status::NotFound,
                ffi::SQLITE_AUTH | ffi::SQLITE_PERM => Status::Unauthorized,
                _ => Status::Internal,
            },
        }
    }
}

impl Display for SqliteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ErrorKind::Usage(msg) => write!(f, "Usage error: {}", msg),
            ErrorKind::Config(msg) => write!(f, "Configuration error: {}", msg),
            ErrorKind::Engine { extended, message, .. } => {
                write!(f, "Engine error ({}): {}", extended, message)
            }
        }
    }
}

impl std::error::Error for SqliteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

#[derive(Debug)]
enum ErrorKind {
    Usage(String),
    Config(String),
    Engine {
        basic: i32,
        extended: i32,
        message: String,
    },
}

/// Converts `SqliteError` to ADBC `Error`.
///
/// Engine errors carry their extended result code as the vendor code.
impl From<SqliteError> for adbc_core::error::Error {
    fn from(err: SqliteError) -> Self {
        let mut error =
            adbc_core::error::Error::with_message_and_status(err.to_string(), err.adbc_status());
        if let Some(code) = err.extended_code() {
            error.vendor_code = code;
        }
        error
    }
}


// Rust guideline compliant 2026-10-19
