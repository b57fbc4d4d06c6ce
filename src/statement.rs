//! Compiled SQL statements.
//!
//! A `SqliteStatement` is compiled once by [`SqliteConnection::prepare`] and
//! can be executed any number of times. It owns no result state: iteration
//! state lives in the [`Cursor`] or [`ResultSet`] borrowing it.
//!
//! [`SqliteConnection::prepare`]: crate::SqliteConnection::prepare
//! [`Cursor`]: crate::Cursor
//! [`ResultSet`]: crate::ResultSet

use std::collections::HashMap;
use std::ffi::c_int;
use std::fmt;
use std::sync::Arc;

use libsqlite3_sys as ffi;

use crate::cursor::{NamedRow, Row};
use crate::engine::{RawStatement, Session};
use crate::error::{Result, SqliteError};

/// Outcome of one successful evaluation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// A row is available for reading.
    Row,
    /// Evaluation finished; the statement has been reset and cleared.
    Done,
}

/// SQL statement compiled against one connection.
#[derive(Debug)]
pub struct SqliteStatement {
    session: Arc<Session>,
    raw: Option<RawStatement>,
    parameter_count: usize,
}

impl SqliteStatement {
    /// Compiles `sql` on `session`.
    ///
    /// Text that compiles to no statement at all (empty, or only comments)
    /// is a usage error, as is text holding a NUL byte.
    pub(crate) fn prepare(session: &Arc<Session>, sql: &str) -> Result<Self> {
        if sql.contains('\0') {
            return Err(SqliteError::usage("prepare: SQL text contains a NUL byte"));
        }
        let raw = session
            .prepare(sql)?
            .ok_or_else(|| SqliteError::usage("prepare: SQL text holds no statement"))?;
        tracing::debug!(sql, "statement prepared");

        let parameter_count = raw.parameter_count();
        Ok(Self {
            session: Arc::clone(session),
            raw: Some(raw),
            parameter_count,
        })
    }

    fn raw(&self) -> Result<&RawStatement> {
        self.raw
            .as_ref()
            .ok_or_else(|| SqliteError::usage("statement is closed"))
    }

    fn raw_mut(&mut self) -> Result<&mut RawStatement> {
        self.raw
            .as_mut()
            .ok_or_else(|| SqliteError::usage("statement is closed"))
    }

    pub(crate) fn belongs_to(&self, session: &Arc<Session>) -> bool {
        Arc::ptr_eq(&self.session, session)
    }

    /// Returns true once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.raw.is_none()
    }

    /// Number of `?` parameter slots in the statement.
    pub fn parameter_count(&self) -> Result<usize> {
        self.raw()?;
        Ok(self.parameter_count)
    }

    /// Number of columns in the statement's result.
    pub fn column_count(&self) -> Result<usize> {
        Ok(self.raw()?.column_count())
    }

    /// Result column names, taken from the compiled query rather than the data.
    pub fn column_names(&self) -> Result<Vec<String>> {
        let raw = self.raw()?;
        Ok((0..raw.column_count()).map(|i| raw.column_name(i)).collect())
    }

    /// SQL text of the statement, as recovered from the engine.
    pub fn sql(&self) -> Result<String> {
        Ok(self.raw()?.sql())
    }

    /// Finalizes the compiled query.
    ///
    /// The engine handle is released even when finalizing reports an error.
    /// Any operation after `close` fails with a usage error.
    pub fn close(&mut self) -> Result<()> {
        let raw = self
            .raw
            .take()
            .ok_or_else(|| SqliteError::usage("close: statement is already closed"))?;

        if raw.finalize() != ffi::SQLITE_OK {
            return Err(self.session.last_error());
        }
        tracing::debug!("statement finalized");
        Ok(())
    }

    /// Binds `params` and takes the first step.
    ///
    /// Returns true when a row is ready to be read.
    pub(crate) fn start<P: AsRef<str>>(&mut self, params: &[P]) -> Result<bool> {
        self.bind(params)?;
        Ok(self.step()? == Step::Row)
    }

    /// Binds `params` positionally as text.
    ///
    /// The count and sizes are validated before the first engine call. A
    /// statement left mid-result by an abandoned cursor is rewound first. On
    /// a failed bind the statement is reset and its bindings cleared.
    pub(crate) fn bind<P: AsRef<str>>(&mut self, params: &[P]) -> Result<()> {
        self.raw()?;
        if params.len() != self.parameter_count {
            return Err(SqliteError::usage(format!(
                "execute: statement takes {} parameters but {} were supplied",
                self.parameter_count,
                params.len()
            )));
        }
        if params.iter().any(|p| c_int::try_from(p.as_ref().len()).is_err()) {
            return Err(SqliteError::usage("execute: parameter value is too large"));
        }
        self.clear()?;

        for (i, param) in params.iter().enumerate() {
            let rc = self.raw_mut()?.bind_text(i as c_int + 1, param.as_ref());
            if rc != ffi::SQLITE_OK {
                let err = self.session.last_error();
                self.reset_after_failure();
                return Err(err);
            }
        }
        Ok(())
    }

    /// Advances evaluation by one step.
    ///
    /// Completion resets the statement and clears its bindings so it is
    /// ready for the next execution. Any other outcome is an engine error,
    /// after which the statement is reset as well.
    pub(crate) fn step(&mut self) -> Result<Step> {
        match self.raw_mut()?.step() {
            ffi::SQLITE_ROW => Ok(Step::Row),
            ffi::SQLITE_DONE => {
                self.clear()?;
                Ok(Step::Done)
            }
            _ => {
                let err = self.session.last_error();
                self.reset_after_failure();
                Err(err)
            }
        }
    }

    /// Resets the statement and clears its bindings.
    pub(crate) fn clear(&mut self) -> Result<()> {
        let raw = self.raw_mut()?;
        if raw.reset() == ffi::SQLITE_OK && raw.clear_bindings() == ffi::SQLITE_OK {
            return Ok(());
        }
        Err(self.session.last_error())
    }

    fn reset_after_failure(&mut self) {
        if let Some(raw) = self.raw.as_mut() {
            // reset repeats the failed call's code, nothing new to report
            let _ = raw.reset();
            if raw.clear_bindings() != ffi::SQLITE_OK {
                tracing::warn!(
                    error = %self.session.last_error(),
                    "clearing bindings after a failed execution also failed"
                );
            }
        }
    }

    /// Reads every column of the current row as text.
    pub(crate) fn read_row(&self) -> Result<Row> {
        let raw = self.raw()?;
        let columns = raw.column_count();
        if columns == 0 {
            return Err(SqliteError::usage("fetch: no columns in result"));
        }
        Ok((0..columns).map(|i| raw.column_text(i)).collect())
    }

    /// Reads the current row keyed by column name.
    pub(crate) fn read_named_row(&self) -> Result<NamedRow> {
        let raw = self.raw()?;
        let columns = raw.column_count();
        if columns == 0 {
            return Err(SqliteError::usage("fetch: no columns in result"));
        }
        let mut row = HashMap::with_capacity(columns);
        for i in 0..columns {
            row.insert(raw.column_name(i), raw.column_text(i));
        }
        Ok(row)
    }
}

/// Writes the statement's SQL text; a closed statement writes nothing.
impl fmt::Display for SqliteStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.raw {
            Some(raw) => f.write_str(&raw.sql()),
            None => Ok(()),
        }
    }
}

impl Drop for SqliteStatement {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            // finalize reports the last execution's error, which was
            // already surfaced when it happened
            let _ = raw.finalize();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{ConnectionInfo, SqliteConnection};

    fn memory() -> SqliteConnection {
        crate::open(&ConnectionInfo::new(":memory:")).unwrap()
    }

    #[test]
    fn test_display_recovers_sql() {
        let conn = memory();
        let stmt = conn.prepare("SELECT 1 AS one").unwrap();
        assert_eq!(stmt.to_string(), "SELECT 1 AS one");
        assert_eq!(stmt.sql().unwrap(), "SELECT 1 AS one");
        assert_eq!(stmt.column_names().unwrap(), vec!["one".to_string()]);
    }

    #[test]
    fn test_parameter_count() {
        let conn = memory();
        let stmt = conn.prepare("SELECT ?, ?, ?").unwrap();
        assert_eq!(stmt.parameter_count().unwrap(), 3);
        assert_eq!(stmt.column_count().unwrap(), 3);
    }

    #[test]
    fn test_operations_after_close_fail() {
        let conn = memory();
        let mut stmt = conn.prepare("SELECT ?").unwrap();
        stmt.close().unwrap();

        assert!(stmt.is_closed());
        assert!(stmt.close().unwrap_err().is_usage());
        assert!(stmt.parameter_count().unwrap_err().is_usage());
        assert!(stmt.column_names().unwrap_err().is_usage());
        assert!(stmt.sql().unwrap_err().is_usage());
        assert!(conn.execute(&mut stmt, &["x"]).unwrap_err().is_usage());
        assert_eq!(stmt.to_string(), "");
    }

    #[test]
    fn test_bind_count_checked_before_binding() {
        let conn = memory();
        let mut stmt = conn.prepare("SELECT ?, ?").unwrap();
        assert!(stmt.bind(&["a"]).unwrap_err().is_usage());
        assert!(stmt.bind(&["a", "b", "c"]).unwrap_err().is_usage());
        assert!(stmt.bind(&["a", "b"]).is_ok());
    }

    #[test]
    fn test_prepare_rejects_empty_and_nul() {
        let conn = memory();
        assert!(conn.prepare("").unwrap_err().is_usage());
        assert!(conn.prepare("/* only a comment */").unwrap_err().is_usage());
        assert!(conn.prepare("SELECT 1\0").unwrap_err().is_usage());
        assert!(conn.prepare("SELEKT 1").unwrap_err().is_engine());
    }

    #[test]
    fn test_abandoned_cursor_is_rewound() {
        let conn = memory();
        let mut stmt = conn.prepare("SELECT 1 UNION ALL SELECT 2").unwrap();
        let mut cursor = conn.execute(&mut stmt, &[] as &[&str]).unwrap().unwrap();
        assert_eq!(cursor.fetch_one().unwrap(), vec!["1"]);
        drop(cursor);

        let mut cursor = conn.execute(&mut stmt, &[] as &[&str]).unwrap().unwrap();
        assert_eq!(cursor.fetch_all().unwrap(), vec![vec!["1"], vec!["2"]]);
    }
}

// Rust guideline compliant 2026-10-19
