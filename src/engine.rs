//! Engine binding for the SQLite C API.
//!
//! This is the only module that talks to `libsqlite3-sys`. It exposes the
//! narrow capability set the driver needs: a process-wide threading-mode
//! switch, a [`Session`] owning one `sqlite3*` handle, and a
//! [`RawStatement`] owning one `sqlite3_stmt*` handle. Everything above this
//! module works with safe types only.

use std::ffi::{CStr, c_char, c_int};
use std::ptr::{self, NonNull};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicPtr, Ordering};
use std::time::Duration;

use libsqlite3_sys as ffi;

use crate::error::{Result, SqliteError};

/// After we run into a locked database or table, the engine retries for this long.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(16_000);

static SERIALIZED: OnceLock<std::result::Result<(), c_int>> = OnceLock::new();

/// Forces the engine into serialized threading mode.
///
/// The switch happens exactly once per process, before any session is
/// opened; later calls return the memoized outcome. [`crate::open`] calls
/// this itself, so calling it explicitly is only needed to fail fast at
/// startup. A failure here is not recoverable: no connection can be opened
/// in this process afterwards.
pub fn initialize() -> Result<()> {
    let outcome = SERIALIZED.get_or_init(|| {
        let rc = unsafe { ffi::sqlite3_config(ffi::SQLITE_CONFIG_SERIALIZED) };
        if rc == ffi::SQLITE_OK {
            tracing::debug!("sqlite engine switched to serialized threading mode");
            Ok(())
        } else {
            Err(rc)
        }
    });

    (*outcome).map_err(|rc| {
        SqliteError::engine(
            rc,
            format!("can't switch engine to serialized mode: {}", errstr(rc)),
        )
    })
}

/// Version information reported by the linked engine.
#[derive(Debug, Clone)]
pub(crate) struct LibraryVersion {
    pub version: Option<String>,
    pub number: i32,
    pub source_id: Option<String>,
}

pub(crate) fn library_version() -> LibraryVersion {
    unsafe {
        LibraryVersion {
            version: owned_text(ffi::sqlite3_libversion()),
            number: ffi::sqlite3_libversion_number(),
            source_id: owned_text(ffi::sqlite3_sourceid()),
        }
    }
}

/// One open engine session.
///
/// The handle is swapped to null once the session is closed, so every later
/// call reports a usage error instead of touching freed memory. Sessions are
/// always opened with `SQLITE_OPEN_FULLMUTEX`, which makes it sound to share
/// them between threads.
#[derive(Debug)]
pub(crate) struct Session {
    db: AtomicPtr<ffi::sqlite3>,
}

impl Session {
    /// Opens a session and applies the per-connection settings.
    ///
    /// If a handle was obtained but any later step fails, the handle is
    /// released before the error is returned.
    pub(crate) fn open(name: &CStr, flags: c_int, vfs: Option<&CStr>) -> Result<Self> {
        let mut db: *mut ffi::sqlite3 = ptr::null_mut();
        let vfs_ptr = vfs.map_or(ptr::null(), CStr::as_ptr);
        let rc = unsafe { ffi::sqlite3_open_v2(name.as_ptr(), &mut db, flags, vfs_ptr) };

        if db.is_null() {
            // only happens when the engine can't allocate a handle at all
            return Err(SqliteError::engine(rc, errstr(rc)));
        }
        let session = Self {
            db: AtomicPtr::new(db),
        };
        if rc != ffi::SQLITE_OK {
            return Err(session.last_error());
        }

        let timeout = c_int::try_from(DEFAULT_BUSY_TIMEOUT.as_millis()).unwrap_or(c_int::MAX);
        session.check(unsafe { ffi::sqlite3_busy_timeout(db, timeout) })?;
        session.check(unsafe { ffi::sqlite3_extended_result_codes(db, 1) })?;

        Ok(session)
    }

    /// Returns the live handle, or a usage error once the session is closed.
    fn handle(&self) -> Result<NonNull<ffi::sqlite3>> {
        NonNull::new(self.db.load(Ordering::Acquire))
            .ok_or_else(|| SqliteError::usage("connection is closed"))
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.db.load(Ordering::Acquire).is_null()
    }

    /// Builds an engine error from the session's last-error slot.
    ///
    /// Must be called right after the failing engine call; any further call
    /// may overwrite the slot.
    pub(crate) fn last_error(&self) -> SqliteError {
        match self.handle() {
            Ok(db) => error_from_handle(db.as_ptr()),
            Err(e) => e,
        }
    }

    fn check(&self, rc: c_int) -> Result<()> {
        if rc == ffi::SQLITE_OK {
            Ok(())
        } else {
            Err(self.last_error())
        }
    }

    /// Releases the handle.
    ///
    /// The engine refuses while compiled statements are still alive; in that
    /// case the handle is kept and the engine error returned.
    pub(crate) fn close(&self) -> Result<()> {
        let db = NonNull::new(self.db.swap(ptr::null_mut(), Ordering::AcqRel))
            .ok_or_else(|| SqliteError::usage("close: connection is already closed"))?;

        let rc = unsafe { ffi::sqlite3_close(db.as_ptr()) };
        if rc != ffi::SQLITE_OK {
            let err = error_from_handle(db.as_ptr());
            self.db.store(db.as_ptr(), Ordering::Release);
            return Err(err);
        }
        tracing::debug!("sqlite session closed");
        Ok(())
    }

    /// Compiles `sql`. Returns `None` when the text holds no statement.
    pub(crate) fn prepare(&self, sql: &str) -> Result<Option<RawStatement>> {
        let db = self.handle()?;
        let len = c_int::try_from(sql.len())
            .map_err(|_| SqliteError::usage("prepare: SQL text is too long"))?;

        let mut stmt: *mut ffi::sqlite3_stmt = ptr::null_mut();
        let rc = unsafe {
            ffi::sqlite3_prepare_v2(
                db.as_ptr(),
                sql.as_ptr() as *const c_char,
                len,
                &mut stmt,
                ptr::null_mut(),
            )
        };

        if rc != ffi::SQLITE_OK {
            let err = error_from_handle(db.as_ptr());
            // the engine shouldn't hand out a handle on failure, but if it
            // did, release it and keep the primary error
            if let Some(stmt) = NonNull::new(stmt) {
                let secondary = unsafe { ffi::sqlite3_finalize(stmt.as_ptr()) };
                if secondary != ffi::SQLITE_OK {
                    tracing::warn!(code = secondary, "finalize after failed prepare also failed");
                }
            }
            return Err(err);
        }

        Ok(NonNull::new(stmt).map(RawStatement))
    }

    pub(crate) fn changes(&self) -> Result<i64> {
        let db = self.handle()?;
        Ok(i64::from(unsafe { ffi::sqlite3_changes(db.as_ptr()) }))
    }

    /// Rows changed by every INSERT, UPDATE or DELETE since the session
    /// opened. Unlike [`changes`](Self::changes) it never reports a count
    /// left over from an earlier statement.
    pub(crate) fn total_changes(&self) -> Result<i64> {
        let db = self.handle()?;
        Ok(i64::from(unsafe { ffi::sqlite3_total_changes(db.as_ptr()) }))
    }

    pub(crate) fn last_insert_rowid(&self) -> Result<i64> {
        let db = self.handle()?;
        Ok(unsafe { ffi::sqlite3_last_insert_rowid(db.as_ptr()) })
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let db = *self.db.get_mut();
        if db.is_null() {
            return;
        }
        let rc = unsafe { ffi::sqlite3_close_v2(db) };
        if rc != ffi::SQLITE_OK {
            tracing::warn!(code = rc, "releasing sqlite session failed");
        }
    }
}

/// Owned compiled-query handle.
///
/// Only valid while the session that compiled it is open; the statement
/// layer guarantees that by holding the session alive.
#[derive(Debug)]
pub(crate) struct RawStatement(NonNull<ffi::sqlite3_stmt>);

// Statements belong to full-mutex sessions, so the engine serializes every
// call made through them.
unsafe impl Send for RawStatement {}

impl RawStatement {
    pub(crate) fn step(&mut self) -> c_int {
        unsafe { ffi::sqlite3_step(self.0.as_ptr()) }
    }

    pub(crate) fn reset(&mut self) -> c_int {
        unsafe { ffi::sqlite3_reset(self.0.as_ptr()) }
    }

    pub(crate) fn clear_bindings(&mut self) -> c_int {
        unsafe { ffi::sqlite3_clear_bindings(self.0.as_ptr()) }
    }

    /// Binds `value` to the 1-based slot `index`.
    ///
    /// The engine takes a private copy (`SQLITE_TRANSIENT`), so `value` only
    /// has to live for the duration of the call. The caller checks that the
    /// length fits a `c_int`.
    pub(crate) fn bind_text(&mut self, index: c_int, value: &str) -> c_int {
        unsafe {
            ffi::sqlite3_bind_text(
                self.0.as_ptr(),
                index,
                value.as_ptr() as *const c_char,
                value.len() as c_int,
                ffi::SQLITE_TRANSIENT(),
            )
        }
    }

    pub(crate) fn parameter_count(&self) -> usize {
        let n = unsafe { ffi::sqlite3_bind_parameter_count(self.0.as_ptr()) };
        usize::try_from(n).unwrap_or(0)
    }

    pub(crate) fn column_count(&self) -> usize {
        let n = unsafe { ffi::sqlite3_column_count(self.0.as_ptr()) };
        usize::try_from(n).unwrap_or(0)
    }

    /// Text of column `index` in the current row; SQL NULL reads as "".
    pub(crate) fn column_text(&self, index: usize) -> String {
        let index = index as c_int;
        unsafe {
            let text = ffi::sqlite3_column_text(self.0.as_ptr(), index);
            if text.is_null() {
                return String::new();
            }
            let len = usize::try_from(ffi::sqlite3_column_bytes(self.0.as_ptr(), index)).unwrap_or(0);
            let bytes = std::slice::from_raw_parts(text, len);
            String::from_utf8_lossy(bytes).into_owned()
        }
    }

    pub(crate) fn column_name(&self, index: usize) -> String {
        let name = unsafe { ffi::sqlite3_column_name(self.0.as_ptr(), index as c_int) };
        unsafe { owned_text(name) }.unwrap_or_default()
    }

    /// Original SQL text, recovered from the engine.
    pub(crate) fn sql(&self) -> String {
        unsafe { owned_text(ffi::sqlite3_sql(self.0.as_ptr())) }.unwrap_or_default()
    }

    /// Destroys the compiled query. The handle is gone whatever the result.
    pub(crate) fn finalize(self) -> c_int {
        unsafe { ffi::sqlite3_finalize(self.0.as_ptr()) }
    }
}

fn error_from_handle(db: *mut ffi::sqlite3) -> SqliteError {
    unsafe {
        // extended codes are enabled at open, mask to get the basic one
        let extended = ffi::sqlite3_errcode(db);
        let message = owned_text(ffi::sqlite3_errmsg(db)).unwrap_or_default();
        SqliteError::engine(extended, message)
    }
}

fn errstr(rc: c_int) -> String {
    unsafe { owned_text(ffi::sqlite3_errstr(rc)) }.unwrap_or_else(|| format!("error code {}", rc))
}

/// Copies a NUL-terminated engine string.
///
/// # Safety
/// `ptr` must be null or point to a valid NUL-terminated string.
unsafe fn owned_text(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
    }
}
