//! Row iteration over an executing statement.
//!
//! Three shapes share one protocol: the pull-style [`Cursor`], the classic
//! [`ResultSet`] (`more`/`fetch`, also an `Iterator`), and the push-style
//! [`ResultStream`] that delivers rows over a channel.
//!
//! The protocol is "deliver current, prefetch next": a cursor only exists
//! while the engine holds an unread row. Fetching reads that row, then steps
//! once so that [`Cursor::has_more`] already knows whether another row
//! follows. When the step reports completion the statement is reset and its
//! bindings cleared, ready for the next execution.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{Result, SqliteError};
use crate::statement::{SqliteStatement, Step};
use crate::utils::Runtime;

/// One result row, every column read as text. SQL NULL reads as "".
pub type Row = Vec<String>;

/// One result row keyed by column name.
pub type NamedRow = HashMap<String, String>;

/// Outcome of a single fetch on a [`ResultSet`].
pub type FetchResult = Result<Row>;

/// Iteration state of one execution.
///
/// Holds the statement's only mutable borrow, so a statement can never have
/// two active cursors.
#[derive(Debug)]
pub struct Cursor<'s> {
    statement: &'s mut SqliteStatement,
    has_more: bool,
}

impl<'s> Cursor<'s> {
    pub(crate) fn resume(statement: &'s mut SqliteStatement, has_more: bool) -> Self {
        Self {
            statement,
            has_more,
        }
    }

    /// Whether another row is ready to be fetched.
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Result column names of the underlying statement.
    pub fn column_names(&self) -> Result<Vec<String>> {
        self.statement.column_names()
    }

    fn ensure_more(&self, op: &str) -> Result<()> {
        if self.has_more {
            Ok(())
        } else {
            Err(SqliteError::usage(format!("{}: no results to fetch", op)))
        }
    }

    fn advance(&mut self) -> Result<()> {
        match self.statement.step() {
            Ok(Step::Row) => Ok(()),
            Ok(Step::Done) => {
                self.has_more = false;
                Ok(())
            }
            Err(e) => {
                self.has_more = false;
                Err(e)
            }
        }
    }

    /// Fetches the current row and prefetches the next one.
    ///
    /// If prefetching fails, the row is not delivered and the engine error
    /// is returned instead; the cursor is exhausted afterwards.
    pub fn fetch_one(&mut self) -> Result<Row> {
        self.ensure_more("fetch_one")?;
        let row = self.statement.read_row()?;
        self.advance()?;
        Ok(row)
    }

    /// Like [`fetch_one`](Self::fetch_one), keyed by column name.
    pub fn fetch_row(&mut self) -> Result<NamedRow> {
        self.ensure_more("fetch_row")?;
        let row = self.statement.read_named_row()?;
        self.advance()?;
        Ok(row)
    }

    /// Fetches up to `n` rows.
    ///
    /// Partial success wins: if at least one row was read, those rows are
    /// returned and the error that stopped the fetch is dropped. With no row
    /// read, that error is returned.
    pub fn fetch_many(&mut self, n: usize) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while rows.len() < n {
            match self.fetch_one() {
                Ok(row) => rows.push(row),
                Err(e) if rows.is_empty() => return Err(e),
                Err(e) => {
                    if e.is_engine() {
                        tracing::debug!(error = %e, rows = rows.len(), "fetch stopped early");
                    }
                    break;
                }
            }
        }
        Ok(rows)
    }

    /// Fetches every remaining row, with the same policy as
    /// [`fetch_many`](Self::fetch_many).
    pub fn fetch_all(&mut self) -> Result<Vec<Row>> {
        self.fetch_many(usize::MAX)
    }

    /// Ends the cursor. The statement stays compiled and reusable.
    pub fn close(self) -> Result<()> {
        Ok(())
    }
}

/// Classic result set: ask [`more`](Self::more), then [`fetch`](Self::fetch).
#[derive(Debug)]
pub struct ResultSet<'s> {
    cursor: Cursor<'s>,
}

impl<'s> ResultSet<'s> {
    pub(crate) fn resume(statement: &'s mut SqliteStatement, has_more: bool) -> Self {
        Self {
            cursor: Cursor::resume(statement, has_more),
        }
    }

    pub fn more(&self) -> bool {
        self.cursor.has_more()
    }

    pub fn fetch(&mut self) -> FetchResult {
        self.cursor.fetch_one()
    }

    pub fn column_names(&self) -> Result<Vec<String>> {
        self.cursor.column_names()
    }

    pub fn close(self) -> Result<()> {
        self.cursor.close()
    }
}

impl Iterator for ResultSet<'_> {
    type Item = FetchResult;

    fn next(&mut self) -> Option<Self::Item> {
        if self.more() { Some(self.fetch()) } else { None }
    }
}

/// Push adapter over a [`ResultSet`].
///
/// A producer on the Tokio blocking pool fetches rows and sends each
/// [`FetchResult`] through a channel holding at most one value, so it runs
/// at most one row ahead of the consumer. Rows arrive in fetch order and the
/// channel closes exactly once, after the last row. Dropping the stream
/// early stops the producer at its next send; the statement is then
/// finalized on the producer's thread.
#[derive(Debug)]
pub struct ResultStream {
    rx: mpsc::Receiver<FetchResult>,
    producer: JoinHandle<SqliteStatement>,
    // dropped last: an owned runtime must outlive the producer handle
    runtime: Runtime,
}

impl ResultStream {
    pub(crate) fn spawn(
        mut statement: SqliteStatement,
        has_more: bool,
    ) -> std::result::Result<Self, (SqliteStatement, SqliteError)> {
        let runtime = match Runtime::new() {
            Ok(runtime) => runtime,
            Err(e) => {
                // the statement is mid-execution; leave it idle for the caller
                if has_more && let Err(secondary) = statement.clear() {
                    tracing::warn!(error = %secondary, "resetting statement after runtime failure failed");
                }
                let err = SqliteError::usage(format!("execute_stream: can't start runtime: {}", e));
                return Err((statement, err));
            }
        };

        let (tx, rx) = mpsc::channel(1);
        let producer = runtime.spawn_blocking(move || {
            {
                let mut results = ResultSet::resume(&mut statement, has_more);
                while results.more() {
                    if tx.blocking_send(results.fetch()).is_err() {
                        tracing::debug!("result stream consumer went away");
                        break;
                    }
                }
            }
            statement
        });

        Ok(Self {
            rx,
            producer,
            runtime,
        })
    }

    /// Receives the next row; `None` once the result is exhausted.
    pub async fn recv(&mut self) -> Option<FetchResult> {
        self.rx.recv().await
    }

    /// Blocking variant of [`recv`](Self::recv). Must not be called from
    /// inside an async context.
    pub fn blocking_recv(&mut self) -> Option<FetchResult> {
        self.rx.blocking_recv()
    }

    /// Stops the stream and returns the statement for reuse.
    ///
    /// Rows not yet received are discarded. If the stream was not drained,
    /// the statement is reset before it is returned.
    pub async fn finish(self) -> Result<SqliteStatement> {
        let Self {
            rx,
            producer,
            runtime,
        } = self;
        drop(rx);
        let outcome = producer.await;
        // an owned runtime can't be dropped from async context
        if let Runtime::TokioRuntime(rt) = runtime {
            rt.shutdown_background();
        }
        Self::reclaim(outcome)
    }

    /// Blocking variant of [`finish`](Self::finish).
    ///
    /// Outside any runtime this is always safe. Inside one it goes through
    /// `block_in_place`, so it panics when the stream was created on a
    /// current-thread runtime; use [`finish`](Self::finish) there.
    pub fn blocking_finish(self) -> Result<SqliteStatement> {
        let Self {
            rx,
            producer,
            runtime,
        } = self;
        drop(rx);
        Self::reclaim(runtime.block_on(producer))
    }

    fn reclaim(
        outcome: std::result::Result<SqliteStatement, tokio::task::JoinError>,
    ) -> Result<SqliteStatement> {
        let mut statement = outcome
            .map_err(|e| SqliteError::usage(format!("result stream producer failed: {}", e)))?;
        // a producer stopped by a dropped receiver leaves the statement active
        statement.clear()?;
        Ok(statement)
    }
}


// Rust guideline compliant 2026-10-19
