//! ADBC statement for the SQLite driver.
//!
//! `QueryStatement` holds SQL text, compiles it lazily, binds Arrow batches
//! as text parameter sets and returns results as Arrow.

#![allow(refining_impl_trait)]

use std::sync::Arc;

use adbc_core::error::{Error as AdbcError, Status};
use adbc_core::{Optionable, Statement, options::{OptionStatement, OptionValue}};
use arrow_array::{RecordBatch, RecordBatchReader};
use arrow_schema::{DataType, Field, Schema};

use crate::engine::Session;
use crate::reader::SqliteRecordBatchReader;
use crate::statement::SqliteStatement;
use crate::types::{arrow_value_to_text, text_schema};

/// SQL statement created by `Connection::new_statement`.
///
/// Every row of a bound batch is one parameter set. A query returning rows
/// accepts at most one; [`execute_update`](Statement::execute_update) runs
/// the statement once per set.
pub struct QueryStatement {
    session: Arc<Session>,
    query: Option<String>,
    prepared: Option<SqliteStatement>,
    bound: Vec<Vec<String>>,
}

impl QueryStatement {
    pub(crate) fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            query: None,
            prepared: None,
            bound: Vec::new(),
        }
    }

    /// Returns the current query string.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    fn compile(&self) -> adbc_core::error::Result<SqliteStatement> {
        let query = self.query.as_deref().ok_or_else(|| {
            AdbcError::with_message_and_status("No query set", Status::InvalidArguments)
        })?;
        Ok(SqliteStatement::prepare(&self.session, query)?)
    }

    /// Takes the compiled statement, compiling it if needed. Callers put it
    /// back once done.
    fn take_compiled(&mut self) -> adbc_core::error::Result<SqliteStatement> {
        match self.prepared.take() {
            Some(statement) => Ok(statement),
            None => self.compile(),
        }
    }
}

fn not_implemented(what: &str) -> AdbcError {
    AdbcError::with_message_and_status(format!("{} not supported", what), Status::NotImplemented)
}

impl Optionable for QueryStatement {
    type Option = OptionStatement;

    fn set_option(
        &mut self,
        _key: Self::Option,
        _value: OptionValue,
    ) -> adbc_core::error::Result<()> {
        Err(not_implemented("Statement options"))
    }

    fn get_option_string(&self, _key: Self::Option) -> adbc_core::error::Result<String> {
        Err(not_implemented("Statement options"))
    }

    fn get_option_bytes(&self, _key: Self::Option) -> adbc_core::error::Result<Vec<u8>> {
        Err(not_implemented("Statement options"))
    }

    fn get_option_double(&self, _key: Self::Option) -> adbc_core::error::Result<f64> {
        Err(not_implemented("Statement options"))
    }

    fn get_option_int(&self, _key: Self::Option) -> adbc_core::error::Result<i64> {
        Err(not_implemented("Statement options"))
    }
}

impl Statement for QueryStatement {
    fn bind(&mut self, batch: RecordBatch) -> adbc_core::error::Result<()> {
        let mut bound = Vec::with_capacity(batch.num_rows());
        for row in 0..batch.num_rows() {
            let params = batch
                .columns()
                .iter()
                .map(|column| arrow_value_to_text(column.as_ref(), row))
                .collect::<crate::Result<Vec<_>>>()?;
            bound.push(params);
        }
        self.bound = bound;
        Ok(())
    }

    fn bind_stream(
        &mut self,
        _reader: Box<dyn RecordBatchReader + Send>,
    ) -> adbc_core::error::Result<()> {
        Err(not_implemented("Stream bind"))
    }

    fn execute(&mut self) -> adbc_core::error::Result<Box<dyn RecordBatchReader + Send>> {
        if self.bound.len() > 1 {
            return Err(AdbcError::with_message_and_status(
                format!(
                    "A query takes one parameter set, {} are bound; use execute_update for batches",
                    self.bound.len()
                ),
                Status::InvalidArguments,
            ));
        }

        let mut statement = self.take_compiled()?;
        let params = self.bound.first().map(Vec::as_slice).unwrap_or_default();
        let has_more = match statement.start(params) {
            Ok(has_more) => has_more,
            Err(e) => {
                self.prepared = Some(statement);
                return Err(e.into());
            }
        };
        let schema = text_schema(&statement.column_names()?);

        // the reader owns the statement; the next execution compiles afresh
        Ok(Box::new(SqliteRecordBatchReader::new(statement, has_more, schema)))
    }

    fn execute_update(&mut self) -> adbc_core::error::Result<Option<i64>> {
        let mut statement = self.take_compiled()?;

        let no_params: [Vec<String>; 1] = [Vec::new()];
        let param_sets = if self.bound.is_empty() { &no_params[..] } else { &self.bound[..] };

        // the running total, since changes() keeps the last DML's count
        // across statements that modify nothing
        let mut run = || -> crate::Result<i64> {
            let before = self.session.total_changes()?;
            for params in param_sets {
                if statement.start(params)? {
                    // rows produced by an update are not reported
                    statement.clear()?;
                }
            }
            Ok(self.session.total_changes()? - before)
        };
        let outcome = run();

        self.prepared = Some(statement);
        Ok(Some(outcome?))
    }

    fn execute_schema(&mut self) -> adbc_core::error::Result<Schema> {
        let statement = self.take_compiled()?;
        let names = statement.column_names();
        self.prepared = Some(statement);
        Ok(text_schema(&names?))
    }

    fn execute_partitions(&mut self) -> adbc_core::error::Result<adbc_core::PartitionedResult> {
        Err(not_implemented("Partitioned execution"))
    }

    fn get_parameter_schema(&self) -> adbc_core::error::Result<Schema> {
        let count = match &self.prepared {
            Some(statement) => statement.parameter_count()?,
            None => self.compile()?.parameter_count()?,
        };
        Ok(Schema::new(
            (1..=count)
                .map(|i| Field::new(format!("?{}", i), DataType::Utf8, false))
                .collect::<Vec<_>>(),
        ))
    }

    fn prepare(&mut self) -> adbc_core::error::Result<()> {
        self.prepared = Some(self.compile()?);
        self.bound.clear();
        Ok(())
    }

    fn set_sql_query(&mut self, query: impl AsRef<str>) -> adbc_core::error::Result<()> {
        self.query = Some(query.as_ref().to_string());
        // a new query invalidates the compiled statement and its parameters
        self.prepared = None;
        self.bound.clear();
        Ok(())
    }

    fn set_substrait_plan(&mut self, _plan: impl AsRef<[u8]>) -> adbc_core::error::Result<()> {
        Err(not_implemented("Substrait"))
    }

    fn cancel(&mut self) -> adbc_core::error::Result<()> {
        Err(not_implemented("Query cancellation"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adbc_core::Connection;
    use arrow_array::{Array, Int64Array, StringArray};

    fn statement() -> (crate::SqliteConnection, QueryStatement) {
        let mut conn = crate::open(&crate::ConnectionInfo::new(":memory:")).unwrap();
        let stmt = conn.new_statement().unwrap();
        (conn, stmt)
    }

    fn batch(ids: Vec<i64>, names: Vec<&str>) -> RecordBatch {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("name", DataType::Utf8, false),
        ]);
        RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(Int64Array::from(ids)), Arc::new(StringArray::from(names))],
        )
        .unwrap()
    }

    #[test]
    fn test_execute_without_query() {
        let (_conn, mut stmt) = statement();
        let err = stmt.execute().err().unwrap();
        assert_eq!(err.status, Status::InvalidArguments);
    }

    #[test]
    fn test_bound_batch_inserts_every_row() {
        let (_conn, mut stmt) = statement();
        stmt.set_sql_query("CREATE TABLE t (id INTEGER, name TEXT)").unwrap();
        assert_eq!(stmt.execute_update().unwrap(), Some(0));

        stmt.set_sql_query("INSERT INTO t VALUES (?, ?)").unwrap();
        stmt.prepare().unwrap();
        assert_eq!(stmt.get_parameter_schema().unwrap().field(1).name(), "?2");
        stmt.bind(batch(vec![1, 2, 3], vec!["a", "b", "c"])).unwrap();
        assert_eq!(stmt.execute_update().unwrap(), Some(3));

        stmt.set_sql_query("SELECT name FROM t WHERE id >= ? ORDER BY id").unwrap();
        let params = RecordBatch::try_new(
            Arc::new(Schema::new(vec![Field::new("min", DataType::Int64, false)])),
            vec![Arc::new(Int64Array::from(vec![2]))],
        )
        .unwrap();
        stmt.bind(params).unwrap();
        let batches: Vec<_> = stmt
            .execute()
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        let names = batches[0].column(0).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names.value(0), "b");
    }

    #[test]
    fn test_update_count_ignores_earlier_dml() {
        let (_conn, mut stmt) = statement();
        stmt.set_sql_query("CREATE TABLE t (v INTEGER)").unwrap();
        stmt.execute_update().unwrap();
        stmt.set_sql_query("INSERT INTO t VALUES (1), (2), (3)").unwrap();
        assert_eq!(stmt.execute_update().unwrap(), Some(3));

        stmt.set_sql_query("SELECT v FROM t").unwrap();
        assert_eq!(stmt.execute_update().unwrap(), Some(0));
        stmt.set_sql_query("CREATE TABLE u (x)").unwrap();
        assert_eq!(stmt.execute_update().unwrap(), Some(0));
        stmt.set_sql_query("DELETE FROM t WHERE v > 1").unwrap();
        assert_eq!(stmt.execute_update().unwrap(), Some(2));
    }

    #[test]
    fn test_execute_rejects_many_parameter_sets() {
        let (_conn, mut stmt) = statement();
        stmt.set_sql_query("SELECT ?, ?").unwrap();
        stmt.bind(batch(vec![1, 2], vec!["a", "b"])).unwrap();
        let err = stmt.execute().err().unwrap();
        assert_eq!(err.status, Status::InvalidArguments);
    }

    #[test]
    fn test_bind_rejects_nulls() {
        let (_conn, mut stmt) = statement();
        stmt.set_sql_query("SELECT ?").unwrap();
        let params = RecordBatch::try_new(
            Arc::new(Schema::new(vec![Field::new("v", DataType::Utf8, true)])),
            vec![Arc::new(StringArray::from(vec![None::<&str>]))],
        )
        .unwrap();
        let err = stmt.bind(params).unwrap_err();
        assert_eq!(err.status, Status::InvalidState);
    }

    #[test]
    fn test_execute_schema() {
        let (_conn, mut stmt) = statement();
        stmt.set_sql_query("SELECT 1 AS one, 'x' AS two").unwrap();
        let schema = stmt.execute_schema().unwrap();
        assert_eq!(schema.field(1).name(), "two");
        assert_eq!(schema.field(1).data_type(), &DataType::Utf8);
    }

    #[test]
    fn test_syntax_error_maps_to_internal() {
        let (_conn, mut stmt) = statement();
        stmt.set_sql_query("SELEKT 1").unwrap();
        let err = stmt.prepare().unwrap_err();
        assert_eq!(err.status, Status::Internal);
        assert_eq!(err.vendor_code, libsqlite3_sys::SQLITE_ERROR);
    }
}

// Rust guideline compliant 2026-10-19
