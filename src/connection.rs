//! Connection implementation for the SQLite driver.
//!
//! `SqliteConnection` owns one engine session. Its inherent methods are the
//! core driver protocol (prepare, execute, fetch through a cursor); the
//! `adbc_core::Connection` impl layers ADBC metadata and statements on top.

#![allow(refining_impl_trait)]

use std::collections::HashSet;
use std::ffi::c_int;
use std::sync::Arc;

use adbc_core::error::{Error as AdbcError, Status};
use adbc_core::options::{InfoCode, ObjectDepth, OptionConnection, OptionValue};
use adbc_core::{Connection, Optionable};
use arrow_array::{ArrayRef, RecordBatch, RecordBatchReader, StringArray, UInt32Array};
use arrow_schema::{DataType, Field, Schema};

use crate::cursor::{Cursor, ResultSet, ResultStream, Row};
use crate::dbapi;
use crate::engine::{self, Session};
use crate::error::{Result, SqliteError};
use crate::query::QueryStatement;
use crate::reader::VecRecordBatchReader;
use crate::statement::SqliteStatement;
use crate::types::text_schema;

/// Catalog and schema name SQLite gives the primary database.
const MAIN_SCHEMA: &str = "main";

/// One open session with the engine.
///
/// Created by [`crate::open`]. The session is released by [`close`](Self::close)
/// or, failing that, when the connection and every statement prepared on it
/// have been dropped.
#[derive(Debug)]
pub struct SqliteConnection {
    session: Arc<Session>,
}

impl SqliteConnection {
    pub(crate) fn new(session: Session) -> Self {
        Self {
            session: Arc::new(session),
        }
    }

    /// Compiles `sql` into a reusable statement.
    pub fn prepare(&self, sql: &str) -> Result<SqliteStatement> {
        SqliteStatement::prepare(&self.session, sql)
    }

    fn start<P: AsRef<str>>(&self, statement: &mut SqliteStatement, params: &[P]) -> Result<bool> {
        if self.session.is_closed() {
            return Err(SqliteError::usage("execute: connection is closed"));
        }
        if !statement.belongs_to(&self.session) {
            return Err(SqliteError::usage(
                "execute: statement was prepared on a different connection",
            ));
        }
        statement.start(params)
    }

    /// Executes `statement` with `params` bound positionally as text.
    ///
    /// Returns a cursor positioned on the first row, or `None` when the
    /// statement produced no rows. The parameter count must match the
    /// statement's exactly.
    ///
    /// # Example
    /// ```ignore
    /// let mut stmt = conn.prepare("SELECT name FROM users WHERE id = ?")?;
    /// if let Some(mut cursor) = conn.execute(&mut stmt, &["1"])? {
    ///     println!("{:?}", cursor.fetch_one()?);
    /// }
    /// ```
    pub fn execute<'s, P: AsRef<str>>(
        &self,
        statement: &'s mut SqliteStatement,
        params: &[P],
    ) -> Result<Option<Cursor<'s>>> {
        if self.start(statement, params)? {
            Ok(Some(Cursor::resume(statement, true)))
        } else {
            Ok(None)
        }
    }

    /// Like [`execute`](Self::execute), but always returns a result set; a
    /// statement without rows yields one where `more()` is false.
    pub fn execute_classic<'s, P: AsRef<str>>(
        &self,
        statement: &'s mut SqliteStatement,
        params: &[P],
    ) -> Result<ResultSet<'s>> {
        let has_more = self.start(statement, params)?;
        Ok(ResultSet::resume(statement, has_more))
    }

    /// Executes `statement` and pushes its rows through a [`ResultStream`].
    ///
    /// The statement moves into the stream's producer. On failure it is
    /// handed back together with the error; on success
    /// [`ResultStream::finish`] returns it.
    pub fn execute_stream<P: AsRef<str>>(
        &self,
        mut statement: SqliteStatement,
        params: &[P],
    ) -> std::result::Result<ResultStream, (SqliteStatement, SqliteError)> {
        match self.start(&mut statement, params) {
            Ok(has_more) => ResultStream::spawn(statement, has_more),
            Err(e) => Err((statement, e)),
        }
    }

    /// Prepares `sql`, executes it once and returns every row.
    pub fn execute_direct<P: AsRef<str>>(&self, sql: &str, params: &[P]) -> Result<Vec<Row>> {
        let mut statement = self.prepare(sql)?;
        let rows = match self.execute(&mut statement, params)? {
            Some(mut cursor) => cursor.fetch_all()?,
            None => Vec::new(),
        };
        statement.close()?;
        Ok(rows)
    }

    /// Releases the session.
    ///
    /// Refused by the engine while statements prepared on this connection
    /// are still open; the connection stays usable in that case.
    pub fn close(&mut self) -> Result<()> {
        self.session.close()
    }

    pub fn is_closed(&self) -> bool {
        self.session.is_closed()
    }

    /// Rows changed by the most recent INSERT, UPDATE or DELETE.
    pub fn changes(&self) -> Result<i64> {
        self.session.changes()
    }

    /// Row id of the most recent successful INSERT.
    pub fn last_id(&self) -> Result<i64> {
        self.session.last_insert_rowid()
    }

    fn table_columns(&self, db_schema: &str, table_name: &str) -> Result<Vec<Row>> {
        self.execute_direct(
            "SELECT name, type FROM pragma_table_info(?, ?) ORDER BY cid",
            &[table_name, db_schema],
        )
    }
}

impl dbapi::Connection for SqliteConnection {
    type Error = SqliteError;
    type Statement = SqliteStatement;
    type Cursor<'s> = Cursor<'s>;
    type ResultSet<'s> = ResultSet<'s>;

    fn prepare(&self, sql: &str) -> Result<SqliteStatement> {
        SqliteConnection::prepare(self, sql)
    }

    fn execute<'s, P: AsRef<str>>(
        &self,
        statement: &'s mut SqliteStatement,
        params: &[P],
    ) -> Result<Option<Cursor<'s>>> {
        SqliteConnection::execute(self, statement, params)
    }

    fn execute_classic<'s, P: AsRef<str>>(
        &self,
        statement: &'s mut SqliteStatement,
        params: &[P],
    ) -> Result<ResultSet<'s>> {
        SqliteConnection::execute_classic(self, statement, params)
    }

    fn close(&mut self) -> Result<()> {
        SqliteConnection::close(self)
    }
}

impl dbapi::InformativeConnection for SqliteConnection {
    fn changes(&self) -> Result<i64> {
        SqliteConnection::changes(self)
    }

    fn last_id(&self) -> Result<i64> {
        SqliteConnection::last_id(self)
    }
}

fn not_implemented(what: &str) -> AdbcError {
    AdbcError::with_message_and_status(format!("{} not supported", what), Status::NotImplemented)
}

fn batch_error(what: &str, e: arrow_schema::ArrowError) -> AdbcError {
    AdbcError::with_message_and_status(
        format!("Failed to create {} batch: {}", what, e),
        Status::Internal,
    )
}

impl Optionable for SqliteConnection {
    type Option = OptionConnection;

    fn set_option(&mut self, _key: Self::Option, _value: OptionValue) -> adbc_core::error::Result<()> {
        Err(not_implemented("Connection options"))
    }

    fn get_option_string(&self, _key: Self::Option) -> adbc_core::error::Result<String> {
        Err(not_implemented("Connection options"))
    }

    fn get_option_bytes(&self, _key: Self::Option) -> adbc_core::error::Result<Vec<u8>> {
        Err(not_implemented("Connection options"))
    }

    fn get_option_double(&self, _key: Self::Option) -> adbc_core::error::Result<f64> {
        Err(not_implemented("Connection options"))
    }

    fn get_option_int(&self, _key: Self::Option) -> adbc_core::error::Result<i64> {
        Err(not_implemented("Connection options"))
    }
}

impl Connection for SqliteConnection {
    type StatementType = QueryStatement;

    fn new_statement(&mut self) -> adbc_core::error::Result<Self::StatementType> {
        if self.is_closed() {
            return Err(SqliteError::usage("new_statement: connection is closed").into());
        }
        Ok(QueryStatement::new(Arc::clone(&self.session)))
    }

    fn cancel(&mut self) -> adbc_core::error::Result<()> {
        Err(not_implemented("Query cancellation"))
    }

    fn get_info(
        &self,
        codes: Option<HashSet<InfoCode>>,
    ) -> adbc_core::error::Result<impl RecordBatchReader + Send> {
        let vendor_version = engine::library_version().version.unwrap_or_default();
        let info = [
            (InfoCode::VendorName, "SQLite"),
            (InfoCode::VendorVersion, vendor_version.as_str()),
            (InfoCode::DriverName, "ADBC-SQLite3"),
            (InfoCode::DriverVersion, env!("CARGO_PKG_VERSION")),
        ];
        let (info_codes, info_values): (Vec<u32>, Vec<&str>) = info
            .into_iter()
            .filter(|(code, _)| codes.as_ref().is_none_or(|wanted| wanted.contains(code)))
            .map(|(code, value)| (code as u32, value))
            .unzip();

        let schema = Schema::new(vec![
            Field::new("info_code", DataType::UInt32, false),
            Field::new("info_value", DataType::Utf8, false),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema.clone()),
            vec![
                Arc::new(UInt32Array::from(info_codes)) as ArrayRef,
                Arc::new(StringArray::from(info_values)) as ArrayRef,
            ],
        )
        .map_err(|e| batch_error("info", e))?;

        Ok(VecRecordBatchReader::new(vec![batch], schema))
    }

    fn get_objects(
        &self,
        depth: ObjectDepth,
        catalog: Option<&str>,
        db_schema: Option<&str>,
        table_name: Option<&str>,
        table_type: Option<Vec<&str>>,
        column_name: Option<&str>,
    ) -> adbc_core::error::Result<Box<dyn RecordBatchReader + Send>> {
        let depth_val: c_int = depth.into();
        let catalogs_depth: c_int = ObjectDepth::Catalogs.into();
        let schemas_depth: c_int = ObjectDepth::Schemas.into();
        let tables_depth: c_int = ObjectDepth::Tables.into();

        // only the primary database is reported
        let in_main = catalog.is_none_or(|c| c == MAIN_SCHEMA)
            && db_schema.is_none_or(|s| s == MAIN_SCHEMA);

        if depth_val == catalogs_depth {
            let names: Vec<&str> = if in_main { vec![MAIN_SCHEMA] } else { vec![] };
            let schema = Schema::new(vec![Field::new("catalog_name", DataType::Utf8, true)]);
            let batch = RecordBatch::try_new(
                Arc::new(schema.clone()),
                vec![Arc::new(StringArray::from(names)) as ArrayRef],
            )
            .map_err(|e| batch_error("catalogs", e))?;
            return Ok(Box::new(VecRecordBatchReader::new(vec![batch], schema)));
        }

        let mut catalog_names: Vec<&str> = Vec::new();
        let mut db_schema_names: Vec<Option<&str>> = Vec::new();
        let mut table_names: Vec<Option<String>> = Vec::new();
        let mut table_types: Vec<Option<String>> = Vec::new();
        let mut column_names: Vec<Option<String>> = Vec::new();
        let mut column_types: Vec<Option<String>> = Vec::new();

        if in_main && depth_val == schemas_depth {
            catalog_names.push(MAIN_SCHEMA);
            db_schema_names.push(Some(MAIN_SCHEMA));
            table_names.push(None);
            table_types.push(None);
            column_names.push(None);
            column_types.push(None);
        } else if in_main {
            let tables = self.execute_direct(
                "SELECT name, type FROM sqlite_master \
                 WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%' ORDER BY name",
                &[] as &[&str],
            )?;

            for row in tables {
                let (tbl, ttype) = (&row[0], &row[1]);
                let name_match = table_name.is_none_or(|t| t == tbl.as_str());
                let type_match = table_type.as_ref().is_none_or(|t| t.contains(&ttype.as_str()));
                if !(name_match && type_match) {
                    continue;
                }

                let columns: Vec<Row> = if depth_val == tables_depth {
                    Vec::new()
                } else {
                    self.table_columns(MAIN_SCHEMA, tbl)?
                        .into_iter()
                        .filter(|col| column_name.is_none_or(|c| c == col[0]))
                        .collect()
                };

                if columns.is_empty() {
                    catalog_names.push(MAIN_SCHEMA);
                    db_schema_names.push(Some(MAIN_SCHEMA));
                    table_names.push(Some(tbl.clone()));
                    table_types.push(Some(ttype.clone()));
                    column_names.push(None);
                    column_types.push(None);
                }
                for mut col in columns {
                    catalog_names.push(MAIN_SCHEMA);
                    db_schema_names.push(Some(MAIN_SCHEMA));
                    table_names.push(Some(tbl.clone()));
                    table_types.push(Some(ttype.clone()));
                    column_types.push(Some(col.remove(1)));
                    column_names.push(Some(col.remove(0)));
                }
            }
        }

        let schema = Schema::new(vec![
            Field::new("catalog_name", DataType::Utf8, true),
            Field::new("db_schema_name", DataType::Utf8, true),
            Field::new("table_name", DataType::Utf8, true),
            Field::new("table_type", DataType::Utf8, true),
            Field::new("column_name", DataType::Utf8, true),
            Field::new("column_type", DataType::Utf8, true),
        ]);

        let batch = RecordBatch::try_new(
            Arc::new(schema.clone()),
            vec![
                Arc::new(StringArray::from(catalog_names)) as ArrayRef,
                Arc::new(StringArray::from(db_schema_names)) as ArrayRef,
                Arc::new(StringArray::from(table_names)) as ArrayRef,
                Arc::new(StringArray::from(table_types)) as ArrayRef,
                Arc::new(StringArray::from(column_names)) as ArrayRef,
                Arc::new(StringArray::from(column_types)) as ArrayRef,
            ],
        )
        .map_err(|e| batch_error("objects", e))?;

        Ok(Box::new(VecRecordBatchReader::new(vec![batch], schema)))
    }

    fn get_table_schema(
        &self,
        _catalog: Option<&str>,
        db_schema: Option<&str>,
        table_name: &str,
    ) -> adbc_core::error::Result<Schema> {
        let db = db_schema.unwrap_or(MAIN_SCHEMA);
        let names: Vec<String> = self
            .table_columns(db, table_name)?
            .into_iter()
            .map(|mut col| col.swap_remove(0))
            .collect();

        if names.is_empty() {
            return Err(AdbcError::with_message_and_status(
                format!("Table '{}.{}' not found", db, table_name),
                Status::NotFound,
            ));
        }
        Ok(text_schema(&names))
    }

    fn get_table_types(&self) -> adbc_core::error::Result<impl RecordBatchReader + Send> {
        let schema = Schema::new(vec![Field::new("table_type", DataType::Utf8, false)]);
        let batch = RecordBatch::try_new(
            Arc::new(schema.clone()),
            vec![Arc::new(StringArray::from(vec!["table", "view"])) as ArrayRef],
        )
        .map_err(|e| batch_error("table types", e))?;

        Ok(VecRecordBatchReader::new(vec![batch], schema))
    }

    fn get_statistic_names(&self) -> adbc_core::error::Result<impl RecordBatchReader + Send> {
        let schema = Schema::new(vec![
            Field::new("statistic_name", DataType::Utf8, false),
            Field::new("statistic_description", DataType::Utf8, false),
        ]);
        Ok(VecRecordBatchReader::empty(schema))
    }

    fn get_statistics(
        &self,
        _catalog: Option<&str>,
        _db_schema: Option<&str>,
        _table_name: Option<&str>,
        _approximate: bool,
    ) -> adbc_core::error::Result<impl RecordBatchReader + Send> {
        Ok(VecRecordBatchReader::empty(Schema::empty()))
    }

    fn commit(&mut self) -> adbc_core::error::Result<()> {
        Err(not_implemented("Transaction commit"))
    }

    fn rollback(&mut self) -> adbc_core::error::Result<()> {
        Err(not_implemented("Transaction rollback"))
    }

    fn read_partition(
        &self,
        _partition: impl AsRef<[u8]>,
    ) -> adbc_core::error::Result<Box<dyn RecordBatchReader + Send>> {
        Err(not_implemented("Partitioned reads"))
    }
}


// Rust guideline compliant 2026-10-19
