//! RecordBatchReader implementations for ADBC results.
//!
//! `SqliteRecordBatchReader` streams a statement's rows as Arrow batches of
//! `Utf8` columns, pulling one batch worth of rows from the engine at a time.

use std::sync::Arc;

use arrow_array::builder::StringBuilder;
use arrow_array::{ArrayRef, RecordBatch};
use arrow_schema::{ArrowError, Schema, SchemaRef};

use crate::cursor::{Cursor, Row};
use crate::statement::SqliteStatement;

/// Iterator-based RecordBatchReader for pre-loaded record batches.
pub struct VecRecordBatchReader {
    batches: std::vec::IntoIter<RecordBatch>,
    schema: SchemaRef,
}

impl VecRecordBatchReader {
    pub fn new(batches: Vec<RecordBatch>, schema: Schema) -> Self {
        Self {
            batches: batches.into_iter(),
            schema: Arc::new(schema),
        }
    }

    pub fn empty(schema: Schema) -> Self {
        Self::new(Vec::new(), schema)
    }
}

impl arrow_array::RecordBatchReader for VecRecordBatchReader {
    fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }
}

impl Iterator for VecRecordBatchReader {
    type Item = std::result::Result<RecordBatch, ArrowError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.batches.next().map(Ok)
    }
}

/// Streams an executing statement's rows as Arrow batches.
///
/// Owns the statement, which is finalized when the reader is dropped. An
/// engine error ends the stream after being yielded once.
pub struct SqliteRecordBatchReader {
    statement: SqliteStatement,
    has_more: bool,
    schema: SchemaRef,
    batch_size: usize,
}

impl SqliteRecordBatchReader {
    const DEFAULT_BATCH_SIZE: usize = 1024;

    pub(crate) fn new(statement: SqliteStatement, has_more: bool, schema: Schema) -> Self {
        Self {
            statement,
            has_more,
            schema: Arc::new(schema),
            batch_size: Self::DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    fn fetch_rows(&mut self) -> crate::Result<Vec<Row>> {
        let mut cursor = Cursor::resume(&mut self.statement, self.has_more);
        let mut rows = Vec::with_capacity(self.batch_size);
        let mut outcome = Ok(());
        while rows.len() < self.batch_size && cursor.has_more() {
            match cursor.fetch_one() {
                Ok(row) => rows.push(row),
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }
        self.has_more = cursor.has_more();
        outcome.map(|()| rows)
    }

    /// Builds one column-major batch from row-major text rows.
    fn build_batch(&self, rows: &[Row]) -> std::result::Result<RecordBatch, ArrowError> {
        let arrays: Vec<ArrayRef> = (0..self.schema.fields().len())
            .map(|col| {
                let mut builder = StringBuilder::with_capacity(rows.len(), rows.len() * 16);
                for row in rows {
                    builder.append_value(&row[col]);
                }
                Arc::new(builder.finish()) as ArrayRef
            })
            .collect();

        RecordBatch::try_new(Arc::clone(&self.schema), arrays)
    }
}

impl arrow_array::RecordBatchReader for SqliteRecordBatchReader {
    fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }
}

impl Iterator for SqliteRecordBatchReader {
    type Item = std::result::Result<RecordBatch, ArrowError>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.has_more {
            return None;
        }
        let batch = self
            .fetch_rows()
            .map_err(|e| ArrowError::ExternalError(Box::new(e)))
            .and_then(|rows| self.build_batch(&rows));
        Some(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::text_schema;
    use crate::{ConnectionInfo, SqliteConnection};
    use arrow_array::{Array, RecordBatchReader, StringArray};
    use arrow_schema::{DataType, Field};

    fn reader_over(conn: &SqliteConnection, sql: &str) -> SqliteRecordBatchReader {
        let mut stmt = conn.prepare(sql).unwrap();
        let has_more = stmt.start(&[] as &[&str]).unwrap();
        let schema = text_schema(&stmt.column_names().unwrap());
        SqliteRecordBatchReader::new(stmt, has_more, schema)
    }

    #[test]
    fn test_vec_reader() {
        let schema = Schema::new(vec![Field::new("v", DataType::Utf8, false)]);
        let mut reader = VecRecordBatchReader::empty(schema);
        assert_eq!(reader.schema().fields().len(), 1);
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_batches_split_by_size() {
        let conn = crate::open(&ConnectionInfo::new(":memory:")).unwrap();
        let reader = reader_over(
            &conn,
            "WITH RECURSIVE n(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM n WHERE x < 5) \
             SELECT x, 'row' || x AS label FROM n",
        )
        .with_batch_size(2);

        let sizes: Vec<usize> = reader.map(|b| b.unwrap().num_rows()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn test_values_are_text() {
        let conn = crate::open(&ConnectionInfo::new(":memory:")).unwrap();
        let mut reader = reader_over(&conn, "SELECT 1 AS a, NULL AS b, 2.5 AS c");
        let batch = reader.next().unwrap().unwrap();
        assert_eq!(batch.schema().field(0).name(), "a");

        let b = batch.column(1).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(b.value(0), "");
        assert_eq!(b.null_count(), 0);
        let c = batch.column(2).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(c.value(0), "2.5");
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_no_rows_means_no_batches() {
        let conn = crate::open(&ConnectionInfo::new(":memory:")).unwrap();
        let mut reader = reader_over(&conn, "SELECT 1 WHERE 0");
        assert!(reader.next().is_none());
    }
}

// Rust guideline compliant 2026-10-19
