//! Backend-neutral database interface.
//!
//! The traits here describe the driver-facing contract without naming any
//! engine: compile a statement, execute it with positional text parameters,
//! walk the rows. The SQLite types implement them, so code written against
//! these traits can move to another backend that does the same.

/// An open session with a database backend.
pub trait Connection {
    type Error: std::error::Error;
    type Statement;
    type Cursor<'s>: Cursor<Error = Self::Error>
    where
        Self::Statement: 's;
    type ResultSet<'s>: ResultSet<Error = Self::Error>
    where
        Self::Statement: 's;

    /// Compiles `sql` into a reusable statement.
    fn prepare(&self, sql: &str) -> Result<Self::Statement, Self::Error>;

    /// Executes `statement`. Returns `None` when it produced no rows.
    fn execute<'s, P: AsRef<str>>(
        &self,
        statement: &'s mut Self::Statement,
        params: &[P],
    ) -> Result<Option<Self::Cursor<'s>>, Self::Error>;

    /// Executes `statement`; a statement without rows yields an exhausted set.
    fn execute_classic<'s, P: AsRef<str>>(
        &self,
        statement: &'s mut Self::Statement,
        params: &[P],
    ) -> Result<Self::ResultSet<'s>, Self::Error>;

    fn close(&mut self) -> Result<(), Self::Error>;
}

/// Connections that can report the effects of the last modification.
pub trait InformativeConnection: Connection {
    /// Rows changed by the most recent modifying statement.
    fn changes(&self) -> Result<i64, Self::Error>;

    /// Row id of the most recent successful insert.
    fn last_id(&self) -> Result<i64, Self::Error>;
}

/// Pull-style iteration over one execution.
pub trait Cursor {
    type Error: std::error::Error;
    type Row;
    type NamedRow;

    fn has_more(&self) -> bool;
    fn fetch_one(&mut self) -> Result<Self::Row, Self::Error>;
    fn fetch_many(&mut self, n: usize) -> Result<Vec<Self::Row>, Self::Error>;
    fn fetch_all(&mut self) -> Result<Vec<Self::Row>, Self::Error>;
    fn fetch_row(&mut self) -> Result<Self::NamedRow, Self::Error>;
    fn close(self) -> Result<(), Self::Error>
    where
        Self: Sized;
}

/// Classic `more`/`fetch` iteration.
pub trait ResultSet {
    type Error: std::error::Error;
    type Row;

    fn more(&self) -> bool;
    fn fetch(&mut self) -> Result<Self::Row, Self::Error>;
    fn close(self) -> Result<(), Self::Error>
    where
        Self: Sized;
}

impl Cursor for crate::Cursor<'_> {
    type Error = crate::SqliteError;
    type Row = crate::Row;
    type NamedRow = crate::NamedRow;

    fn has_more(&self) -> bool {
        crate::Cursor::has_more(self)
    }

    fn fetch_one(&mut self) -> crate::Result<crate::Row> {
        crate::Cursor::fetch_one(self)
    }

    fn fetch_many(&mut self, n: usize) -> crate::Result<Vec<crate::Row>> {
        crate::Cursor::fetch_many(self, n)
    }

    fn fetch_all(&mut self) -> crate::Result<Vec<crate::Row>> {
        crate::Cursor::fetch_all(self)
    }

    fn fetch_row(&mut self) -> crate::Result<crate::NamedRow> {
        crate::Cursor::fetch_row(self)
    }

    fn close(self) -> crate::Result<()> {
        crate::Cursor::close(self)
    }
}

impl ResultSet for crate::ResultSet<'_> {
    type Error = crate::SqliteError;
    type Row = crate::Row;

    fn more(&self) -> bool {
        crate::ResultSet::more(self)
    }

    fn fetch(&mut self) -> crate::FetchResult {
        crate::ResultSet::fetch(self)
    }

    fn close(self) -> crate::Result<()> {
        crate::ResultSet::close(self)
    }
}

#[cfg(test)]
mod tests {
    use super::{Connection, Cursor, InformativeConnection};
    use crate::ConnectionInfo;

    fn count_rows<C: Connection>(conn: &C, sql: &str) -> Result<usize, C::Error> {
        let mut stmt = conn.prepare(sql)?;
        match conn.execute(&mut stmt, &[] as &[&str])? {
            Some(mut cursor) => Ok(cursor.fetch_all()?.len()),
            None => Ok(0),
        }
    }

    fn insert<C: InformativeConnection>(conn: &C, value: &str) -> Result<i64, C::Error> {
        let mut stmt = conn.prepare("INSERT INTO t VALUES (?)")?;
        conn.execute(&mut stmt, &[value])?;
        conn.last_id()
    }

    #[test]
    fn test_generic_code_drives_sqlite() {
        let mut conn = crate::open(&ConnectionInfo::new(":memory:")).unwrap();
        assert_eq!(count_rows(&conn, "CREATE TABLE t (v TEXT)").unwrap(), 0);
        assert_eq!(insert(&conn, "a").unwrap(), 1);
        assert_eq!(insert(&conn, "b").unwrap(), 2);
        assert_eq!(InformativeConnection::changes(&conn).unwrap(), 1);
        assert_eq!(count_rows(&conn, "SELECT v FROM t").unwrap(), 2);
        Connection::close(&mut conn).unwrap();
    }
}

// Rust guideline compliant 2026-10-19
