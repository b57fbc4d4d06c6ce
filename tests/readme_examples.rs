//! Tests to verify README examples compile and work correctly.
//! These tests should match the code shown in README.md.

mod common;

use adbc_core::options::{OptionDatabase, OptionValue};
use adbc_core::{Connection, Database, Driver, Statement};
use arrow_array::{Array, RecordBatchReader, StringArray};

use adbc_sqlite3::ConnectionInfo;

/// This test mirrors the "Basic Query" example from README.md
#[test]
fn test_readme_basic_query() {
    let scratch = common::Scratch::new();
    let uri = scratch.uri("app.db");

    let conn = adbc_sqlite3::open(&ConnectionInfo::from_uri(&uri).expect("Failed to parse URI"))
        .expect("Failed to connect");
    conn.execute_direct(
        "CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY, name TEXT)",
        &[] as &[&str],
    )
    .expect("Failed to create table");

    let mut insert = conn
        .prepare("INSERT INTO users (name) VALUES (?)")
        .expect("Failed to prepare insert");
    for name in ["alice", "bob"] {
        conn.execute(&mut insert, &[name]).expect("Failed to insert");
    }
    insert.close().expect("Failed to close insert");

    let mut stmt = conn
        .prepare("SELECT id, name FROM users WHERE id > ?")
        .expect("Failed to prepare query");
    let mut seen = Vec::new();
    if let Some(mut cursor) = conn.execute(&mut stmt, &["0"]).expect("Failed to execute") {
        for row in cursor.fetch_all().expect("Failed to fetch") {
            println!("{} {}", row[0], row[1]);
            seen.push(row);
        }
    }
    stmt.close().expect("Failed to close statement");

    assert_eq!(seen, vec![vec!["1", "alice"], vec!["2", "bob"]]);
}

/// This test mirrors the "Result Sets" example from README.md
#[test]
fn test_readme_result_sets() {
    let (_scratch, conn) = common::create_test_connection("app.db");
    common::create_users_table(&conn);

    let mut stmt = conn
        .prepare("SELECT name FROM users ORDER BY id")
        .expect("Failed to prepare");
    let mut results = conn
        .execute_classic(&mut stmt, &[] as &[&str])
        .expect("Failed to execute");

    let mut names = Vec::new();
    while results.more() {
        names.push(results.fetch().expect("Failed to fetch").remove(0));
    }
    assert_eq!(names, vec!["alice"]);
}

/// This test mirrors the "Streaming" example from README.md
#[tokio::test(flavor = "multi_thread")]
async fn test_readme_streaming() {
    let (_scratch, conn) = common::create_test_connection("app.db");
    common::create_users_table(&conn);

    let stmt = conn.prepare("SELECT id FROM users").expect("Failed to prepare");
    let mut stream = conn
        .execute_stream(stmt, &[] as &[&str])
        .map_err(|(_, e)| e)
        .expect("Failed to start stream");

    let mut count = 0;
    while let Some(row) = stream.recv().await {
        println!("{:?}", row.expect("Failed to receive row"));
        count += 1;
    }
    let stmt = stream.finish().await.expect("Failed to finish stream");

    assert_eq!(count, 1);
    assert!(!stmt.is_closed());
}

/// This test mirrors the "ADBC" example from README.md
#[test]
fn test_readme_adbc() {
    let scratch = common::Scratch::new();
    {
        let conn = adbc_sqlite3::open(&scratch.info("app.db")).expect("Failed to connect");
        common::create_users_table(&conn);
    }

    let mut driver = adbc_sqlite3::SqliteDriver::default();
    let db = driver
        .new_database_with_opts([(OptionDatabase::Uri, OptionValue::String(scratch.uri("app.db")))])
        .expect("Failed to create database");

    let mut conn = db.new_connection().expect("Failed to connect");
    let mut stmt = conn.new_statement().expect("Failed to create statement");
    stmt.set_sql_query("SELECT * FROM users").expect("Failed to set query");

    let reader = stmt.execute().expect("Failed to execute query");
    assert_eq!(reader.schema().field(1).name(), "name");

    let mut total_rows = 0;
    for batch in reader {
        let batch = batch.expect("Failed to read batch");
        println!("Got {} rows", batch.num_rows());
        let names = batch
            .column(1)
            .as_any()
            .downcast_ref::<StringArray>()
            .expect("Names should be text");
        assert_eq!(names.value(0), "alice");
        total_rows += batch.num_rows();
    }
    assert_eq!(total_rows, 1);
}
