//! Data insertion example for ADBC-SQLite3 driver.
//!
//! This example creates a table and inserts rows through the ADBC API,
//! binding an Arrow batch where every row is one parameter set.

use std::sync::Arc;

use adbc_core::{Connection, Database, Driver, Statement, options::OptionDatabase};
use arrow_array::{Array, Float64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let uri = std::env::var("SQLITE3_URI").unwrap_or_else(|_| "sqlite3://demo.db".to_string());
    println!("Connecting to {}", uri);

    let mut driver = adbc_sqlite3::SqliteDriver::default();
    let db = driver.new_database_with_opts([(OptionDatabase::Uri, uri.into())])?;
    let mut connection = db.new_connection()?;
    let mut stmt = connection.new_statement()?;

    println!("\n1. Creating table 'meters'");
    stmt.set_sql_query("CREATE TABLE IF NOT EXISTS meters (location TEXT, current REAL)")?;
    stmt.execute_update()?;

    println!("\n2. Inserting with literal values");
    stmt.set_sql_query("INSERT INTO meters VALUES ('lab', 10.3), ('roof', 12.6)")?;
    println!("   Rows affected: {:?}", stmt.execute_update()?);

    println!("\n3. Inserting a bound batch");
    stmt.set_sql_query("INSERT INTO meters VALUES (?, ?)")?;
    stmt.prepare()?;
    println!("   Parameters: {:?}", stmt.get_parameter_schema()?);

    let schema = Schema::new(vec![
        Field::new("location", DataType::Utf8, false),
        Field::new("current", DataType::Float64, false),
    ]);
    let batch = RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(StringArray::from(vec!["cellar", "garage", "attic"])),
            Arc::new(Float64Array::from(vec![8.1, 9.4, 11.0])),
        ],
    )?;
    stmt.bind(batch)?;
    println!("   Rows affected: {:?}", stmt.execute_update()?);

    println!("\n4. Counting rows");
    stmt.set_sql_query("SELECT count(*) AS n FROM meters")?;
    for batch in stmt.execute()? {
        let batch = batch?;
        let n = batch
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .map(|a| a.value(0).to_string())
            .unwrap_or_default();
        println!("   meters holds {} rows", n);
    }

    Ok(())
}
