//! Metadata retrieval example for ADBC-SQLite3 driver.
//!
//! This example retrieves driver and engine information, table types, the
//! object tree and a table schema.

use adbc_core::options::{ObjectDepth, OptionDatabase};
use adbc_core::{Connection, Database, Driver};
use arrow_array::{Array, StringArray, UInt32Array};

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let uri = std::env::var("SQLITE3_URI").unwrap_or_else(|_| "sqlite3://demo.db".to_string());
    println!("Retrieving metadata from {}", uri);

    let mut driver = adbc_sqlite3::SqliteDriver::default();
    let db = driver.new_database_with_opts([(OptionDatabase::Uri, uri.into())])?;
    let connection = db.new_connection()?;

    // Get driver and engine info
    println!("\n=== Driver Info ===");
    for batch in connection.get_info(None)? {
        let batch = batch?;
        let codes = batch.column(0).as_any().downcast_ref::<UInt32Array>();
        let values = batch.column(1).as_any().downcast_ref::<StringArray>();
        if let (Some(codes), Some(values)) = (codes, values) {
            for i in 0..batch.num_rows() {
                println!("  {}: {}", codes.value(i), values.value(i));
            }
        }
    }

    println!("\n=== Table Types ===");
    for batch in connection.get_table_types()? {
        let batch = batch?;
        if let Some(types) = batch.column(0).as_any().downcast_ref::<StringArray>() {
            for i in 0..types.len() {
                println!("  {}", types.value(i));
            }
        }
    }

    println!("\n=== Objects ===");
    let mut tables = Vec::new();
    for batch in connection.get_objects(ObjectDepth::All, None, None, None, None, None)? {
        let batch = batch?;
        let table = batch.column(2).as_any().downcast_ref::<StringArray>();
        let column = batch.column(4).as_any().downcast_ref::<StringArray>();
        let column_type = batch.column(5).as_any().downcast_ref::<StringArray>();
        if let (Some(table), Some(column), Some(column_type)) = (table, column, column_type) {
            for i in 0..batch.num_rows() {
                if table.is_null(i) {
                    continue;
                }
                println!("  {}.{} {}", table.value(i), column.value(i), column_type.value(i));
                if !tables.contains(&table.value(i).to_string()) {
                    tables.push(table.value(i).to_string());
                }
            }
        }
    }

    if let Some(table) = tables.first() {
        println!("\n=== Schema of {} ===", table);
        let schema = connection.get_table_schema(None, None, table)?;
        for field in schema.fields() {
            println!("  {}: {:?}", field.name(), field.data_type());
        }
    } else {
        println!("\nNo tables yet; run the insert example first");
    }

    Ok(())
}
