//! Basic connection example for ADBC-SQLite3 driver.
//!
//! This example opens a database with the core API, runs one query and
//! prints the engine version.

use adbc_sqlite3::ConnectionInfo;

fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let uri = std::env::var("SQLITE3_URI").unwrap_or_else(|_| "sqlite3://demo.db".to_string());
    println!("Opening {}", uri);

    let info = ConnectionInfo::from_uri(&uri)?;
    let mut conn = adbc_sqlite3::open(&info)?;
    println!("Opened {:?}", info);

    let version = adbc_sqlite3::version()?;
    println!("SQLite version: {}", version.get("version").map(String::as_str).unwrap_or("unknown"));

    let rows = conn.execute_direct("SELECT datetime('now'), ?", &["hello"])?;
    println!("Engine says: {:?}", rows[0]);

    conn.close()?;
    println!("Connection closed");

    Ok(())
}
