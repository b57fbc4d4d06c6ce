//! Query execution example for ADBC-SQLite3 driver.
//!
//! This example prepares a parameterized query once, executes it several
//! times and walks the rows with a cursor and a classic result set.

use adbc_sqlite3::ConnectionInfo;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let uri = std::env::var("SQLITE3_URI").unwrap_or_else(|_| "sqlite3://demo.db".to_string());
    println!("Querying {}", uri);

    let conn = adbc_sqlite3::open(&ConnectionInfo::from_uri(&uri)?)?;
    conn.execute_direct(
        "CREATE TABLE IF NOT EXISTS sensor_data (id INTEGER PRIMARY KEY, location TEXT, temperature REAL)",
        &[] as &[&str],
    )?;
    if conn.execute_direct("SELECT count(*) FROM sensor_data", &[] as &[&str])?[0][0] == "0" {
        conn.execute_direct(
            "INSERT INTO sensor_data (location, temperature) \
             VALUES ('north', 21.5), ('north', 22.0), ('south', 25.1), ('south', NULL)",
            &[] as &[&str],
        )?;
    }

    let mut stmt = conn.prepare("SELECT id, temperature FROM sensor_data WHERE location = ? ORDER BY id")?;
    println!("Prepared: {}", stmt);

    for location in ["north", "south", "east"] {
        println!("\n{}:", location);
        match conn.execute(&mut stmt, &[location])? {
            Some(mut cursor) => {
                while cursor.has_more() {
                    let row = cursor.fetch_one()?;
                    let temperature = if row[1].is_empty() { "n/a" } else { row[1].as_str() };
                    println!("  #{} {}", row[0], temperature);
                }
            }
            None => println!("  no readings"),
        }
    }

    // the same statement through the classic more/fetch interface
    let mut results = conn.execute_classic(&mut stmt, &["north"])?;
    println!("\nColumns: {:?}", results.column_names()?);
    while results.more() {
        println!("  {:?}", results.fetch()?);
    }
    results.close()?;

    stmt.close()?;
    Ok(())
}
