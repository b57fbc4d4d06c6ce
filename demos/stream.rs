//! Streaming example for ADBC-SQLite3 driver.
//!
//! This example pushes a query's rows through a channel to async code and
//! reuses the statement once the stream is finished.

use adbc_sqlite3::ConnectionInfo;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let conn = adbc_sqlite3::open(&ConnectionInfo::new(":memory:"))?;
    conn.execute_direct(
        "CREATE TABLE ticks AS \
         WITH RECURSIVE n(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM n WHERE x < 20) \
         SELECT x AS id, 'tick ' || x AS label FROM n",
        &[] as &[&str],
    )?;

    let stmt = conn.prepare("SELECT id, label FROM ticks WHERE id % ? = 0")?;
    let mut stream = conn.execute_stream(stmt, &["3"]).map_err(|(_, e)| e)?;

    while let Some(row) = stream.recv().await {
        let row = row?;
        println!("{} -> {}", row[0], row[1]);
    }

    // the statement comes back ready for another execution
    let mut stmt = stream.finish().await?;
    if let Some(mut cursor) = conn.execute(&mut stmt, &["7"])? {
        println!("Multiples of 7: {:?}", cursor.fetch_all()?);
    }
    stmt.close()?;

    Ok(())
}
