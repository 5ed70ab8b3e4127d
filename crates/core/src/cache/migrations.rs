//! Schema versions for the cache database.
//!
//! `_migrations` records every applied version. Opening a database applies
//! whatever versions it has not seen yet, each inside its own transaction, so
//! a half-applied schema never gets recorded.

use tokio_rusqlite::{Connection, params};

use super::Error;

/// Ordered schema versions. Version 1 creates the generation and entry tables.
const MIGRATIONS: &[(i64, &str)] = &[(1, include_str!("../../migrations/001_generations.sql"))];

/// Bring the schema on `conn` up to the latest version.
///
/// # Errors
///
/// Returns `Error::MigrationFailed` naming the version whose SQL failed.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
        )?;

        let applied: i64 =
            conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

        for &(version, sql) in MIGRATIONS.iter().filter(|(v, _)| *v > applied) {
            tracing::debug!(version, "applying cache schema version");
            let tx = conn.transaction()?;
            tx.execute_batch(sql)
                .map_err(|e| Error::MigrationFailed(format!("version {version}: {e}")))?;
            tx.execute(
                "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
                params![version, chrono::Utc::now().to_rfc3339()],
            )?;
            tx.commit()?;
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rerun_is_noop() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();
        run(&conn).await.unwrap();

        let (tables, versions): (i64, i64) = conn
            .call(|conn| -> Result<(i64, i64), tokio_rusqlite::rusqlite::Error> {
                let tables = conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('generations', 'entries')",
                    [],
                    |row| row.get(0),
                )?;
                let versions = conn.query_row("SELECT COUNT(*) FROM _migrations", [], |row| row.get(0))?;
                Ok((tables, versions))
            })
            .await
            .unwrap();

        assert_eq!(tables, 2);
        assert_eq!(versions, MIGRATIONS.len() as i64);
    }

    #[tokio::test]
    async fn test_applies_only_newer_versions() {
        let conn = Connection::open_in_memory().await.unwrap();
        conn.call(|conn| {
            conn.execute_batch(
                "CREATE TABLE _migrations (version INTEGER PRIMARY KEY, applied_at TEXT NOT NULL);
                 INSERT INTO _migrations VALUES (1, 'earlier');",
            )
        })
        .await
        .unwrap();

        run(&conn).await.unwrap();

        let generations: i64 = conn
            .call(|conn| {
                conn.query_row("SELECT COUNT(*) FROM sqlite_master WHERE name = 'generations'", [], |row| row.get(0))
            })
            .await
            .unwrap();
        assert_eq!(generations, 0);
    }
}
