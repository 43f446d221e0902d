use crate::error::StoreError;
use crate::models::EmailOutcome;
use chrono::Utc;
use rusqlite::{Connection, params};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS email_checks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL,
        status TEXT NOT NULL,
        mx_records TEXT,
        error_message TEXT,
        check_timestamp TEXT NOT NULL,
        rate_limit INTEGER
    );
    CREATE INDEX IF NOT EXISTS idx_email ON email_checks(email);
";

const INSERT: &str = "
    INSERT INTO email_checks (email, status, mx_records, error_message, check_timestamp, rate_limit)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
";

/// SQLite-backed result store.
///
/// Rows accumulate across runs against the same file; [`SqliteStore::summary`]
/// always covers every stored row.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the database file and ensures the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "opened result store");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Creates the results table and its email index if missing.
    pub fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Appends one row for `outcome`.
    pub fn save(&self, outcome: &EmailOutcome, rate_limit: i64) -> Result<(), StoreError> {
        insert(&self.conn, outcome, rate_limit)
    }

    /// Appends one row per outcome inside a single transaction.
    pub fn save_all(&mut self, outcomes: &[EmailOutcome], rate_limit: i64) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        for outcome in outcomes {
            insert(&tx, outcome, rate_limit)?;
        }
        tx.commit()?;
        debug!(rows = outcomes.len(), "saved outcomes");
        Ok(())
    }

    /// Row count per status label over every stored row.
    pub fn summary(&self) -> Result<BTreeMap<String, i64>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM email_checks GROUP BY status")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;

        let mut summary = BTreeMap::new();
        for row in rows {
            let (status, count) = row?;
            summary.insert(status, count);
        }
        Ok(summary)
    }
}

fn insert(conn: &Connection, outcome: &EmailOutcome, rate_limit: i64) -> Result<(), StoreError> {
    let mx_records = if outcome.mx_hosts().is_empty() {
        None
    } else {
        Some(outcome.mx_hosts().join(","))
    };
    let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();

    conn.execute(
        INSERT,
        params![
            outcome.address(),
            outcome.status().label(),
            mx_records,
            outcome.detail(),
            timestamp,
            rate_limit
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EmailStatus;
    use std::path::PathBuf;

    fn temp_db() -> PathBuf {
        std::env::temp_dir().join(format!("email-checker-{}.db", uuid::Uuid::new_v4()))
    }

    fn sample() -> Vec<EmailOutcome> {
        vec![
            EmailOutcome::valid(
                "a@example.com",
                vec!["mx1.example.com".into(), "mx2.example.com".into()],
            ),
            EmailOutcome::failed("b@example.org", EmailStatus::NoMx, "A record present, no MX"),
            EmailOutcome::failed("nope", EmailStatus::NoDomain, "invalid email syntax"),
            EmailOutcome::failed("c@example.net", EmailStatus::NoDomain, "NXDOMAIN"),
        ]
    }

    #[test]
    fn test_init_schema_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.init_schema().unwrap();
        store.init_schema().unwrap();
        assert!(store.summary().unwrap().is_empty());
    }

    #[test]
    fn test_summary_groups_by_status_label() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.save_all(&sample(), 50).unwrap();

        let summary = store.summary().unwrap();
        assert_eq!(summary.get("valid_domain"), Some(&1));
        assert_eq!(summary.get("no_mx"), Some(&1));
        assert_eq!(summary.get("no_domain"), Some(&2));
        assert_eq!(summary.values().sum::<i64>(), 4);
    }

    #[test]
    fn test_row_columns() {
        let store = SqliteStore::open_in_memory().unwrap();
        for outcome in sample() {
            store.save(&outcome, 10).unwrap();
        }

        let (mx, error, rate): (Option<String>, Option<String>, i64) = store
            .conn
            .query_row(
                "SELECT mx_records, error_message, rate_limit FROM email_checks WHERE email = ?1",
                ["a@example.com"],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(mx.as_deref(), Some("mx1.example.com,mx2.example.com"));
        assert_eq!(error, None);
        assert_eq!(rate, 10);

        let (mx, error): (Option<String>, Option<String>) = store
            .conn
            .query_row(
                "SELECT mx_records, error_message FROM email_checks WHERE email = ?1",
                ["nope"],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(mx, None);
        assert_eq!(error.as_deref(), Some("invalid email syntax"));

        let timestamp: String = store
            .conn
            .query_row("SELECT check_timestamp FROM email_checks LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert!(
            chrono::NaiveDateTime::parse_from_str(&timestamp, "%Y-%m-%d %H:%M:%S").is_ok(),
            "bad timestamp {:?}",
            timestamp
        );
    }

    #[test]
    fn test_summary_is_cumulative_across_runs() {
        let path = temp_db();

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.save_all(&sample(), 50).unwrap();
        }
        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.save_all(&sample()[..1], 0).unwrap();
            let summary = store.summary().unwrap();
            assert_eq!(summary.get("valid_domain"), Some(&2));
            assert_eq!(summary.values().sum::<i64>(), 5);
        }

        let _ = std::fs::remove_file(&path);
    }
}
