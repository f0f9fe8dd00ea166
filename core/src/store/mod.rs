//! SQLite persistence layer.
//!
//! RULE: All SQL lives under store/.
//! The orchestrator and processor call store methods; they never execute SQL directly.

use crate::{
    error::{HazardError, HazardResult},
    model::Run,
    status::RunStatus,
};
use rusqlite::{params, types::Type, Connection, OptionalExtension};

mod import;
mod results;
mod run_data;

pub use results::ScenarioRow;

pub struct HazardStore {
    conn: Connection,
}

impl HazardStore {
    /// Open (or create) the database at `path`. `file:` URIs are accepted,
    /// so shared-cache in-memory databases work across connections.
    pub fn open(path: &str) -> HazardResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // In-memory databases answer "memory" here and keep that mode.
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        log::debug!("Opened {path} with journal mode {mode}");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open a private in-memory database (used in tests).
    pub fn in_memory() -> HazardResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Apply all schema migrations in order. Runs on every open and is
    /// safe to repeat.
    pub fn migrate(&self) -> HazardResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_hazard_rate.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn fetch_run(&self, run_id: &str) -> HazardResult<Option<Run>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, title, run_date, contact_email, description, user_id,
                        organisation_id, status
                 FROM hazard_rate_run WHERE id = ?1",
                params![run_id],
                |row| {
                    let status: String = row.get(7)?;
                    Ok(Run {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        run_date: row.get(2)?,
                        contact_email: row.get(3)?,
                        description: row.get(4)?,
                        user_id: row.get(5)?,
                        organisation_id: row.get(6)?,
                        status: status
                            .parse()
                            .map_err(|e: anyhow::Error| invalid_column(7, Type::Text, e.to_string()))?,
                    })
                },
            )
            .optional()?;
        Ok(run)
    }

    pub fn update_run_status(&self, run_id: &str, status: RunStatus) -> HazardResult<()> {
        let updated = self.conn.execute(
            "UPDATE hazard_rate_run SET status = ?1 WHERE id = ?2",
            params![status.as_str(), run_id],
        )?;
        if updated == 0 {
            return Err(HazardError::RunNotFound { run_id: run_id.to_string() });
        }
        log::debug!("Run {run_id} status -> {status}");
        Ok(())
    }

    pub fn run_status(&self, run_id: &str) -> HazardResult<Option<RunStatus>> {
        Ok(self.fetch_run(run_id)?.map(|run| run.status))
    }
}

/// Column value that does not map onto a domain enum.
fn invalid_column(index: usize, kind: Type, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, kind, message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    #[test]
    fn file_database_opens_in_wal_mode() {
        let path = env::temp_dir().join(format!("hazard_store_{}.db", uuid::Uuid::new_v4()));
        let path_str = path.to_str().unwrap().to_string();

        let store = HazardStore::open(&path_str).unwrap();
        let mode: String = store.conn.query_row("PRAGMA journal_mode", [], |row| row.get(0)).unwrap();
        assert_eq!(mode, "wal");
        drop(store);

        for suffix in ["", "-wal", "-shm"] {
            let _ = fs::remove_file(format!("{path_str}{suffix}"));
        }
    }

    #[test]
    fn fresh_store_has_schema_without_explicit_migrate() {
        let store = HazardStore::open("file:store_fresh_schema?mode=memory&cache=shared").unwrap();
        assert_eq!(store.run_status("no-such-run").unwrap(), None);

        let store = HazardStore::in_memory().unwrap();
        assert_eq!(store.run_status("no-such-run").unwrap(), None);
        store.migrate().unwrap();
    }
}
