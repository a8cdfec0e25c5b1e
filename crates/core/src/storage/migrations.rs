//! Embedded schema migrations.
//!
//! The SQLite file is shared with the admin panel process, so the runner
//! sets a 30s busy timeout before applying anything: whichever process
//! starts first applies the schema, the other waits on the file lock and
//! then finds every migration already recorded. Refinery wraps each
//! migration in its own transaction, so no outer transaction is needed.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::Duration;

mod embedded {
    use refinery::embed_migrations;

    embed_migrations!("./migrations");
}

// Serializes runners inside this process; the busy timeout covers the
// cross-process case.
static RUNNER_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// Applies all pending migrations. Idempotent, so a poisoned in-process
/// lock is recovered rather than treated as fatal.
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let _guard = RUNNER_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner);

    conn.busy_timeout(BUSY_TIMEOUT)
        .context("set SQLite busy timeout")?;
    embedded::migrations::runner()
        .run(conn)
        .map(|_| ())
        .context("apply migrations")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_migrations_creates_schema_and_reruns_cleanly() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        // Second run finds everything applied and commits without error.
        run_migrations(&mut conn).unwrap();

        let users: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(users, 0);
    }
}
