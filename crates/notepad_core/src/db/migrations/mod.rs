//! Embedded schema steps for the note store.
//!
//! Step `n` (1-based) upgrades a database to schema version `n`. The version
//! reached is stored in `PRAGMA user_version`; pending steps commit together.

use crate::db::{DbError, DbResult};
use log::debug;
use rusqlite::Connection;

const STEPS: [&str; 2] = [
    include_str!("0001_init.sql"),
    include_str!("0002_category_index.sql"),
];

/// Schema versions before and after [`apply_migrations`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    pub from: u32,
    pub to: u32,
}

impl MigrationReport {
    pub fn applied(&self) -> u32 {
        self.to - self.from
    }
}

/// Newest schema version this build can produce.
pub fn latest_version() -> u32 {
    // Two embedded steps; the cast cannot truncate.
    STEPS.len() as u32
}

/// Brings `conn` up to [`latest_version`].
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file was written by a newer build.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<MigrationReport> {
    let from: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let to = latest_version();
    if from > to {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from,
            latest_supported: to,
        });
    }

    let pending = STEPS.iter().zip(1..=to).skip(from as usize);
    let tx = conn.transaction()?;
    for (script, version) in pending {
        tx.execute_batch(script)?;
        tx.pragma_update(None, "user_version", version)?;
        debug!("event=db_migrate module=db status=ok version={version}");
    }
    tx.commit()?;

    Ok(MigrationReport { from, to })
}

#[cfg(test)]
mod tests {
    use super::{apply_migrations, latest_version};
    use rusqlite::Connection;

    #[test]
    fn second_run_applies_nothing() {
        let mut conn = Connection::open_in_memory().unwrap();

        let first = apply_migrations(&mut conn).unwrap();
        assert_eq!((first.from, first.to), (0, latest_version()));
        assert_eq!(first.applied(), latest_version());

        let second = apply_migrations(&mut conn).unwrap();
        assert_eq!(second.applied(), 0);
    }
}
