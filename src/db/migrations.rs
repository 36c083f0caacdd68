use anyhow::Context;
use rusqlite::{Connection, OptionalExtension};

/// Embedded so the store works wherever the binary runs.
const MIGRATIONS: &[(&str, &str)] = &[(
    "001_settings.sql",
    include_str!("../../migrations/001_settings.sql"),
)];

/// Applies pending migrations in order, each in its own transaction.
/// Returns how many were applied.
pub fn run_migrations(conn: &Connection) -> anyhow::Result<usize> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .context("failed to create migrations table")?;

    let mut applied = 0;
    for (name, sql) in MIGRATIONS {
        let seen = conn
            .query_row("SELECT 1 FROM _migrations WHERE name = ?1", [name], |_| Ok(()))
            .optional()
            .context("failed to check migration status")?
            .is_some();
        if seen {
            continue;
        }

        let tx = conn
            .unchecked_transaction()
            .with_context(|| format!("failed to start migration: {name}"))?;
        tx.execute_batch(sql)
            .with_context(|| format!("failed to apply migration: {name}"))?;
        tx.execute("INSERT INTO _migrations (name) VALUES (?1)", [name])
            .with_context(|| format!("failed to record migration: {name}"))?;
        tx.commit()
            .with_context(|| format!("failed to commit migration: {name}"))?;

        tracing::debug!(migration = *name, "applied migration");
        applied += 1;
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_apply_once() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(run_migrations(&conn).unwrap(), MIGRATIONS.len());
        assert_eq!(run_migrations(&conn).unwrap(), 0);

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM settings", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
