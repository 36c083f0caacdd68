use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

pub const TOKEN_KEY: &str = "sanctum_token";
pub const USER_TYPE_KEY: &str = "user_type";
pub const USER_KEY: &str = "user";
pub const THEME_KEY: &str = "theme";

// ── Settings ──

pub fn get_setting(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM settings WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    let now = Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S").to_string();
    conn.execute(
        "INSERT INTO settings (key, value, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET
           value = excluded.value,
           updated_at = excluded.updated_at",
        params![key, value, now],
    )?;
    Ok(())
}

pub fn remove_setting(conn: &Connection, key: &str) -> rusqlite::Result<bool> {
    let count = conn.execute("DELETE FROM settings WHERE key = ?1", params![key])?;
    Ok(count > 0)
}

pub fn clear_session(conn: &Connection) -> rusqlite::Result<()> {
    for key in [TOKEN_KEY, USER_TYPE_KEY, USER_KEY] {
        remove_setting(conn, key)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;

    #[test]
    fn set_get_overwrite_remove() {
        let conn = init_db(":memory:").unwrap();

        assert_eq!(get_setting(&conn, THEME_KEY).unwrap(), None);

        set_setting(&conn, THEME_KEY, "dark").unwrap();
        assert_eq!(get_setting(&conn, THEME_KEY).unwrap().as_deref(), Some("dark"));

        set_setting(&conn, THEME_KEY, "light").unwrap();
        assert_eq!(get_setting(&conn, THEME_KEY).unwrap().as_deref(), Some("light"));

        assert!(remove_setting(&conn, THEME_KEY).unwrap());
        assert!(!remove_setting(&conn, THEME_KEY).unwrap());
    }

    #[test]
    fn clear_session_keeps_theme() {
        let conn = init_db(":memory:").unwrap();
        set_setting(&conn, TOKEN_KEY, "abc").unwrap();
        set_setting(&conn, USER_TYPE_KEY, "donor").unwrap();
        set_setting(&conn, USER_KEY, "{}").unwrap();
        set_setting(&conn, THEME_KEY, "dark").unwrap();

        clear_session(&conn).unwrap();

        assert_eq!(get_setting(&conn, TOKEN_KEY).unwrap(), None);
        assert_eq!(get_setting(&conn, USER_TYPE_KEY).unwrap(), None);
        assert_eq!(get_setting(&conn, USER_KEY).unwrap(), None);
        assert_eq!(get_setting(&conn, THEME_KEY).unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn migrations_are_idempotent() {
        let conn = init_db(":memory:").unwrap();
        crate::db::migrations::run_migrations(&conn).unwrap();
        let applied: i64 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(applied, 1);
    }
}
