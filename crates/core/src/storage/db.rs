use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, Result};

use super::migrations;

/// A registered marketplace customer.
///
/// Created on first contact with empty profile fields; onboarding fills
/// `full_name` and `phone`. `phone` stays NULL until onboarding completes,
/// which is also the marker that ordering access has been granted.
#[derive(Debug, Clone)]
pub struct User {
    /// Internal primary key; carts, orders, and transactions reference this.
    pub id: i64,
    /// Telegram chat id (unique external identity)
    pub telegram_id: i64,
    /// Display name collected during onboarding
    pub full_name: String,
    /// Preferred locale, "uk" or "de"
    pub language: String,
    /// Phone number, None until onboarding completes
    pub phone: Option<String>,
    /// Operator flag for the admin surface
    pub is_admin: bool,
    /// Prepaid balance in euro cents
    pub balance_cents: i64,
}

impl User {
    /// Whether onboarding finished (phone collected).
    pub fn is_onboarded(&self) -> bool {
        self.phone.is_some()
    }
}

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Create a new database connection pool
///
/// Initializes a connection pool with up to 10 connections and runs schema
/// migrations on the first connection.
pub fn create_pool(database_path: &str) -> anyhow::Result<DbPool> {
    let manager = SqliteConnectionManager::file(database_path);
    let pool = Pool::builder()
        .max_size(10) // Maximum 10 connections in the pool
        .build(manager)?;

    let mut conn = pool.get()?;
    migrations::run_migrations(&mut conn)?;

    Ok(pool)
}

/// Get a connection from the pool
///
/// The connection is automatically returned to the pool when dropped.
pub fn get_connection(pool: &DbPool) -> Result<DbConnection, r2d2::Error> {
    pool.get()
}

/// Creates a user on first contact. The profile is incomplete until
/// onboarding fills name and phone.
pub fn create_user(conn: &rusqlite::Connection, telegram_id: i64, full_name: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO users (telegram_id, full_name) VALUES (?1, ?2)",
        &[&telegram_id as &dyn rusqlite::ToSql, &full_name as &dyn rusqlite::ToSql],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Fetches a user by Telegram chat id.
pub fn get_user(conn: &rusqlite::Connection, telegram_id: i64) -> Result<Option<User>> {
    conn.query_row(
        "SELECT id, telegram_id, full_name, language, phone, is_admin, balance_cents
         FROM users WHERE telegram_id = ?1",
        [telegram_id],
        map_user_row,
    )
    .optional()
}

/// Fetches a user by internal id (payment webhook path).
pub fn get_user_by_id(conn: &rusqlite::Connection, user_id: i64) -> Result<Option<User>> {
    conn.query_row(
        "SELECT id, telegram_id, full_name, language, phone, is_admin, balance_cents
         FROM users WHERE id = ?1",
        [user_id],
        map_user_row,
    )
    .optional()
}

fn map_user_row(row: &rusqlite::Row<'_>) -> Result<User> {
    Ok(User {
        id: row.get(0)?,
        telegram_id: row.get(1)?,
        full_name: row.get(2)?,
        language: row.get(3)?,
        phone: row.get(4)?,
        is_admin: row.get::<_, i64>(5)? != 0,
        balance_cents: row.get(6)?,
    })
}

/// Persists a language preference. Called as soon as the user picks a
/// language, independent of onboarding completion, so partial onboarding
/// retains the choice.
pub fn set_user_language(conn: &rusqlite::Connection, telegram_id: i64, language: &str) -> Result<()> {
    conn.execute(
        "UPDATE users SET language = ?1 WHERE telegram_id = ?2",
        &[&language as &dyn rusqlite::ToSql, &telegram_id as &dyn rusqlite::ToSql],
    )?;
    Ok(())
}

/// Returns the stored language code for a user ("uk" when unknown).
pub fn get_user_language(conn: &rusqlite::Connection, telegram_id: i64) -> Result<String> {
    let lang: Option<String> = conn
        .query_row("SELECT language FROM users WHERE telegram_id = ?1", [telegram_id], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(lang.unwrap_or_else(|| "uk".to_string()))
}

/// Completes onboarding: stores name and phone in one statement so the
/// profile never ends up half-written.
pub fn complete_user_profile(
    conn: &rusqlite::Connection,
    telegram_id: i64,
    full_name: &str,
    phone: &str,
) -> Result<()> {
    let updated = conn.execute(
        "UPDATE users SET full_name = ?1, phone = ?2 WHERE telegram_id = ?3",
        &[
            &full_name as &dyn rusqlite::ToSql,
            &phone as &dyn rusqlite::ToSql,
            &telegram_id as &dyn rusqlite::ToSql,
        ],
    )?;
    if updated == 0 {
        return Err(rusqlite::Error::QueryReturnedNoRows);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::migrations::run_migrations;
    use pretty_assertions::assert_eq;

    fn test_conn() -> rusqlite::Connection {
        let mut conn = rusqlite::Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        conn
    }

    #[test]
    fn creates_and_reads_user() {
        let conn = test_conn();
        let id = create_user(&conn, 42, "Олена").unwrap();

        let user = get_user(&conn, 42).unwrap().unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.full_name, "Олена");
        assert_eq!(user.language, "uk");
        assert!(!user.is_onboarded());
    }

    #[test]
    fn language_toggle_is_idempotent() {
        let conn = test_conn();
        create_user(&conn, 42, "Олена").unwrap();

        set_user_language(&conn, 42, "de").unwrap();
        assert_eq!(get_user_language(&conn, 42).unwrap(), "de");
        set_user_language(&conn, 42, "uk").unwrap();
        assert_eq!(get_user_language(&conn, 42).unwrap(), "uk");
    }

    #[test]
    fn profile_completion_sets_name_and_phone_together() {
        let conn = test_conn();
        create_user(&conn, 42, "Олена").unwrap();

        complete_user_profile(&conn, 42, "Олена Петрівна", "+380501234567").unwrap();
        let user = get_user(&conn, 42).unwrap().unwrap();
        assert_eq!(user.full_name, "Олена Петрівна");
        assert_eq!(user.phone.as_deref(), Some("+380501234567"));
        assert!(user.is_onboarded());
    }

    #[test]
    fn completing_missing_user_fails_without_insert() {
        let conn = test_conn();
        assert!(complete_user_profile(&conn, 999, "X Y", "+4912345678").is_err());
    }
}
