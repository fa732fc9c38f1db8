use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use thiserror::Error;

use crate::types::{NewUser, User};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    firstname TEXT NOT NULL,
    lastname TEXT NOT NULL,
    username TEXT UNIQUE NOT NULL,
    email TEXT UNIQUE NOT NULL,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);
"#;

/// Errors surfaced by the storage gateway.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite rejected the write on a UNIQUE constraint
    /// (username or email already taken).
    #[error("{0}")]
    ConstraintViolation(String),

    /// Any other engine-level failure.
    #[error("{0}")]
    Storage(#[from] rusqlite::Error),
}

/// In-memory user store. The connection is opened once at startup and held
/// behind a mutex; handlers run one call at a time, so there is no
/// overlapping mutation.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open an in-memory database and create the users table.
    /// A failure here is fatal - there is no recovery path at startup.
    pub fn in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory database")?;
        conn.execute_batch(SCHEMA)
            .context("Failed to create users table")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert one user row with parameter binding.
    pub fn insert_user(&self, user: &NewUser) -> Result<(), StoreError> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO users (firstname, lastname, username, email) VALUES (?1, ?2, ?3, ?4)",
            params![user.firstname, user.lastname, user.username, user.email],
        )
        .map_err(classify)?;
        Ok(())
    }

    /// All users, ordered by id so callers always see insertion order.
    pub fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, firstname, lastname, username, email, created_at FROM users ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(User {
                id: row.get(0)?,
                firstname: row.get(1)?,
                lastname: row.get(2)?,
                username: row.get(3)?,
                email: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Row count. Inserts either fully land or not at all, and this is how
    /// tests assert it.
    pub fn count_users(&self) -> Result<i64, StoreError> {
        let conn = self.lock();
        let count = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // Handlers never panic while holding the guard, so recover from
        // poisoning instead of propagating it.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn classify(err: rusqlite::Error) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(e, msg)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::ConstraintViolation(
                msg.clone()
                    .unwrap_or_else(|| "UNIQUE constraint failed".to_string()),
            )
        }
        _ => StoreError::Storage(err),
    }
}
