//! SQLite store operations.

use crate::error::StoreError;
use crate::types::*;
use chrono::{DateTime, Utc};
use rusqlite::params;
use tokio_rusqlite::Connection;
use tracing::{debug, info, instrument};

/// Record store for users, phone numbers and session handles.
#[derive(Clone)]
pub struct AccountStore {
    conn: Connection,
}

impl AccountStore {
    /// Open (creating if missing) the database at `path`.
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path.to_owned()).await?;
        let store = Self { conn };
        store.init_schema().await?;
        info!("Record store ready at {}", path);
        Ok(store)
    }

    /// Open a fresh in-memory database.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().await?;
        let store = Self { conn };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        self.conn
            .call(|conn| {
                conn.execute_batch(
                    "CREATE TABLE IF NOT EXISTS users (
                        user_id INTEGER PRIMARY KEY,
                        username TEXT,
                        first_name TEXT,
                        last_name TEXT,
                        is_active INTEGER NOT NULL DEFAULT 1,
                        created_at TEXT NOT NULL
                    );
                    CREATE TABLE IF NOT EXISTS phone_numbers (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        user_id INTEGER NOT NULL REFERENCES users (user_id),
                        phone_number TEXT NOT NULL,
                        is_authenticated INTEGER NOT NULL DEFAULT 0,
                        status TEXT NOT NULL DEFAULT 'pending',
                        added_at TEXT NOT NULL,
                        last_login TEXT
                    );
                    CREATE TABLE IF NOT EXISTS sessions (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        user_id INTEGER NOT NULL REFERENCES users (user_id),
                        phone_number TEXT NOT NULL,
                        session_ref TEXT NOT NULL,
                        is_active INTEGER NOT NULL DEFAULT 1,
                        created_at TEXT NOT NULL,
                        UNIQUE (user_id, phone_number)
                    );",
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Insert or refresh a user record. `created_at` and `is_active` survive
    /// repeat upserts.
    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub async fn upsert_user(&self, user: &NewUser) -> Result<(), StoreError> {
        let user = user.clone();
        let now = Utc::now();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO users (user_id, username, first_name, last_name, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT (user_id) DO UPDATE SET
                        username = excluded.username,
                        first_name = excluded.first_name,
                        last_name = excluded.last_name",
                    params![user.id, user.username, user.first_name, user.last_name, now],
                )?;
                Ok(())
            })
            .await?;
        debug!("User upserted");
        Ok(())
    }

    /// Record a phone-number submission. Duplicates are permitted.
    #[instrument(skip(self))]
    pub async fn insert_phone_number(
        &self,
        user_id: i64,
        phone_number: &str,
    ) -> Result<i64, StoreError> {
        let phone_number = phone_number.to_string();
        let now = Utc::now();
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO phone_numbers (user_id, phone_number, added_at)
                     VALUES (?1, ?2, ?3)",
                    params![user_id, phone_number, now],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    /// All phone records for a user, newest first.
    pub async fn list_phone_numbers(
        &self,
        user_id: i64,
    ) -> Result<Vec<PhoneNumberRecord>, StoreError> {
        let records = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, user_id, phone_number, is_authenticated, status,
                            added_at, last_login
                     FROM phone_numbers
                     WHERE user_id = ?1
                     ORDER BY added_at DESC, id DESC",
                )?;
                let rows = stmt
                    .query_map(params![user_id], row_to_phone_record)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;
        Ok(records)
    }

    /// Look up one phone record by id.
    pub async fn get_phone_number(
        &self,
        record_id: i64,
    ) -> Result<Option<PhoneNumberRecord>, StoreError> {
        let record = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, user_id, phone_number, is_authenticated, status,
                            added_at, last_login
                     FROM phone_numbers
                     WHERE id = ?1",
                )?;
                let mut rows = stmt.query_map(params![record_id], row_to_phone_record)?;
                Ok(rows.next().transpose()?)
            })
            .await?;
        Ok(record)
    }

    /// Id of the most recently added record for (user, phone), if any.
    pub async fn latest_phone_record_id(
        &self,
        user_id: i64,
        phone_number: &str,
    ) -> Result<Option<i64>, StoreError> {
        let phone_number = phone_number.to_string();
        let id = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id FROM phone_numbers
                     WHERE user_id = ?1 AND phone_number = ?2
                     ORDER BY id DESC LIMIT 1",
                )?;
                let mut rows = stmt.query_map(params![user_id, phone_number], |row| row.get(0))?;
                Ok(rows.next().transpose()?)
            })
            .await?;
        Ok(id)
    }

    /// Update a record's protocol outcome.
    ///
    /// `last_login` is stamped when the record becomes authenticated.
    #[instrument(skip(self))]
    pub async fn update_phone_status(
        &self,
        record_id: i64,
        status: PhoneStatus,
        is_authenticated: bool,
    ) -> Result<(), StoreError> {
        let last_login: Option<DateTime<Utc>> = is_authenticated.then(Utc::now);
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE phone_numbers
                     SET status = ?2, is_authenticated = ?3,
                         last_login = COALESCE(?4, last_login)
                     WHERE id = ?1",
                    params![record_id, status.as_str(), is_authenticated, last_login],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Store a completed login's session reference.
    ///
    /// Replace-on-conflict: at most one active handle per (user, phone).
    #[instrument(skip(self, session_ref))]
    pub async fn upsert_session(
        &self,
        user_id: i64,
        phone_number: &str,
        session_ref: &str,
    ) -> Result<(), StoreError> {
        let phone_number = phone_number.to_string();
        let session_ref = session_ref.to_string();
        let now = Utc::now();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO sessions (user_id, phone_number, session_ref, created_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT (user_id, phone_number) DO UPDATE SET
                        session_ref = excluded.session_ref,
                        is_active = 1,
                        created_at = excluded.created_at",
                    params![user_id, phone_number, session_ref, now],
                )?;
                Ok(())
            })
            .await?;
        debug!("Session handle stored");
        Ok(())
    }

    /// Session reference for a completed login, if one is active.
    pub async fn get_active_session_ref(
        &self,
        user_id: i64,
        phone_number: &str,
    ) -> Result<Option<String>, StoreError> {
        let phone_number = phone_number.to_string();
        let session_ref = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT session_ref FROM sessions
                     WHERE user_id = ?1 AND phone_number = ?2 AND is_active = 1",
                )?;
                let mut rows = stmt.query_map(params![user_id, phone_number], |row| row.get(0))?;
                Ok(rows.next().transpose()?)
            })
            .await?;
        Ok(session_ref)
    }
}

fn row_to_phone_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<PhoneNumberRecord> {
    let status: String = row.get(4)?;
    Ok(PhoneNumberRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        phone_number: row.get(2)?,
        is_authenticated: row.get(3)?,
        status: PhoneStatus::from_str(&status).unwrap_or(PhoneStatus::Pending),
        added_at: row.get(5)?,
        last_login: row.get(6)?,
    })
}
