//! Core DeadlineStore implementation

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;
use tracing::debug;

use crate::{WEIGHT_MAX, WEIGHT_MIN};

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings json in row: {0}")]
    BadSettings(#[from] serde_json::Error),

    #[error("weight {0} out of range {WEIGHT_MIN}..={WEIGHT_MAX}")]
    WeightOutOfRange(i64),

    #[error("invalid notification time {0:?}, expected HH:MM")]
    InvalidTime(String),

    #[error("invalid weekday {0}, expected 0 (Monday) to 6 (Sunday)")]
    InvalidWeekday(u8),
}

/// A deadline as persisted. Timestamps are UTC; the repository layer
/// localizes them into the service timezone.
#[derive(Debug, Clone, PartialEq)]
pub struct DeadlineRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_at: DateTime<Utc>,
    pub weight: u8,
    pub created_at: DateTime<Utc>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Fields for inserting a new deadline
#[derive(Debug, Clone)]
pub struct NewDeadline {
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_at: DateTime<Utc>,
    pub weight: u8,
}

/// Partial update of an existing deadline; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct UpdateDeadline {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub weight: Option<u8>,
}

/// Per-user notification settings as persisted (times as "HH:MM" strings,
/// weekdays 0=Monday..6=Sunday). Parsing into domain types happens upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationSettingsRow {
    pub times: Vec<String>,
    pub weekdays: Vec<u8>,
}

impl Default for NotificationSettingsRow {
    fn default() -> Self {
        // Unconfigured users get no notification times (silent) on all days
        Self {
            times: Vec::new(),
            weekdays: (0..7).collect(),
        }
    }
}

/// Per-user display settings for rendered notifications
#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySettingsRow {
    pub show_remaining_time: bool,
    pub show_description: bool,
    pub show_importance: bool,
    pub show_weight: bool,
    pub show_emojis: bool,
    pub show_date: bool,
}

impl Default for DisplaySettingsRow {
    fn default() -> Self {
        Self {
            show_remaining_time: true,
            show_description: true,
            show_importance: true,
            show_weight: true,
            show_emojis: true,
            show_date: true,
        }
    }
}

/// Store-wide counters for the `ds stats` command
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub users: usize,
    pub active_deadlines: usize,
    pub completed_deadlines: usize,
}

/// The deadline store
pub struct DeadlineStore {
    conn: Connection,
    path: PathBuf,
}

impl DeadlineStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&path)?;
        let store = Self { conn, path };
        store.init_schema()?;
        debug!(path = ?store.path, "Opened deadline store");
        Ok(store)
    }

    /// Open an in-memory store (tests)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn,
            path: PathBuf::from(":memory:"),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                user_id INTEGER PRIMARY KEY,
                username TEXT,
                first_name TEXT,
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
            );

            CREATE TABLE IF NOT EXISTS deadlines (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                due_at TEXT NOT NULL,
                weight INTEGER NOT NULL DEFAULT 5 CHECK (weight BETWEEN 0 AND 10),
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
                completed INTEGER NOT NULL DEFAULT 0,
                completed_at TEXT,
                FOREIGN KEY (user_id) REFERENCES users (user_id)
            );

            CREATE INDEX IF NOT EXISTS idx_deadlines_user_active
                ON deadlines (user_id, completed);

            CREATE TABLE IF NOT EXISTS notification_settings (
                user_id INTEGER PRIMARY KEY,
                times TEXT NOT NULL DEFAULT '[]',
                weekdays TEXT NOT NULL DEFAULT '[0,1,2,3,4,5,6]',
                FOREIGN KEY (user_id) REFERENCES users (user_id)
            );

            CREATE TABLE IF NOT EXISTS display_settings (
                user_id INTEGER PRIMARY KEY,
                show_remaining_time INTEGER NOT NULL DEFAULT 1,
                show_description INTEGER NOT NULL DEFAULT 1,
                show_importance INTEGER NOT NULL DEFAULT 1,
                show_weight INTEGER NOT NULL DEFAULT 1,
                show_emojis INTEGER NOT NULL DEFAULT 1,
                show_date INTEGER NOT NULL DEFAULT 1,
                FOREIGN KEY (user_id) REFERENCES users (user_id)
            );",
        )?;
        Ok(())
    }

    /// The file path this store was opened at
    pub fn path(&self) -> &Path {
        &self.path
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Insert or update a user
    pub fn upsert_user(&self, user_id: i64, username: Option<&str>, first_name: Option<&str>) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO users (user_id, username, first_name) VALUES (?1, ?2, ?3)
             ON CONFLICT (user_id) DO UPDATE SET username = ?2, first_name = ?3",
            params![user_id, username, first_name],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Deadlines
    // ------------------------------------------------------------------

    /// Add a deadline and return its id
    pub fn add_deadline(&self, new: &NewDeadline) -> Result<i64, StoreError> {
        check_weight(new.weight as i64)?;
        self.conn.execute(
            "INSERT INTO deadlines (user_id, title, description, due_at, weight)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                new.user_id,
                new.title,
                new.description,
                new.due_at.to_rfc3339(),
                new.weight
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(id, user_id = new.user_id, "Added deadline");
        Ok(id)
    }

    /// Fetch a single deadline by id
    pub fn get_deadline(&self, id: i64) -> Result<Option<DeadlineRow>, StoreError> {
        self.conn
            .query_row(
                &format!("SELECT {DEADLINE_COLS} FROM deadlines WHERE id = ?1"),
                params![id],
                row_to_deadline,
            )
            .optional()
            .map_err(StoreError::from)
    }

    /// All non-completed deadlines for a user, soonest first
    pub fn active_deadlines_for(&self, user_id: i64) -> Result<Vec<DeadlineRow>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DEADLINE_COLS} FROM deadlines
             WHERE user_id = ?1 AND completed = 0
             ORDER BY due_at ASC"
        ))?;
        let rows = stmt.query_map(params![user_id], row_to_deadline)?;
        collect_rows(rows)
    }

    /// All deadlines for a user, optionally including completed ones
    pub fn deadlines_for(&self, user_id: i64, include_completed: bool) -> Result<Vec<DeadlineRow>, StoreError> {
        let sql = if include_completed {
            format!("SELECT {DEADLINE_COLS} FROM deadlines WHERE user_id = ?1 ORDER BY due_at ASC")
        } else {
            format!(
                "SELECT {DEADLINE_COLS} FROM deadlines WHERE user_id = ?1 AND completed = 0 ORDER BY due_at ASC"
            )
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], row_to_deadline)?;
        collect_rows(rows)
    }

    /// Distinct users that still have at least one active deadline
    pub fn users_with_active_deadlines(&self) -> Result<Vec<i64>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT user_id FROM deadlines WHERE completed = 0 ORDER BY user_id")?;
        let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
        let mut ids = Vec::new();
        for id in rows {
            ids.push(id?);
        }
        Ok(ids)
    }

    /// Mark a deadline completed. Returns false if no matching row.
    pub fn complete_deadline(&self, id: i64, user_id: i64) -> Result<bool, StoreError> {
        let changed = self.conn.execute(
            "UPDATE deadlines SET completed = 1, completed_at = ?3
             WHERE id = ?1 AND user_id = ?2",
            params![id, user_id, Utc::now().to_rfc3339()],
        )?;
        Ok(changed > 0)
    }

    /// Reopen a completed deadline
    pub fn reopen_deadline(&self, id: i64, user_id: i64) -> Result<bool, StoreError> {
        let changed = self.conn.execute(
            "UPDATE deadlines SET completed = 0, completed_at = NULL
             WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(changed > 0)
    }

    /// Delete a deadline
    pub fn delete_deadline(&self, id: i64, user_id: i64) -> Result<bool, StoreError> {
        let changed = self
            .conn
            .execute("DELETE FROM deadlines WHERE id = ?1 AND user_id = ?2", params![id, user_id])?;
        Ok(changed > 0)
    }

    /// Apply a partial update to a deadline
    pub fn update_deadline(&self, id: i64, user_id: i64, update: &UpdateDeadline) -> Result<bool, StoreError> {
        let mut sets: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(title) = &update.title {
            values.push(Box::new(title.clone()));
            sets.push(format!("title = ?{}", values.len()));
        }
        if let Some(description) = &update.description {
            values.push(Box::new(description.clone()));
            sets.push(format!("description = ?{}", values.len()));
        }
        if let Some(due_at) = &update.due_at {
            values.push(Box::new(due_at.to_rfc3339()));
            sets.push(format!("due_at = ?{}", values.len()));
        }
        if let Some(weight) = update.weight {
            check_weight(weight as i64)?;
            values.push(Box::new(weight));
            sets.push(format!("weight = ?{}", values.len()));
        }

        if sets.is_empty() {
            return Ok(false);
        }

        values.push(Box::new(id));
        let id_idx = values.len();
        values.push(Box::new(user_id));
        let user_idx = values.len();

        let sql = format!(
            "UPDATE deadlines SET {} WHERE id = ?{} AND user_id = ?{}",
            sets.join(", "),
            id_idx,
            user_idx,
        );

        let changed = self
            .conn
            .execute(&sql, rusqlite::params_from_iter(values.iter().map(|v| v.as_ref())))?;
        Ok(changed > 0)
    }

    // ------------------------------------------------------------------
    // Notification settings
    // ------------------------------------------------------------------

    /// Notification settings for a user; a total default for unknown users
    pub fn notification_settings(&self, user_id: i64) -> Result<NotificationSettingsRow, StoreError> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT times, weekdays FROM notification_settings WHERE user_id = ?1",
                params![user_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((times, weekdays)) => Ok(NotificationSettingsRow {
                times: serde_json::from_str(&times)?,
                weekdays: serde_json::from_str(&weekdays)?,
            }),
            None => Ok(NotificationSettingsRow::default()),
        }
    }

    /// Replace a user's notification settings.
    ///
    /// Times must be zero-padded 24h "HH:MM" strings and weekdays in
    /// 0..=6 (0 = Monday); bad values are rejected here so a
    /// misconfigured user cannot end up silently skipped at evaluation
    /// time.
    pub fn set_notification_settings(&self, user_id: i64, settings: &NotificationSettingsRow) -> Result<(), StoreError> {
        for time in &settings.times {
            check_time(time)?;
        }
        for &day in &settings.weekdays {
            if day > 6 {
                return Err(StoreError::InvalidWeekday(day));
            }
        }

        self.conn.execute(
            "INSERT OR REPLACE INTO notification_settings (user_id, times, weekdays)
             VALUES (?1, ?2, ?3)",
            params![
                user_id,
                serde_json::to_string(&settings.times)?,
                serde_json::to_string(&settings.weekdays)?
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Display settings
    // ------------------------------------------------------------------

    /// Display settings for a user; defaults for unknown users
    pub fn display_settings(&self, user_id: i64) -> Result<DisplaySettingsRow, StoreError> {
        self.conn
            .query_row(
                "SELECT show_remaining_time, show_description, show_importance,
                        show_weight, show_emojis, show_date
                 FROM display_settings WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(DisplaySettingsRow {
                        show_remaining_time: row.get(0)?,
                        show_description: row.get(1)?,
                        show_importance: row.get(2)?,
                        show_weight: row.get(3)?,
                        show_emojis: row.get(4)?,
                        show_date: row.get(5)?,
                    })
                },
            )
            .optional()
            .map(|opt| opt.unwrap_or_default())
            .map_err(StoreError::from)
    }

    /// Replace a user's display settings
    pub fn set_display_settings(&self, user_id: i64, settings: &DisplaySettingsRow) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO display_settings
             (user_id, show_remaining_time, show_description, show_importance,
              show_weight, show_emojis, show_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user_id,
                settings.show_remaining_time,
                settings.show_description,
                settings.show_importance,
                settings.show_weight,
                settings.show_emojis,
                settings.show_date
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Stats
    // ------------------------------------------------------------------

    /// Store-wide counters
    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        let users: usize =
            self.conn
                .query_row("SELECT COUNT(*) FROM users", [], |r| r.get::<_, i64>(0))? as usize;
        let active: usize = self.conn.query_row(
            "SELECT COUNT(*) FROM deadlines WHERE completed = 0",
            [],
            |r| r.get::<_, i64>(0),
        )? as usize;
        let completed: usize = self.conn.query_row(
            "SELECT COUNT(*) FROM deadlines WHERE completed = 1",
            [],
            |r| r.get::<_, i64>(0),
        )? as usize;
        Ok(StoreStats {
            users,
            active_deadlines: active,
            completed_deadlines: completed,
        })
    }
}

const DEADLINE_COLS: &str = "id, user_id, title, description, due_at, weight, created_at, completed, completed_at";

fn check_weight(weight: i64) -> Result<(), StoreError> {
    if !(WEIGHT_MIN as i64..=WEIGHT_MAX as i64).contains(&weight) {
        return Err(StoreError::WeightOutOfRange(weight));
    }
    Ok(())
}

fn check_time(s: &str) -> Result<(), StoreError> {
    let bad = || StoreError::InvalidTime(s.to_string());
    let (h, m) = s.split_once(':').ok_or_else(bad)?;
    if h.len() != 2 || m.len() != 2 {
        return Err(bad());
    }
    let hour: u8 = h.parse().map_err(|_| bad())?;
    let minute: u8 = m.parse().map_err(|_| bad())?;
    if hour > 23 || minute > 59 {
        return Err(bad());
    }
    Ok(())
}

fn row_to_deadline(row: &Row<'_>) -> rusqlite::Result<DeadlineRow> {
    let due_at: String = row.get(4)?;
    let created_at: String = row.get(6)?;
    let completed_at: Option<String> = row.get(8)?;

    Ok(DeadlineRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        due_at: parse_utc(4, &due_at)?,
        weight: row.get(5)?,
        created_at: parse_utc(6, &created_at)?,
        completed: row.get(7)?,
        completed_at: completed_at.map(|s| parse_utc(8, &s)).transpose()?,
    })
}

/// Parse an RFC 3339 (or bare "YYYY-MM-DDTHH:MM:SSZ") column into UTC.
/// Reported through rusqlite's error type so query_map can surface it.
fn parse_utc(col: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(col, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn collect_rows(
    rows: impl Iterator<Item = rusqlite::Result<DeadlineRow>>,
) -> Result<Vec<DeadlineRow>, StoreError> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
