use crate::error::PoolError;
use crate::models::{AnswerSet, Entry, MASTER_ENTRY_ID, MASTER_NAME, MasterUpdate};
use crate::scoring::merge_master;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Executor, Row, Sqlite, migrate::MigrateDatabase};
use std::str::FromStr;

/// Durable home of all entries, including the single master row.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Persist a new entry. An existing `entry_id` is an error, never an overwrite.
    async fn insert_entry(&self, entry: &Entry) -> Result<(), PoolError>;

    async fn get_entry(&self, entry_id: &str) -> Result<Option<Entry>, PoolError>;

    async fn get_master(&self) -> Result<Option<Entry>, PoolError>;

    /// All submitter entries, oldest first. The master row is not included.
    async fn list_entries(&self) -> Result<Vec<Entry>, PoolError>;

    /// Merge an edit into the master sheet, creating the row on first save.
    async fn save_master(&self, update: &MasterUpdate) -> Result<Entry, PoolError>;
}

const SELECT_COLUMNS: &str = "entry_id, name, is_master, answers, tiebreaker, created_at";

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn connect(db_url: &str, max_connections: u32) -> Result<Self, PoolError> {
        let options = SqliteConnectOptions::from_str(db_url)
            .map_err(PoolError::persistence("parse database url"))?;

        // SQLite creates the file but not the directory holding it
        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| PoolError::persistence("create database directory")(sqlx::Error::Io(e)))?;
            }
        }

        // Create database if it doesn't exist
        if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            Sqlite::create_database(db_url)
                .await
                .map_err(PoolError::persistence("create database"))?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(db_url)
            .await
            .map_err(PoolError::persistence("connect to database"))?;

        Self::init_schema(&pool).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn init_schema(pool: &SqlitePool) -> Result<(), PoolError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                entry_id TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                is_master BOOLEAN NOT NULL DEFAULT FALSE,
                answers TEXT NOT NULL,
                tiebreaker REAL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await
        .map_err(PoolError::persistence("create entries table"))?;

        // At most one row may be the master
        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_entries_single_master
            ON entries(is_master)
            WHERE is_master = TRUE;
            "#,
        )
        .execute(pool)
        .await
        .map_err(PoolError::persistence("create master index"))?;

        Ok(())
    }

    async fn fetch_master<'e, E>(executor: E) -> Result<Option<Entry>, PoolError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let query = format!(
            "SELECT {} FROM entries WHERE is_master = TRUE LIMIT 1",
            SELECT_COLUMNS
        );
        sqlx::query(&query)
            .fetch_optional(executor)
            .await
            .map_err(PoolError::persistence("load master sheet"))?
            .map(|row| row_to_entry(&row))
            .transpose()
    }

    // Runs inside the caller's write transaction.
    async fn merge_into_master(
        conn: &mut SqliteConnection,
        update: &MasterUpdate,
    ) -> Result<Entry, PoolError> {
        let existing = Self::fetch_master(&mut *conn).await?;
        let current_sheet = existing.as_ref().map(Entry::sheet);
        let merged = merge_master(current_sheet.as_ref(), update);
        let answers = serialize_answers("save master sheet", &merged.answers)?;

        match existing {
            Some(current) => {
                sqlx::query(
                    r#"
                    UPDATE entries
                    SET name = ?, answers = ?, tiebreaker = ?
                    WHERE entry_id = ? AND is_master = TRUE
                    "#,
                )
                .bind(MASTER_NAME)
                .bind(&answers)
                .bind(merged.tiebreaker)
                .bind(&current.entry_id)
                .execute(&mut *conn)
                .await
                .map_err(PoolError::persistence("update master sheet"))?;

                Ok(Entry::master(merged, current.created_at))
            }
            None => {
                let created_at = Utc::now();
                sqlx::query(
                    r#"
                    INSERT INTO entries (entry_id, name, is_master, answers, tiebreaker, created_at)
                    VALUES (?, ?, TRUE, ?, ?, ?)
                    "#,
                )
                .bind(MASTER_ENTRY_ID)
                .bind(MASTER_NAME)
                .bind(&answers)
                .bind(merged.tiebreaker)
                .bind(format_timestamp(created_at))
                .execute(&mut *conn)
                .await
                .map_err(PoolError::persistence("create master sheet"))?;

                Ok(Entry::master(merged, created_at))
            }
        }
    }
}

#[async_trait]
impl EntryStore for Database {
    async fn insert_entry(&self, entry: &Entry) -> Result<(), PoolError> {
        let answers = serialize_answers("save entry", &entry.answers)?;
        sqlx::query(
            r#"
            INSERT INTO entries (entry_id, name, is_master, answers, tiebreaker, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.entry_id)
        .bind(&entry.name)
        .bind(entry.is_master)
        .bind(&answers)
        .bind(entry.tiebreaker)
        .bind(format_timestamp(entry.created_at))
        .execute(&self.pool)
        .await
        .map_err(PoolError::persistence("save entry"))?;

        Ok(())
    }

    async fn get_entry(&self, entry_id: &str) -> Result<Option<Entry>, PoolError> {
        let query = format!("SELECT {} FROM entries WHERE entry_id = ?", SELECT_COLUMNS);
        sqlx::query(&query)
            .bind(entry_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(PoolError::persistence("load entry"))?
            .map(|row| row_to_entry(&row))
            .transpose()
    }

    async fn get_master(&self) -> Result<Option<Entry>, PoolError> {
        Self::fetch_master(&self.pool).await
    }

    async fn list_entries(&self) -> Result<Vec<Entry>, PoolError> {
        let query = format!(
            "SELECT {} FROM entries WHERE is_master = FALSE ORDER BY created_at ASC, id ASC",
            SELECT_COLUMNS
        );
        sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(PoolError::persistence("load entries"))?
            .iter()
            .map(row_to_entry)
            .collect()
    }

    async fn save_master(&self, update: &MasterUpdate) -> Result<Entry, PoolError> {
        // IMMEDIATE takes the write lock up front so concurrent saves queue
        // instead of both reading the same old sheet. Dropping `tx` before
        // commit rolls it back.
        let mut tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(PoolError::persistence("save master sheet"))?;

        let master = Self::merge_into_master(&mut tx, update).await?;

        tx.commit()
            .await
            .map_err(PoolError::persistence("save master sheet"))?;

        Ok(master)
    }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    // Fixed-width so text ordering in SQL matches time ordering
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn serialize_answers(action: &'static str, answers: &AnswerSet) -> Result<String, PoolError> {
    serde_json::to_string(answers)
        .map_err(|e| PoolError::persistence(action)(sqlx::Error::Encode(Box::new(e))))
}

fn row_to_entry(row: &SqliteRow) -> Result<Entry, PoolError> {
    let read = PoolError::persistence("read entry");
    let entry_id: String = row.try_get("entry_id").map_err(read)?;

    let corrupt = |reason: String| PoolError::CorruptEntry {
        entry_id: entry_id.clone(),
        reason,
    };
    let column = |e: sqlx::Error| corrupt(e.to_string());

    let answers_json: String = row.try_get("answers").map_err(column)?;
    let answers: AnswerSet =
        serde_json::from_str(&answers_json).map_err(|e| corrupt(format!("answers: {}", e)))?;

    let created_at_str: String = row.try_get("created_at").map_err(column)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map_err(|e| corrupt(format!("created_at: {}", e)))?
        .with_timezone(&Utc);

    Ok(Entry {
        name: row.try_get("name").map_err(column)?,
        is_master: row.try_get("is_master").map_err(column)?,
        answers,
        tiebreaker: row.try_get("tiebreaker").map_err(column)?,
        created_at,
        entry_id,
    })
}
