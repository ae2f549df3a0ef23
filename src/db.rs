//! Database module for `SQLite` storage (accounts and saved drafts)

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use std::path::PathBuf;
use uuid::Uuid;

use crate::models::{Account, DraftImage, SavedDraft};
use crate::paths;

const ACCOUNT_COLUMNS: &str = "id, did, handle, display_name, pds_url, is_default, avatar_url, created_at, last_used_at";
const DRAFT_COLUMNS: &str = "id, text, images_json, created_at, updated_at";

/// Database connection wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create the database at the default location
    pub fn open() -> Result<Self> {
        let path = Self::default_path()?;
        Self::open_path(&path)
    }

    /// Open or create the database at a specific path
    pub fn open_path(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create data directory")?;
        }

        let conn = Connection::open(path).context("Failed to open database")?;

        let db = Self { conn };
        db.init()?;

        Ok(db)
    }

    /// Get the default database path
    pub fn default_path() -> Result<PathBuf> {
        paths::database_path()
    }

    /// Initialize the database schema
    fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                did TEXT NOT NULL UNIQUE,
                handle TEXT NOT NULL,
                display_name TEXT NOT NULL,
                pds_url TEXT NOT NULL,
                is_default INTEGER NOT NULL DEFAULT 0,
                avatar_url TEXT,
                created_at TEXT NOT NULL,
                last_used_at TEXT
            );

            CREATE TABLE IF NOT EXISTS drafts (
                id TEXT PRIMARY KEY,
                text TEXT NOT NULL,
                images_json TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_drafts_updated_at ON drafts(updated_at);
            ",
        )?;

        Ok(())
    }

    // ==================== Accounts ====================

    /// Insert a new account
    pub fn insert_account(&self, account: &Account) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO accounts ({ACCOUNT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
            ),
            params![
                account.id.to_string(),
                account.did,
                account.handle,
                account.display_name,
                account.pds_url,
                i32::from(account.is_default),
                account.avatar_url,
                account.created_at.to_rfc3339(),
                account.last_used_at.map(|dt| dt.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// Get all accounts
    pub fn get_accounts(&self) -> Result<Vec<Account>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY is_default DESC, handle"
        ))?;

        let accounts = stmt.query_map([], row_to_account)?;
        accounts.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Get the account used for composing: the default one, else the most
    /// recently used
    pub fn get_default_account(&self) -> Result<Option<Account>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts
             ORDER BY is_default DESC, last_used_at IS NULL, last_used_at DESC, created_at
             LIMIT 1"
        ))?;

        stmt.query_row([], row_to_account)
            .optional()
            .map_err(Into::into)
    }

    /// Make `id` the only default account
    pub fn set_default_account(&self, id: Uuid) -> Result<()> {
        self.conn.execute("UPDATE accounts SET is_default = 0", [])?;
        self.conn.execute(
            "UPDATE accounts SET is_default = 1 WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(())
    }

    /// Delete an account
    pub fn delete_account(&self, id: Uuid) -> Result<()> {
        self.conn.execute(
            "DELETE FROM accounts WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(())
    }

    /// Update last used timestamp for an account
    pub fn update_account_last_used(&self, id: Uuid) -> Result<()> {
        self.conn.execute(
            "UPDATE accounts SET last_used_at = ?1 WHERE id = ?2",
            params![Utc::now().to_rfc3339(), id.to_string()],
        )?;
        Ok(())
    }

    // ==================== Drafts ====================

    /// Insert a draft, or update it if it was saved before
    pub fn save_draft(&self, draft: &SavedDraft) -> Result<()> {
        let images_json = serde_json::to_string(&draft.images)?;
        self.conn.execute(
            &format!(
                "INSERT INTO drafts ({DRAFT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                    text = excluded.text,
                    images_json = excluded.images_json,
                    updated_at = excluded.updated_at"
            ),
            params![
                draft.id.to_string(),
                draft.text,
                images_json,
                draft.created_at.to_rfc3339(),
                draft.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// All drafts, most recently updated first
    pub fn get_drafts(&self) -> Result<Vec<SavedDraft>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DRAFT_COLUMNS} FROM drafts ORDER BY updated_at DESC"
        ))?;

        let drafts = stmt.query_map([], row_to_draft)?;
        drafts.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// A single draft
    pub fn get_draft(&self, id: Uuid) -> Result<Option<SavedDraft>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {DRAFT_COLUMNS} FROM drafts WHERE id = ?1"))?;

        stmt.query_row(params![id.to_string()], row_to_draft)
            .optional()
            .map_err(Into::into)
    }

    /// Delete a draft
    pub fn delete_draft(&self, id: Uuid) -> Result<()> {
        self.conn
            .execute("DELETE FROM drafts WHERE id = ?1", params![id.to_string()])?;
        Ok(())
    }
}

fn conversion_error(
    index: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err))
}

fn get_uuid(row: &Row<'_>, index: usize) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(&row.get::<_, String>(index)?).map_err(|e| conversion_error(index, e))
}

fn get_datetime(row: &Row<'_>, index: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&row.get::<_, String>(index)?)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(index, e))
}

fn row_to_account(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: get_uuid(row, 0)?,
        did: row.get(1)?,
        handle: row.get(2)?,
        display_name: row.get(3)?,
        pds_url: row.get(4)?,
        is_default: row.get::<_, i32>(5)? != 0,
        avatar_url: row.get(6)?,
        created_at: get_datetime(row, 7)?,
        last_used_at: row
            .get::<_, Option<String>>(8)?
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc)),
    })
}

fn row_to_draft(row: &Row<'_>) -> rusqlite::Result<SavedDraft> {
    let images_json: String = row.get(2)?;
    let images: Vec<DraftImage> =
        serde_json::from_str(&images_json).map_err(|e| conversion_error(2, e))?;

    Ok(SavedDraft {
        id: get_uuid(row, 0)?,
        text: row.get(1)?,
        images,
        created_at: get_datetime(row, 3)?,
        updated_at: get_datetime(row, 4)?,
    })
}
