use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::{
    domain::{Contact, ContactId},
    protocol::ContactUpdate,
};

/// SQLite-backed contact store. The store is the sole writer of persisted
/// contact state; callers only ever hold snapshots.
#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Inserts a blank record: generated id, no name, `favorite = false`.
    pub async fn create_empty_contact(&self) -> Result<Contact> {
        let id = ContactId::generate();
        let row = sqlx::query(
            "INSERT INTO contacts (id, favorite, created_at) VALUES (?, 0, ?)
             RETURNING id, first, last, avatar, twitter, notes, favorite, created_at",
        )
        .bind(&id.0)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(contact_from_row(&row))
    }

    pub async fn get_contact(&self, id: &ContactId) -> Result<Option<Contact>> {
        let row = sqlx::query(
            "SELECT id, first, last, avatar, twitter, notes, favorite, created_at
             FROM contacts WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| contact_from_row(&r)))
    }

    /// Sidebar listing: optional case-insensitive name filter, ordered by
    /// last name, then first name, then creation time.
    pub async fn list_contacts(&self, query: Option<&str>) -> Result<Vec<Contact>> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());
        let rows = if let Some(q) = query {
            sqlx::query(
                "SELECT id, first, last, avatar, twitter, notes, favorite, created_at
                 FROM contacts
                 WHERE lower(coalesce(first, '') || ' ' || coalesce(last, '')) LIKE ?
                 ORDER BY lower(coalesce(last, '')) ASC, lower(coalesce(first, '')) ASC, created_at ASC",
            )
            .bind(format!("%{}%", q.to_lowercase()))
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query(
                "SELECT id, first, last, avatar, twitter, notes, favorite, created_at
                 FROM contacts
                 ORDER BY lower(coalesce(last, '')) ASC, lower(coalesce(first, '')) ASC, created_at ASC",
            )
            .fetch_all(&self.pool)
            .await?
        };
        Ok(rows.iter().map(contact_from_row).collect())
    }

    /// Partial in-place update keyed by id. Absent fields keep their stored
    /// value. Returns `None` when the id is unknown.
    pub async fn update_contact(
        &self,
        id: &ContactId,
        update: &ContactUpdate,
    ) -> Result<Option<Contact>> {
        let row = sqlx::query(
            "UPDATE contacts SET
                first = coalesce(?, first),
                last = coalesce(?, last),
                avatar = coalesce(?, avatar),
                twitter = coalesce(?, twitter),
                notes = coalesce(?, notes)
             WHERE id = ?
             RETURNING id, first, last, avatar, twitter, notes, favorite, created_at",
        )
        .bind(update.first.as_deref())
        .bind(update.last.as_deref())
        .bind(update.avatar.as_deref())
        .bind(update.twitter.as_deref())
        .bind(update.notes.as_deref())
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| contact_from_row(&r)))
    }

    pub async fn set_favorite(&self, id: &ContactId, favorite: bool) -> Result<Option<Contact>> {
        let row = sqlx::query(
            "UPDATE contacts SET favorite = ? WHERE id = ?
             RETURNING id, first, last, avatar, twitter, notes, favorite, created_at",
        )
        .bind(favorite)
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| contact_from_row(&r)))
    }

    pub async fn delete_contact(&self, id: &ContactId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = ?")
            .bind(&id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn contact_from_row(row: &SqliteRow) -> Contact {
    Contact {
        id: ContactId(row.get::<String, _>(0)),
        first: row.get::<Option<String>, _>(1),
        last: row.get::<Option<String>, _>(2),
        avatar: row.get::<Option<String>, _>(3),
        twitter: row.get::<Option<String>, _>(4),
        notes: row.get::<Option<String>, _>(5),
        favorite: row.get::<bool, _>(6),
        created_at: row.get::<DateTime<Utc>, _>(7),
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
