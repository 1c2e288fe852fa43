//! SQLite-backed store: preferences, bookmarks, RAG corpus.
//!
//! All operations are atomic at the document level; there are no
//! multi-document transactions. Missing users and docs yield empty
//! results, never errors.

use crate::rag::{self, RagDoc};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

/// Known preference keys with their defaults. Unknown keys are preserved
/// verbatim for forward compatibility.
pub fn default_preferences() -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("voice_speed".into(), Value::from(1.0));
    map.insert("preferred_voice".into(), Value::Null);
    map.insert("reading_mode".into(), Value::from("immersive"));
    map.insert("language".into(), Value::from("zh-TW"));
    map.insert("haptics_enabled".into(), Value::from(true));
    map.insert("scent_enabled".into(), Value::from(true));
    map
}

/// One saved reading position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: i64,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub segment_index: i64,
    #[serde(default)]
    pub note: String,
    pub created_at: i64,
}

#[derive(Clone)]
pub struct MemoryStore {
    pool: Pool<Sqlite>,
}

impl MemoryStore {
    pub async fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_url = format!("sqlite://{}?mode=rwc", db_path.as_ref().display());
        let pool = SqlitePoolOptions::new()
            .connect(&db_url)
            .await
            .context("Failed to connect to SQLite database")?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// In-memory store for tests and ephemeral runs.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory SQLite")?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS preferences (
                user_id TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (user_id, key)
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create preferences table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS bookmarks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                session_id TEXT,
                segment_index INTEGER NOT NULL,
                note TEXT NOT NULL DEFAULT '',
                created_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create bookmarks table")?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_bookmarks_user ON bookmarks(user_id)")
            .execute(&self.pool)
            .await
            .context("Failed to create bookmarks index")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS rag_docs (
                doc_id TEXT PRIMARY KEY,
                text TEXT NOT NULL,
                meta TEXT NOT NULL DEFAULT '{}',
                updated_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create rag_docs table")?;

        Ok(())
    }

    // ========================================================================
    // Preferences
    // ========================================================================

    /// Stored preferences merged over the defaults. An unknown user gets
    /// the defaults.
    pub async fn get_preferences(&self, user_id: &str) -> Result<Map<String, Value>> {
        let rows = sqlx::query("SELECT key, value FROM preferences WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to read preferences")?;

        let mut merged = default_preferences();
        for row in rows {
            let key: String = row.get("key");
            let raw: String = row.get("value");
            let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
            merged.insert(key, value);
        }
        Ok(merged)
    }

    /// Apply a patch, last write wins per key. Returns the merged view.
    pub async fn set_preferences(
        &self,
        user_id: &str,
        patch: &Map<String, Value>,
    ) -> Result<Map<String, Value>> {
        let now = chrono::Utc::now().timestamp();
        for (key, value) in patch {
            let raw = serde_json::to_string(value)?;
            sqlx::query(
                r#"
                INSERT INTO preferences (user_id, key, value, updated_at)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(user_id, key) DO UPDATE SET value = excluded.value,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(user_id)
            .bind(key)
            .bind(raw)
            .bind(now)
            .execute(&self.pool)
            .await
            .context("Failed to upsert preference")?;
        }
        self.get_preferences(user_id).await
    }

    /// The effective reading speed for a user: base wpm scaled by the
    /// `voice_speed` preference.
    pub async fn reading_wpm(&self, user_id: Option<&str>, base_wpm: f64) -> f64 {
        let Some(user_id) = user_id else {
            return base_wpm;
        };
        match self.get_preferences(user_id).await {
            Ok(prefs) => {
                let speed = prefs
                    .get("voice_speed")
                    .and_then(Value::as_f64)
                    .unwrap_or(1.0);
                (base_wpm * speed).max(1.0)
            }
            Err(e) => {
                tracing::warn!("preference lookup failed for {}: {}", user_id, e);
                base_wpm
            }
        }
    }

    // ========================================================================
    // Bookmarks
    // ========================================================================

    pub async fn add_bookmark(
        &self,
        user_id: &str,
        session_id: Option<&str>,
        segment_index: i64,
        note: &str,
    ) -> Result<Bookmark> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query(
            r#"
            INSERT INTO bookmarks (user_id, session_id, segment_index, note, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(session_id)
        .bind(segment_index)
        .bind(note)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to insert bookmark")?;

        Ok(Bookmark {
            id: result.last_insert_rowid(),
            user_id: user_id.to_string(),
            session_id: session_id.map(str::to_string),
            segment_index,
            note: note.to_string(),
            created_at: now,
        })
    }

    pub async fn list_bookmarks(&self, user_id: &str) -> Result<Vec<Bookmark>> {
        let rows = sqlx::query(
            "SELECT id, user_id, session_id, segment_index, note, created_at
             FROM bookmarks WHERE user_id = ? ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list bookmarks")?;

        Ok(rows
            .into_iter()
            .map(|row| Bookmark {
                id: row.get("id"),
                user_id: row.get("user_id"),
                session_id: row.get("session_id"),
                segment_index: row.get("segment_index"),
                note: row.get("note"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    // ========================================================================
    // RAG
    // ========================================================================

    /// Insert or replace a document. With no `doc_id` supplied, one is
    /// derived from the text hash, so re-upserting identical text is a
    /// no-op rather than a duplicate.
    pub async fn rag_upsert(
        &self,
        text: &str,
        doc_id: Option<&str>,
        meta: Value,
    ) -> Result<RagDoc> {
        let doc_id = match doc_id {
            Some(id) => id.to_string(),
            None => {
                let digest = Sha256::digest(text.as_bytes());
                format!("doc-{:x}", digest)[..20].to_string()
            }
        };
        let now = chrono::Utc::now().timestamp();
        let meta_raw = serde_json::to_string(&meta)?;
        sqlx::query(
            r#"
            INSERT INTO rag_docs (doc_id, text, meta, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(doc_id) DO UPDATE SET text = excluded.text,
                meta = excluded.meta, updated_at = excluded.updated_at
            "#,
        )
        .bind(&doc_id)
        .bind(text)
        .bind(meta_raw)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to upsert RAG doc")?;

        Ok(RagDoc::new(doc_id, text.to_string(), meta))
    }

    /// Score every stored doc against `q`. `top_k` is clamped to [1, 100].
    pub async fn rag_query(&self, q: &str, top_k: usize) -> Result<Vec<(RagDoc, f64)>> {
        let top_k = top_k.clamp(1, 100);
        let docs = self.rag_list().await?;
        Ok(rag::rank(docs.iter(), q, top_k))
    }

    pub async fn rag_list(&self) -> Result<Vec<RagDoc>> {
        let rows = sqlx::query("SELECT doc_id, text, meta FROM rag_docs ORDER BY doc_id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list RAG docs")?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let meta_raw: String = row.get("meta");
                let meta = serde_json::from_str(&meta_raw).unwrap_or(Value::Null);
                RagDoc::new(row.get("doc_id"), row.get("text"), meta)
            })
            .collect())
    }

    /// Delete a doc. Returns whether it existed.
    pub async fn rag_delete(&self, doc_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM rag_docs WHERE doc_id = ?")
            .bind(doc_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete RAG doc")?;
        Ok(result.rows_affected() > 0)
    }
}
