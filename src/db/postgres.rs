use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::db::JournalStore;
use crate::error::{AppError, AppResult};
use crate::models::collection::Collection;
use crate::models::draft::{Draft, SaveDraftRequest};
use crate::models::entry::{CollectionFilter, Entry, EntryChanges, NewEntry, SortOrder};
use crate::models::user::{SyncUserRequest, User};

pub async fn create_pool(database_url: &str) -> PgPool {
    PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(database_url)
        .await
        .expect("Failed to create database pool")
}

/// Share-locks the caller's collection for the rest of the transaction so a
/// concurrent delete cannot leave the entry pointing at nothing.
async fn lock_owned_collection(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    collection_id: Option<Uuid>,
) -> AppResult<()> {
    let Some(collection_id) = collection_id else {
        return Ok(());
    };

    sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM collections WHERE id = $1 AND user_id = $2 FOR SHARE",
    )
    .bind(collection_id)
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(AppError::NotFound("Collection not found".into()))?;
    Ok(())
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JournalStore for PgStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_user_by_external_id(&self, external_id: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE external_id = $1")
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn upsert_user(&self, external_id: &str, profile: SyncUserRequest) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, external_id, email, name, image_url)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (external_id) DO UPDATE SET
                email = COALESCE($3, users.email),
                name = COALESCE($4, users.name),
                image_url = COALESCE($5, users.image_url),
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(external_id)
        .bind(&profile.email)
        .bind(&profile.name)
        .bind(&profile.image_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert_entry(&self, entry: NewEntry) -> AppResult<Entry> {
        let mut tx = self.pool.begin().await?;
        lock_owned_collection(&mut tx, entry.user_id, entry.collection_id).await?;

        let entry = sqlx::query_as::<_, Entry>(
            r#"
            INSERT INTO entries (id, user_id, title, content, mood, mood_score, mood_image_url, collection_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.user_id)
        .bind(&entry.title)
        .bind(&entry.content)
        .bind(&entry.mood)
        .bind(entry.mood_score)
        .bind(&entry.mood_image_url)
        .bind(entry.collection_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(entry)
    }

    async fn find_entry(&self, user_id: Uuid, entry_id: Uuid) -> AppResult<Option<Entry>> {
        let entry = sqlx::query_as::<_, Entry>(
            "SELECT * FROM entries WHERE id = $1 AND user_id = $2",
        )
        .bind(entry_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    async fn list_entries(
        &self,
        user_id: Uuid,
        filter: &CollectionFilter,
        order: SortOrder,
    ) -> AppResult<Vec<Entry>> {
        let entries = match filter {
            CollectionFilter::All => {
                let sql = format!(
                    "SELECT * FROM entries WHERE user_id = $1 ORDER BY created_at {}",
                    order.as_sql()
                );
                sqlx::query_as::<_, Entry>(&sql)
                    .bind(user_id)
                    .fetch_all(&self.pool)
                    .await?
            }
            CollectionFilter::Unorganized => {
                let sql = format!(
                    "SELECT * FROM entries WHERE user_id = $1 AND collection_id IS NULL ORDER BY created_at {}",
                    order.as_sql()
                );
                sqlx::query_as::<_, Entry>(&sql)
                    .bind(user_id)
                    .fetch_all(&self.pool)
                    .await?
            }
            CollectionFilter::Collection(collection_id) => {
                let sql = format!(
                    "SELECT * FROM entries WHERE user_id = $1 AND collection_id = $2 ORDER BY created_at {}",
                    order.as_sql()
                );
                sqlx::query_as::<_, Entry>(&sql)
                    .bind(user_id)
                    .bind(collection_id)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(entries)
    }

    async fn list_entries_since(&self, user_id: Uuid, since: DateTime<Utc>) -> AppResult<Vec<Entry>> {
        let entries = sqlx::query_as::<_, Entry>(
            r#"
            SELECT * FROM entries
            WHERE user_id = $1 AND created_at >= $2
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn update_entry(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
        changes: EntryChanges,
    ) -> AppResult<Option<Entry>> {
        let mut tx = self.pool.begin().await?;
        lock_owned_collection(&mut tx, user_id, changes.collection_id).await?;

        let entry = sqlx::query_as::<_, Entry>(
            r#"
            UPDATE entries SET
                title = $3,
                content = $4,
                mood = $5,
                mood_score = $6,
                mood_image_url = $7,
                collection_id = $8,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(entry_id)
        .bind(user_id)
        .bind(&changes.title)
        .bind(&changes.content)
        .bind(&changes.mood)
        .bind(changes.mood_score)
        .bind(&changes.mood_image_url)
        .bind(changes.collection_id)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(entry)
    }

    async fn delete_entry(&self, user_id: Uuid, entry_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM entries WHERE id = $1 AND user_id = $2")
            .bind(entry_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_collection(
        &self,
        user_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> AppResult<Collection> {
        let collection = sqlx::query_as::<_, Collection>(
            r#"
            INSERT INTO collections (id, user_id, name, description)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;
        Ok(collection)
    }

    async fn find_collection(&self, user_id: Uuid, collection_id: Uuid) -> AppResult<Option<Collection>> {
        let collection = sqlx::query_as::<_, Collection>(
            "SELECT * FROM collections WHERE id = $1 AND user_id = $2",
        )
        .bind(collection_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(collection)
    }

    async fn list_collections(&self, user_id: Uuid) -> AppResult<Vec<Collection>> {
        let collections = sqlx::query_as::<_, Collection>(
            "SELECT * FROM collections WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(collections)
    }

    async fn delete_collection(&self, user_id: Uuid, collection_id: Uuid) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        // Entries move to "unorganized" rather than being deleted.
        sqlx::query(
            r#"
            UPDATE entries SET collection_id = NULL, updated_at = NOW()
            WHERE collection_id = $1 AND user_id = $2
            "#,
        )
        .bind(collection_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM collections WHERE id = $1 AND user_id = $2")
            .bind(collection_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_draft(&self, user_id: Uuid) -> AppResult<Option<Draft>> {
        let draft = sqlx::query_as::<_, Draft>("SELECT * FROM drafts WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(draft)
    }

    async fn upsert_draft(&self, user_id: Uuid, fields: SaveDraftRequest) -> AppResult<Draft> {
        let draft = sqlx::query_as::<_, Draft>(
            r#"
            INSERT INTO drafts (id, user_id, title, content, mood)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE SET
                title = EXCLUDED.title,
                content = EXCLUDED.content,
                mood = EXCLUDED.mood,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&fields.title)
        .bind(&fields.content)
        .bind(&fields.mood)
        .fetch_one(&self.pool)
        .await?;
        Ok(draft)
    }

    async fn delete_draft(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM drafts WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
