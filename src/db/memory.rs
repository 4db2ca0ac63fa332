//! In-process store used when no database is configured, and by the tests.
//!
//! Mirrors the Postgres schema's rules: owner filtering on every lookup, one
//! draft per user, and collection deletes clearing entry references.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::JournalStore;
use crate::error::{AppError, AppResult};
use crate::models::collection::Collection;
use crate::models::draft::{Draft, SaveDraftRequest};
use crate::models::entry::{CollectionFilter, Entry, EntryChanges, NewEntry, SortOrder};
use crate::models::user::{SyncUserRequest, User};

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    entries: RwLock<HashMap<Uuid, Entry>>,
    collections: RwLock<HashMap<Uuid, Collection>>,
    /// Keyed by owner, which makes the one-draft-per-user rule structural.
    drafts: RwLock<HashMap<Uuid, Draft>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry row as-is, bypassing id and timestamp assignment.
    #[cfg(test)]
    pub async fn put_entry(&self, entry: Entry) {
        self.entries.write().await.insert(entry.id, entry);
    }

    #[cfg(test)]
    pub async fn draft_count(&self, user_id: Uuid) -> usize {
        self.drafts
            .read()
            .await
            .values()
            .filter(|d| d.user_id == user_id)
            .count()
    }

    #[cfg(test)]
    pub async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }
}

fn ensure_owned(
    collections: &HashMap<Uuid, Collection>,
    user_id: Uuid,
    collection_id: Option<Uuid>,
) -> AppResult<()> {
    match collection_id {
        Some(id) if collections.get(&id).map(|c| c.user_id) != Some(user_id) => {
            Err(AppError::NotFound("Collection not found".into()))
        }
        _ => Ok(()),
    }
}

#[async_trait]
impl JournalStore for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn find_user_by_external_id(&self, external_id: &str) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.external_id == external_id).cloned())
    }

    async fn upsert_user(&self, external_id: &str, profile: SyncUserRequest) -> AppResult<User> {
        let mut users = self.users.write().await;
        let now = Utc::now();

        if let Some(user) = users.values_mut().find(|u| u.external_id == external_id) {
            if profile.email.is_some() {
                user.email = profile.email;
            }
            if profile.name.is_some() {
                user.name = profile.name;
            }
            if profile.image_url.is_some() {
                user.image_url = profile.image_url;
            }
            user.updated_at = now;
            return Ok(user.clone());
        }

        let user = User {
            id: Uuid::new_v4(),
            external_id: external_id.to_string(),
            email: profile.email,
            name: profile.name,
            image_url: profile.image_url,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn insert_entry(&self, entry: NewEntry) -> AppResult<Entry> {
        // Held across the insert, so a concurrent collection delete waits for it.
        let collections = self.collections.read().await;
        ensure_owned(&collections, entry.user_id, entry.collection_id)?;

        let now = Utc::now();
        let entry = Entry {
            id: Uuid::new_v4(),
            user_id: entry.user_id,
            title: entry.title,
            content: entry.content,
            mood: entry.mood,
            mood_score: entry.mood_score,
            mood_image_url: entry.mood_image_url,
            collection_id: entry.collection_id,
            created_at: now,
            updated_at: now,
        };
        self.entries.write().await.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn find_entry(&self, user_id: Uuid, entry_id: Uuid) -> AppResult<Option<Entry>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(&entry_id)
            .filter(|e| e.user_id == user_id)
            .cloned())
    }

    async fn list_entries(
        &self,
        user_id: Uuid,
        filter: &CollectionFilter,
        order: SortOrder,
    ) -> AppResult<Vec<Entry>> {
        let entries = self.entries.read().await;
        let mut result: Vec<Entry> = entries
            .values()
            .filter(|e| e.user_id == user_id && filter.matches(e.collection_id))
            .cloned()
            .collect();

        result.sort_by_key(|e| (e.created_at, e.id));
        if order == SortOrder::Desc {
            result.reverse();
        }
        Ok(result)
    }

    async fn list_entries_since(&self, user_id: Uuid, since: DateTime<Utc>) -> AppResult<Vec<Entry>> {
        let entries = self.entries.read().await;
        let mut result: Vec<Entry> = entries
            .values()
            .filter(|e| e.user_id == user_id && e.created_at >= since)
            .cloned()
            .collect();
        result.sort_by_key(|e| (e.created_at, e.id));
        Ok(result)
    }

    async fn update_entry(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
        changes: EntryChanges,
    ) -> AppResult<Option<Entry>> {
        let collections = self.collections.read().await;
        let mut entries = self.entries.write().await;
        let Some(entry) = entries.get_mut(&entry_id).filter(|e| e.user_id == user_id) else {
            return Ok(None);
        };
        ensure_owned(&collections, user_id, changes.collection_id)?;

        entry.title = changes.title;
        entry.content = changes.content;
        entry.mood = changes.mood;
        entry.mood_score = changes.mood_score;
        entry.mood_image_url = changes.mood_image_url;
        entry.collection_id = changes.collection_id;
        entry.updated_at = Utc::now();
        Ok(Some(entry.clone()))
    }

    async fn delete_entry(&self, user_id: Uuid, entry_id: Uuid) -> AppResult<bool> {
        let mut entries = self.entries.write().await;
        if entries.get(&entry_id).map(|e| e.user_id) != Some(user_id) {
            return Ok(false);
        }
        Ok(entries.remove(&entry_id).is_some())
    }

    async fn insert_collection(
        &self,
        user_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> AppResult<Collection> {
        let now = Utc::now();
        let collection = Collection {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            description: description.map(String::from),
            created_at: now,
            updated_at: now,
        };
        self.collections
            .write()
            .await
            .insert(collection.id, collection.clone());
        Ok(collection)
    }

    async fn find_collection(&self, user_id: Uuid, collection_id: Uuid) -> AppResult<Option<Collection>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection_id)
            .filter(|c| c.user_id == user_id)
            .cloned())
    }

    async fn list_collections(&self, user_id: Uuid) -> AppResult<Vec<Collection>> {
        let collections = self.collections.read().await;
        let mut result: Vec<Collection> = collections
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        result.sort_by_key(|c| (c.created_at, c.id));
        result.reverse();
        Ok(result)
    }

    async fn delete_collection(&self, user_id: Uuid, collection_id: Uuid) -> AppResult<bool> {
        let mut collections = self.collections.write().await;
        if collections.get(&collection_id).map(|c| c.user_id) != Some(user_id) {
            return Ok(false);
        }

        let mut entries = self.entries.write().await;
        let now = Utc::now();
        for entry in entries
            .values_mut()
            .filter(|e| e.user_id == user_id && e.collection_id == Some(collection_id))
        {
            entry.collection_id = None;
            entry.updated_at = now;
        }

        collections.remove(&collection_id);
        Ok(true)
    }

    async fn find_draft(&self, user_id: Uuid) -> AppResult<Option<Draft>> {
        Ok(self.drafts.read().await.get(&user_id).cloned())
    }

    async fn upsert_draft(&self, user_id: Uuid, fields: SaveDraftRequest) -> AppResult<Draft> {
        let mut drafts = self.drafts.write().await;
        let now = Utc::now();
        let draft = drafts.entry(user_id).or_insert_with(|| Draft {
            id: Uuid::new_v4(),
            user_id,
            title: String::new(),
            content: String::new(),
            mood: String::new(),
            created_at: now,
            updated_at: now,
        });

        draft.title = fields.title;
        draft.content = fields.content;
        draft.mood = fields.mood;
        draft.updated_at = now;
        Ok(draft.clone())
    }

    async fn delete_draft(&self, user_id: Uuid) -> AppResult<u64> {
        Ok(self.drafts.write().await.remove(&user_id).map_or(0, |_| 1))
    }
}
