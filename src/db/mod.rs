use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::collection::Collection;
use crate::models::draft::{Draft, SaveDraftRequest};
use crate::models::entry::{CollectionFilter, Entry, EntryChanges, NewEntry, SortOrder};
use crate::models::user::{SyncUserRequest, User};

pub mod memory;
pub mod postgres;

/// Relational store behind the journal services.
///
/// Every entry, collection and draft method takes the owning internal user id
/// and must filter by it; a row owned by someone else behaves as absent.
#[async_trait]
pub trait JournalStore: Send + Sync {
    async fn ping(&self) -> AppResult<()>;

    // Users
    async fn find_user_by_external_id(&self, external_id: &str) -> AppResult<Option<User>>;
    async fn upsert_user(&self, external_id: &str, profile: SyncUserRequest) -> AppResult<User>;

    // Entries
    /// `insert_entry` and `update_entry` re-check that `collection_id`, when
    /// set, is one of the user's collections as part of the write, and fail
    /// with `NotFound` otherwise.
    async fn insert_entry(&self, entry: NewEntry) -> AppResult<Entry>;
    async fn find_entry(&self, user_id: Uuid, entry_id: Uuid) -> AppResult<Option<Entry>>;
    async fn list_entries(
        &self,
        user_id: Uuid,
        filter: &CollectionFilter,
        order: SortOrder,
    ) -> AppResult<Vec<Entry>>;
    /// Entries created at or after `since`, oldest first.
    async fn list_entries_since(&self, user_id: Uuid, since: DateTime<Utc>) -> AppResult<Vec<Entry>>;
    async fn update_entry(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
        changes: EntryChanges,
    ) -> AppResult<Option<Entry>>;
    async fn delete_entry(&self, user_id: Uuid, entry_id: Uuid) -> AppResult<bool>;

    // Collections
    async fn insert_collection(
        &self,
        user_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> AppResult<Collection>;
    async fn find_collection(&self, user_id: Uuid, collection_id: Uuid) -> AppResult<Option<Collection>>;
    /// Newest first.
    async fn list_collections(&self, user_id: Uuid) -> AppResult<Vec<Collection>>;
    /// Deletes the collection and clears it from the user's entries.
    async fn delete_collection(&self, user_id: Uuid, collection_id: Uuid) -> AppResult<bool>;

    // Drafts
    async fn find_draft(&self, user_id: Uuid) -> AppResult<Option<Draft>>;
    async fn upsert_draft(&self, user_id: Uuid, fields: SaveDraftRequest) -> AppResult<Draft>;
    async fn delete_draft(&self, user_id: Uuid) -> AppResult<u64>;
}
