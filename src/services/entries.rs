//! Journal entry lifecycle and the per-user draft.
//!
//! Mutations raise [`AppError`]s; reads (`get_entries`, `get_draft`) and
//! `save_draft` answer with an [`ActionResult`] envelope instead.

use std::collections::HashMap;

use uuid::Uuid;
use validator::Validate;

use crate::auth::admission::{admit, WRITE_COST};
use crate::auth::identity::resolve_user;
use crate::auth::middleware::Identity;
use crate::error::{ActionResult, AppError, AppResult};
use crate::models::collection::{Collection, CollectionSummary};
use crate::models::draft::{Draft, SaveDraftRequest};
use crate::models::entry::{
    CollectionFilter, CreateEntryRequest, EntriesPage, Entry, EntryChanges, EntryQuery,
    EntryWithMood, NewEntry, SortOrder, UpdateEntryRequest,
};
use crate::models::mood::{mood_by_id, mood_by_key, Mood};
use crate::services::images::resolve_mood_image;
use crate::services::revalidate::{journal_path, revalidate_path, DASHBOARD};
use crate::AppState;

pub async fn create_entry(
    state: &AppState,
    identity: &Identity,
    req: CreateEntryRequest,
) -> AppResult<Entry> {
    let user = resolve_user(state.store.as_ref(), identity).await?;
    req.validate()?;
    admit(
        state.admission.as_ref(),
        identity,
        WRITE_COST,
        state.admission_timeout(),
    )
    .await?;

    let mood = mood_by_key(&req.mood).ok_or(AppError::InvalidMood)?;
    ensure_collection_owned(state, user.id, req.collection_id).await?;

    let mood_image_url =
        resolve_mood_image(state.images.as_ref(), image_query(&req, mood)).await;

    let entry = state
        .store
        .insert_entry(NewEntry {
            user_id: user.id,
            title: req.title,
            content: req.content,
            mood: mood.id.to_string(),
            mood_score: mood.score,
            mood_image_url,
            collection_id: req.collection_id,
        })
        .await?;

    // The entry is persisted at this point; draft cleanup failures are only logged.
    match state.store.delete_draft(user.id).await {
        Ok(cleared) => {
            tracing::info!(
                user_id = %user.id,
                entry_id = %entry.id,
                mood = %entry.mood,
                draft_cleared = cleared > 0,
                "Journal entry created"
            );
        }
        Err(e) => {
            tracing::warn!(error = %e, user_id = %user.id, "Failed to clear draft after entry creation");
        }
    }

    revalidate_path(state, user.id, DASHBOARD);
    Ok(entry)
}

pub async fn get_entries(
    state: &AppState,
    identity: &Identity,
    query: EntryQuery,
) -> ActionResult<EntriesPage> {
    load_entries(state, identity, query).await.into()
}

async fn load_entries(
    state: &AppState,
    identity: &Identity,
    query: EntryQuery,
) -> AppResult<EntriesPage> {
    let user = resolve_user(state.store.as_ref(), identity).await?;
    let filter = CollectionFilter::parse(query.collection_id.as_deref())
        .map_err(|_| AppError::Validation("Invalid collection id".into()))?;
    let order = SortOrder::parse(query.order.as_deref())
        .ok_or_else(|| AppError::Validation("Invalid sort order".into()))?;

    let entries = state.store.list_entries(user.id, &filter, order).await?;
    let collections = collection_index(state.store.list_collections(user.id).await?);

    let entries = entries
        .into_iter()
        .map(|entry| with_mood(entry, &collections))
        .collect();

    Ok(EntriesPage { entries })
}

pub async fn get_entry(
    state: &AppState,
    identity: &Identity,
    entry_id: Uuid,
) -> AppResult<EntryWithMood> {
    let user = resolve_user(state.store.as_ref(), identity).await?;

    let entry = state
        .store
        .find_entry(user.id, entry_id)
        .await?
        .ok_or(AppError::NotFound("Entry not found".into()))?;

    let collections: HashMap<Uuid, CollectionSummary> = match entry.collection_id {
        Some(collection_id) => state
            .store
            .find_collection(user.id, collection_id)
            .await?
            .into_iter()
            .map(|c| (c.id, CollectionSummary::from(&c)))
            .collect(),
        None => HashMap::new(),
    };

    Ok(with_mood(entry, &collections))
}

pub async fn update_entry(
    state: &AppState,
    identity: &Identity,
    entry_id: Uuid,
    req: UpdateEntryRequest,
) -> AppResult<Entry> {
    let user = resolve_user(state.store.as_ref(), identity).await?;
    req.validate()?;
    admit(
        state.admission.as_ref(),
        identity,
        WRITE_COST,
        state.admission_timeout(),
    )
    .await?;

    let existing = state
        .store
        .find_entry(user.id, entry_id)
        .await?
        .ok_or(AppError::NotFound("Entry not found".into()))?;

    let mood = mood_by_key(&req.mood).ok_or(AppError::InvalidMood)?;
    ensure_collection_owned(state, user.id, req.collection_id).await?;

    let mood_image_url = if existing.mood != mood.id {
        resolve_mood_image(state.images.as_ref(), image_query(&req, mood)).await
    } else {
        existing.mood_image_url
    };

    let entry = state
        .store
        .update_entry(
            user.id,
            entry_id,
            EntryChanges {
                title: req.title,
                content: req.content,
                mood: mood.id.to_string(),
                mood_score: mood.score,
                mood_image_url,
                collection_id: req.collection_id,
            },
        )
        .await?
        .ok_or(AppError::NotFound("Entry not found".into()))?;

    tracing::info!(user_id = %user.id, entry_id = %entry.id, "Journal entry updated");

    revalidate_path(state, user.id, DASHBOARD);
    revalidate_path(state, user.id, &journal_path(entry.id));
    Ok(entry)
}

pub async fn delete_entry(state: &AppState, identity: &Identity, entry_id: Uuid) -> AppResult<bool> {
    let user = resolve_user(state.store.as_ref(), identity).await?;

    if !state.store.delete_entry(user.id, entry_id).await? {
        return Err(AppError::NotFound("Entry not found".into()));
    }

    tracing::info!(user_id = %user.id, entry_id = %entry_id, "Journal entry deleted");

    revalidate_path(state, user.id, DASHBOARD);
    revalidate_path(state, user.id, &journal_path(entry_id));
    Ok(true)
}

pub async fn get_draft(state: &AppState, identity: &Identity) -> ActionResult<Option<Draft>> {
    load_draft(state, identity).await.into()
}

async fn load_draft(state: &AppState, identity: &Identity) -> AppResult<Option<Draft>> {
    let user = resolve_user(state.store.as_ref(), identity).await?;
    state.store.find_draft(user.id).await
}

/// Last write wins; drafts are never tied to a collection.
pub async fn save_draft(
    state: &AppState,
    identity: &Identity,
    req: SaveDraftRequest,
) -> ActionResult<Draft> {
    store_draft(state, identity, req).await.into()
}

async fn store_draft(
    state: &AppState,
    identity: &Identity,
    req: SaveDraftRequest,
) -> AppResult<Draft> {
    let user = resolve_user(state.store.as_ref(), identity).await?;
    let draft = state.store.upsert_draft(user.id, req).await?;
    tracing::debug!(user_id = %user.id, "Draft saved");

    revalidate_path(state, user.id, DASHBOARD);
    Ok(draft)
}

fn image_query<'a>(req: &'a CreateEntryRequest, mood: &'static Mood) -> &'a str {
    req.mood_query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .unwrap_or(mood.pixabay_query)
}

async fn ensure_collection_owned(
    state: &AppState,
    user_id: Uuid,
    collection_id: Option<Uuid>,
) -> AppResult<()> {
    if let Some(collection_id) = collection_id {
        state
            .store
            .find_collection(user_id, collection_id)
            .await?
            .ok_or(AppError::NotFound("Collection not found".into()))?;
    }
    Ok(())
}

fn collection_index(collections: Vec<Collection>) -> HashMap<Uuid, CollectionSummary> {
    collections
        .iter()
        .map(|c| (c.id, CollectionSummary::from(c)))
        .collect()
}

fn with_mood(entry: Entry, collections: &HashMap<Uuid, CollectionSummary>) -> EntryWithMood {
    let mood_data = mood_by_id(&entry.mood);
    if mood_data.is_none() {
        tracing::error!(entry_id = %entry.id, mood = %entry.mood, "Entry has a mood outside the taxonomy");
    }

    let collection = entry
        .collection_id
        .and_then(|id| collections.get(&id).cloned());

    EntryWithMood {
        entry,
        mood_data,
        collection,
    }
}
