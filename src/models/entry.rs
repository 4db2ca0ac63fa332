use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::collection::CollectionSummary;
use crate::models::mood::Mood;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Entry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    /// Lowercase mood id from the taxonomy.
    pub mood: String,
    /// Taxonomy score captured when the entry was written.
    pub mood_score: i32,
    pub mood_image_url: Option<String>,
    pub collection_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row to insert. Ids and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub mood: String,
    pub mood_score: i32,
    pub mood_image_url: Option<String>,
    pub collection_id: Option<Uuid>,
}

/// Full replacement of the mutable columns of an entry.
#[derive(Debug, Clone)]
pub struct EntryChanges {
    pub title: String,
    pub content: String,
    pub mood: String,
    pub mood_score: i32,
    pub mood_image_url: Option<String>,
    pub collection_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEntryRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,

    /// Mood key, matched case-insensitively.
    pub mood: String,

    /// Image search phrase. Defaults to the mood's own query.
    pub mood_query: Option<String>,

    pub collection_id: Option<Uuid>,
}

/// PUT /api/entries/:id carries the same fields as a create.
pub type UpdateEntryRequest = CreateEntryRequest;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Parses the `order` query value. Absent or blank means newest first.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw.map(str::trim) {
            None | Some("") => Some(SortOrder::Desc),
            Some(s) if s.eq_ignore_ascii_case("desc") => Some(SortOrder::Desc),
            Some(s) if s.eq_ignore_ascii_case("asc") => Some(SortOrder::Asc),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionFilter {
    All,
    /// Entries without a collection.
    Unorganized,
    Collection(Uuid),
}

impl CollectionFilter {
    /// Parses the `collection_id` query value: absent, `unorganized`, or a UUID.
    pub fn parse(raw: Option<&str>) -> Result<Self, uuid::Error> {
        match raw.map(str::trim) {
            None | Some("") => Ok(CollectionFilter::All),
            Some("unorganized") => Ok(CollectionFilter::Unorganized),
            Some(id) => Uuid::parse_str(id).map(CollectionFilter::Collection),
        }
    }

    pub fn matches(&self, collection_id: Option<Uuid>) -> bool {
        match self {
            CollectionFilter::All => true,
            CollectionFilter::Unorganized => collection_id.is_none(),
            CollectionFilter::Collection(id) => collection_id == Some(*id),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct EntryQuery {
    pub collection_id: Option<String>,
    pub order: Option<String>,
}

/// Entry as returned to readers, with taxonomy and collection metadata.
#[derive(Debug, Clone, Serialize)]
pub struct EntryWithMood {
    #[serde(flatten)]
    pub entry: Entry,
    pub mood_data: Option<&'static Mood>,
    pub collection: Option<CollectionSummary>,
}

#[derive(Debug, Serialize)]
pub struct EntriesPage {
    pub entries: Vec<EntryWithMood>,
}
