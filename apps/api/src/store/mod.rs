//! Storage seams for postings, interactions and profiles.
//!
//! Handlers, the ingestion coordinator and the recommendation pipeline only
//! see these traits. `PgStore` backs them in production; `InMemoryStore`
//! backs the tests.

pub mod memory;
pub mod postgres;

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::interaction::{Interaction, InteractionAction};
use crate::models::posting::{NormalizedPosting, Posting, PostingPage, PostingQuery};
use crate::models::profile::Profile;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

/// Result of an upsert by natural key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted(Uuid),
    Updated(Uuid),
}

impl UpsertOutcome {
    pub fn id(&self) -> Uuid {
        match self {
            UpsertOutcome::Inserted(id) | UpsertOutcome::Updated(id) => *id,
        }
    }
}

#[async_trait]
pub trait PostingStore: Send + Sync {
    /// Inserts a posting or overwrites the mutable fields of the record with the
    /// same `(source, source_id)`. The stored id and `scraped_at` never change.
    /// Must be safe under concurrent calls for the same key.
    async fn upsert_by_natural_key(
        &self,
        posting: &NormalizedPosting,
    ) -> Result<UpsertOutcome, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Posting>, StoreError>;

    /// Returns the postings that exist among `ids`, most recently posted first.
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Posting>, StoreError>;

    /// Active postings matching `query`, most recently posted first
    /// (unknown dates last), paginated.
    async fn query_active(&self, query: &PostingQuery) -> Result<PostingPage, StoreError>;
}

#[async_trait]
pub trait InteractionStore: Send + Sync {
    async fn record(
        &self,
        user_id: Uuid,
        posting_id: Uuid,
        action: InteractionAction,
    ) -> Result<Interaction, StoreError>;

    /// Deletes every saved record for the pair. Returns how many were removed.
    async fn remove_saved(&self, user_id: Uuid, posting_id: Uuid) -> Result<u64, StoreError>;

    async fn posting_ids_with_action(
        &self,
        user_id: Uuid,
        action: InteractionAction,
    ) -> Result<HashSet<Uuid>, StoreError>;

    async fn hidden_posting_ids(&self, user_id: Uuid) -> Result<HashSet<Uuid>, StoreError> {
        self.posting_ids_with_action(user_id, InteractionAction::Hidden)
            .await
    }

    /// All records for a user, newest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Interaction>, StoreError>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_profile(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError>;

    async fn save_profile(&self, user_id: Uuid, profile: &Profile) -> Result<(), StoreError>;
}
