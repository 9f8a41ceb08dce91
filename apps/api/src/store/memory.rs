//! In-memory store. Test-only backend; `main` always wires `PgStore`.
//!
//! Each table sits behind its own `RwLock`; an upsert holds the posting
//! table's write lock for both the key lookup and the write.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::models::interaction::{Interaction, InteractionAction};
use crate::models::posting::{NormalizedPosting, Posting, PostingPage, PostingQuery};
use crate::models::profile::Profile;

use super::{InteractionStore, PostingStore, ProfileStore, StoreError, UpsertOutcome};

#[derive(Default)]
struct PostingTable {
    by_id: HashMap<Uuid, Posting>,
    by_natural_key: HashMap<(String, String), Uuid>,
}

#[derive(Default)]
pub struct InMemoryStore {
    postings: RwLock<PostingTable>,
    interactions: RwLock<Vec<Interaction>>,
    profiles: RwLock<HashMap<Uuid, Profile>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored postings, active or not.
    pub fn posting_count(&self) -> usize {
        self.postings.read().map(|t| t.by_id.len()).unwrap_or(0)
    }

    /// Flips the active flag of a stored posting. Returns false if it does not exist.
    pub fn set_active(&self, id: Uuid, active: bool) -> Result<bool, StoreError> {
        let mut table = write(&self.postings)?;
        Ok(match table.by_id.get_mut(&id) {
            Some(posting) => {
                posting.is_active = active;
                true
            }
            None => false,
        })
    }
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, StoreError> {
    lock.read()
        .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, StoreError> {
    lock.write()
        .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
}

/// Most recently posted first; postings without a date go last.
fn recency_order(a: &Posting, b: &Posting) -> Ordering {
    match (a.posted_at, b.posted_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| b.scraped_at.cmp(&a.scraped_at))
}

fn matches_query(posting: &Posting, query: &PostingQuery) -> bool {
    if !posting.is_active {
        return false;
    }
    if let Some(search) = &query.search {
        let needle = search.to_lowercase();
        let hit = [&posting.title, &posting.company, &posting.description]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle));
        if !hit {
            return false;
        }
    }
    if !query.skills.is_empty() && !posting.skills.iter().any(|s| query.skills.contains(s)) {
        return false;
    }
    if let Some(source) = &query.source {
        if &posting.source != source {
            return false;
        }
    }
    true
}

#[async_trait]
impl PostingStore for InMemoryStore {
    async fn upsert_by_natural_key(
        &self,
        posting: &NormalizedPosting,
    ) -> Result<UpsertOutcome, StoreError> {
        let mut table = write(&self.postings)?;
        let (source, source_id) = posting.natural_key();
        let key = (source.to_string(), source_id.to_string());

        if let Some(id) = table.by_natural_key.get(&key).copied() {
            if let Some(existing) = table.by_id.get_mut(&id) {
                let scraped_at = existing.scraped_at;
                *existing = posting.clone().into_posting(id, scraped_at);
                return Ok(UpsertOutcome::Updated(id));
            }
        }

        let id = Uuid::new_v4();
        table
            .by_id
            .insert(id, posting.clone().into_posting(id, Utc::now()));
        table.by_natural_key.insert(key, id);
        Ok(UpsertOutcome::Inserted(id))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Posting>, StoreError> {
        Ok(read(&self.postings)?.by_id.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Posting>, StoreError> {
        let table = read(&self.postings)?;
        let unique: HashSet<&Uuid> = ids.iter().collect();
        let mut postings: Vec<Posting> = unique
            .into_iter()
            .filter_map(|id| table.by_id.get(id).cloned())
            .collect();
        postings.sort_by(recency_order);
        Ok(postings)
    }

    async fn query_active(&self, query: &PostingQuery) -> Result<PostingPage, StoreError> {
        let table = read(&self.postings)?;
        let mut matching: Vec<&Posting> = table
            .by_id
            .values()
            .filter(|p| matches_query(p, query))
            .collect();
        matching.sort_by(|a, b| recency_order(a, b));

        let total = matching.len() as u64;
        let page: Vec<Posting> = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .cloned()
            .collect();
        Ok(PostingPage::new(page, total, query))
    }
}

#[async_trait]
impl InteractionStore for InMemoryStore {
    async fn record(
        &self,
        user_id: Uuid,
        posting_id: Uuid,
        action: InteractionAction,
    ) -> Result<Interaction, StoreError> {
        let interaction = Interaction {
            id: Uuid::new_v4(),
            user_id,
            posting_id,
            action,
            timestamp: Utc::now(),
        };
        write(&self.interactions)?.push(interaction.clone());
        Ok(interaction)
    }

    async fn remove_saved(&self, user_id: Uuid, posting_id: Uuid) -> Result<u64, StoreError> {
        let mut interactions = write(&self.interactions)?;
        let before = interactions.len();
        interactions.retain(|i| {
            !(i.user_id == user_id
                && i.posting_id == posting_id
                && i.action == InteractionAction::Saved)
        });
        Ok((before - interactions.len()) as u64)
    }

    async fn posting_ids_with_action(
        &self,
        user_id: Uuid,
        action: InteractionAction,
    ) -> Result<HashSet<Uuid>, StoreError> {
        Ok(read(&self.interactions)?
            .iter()
            .filter(|i| i.user_id == user_id && i.action == action)
            .map(|i| i.posting_id)
            .collect())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Interaction>, StoreError> {
        let mut records: Vec<Interaction> = read(&self.interactions)?
            .iter()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect();
        // Later insertions first when timestamps tie.
        records.reverse();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }
}

#[async_trait]
impl ProfileStore for InMemoryStore {
    async fn find_profile(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError> {
        Ok(read(&self.profiles)?.get(&user_id).cloned())
    }

    async fn save_profile(&self, user_id: Uuid, profile: &Profile) -> Result<(), StoreError> {
        write(&self.profiles)?.insert(user_id, profile.clone());
        Ok(())
    }
}
