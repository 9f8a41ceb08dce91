use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A stored job posting. `id` is assigned by the store; `(source, source_id)`
/// is the natural key that survives repeated ingestion runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Posting {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub description: String,
    pub skills: Vec<String>,
    pub salary: String,
    pub location: String,
    pub source: String,
    pub url: String,
    pub source_id: String,
    pub posted_at: Option<DateTime<Utc>>,
    /// Set on first insert and never overwritten by later upserts.
    pub scraped_at: DateTime<Utc>,
    pub is_active: bool,
}

/// A posting as produced by a source adapter, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedPosting {
    pub title: String,
    pub company: String,
    pub description: String,
    pub skills: Vec<String>,
    pub salary: String,
    pub location: String,
    pub source: String,
    pub url: String,
    pub source_id: String,
    pub posted_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl NormalizedPosting {
    pub fn natural_key(&self) -> (&str, &str) {
        (&self.source, &self.source_id)
    }

    /// Records without both a title and a company are dropped before persistence.
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty() && !self.company.trim().is_empty()
    }

    /// Materializes a stored record. Used by the in-memory store on insert.
    pub fn into_posting(self, id: Uuid, scraped_at: DateTime<Utc>) -> Posting {
        Posting {
            id,
            title: self.title,
            company: self.company,
            description: self.description,
            skills: self.skills,
            salary: self.salary,
            location: self.location,
            source: self.source,
            url: self.url,
            source_id: self.source_id,
            posted_at: self.posted_at,
            scraped_at,
            is_active: self.is_active,
        }
    }
}

/// Filters for browsing active postings. Pagination is 1-based.
#[derive(Debug, Clone, Default)]
pub struct PostingQuery {
    pub search: Option<String>,
    pub skills: Vec<String>,
    pub source: Option<String>,
    pub page: u32,
    pub limit: u32,
}

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

impl PostingQuery {
    /// Page clamped to ≥ 1; limit outside 1..=100 resets to the default of 20.
    pub fn normalized(mut self) -> Self {
        if self.page < 1 {
            self.page = 1;
        }
        if self.limit < 1 || self.limit > MAX_PAGE_LIMIT {
            self.limit = DEFAULT_PAGE_LIMIT;
        }
        self.search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self.source = self.source.filter(|s| !s.is_empty());
        self
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostingPage {
    #[serde(rename = "jobs")]
    pub postings: Vec<Posting>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
}

impl PostingPage {
    pub fn new(postings: Vec<Posting>, total: u64, query: &PostingQuery) -> Self {
        let limit = u64::from(query.limit.max(1));
        let total_pages = total.div_ceil(limit) as u32;
        Self {
            postings,
            total,
            page: query.page,
            total_pages,
        }
    }
}
