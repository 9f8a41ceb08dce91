//! Source adapters. Fetch postings from external job boards and normalize
//! them into `NormalizedPosting`s.
//!
//! Each provider implements `SourceAdapter` (schema + normalize). `HttpSource`
//! wraps an adapter with its own HTTP client and timeout and exposes the
//! object-safe `Source` trait the `IngestionCoordinator` drives.

pub mod coordinator;
pub mod handlers;
pub mod remoteok;
pub mod remotive;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::debug;

use crate::models::posting::NormalizedPosting;

pub use coordinator::{IngestionCoordinator, ScrapeResult};
pub use remoteok::RemoteOk;
pub use remotive::Remotive;

const USER_AGENT: &str = "HireSense Job Aggregator";

/// Provider timestamps are `YYYY-MM-DDTHH:MM:SS`, interpreted as UTC.
const POSTED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{source_name} returned status {status}")]
    Status { source_name: String, status: u16 },

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A job board that can be scraped. Implemented by `HttpSource` and by test doubles.
#[async_trait]
pub trait Source: Send + Sync {
    /// Stable name stored as the posting's `source` discriminator.
    fn name(&self) -> &'static str;

    /// Fetches and normalizes the provider's current postings. Invalid records
    /// are dropped silently; only network and decode failures are errors.
    async fn scrape(&self) -> Result<Vec<NormalizedPosting>, FetchError>;
}

/// Provider-specific schema and field mapping.
pub trait SourceAdapter: Send + Sync + 'static {
    type Record: DeserializeOwned + Send;

    fn name(&self) -> &'static str;

    fn endpoint(&self) -> &str;

    /// Decodes the response body into provider records.
    fn decode(&self, body: &[u8]) -> Result<Vec<Self::Record>, serde_json::Error>;

    /// Maps one record to the canonical shape. `None` skips records that are not postings.
    fn normalize(&self, record: Self::Record) -> Option<NormalizedPosting>;
}

/// Runs a `SourceAdapter` over HTTP with a bounded per-request timeout.
pub struct HttpSource<A> {
    adapter: A,
    client: reqwest::Client,
}

impl<A: SourceAdapter> HttpSource<A> {
    pub fn new(adapter: A, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { adapter, client })
    }

    /// Decodes and normalizes a response body, applying the validity filter.
    pub fn parse_body(&self, body: &[u8]) -> Result<Vec<NormalizedPosting>, FetchError> {
        let records = self.adapter.decode(body)?;
        let total = records.len();
        let postings: Vec<NormalizedPosting> = records
            .into_iter()
            .filter_map(|r| self.adapter.normalize(r))
            .filter(NormalizedPosting::is_valid)
            .collect();
        debug!(
            "{}: {} of {} records normalized",
            self.adapter.name(),
            postings.len(),
            total
        );
        Ok(postings)
    }
}

#[async_trait]
impl<A: SourceAdapter> Source for HttpSource<A> {
    fn name(&self) -> &'static str {
        self.adapter.name()
    }

    async fn scrape(&self) -> Result<Vec<NormalizedPosting>, FetchError> {
        let response = self.client.get(self.adapter.endpoint()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                source_name: self.adapter.name().to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        self.parse_body(&body)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Normalization helpers shared by adapters
// ────────────────────────────────────────────────────────────────────────────

/// Accepts any JSON value; keeps it only if it is a string.
/// Lets a record survive a provider sending `null` or a number where text is expected.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    })
}

/// Source-native identifier: providers send either a number or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum NativeId {
    Number(serde_json::Number),
    Text(String),
}

impl NativeId {
    pub fn into_string(self) -> String {
        match self {
            NativeId::Number(n) => n.to_string(),
            NativeId::Text(s) => s,
        }
    }
}

/// Deserializes a native id, treating `null`, blanks and other shapes as missing.
pub(crate) fn lenient_id<'de, D>(deserializer: D) -> Result<Option<NativeId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => Some(NativeId::Number(n)),
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(NativeId::Text(s)),
        _ => None,
    })
}

/// Skill tags as sent by a provider: a delimited string or a list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(untagged)]
pub(crate) enum SkillTags {
    Delimited(String),
    List(Vec<serde_json::Value>),
    #[default]
    #[serde(skip)]
    Missing,
}

/// Deserializes skill tags, treating `null` or any other shape as missing.
pub(crate) fn lenient_tags<'de, D>(deserializer: D) -> Result<SkillTags, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => SkillTags::Delimited(s),
        serde_json::Value::Array(items) => SkillTags::List(items),
        _ => SkillTags::Missing,
    })
}

impl SkillTags {
    pub fn into_skills(self) -> Vec<String> {
        match self {
            SkillTags::Delimited(s) => parse_skill_string(&s),
            SkillTags::List(items) => items
                .into_iter()
                .filter_map(|v| match v {
                    serde_json::Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            SkillTags::Missing => vec![],
        }
    }
}

/// Splits a comma-delimited tag string, trimming whitespace and dropping empty segments.
pub fn parse_skill_string(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Parses a provider timestamp. Unparsable input yields `None` rather than failing the record.
pub fn parse_posted_at(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(raw, POSTED_AT_FORMAT)
        .map(|naive| naive.and_utc())
        .ok()
}

/// Returns the trimmed value, or `default` when absent or blank.
pub(crate) fn or_default(value: Option<String>, default: &str) -> String {
    match value {
        Some(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => default.to_string(),
    }
}
