use serde::Deserialize;

use crate::models::posting::NormalizedPosting;

use super::{
    lenient_id, lenient_string, lenient_tags, or_default, parse_posted_at, NativeId, SkillTags,
    SourceAdapter,
};

pub const REMOTEOK_ENDPOINT: &str = "https://remoteok.com/api";

/// RemoteOK publishes a JSON array; the first element is a legal notice without an id.
pub struct RemoteOk {
    endpoint: String,
}

impl RemoteOk {
    pub fn new() -> Self {
        Self::with_endpoint(REMOTEOK_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl Default for RemoteOk {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
pub struct RemoteOkRecord {
    #[serde(default, deserialize_with = "lenient_id")]
    id: Option<NativeId>,
    #[serde(default, deserialize_with = "lenient_string")]
    position: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    company: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    salary: Option<String>,
    #[serde(default)]
    salary_min: Option<serde_json::Value>,
    #[serde(default)]
    salary_max: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    location: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    date: Option<String>,
    #[serde(default, deserialize_with = "lenient_tags")]
    tags: SkillTags,
}

/// Prefers the free-text salary; otherwise renders a positive numeric range.
fn salary_text(
    salary: Option<String>,
    min: Option<serde_json::Value>,
    max: Option<serde_json::Value>,
) -> String {
    if let Some(s) = salary.filter(|s| !s.trim().is_empty()) {
        return s.trim().to_string();
    }
    let amount = |v: Option<serde_json::Value>| v.and_then(|v| v.as_u64()).filter(|n| *n > 0);
    match (amount(min), amount(max)) {
        (Some(lo), Some(hi)) => format!("${lo} - ${hi}"),
        (Some(lo), None) => format!("${lo}+"),
        (None, Some(hi)) => format!("up to ${hi}"),
        (None, None) => String::new(),
    }
}

impl SourceAdapter for RemoteOk {
    type Record = RemoteOkRecord;

    fn name(&self) -> &'static str {
        "RemoteOK"
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn decode(&self, body: &[u8]) -> Result<Vec<RemoteOkRecord>, serde_json::Error> {
        serde_json::from_slice(body)
    }

    fn normalize(&self, record: RemoteOkRecord) -> Option<NormalizedPosting> {
        let source_id = record.id?.into_string();

        Some(NormalizedPosting {
            title: or_default(record.position, ""),
            company: or_default(record.company, ""),
            description: record.description.unwrap_or_default(),
            skills: record.tags.into_skills(),
            salary: salary_text(record.salary, record.salary_min, record.salary_max),
            location: or_default(record.location, "Remote"),
            source: self.name().to_string(),
            url: record.url.unwrap_or_default(),
            source_id,
            posted_at: parse_posted_at(record.date.as_deref()),
            is_active: true,
        })
    }
}
