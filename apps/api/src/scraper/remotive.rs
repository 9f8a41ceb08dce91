use serde::Deserialize;

use crate::models::posting::NormalizedPosting;

use super::{
    lenient_id, lenient_string, lenient_tags, or_default, parse_posted_at, NativeId, SkillTags,
    SourceAdapter,
};

pub const REMOTIVE_ENDPOINT: &str = "https://remotive.com/api/remote-jobs";

pub struct Remotive {
    endpoint: String,
}

impl Remotive {
    pub fn new() -> Self {
        Self::with_endpoint(REMOTIVE_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl Default for Remotive {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct RemotiveResponse {
    #[serde(default)]
    jobs: Vec<RemotiveRecord>,
}

#[derive(Debug, Deserialize)]
pub struct RemotiveRecord {
    #[serde(default, deserialize_with = "lenient_id")]
    id: Option<NativeId>,
    #[serde(default, deserialize_with = "lenient_string")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    company_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    salary: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    candidate_required_location: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    publication_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_tags")]
    tags: SkillTags,
}

impl SourceAdapter for Remotive {
    type Record = RemotiveRecord;

    fn name(&self) -> &'static str {
        "Remotive"
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn decode(&self, body: &[u8]) -> Result<Vec<RemotiveRecord>, serde_json::Error> {
        serde_json::from_slice::<RemotiveResponse>(body).map(|r| r.jobs)
    }

    fn normalize(&self, record: RemotiveRecord) -> Option<NormalizedPosting> {
        let source_id = record.id?.into_string();

        Some(NormalizedPosting {
            title: or_default(record.title, ""),
            company: or_default(record.company_name, ""),
            description: record.description.unwrap_or_default(),
            skills: record.tags.into_skills(),
            salary: record.salary.unwrap_or_default(),
            location: or_default(record.candidate_required_location, "Worldwide"),
            source: self.name().to_string(),
            url: record.url.unwrap_or_default(),
            source_id,
            posted_at: parse_posted_at(record.publication_date.as_deref()),
            is_active: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::scraper::HttpSource;

    const FIXTURE: &str = r#"{
        "job-count": 3,
        "jobs": [
            {
                "id": 1850001,
                "url": "https://remotive.com/remote-jobs/software-dev/rust-1850001",
                "title": "Rust Backend Engineer",
                "company_name": "Initech",
                "tags": ["rust", "postgresql", 42],
                "salary": "$140k - $180k",
                "publication_date": "2024-06-01T08:15:00",
                "candidate_required_location": null,
                "description": "Own the ingestion pipeline"
            },
            {
                "id": 1850002,
                "title": "",
                "company_name": "Hooli"
            },
            {
                "id": 1850003,
                "title": "QA Analyst",
                "company_name": "Umbrella",
                "candidate_required_location": "USA Only",
                "tags": null
            }
        ]
    }"#;

    fn source() -> HttpSource<Remotive> {
        HttpSource::new(Remotive::new(), Duration::from_secs(30)).unwrap()
    }

    #[test]
    fn test_normalize_remotive_records() {
        let postings = source().parse_body(FIXTURE.as_bytes()).unwrap();
        assert_eq!(postings.len(), 2);

        let rust = &postings[0];
        assert_eq!(rust.source, "Remotive");
        assert_eq!(rust.source_id, "1850001");
        assert_eq!(rust.company, "Initech");
        assert_eq!(rust.location, "Worldwide");
        assert_eq!(rust.skills, vec!["rust", "postgresql"]);
        assert!(rust.posted_at.is_some());

        let qa = &postings[1];
        assert_eq!(qa.location, "USA Only");
        assert!(qa.skills.is_empty());
        assert!(qa.posted_at.is_none());
    }

    #[test]
    fn test_missing_jobs_key_yields_empty() {
        let postings = source().parse_body(br#"{"job-count": 0}"#).unwrap();
        assert!(postings.is_empty());
    }

    #[test]
    fn test_malformed_body_is_decode_error() {
        assert!(source().parse_body(b"<html>maintenance</html>").is_err());
    }
}
