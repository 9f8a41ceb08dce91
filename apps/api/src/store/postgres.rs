use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::interaction::{Interaction, InteractionAction};
use crate::models::posting::{NormalizedPosting, Posting, PostingPage, PostingQuery};
use crate::models::profile::Profile;

use super::{InteractionStore, PostingStore, ProfileStore, StoreError, UpsertOutcome};

/// PostgreSQL-backed implementation of every store trait.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct UpsertRow {
    id: Uuid,
    inserted: bool,
}

#[derive(FromRow)]
struct InteractionRow {
    id: Uuid,
    user_id: Uuid,
    posting_id: Uuid,
    action: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<InteractionRow> for Interaction {
    type Error = StoreError;

    fn try_from(row: InteractionRow) -> Result<Self, Self::Error> {
        let action = row.action.parse().map_err(StoreError::InvalidData)?;
        Ok(Interaction {
            id: row.id,
            user_id: row.user_id,
            posting_id: row.posting_id,
            action,
            timestamp: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct ProfileRow {
    skills: Vec<String>,
    experience_level: String,
    salary_min: i32,
    salary_max: i32,
    remote_preference: String,
    preferred_roles: Vec<String>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = StoreError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(Profile {
            skills: row.skills,
            experience_level: row
                .experience_level
                .parse()
                .map_err(StoreError::InvalidData)?,
            salary_range: crate::models::profile::SalaryRange {
                min: row.salary_min,
                max: row.salary_max,
            },
            remote_preference: row
                .remote_preference
                .parse()
                .map_err(StoreError::InvalidData)?,
            preferred_roles: row.preferred_roles,
        })
    }
}

/// Escapes LIKE metacharacters so user search text matches literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn push_active_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &PostingQuery) {
    builder.push(" WHERE is_active = TRUE");

    if let Some(search) = &query.search {
        let pattern = format!("%{}%", escape_like(search));
        builder
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR company ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if !query.skills.is_empty() {
        builder
            .push(" AND skills && ")
            .push_bind(query.skills.clone());
    }

    if let Some(source) = &query.source {
        builder.push(" AND source = ").push_bind(source.clone());
    }
}

#[async_trait]
impl PostingStore for PgStore {
    async fn upsert_by_natural_key(
        &self,
        posting: &NormalizedPosting,
    ) -> Result<UpsertOutcome, StoreError> {
        // xmax = 0 only on rows created by this statement.
        let row: UpsertRow = sqlx::query_as(
            r#"
            INSERT INTO postings
                (title, company, description, salary, location, skills,
                 source, source_id, url, posted_at, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (source, source_id) DO UPDATE SET
                title       = EXCLUDED.title,
                company     = EXCLUDED.company,
                description = EXCLUDED.description,
                salary      = EXCLUDED.salary,
                location    = EXCLUDED.location,
                skills      = EXCLUDED.skills,
                url         = EXCLUDED.url,
                posted_at   = EXCLUDED.posted_at,
                is_active   = EXCLUDED.is_active,
                updated_at  = NOW()
            RETURNING id, (xmax = 0) AS inserted
            "#,
        )
        .bind(&posting.title)
        .bind(&posting.company)
        .bind(&posting.description)
        .bind(&posting.salary)
        .bind(&posting.location)
        .bind(&posting.skills)
        .bind(&posting.source)
        .bind(&posting.source_id)
        .bind(&posting.url)
        .bind(posting.posted_at)
        .bind(posting.is_active)
        .fetch_one(&self.pool)
        .await?;

        Ok(if row.inserted {
            UpsertOutcome::Inserted(row.id)
        } else {
            UpsertOutcome::Updated(row.id)
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Posting>, StoreError> {
        let posting = sqlx::query_as::<_, Posting>("SELECT * FROM postings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(posting)
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Posting>, StoreError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let postings = sqlx::query_as::<_, Posting>(
            "SELECT * FROM postings WHERE id = ANY($1) ORDER BY posted_at DESC NULLS LAST, scraped_at DESC",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(postings)
    }

    async fn query_active(&self, query: &PostingQuery) -> Result<PostingPage, StoreError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM postings");
        push_active_filters(&mut count, query);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new("SELECT * FROM postings");
        push_active_filters(&mut select, query);
        select
            .push(" ORDER BY posted_at DESC NULLS LAST, scraped_at DESC LIMIT ")
            .push_bind(i64::from(query.limit))
            .push(" OFFSET ")
            .push_bind(query.offset() as i64);
        let postings = select
            .build_query_as::<Posting>()
            .fetch_all(&self.pool)
            .await?;

        Ok(PostingPage::new(postings, total.max(0) as u64, query))
    }
}

#[async_trait]
impl InteractionStore for PgStore {
    async fn record(
        &self,
        user_id: Uuid,
        posting_id: Uuid,
        action: InteractionAction,
    ) -> Result<Interaction, StoreError> {
        let row: InteractionRow = sqlx::query_as(
            r#"
            INSERT INTO user_interactions (user_id, posting_id, action)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, posting_id, action, created_at
            "#,
        )
        .bind(user_id)
        .bind(posting_id)
        .bind(action.as_str())
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn remove_saved(&self, user_id: Uuid, posting_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "DELETE FROM user_interactions WHERE user_id = $1 AND posting_id = $2 AND action = 'saved'",
        )
        .bind(user_id)
        .bind(posting_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn posting_ids_with_action(
        &self,
        user_id: Uuid,
        action: InteractionAction,
    ) -> Result<HashSet<Uuid>, StoreError> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT DISTINCT posting_id FROM user_interactions WHERE user_id = $1 AND action = $2",
        )
        .bind(user_id)
        .bind(action.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().collect())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Interaction>, StoreError> {
        let rows: Vec<InteractionRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, posting_id, action, created_at
            FROM user_interactions
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Interaction::try_from).collect()
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn find_profile(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError> {
        let row: Option<ProfileRow> = sqlx::query_as(
            r#"
            SELECT skills, experience_level, salary_min, salary_max,
                   remote_preference, preferred_roles
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Profile::try_from).transpose()
    }

    async fn save_profile(&self, user_id: Uuid, profile: &Profile) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO profiles
                (user_id, skills, experience_level, salary_min, salary_max,
                 remote_preference, preferred_roles)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id) DO UPDATE SET
                skills            = EXCLUDED.skills,
                experience_level  = EXCLUDED.experience_level,
                salary_min        = EXCLUDED.salary_min,
                salary_max        = EXCLUDED.salary_max,
                remote_preference = EXCLUDED.remote_preference,
                preferred_roles   = EXCLUDED.preferred_roles,
                updated_at        = NOW()
            "#,
        )
        .bind(user_id)
        .bind(&profile.skills)
        .bind(profile.experience_level.as_str())
        .bind(profile.salary_range.min)
        .bind(profile.salary_range.max)
        .bind(profile.remote_preference.as_str())
        .bind(&profile.preferred_roles)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_escapes_metacharacters() {
        assert_eq!(escape_like("100%_rust\\"), "100\\%\\_rust\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_filters_bind_only_present_fields() {
        let query = PostingQuery {
            search: Some("rust".to_string()),
            skills: vec!["Go".to_string()],
            source: None,
            page: 1,
            limit: 20,
        };
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM postings");
        push_active_filters(&mut builder, &query);
        let sql = builder.sql();
        assert!(sql.contains("is_active = TRUE"));
        assert!(sql.contains("title ILIKE $1"));
        assert!(sql.contains("skills && $4"));
        assert!(!sql.contains("source ="));
    }
}
