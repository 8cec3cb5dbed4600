use async_trait::async_trait;
use sqlx::{query, query_as, FromRow, Pool, Sqlite};
use tracing::debug;

use crate::{
    models::{types::UtcDateTime, NewSubmission, Platform, Submission, SubmissionId},
    repository::conversion::DBConvertible,
};

use super::{
    conversion::{DBFromConversionError, DBToConversionError},
    SubmissionStore,
};

pub struct SubmissionRepository {
    pool: Pool<Sqlite>,
}

impl SubmissionRepository {
    pub fn new(pool: Pool<Sqlite>) -> SubmissionRepository {
        SubmissionRepository { pool }
    }
}

#[async_trait]
impl SubmissionStore for SubmissionRepository {
    #[tracing::instrument(skip(self))]
    async fn insert(&self, submission: &NewSubmission) -> anyhow::Result<Option<Submission>> {
        let mut transaction = self.pool.begin().await?;

        let added_submission = {
            let platform = submission.platform.to_db()?;
            let created_at = submission.created_at.to_db()?;

            query_as::<_, SqlSubmission>(
                r#"
                    INSERT INTO videos (url, platform, submitter, created_at)
                    VALUES ($1, $2, $3, $4)
                    ON CONFLICT (url) DO NOTHING
                    RETURNING id, url, platform, submitter, created_at
                "#,
            )
            .bind(&submission.url)
            .bind(platform)
            .bind(&submission.submitter)
            .bind(created_at)
            .fetch_optional(&mut *transaction)
            .await?
        };

        transaction.commit().await?;

        match added_submission {
            Some(added) => Ok(Some(Submission::from_db(&added)?)),
            None => {
                debug!("URL already stored, nothing inserted");
                Ok(None)
            }
        }
    }

    async fn find_by_url(&self, url: &str) -> anyhow::Result<Option<Submission>> {
        let found = query_as::<_, SqlSubmission>(
            r#"
                SELECT id, url, platform, submitter, created_at FROM videos
                WHERE url = $1
                LIMIT 1
            "#,
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        match found {
            Some(found) => Ok(Some(Submission::from_db(&found)?)),
            None => Ok(None),
        }
    }

    async fn list_all(&self) -> anyhow::Result<Vec<Submission>> {
        let rows = query_as::<_, SqlSubmission>(
            r#"
                SELECT id, url, platform, submitter, created_at FROM videos
                ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(Submission::from_db)
            .collect::<Result<Vec<_>, _>>()?)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_by_id(&self, id: SubmissionId) -> anyhow::Result<()> {
        let id = id.to_db()?;

        let result = query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        debug!("Deleted {} row(s)", result.rows_affected());

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_all_and_compact(&self) -> anyhow::Result<()> {
        query("DELETE FROM videos").execute(&self.pool).await?;
        // VACUUM cannot run inside a transaction.
        query("VACUUM").execute(&self.pool).await?;

        Ok(())
    }
}

#[derive(Debug, FromRow)]
pub struct SqlSubmission {
    id: i64,
    url: String,
    platform: String,
    submitter: String,
    created_at: String,
}

impl DBConvertible for Submission {
    type DBType = SqlSubmission;

    fn to_db(&self) -> Result<Self::DBType, DBToConversionError> {
        Ok(SqlSubmission {
            id: self.id.to_db()?,
            url: self.url.clone(),
            platform: self.platform.to_db()?,
            submitter: self.submitter.clone(),
            created_at: self.created_at.to_db()?,
        })
    }

    fn from_db(value: &Self::DBType) -> Result<Self, DBFromConversionError> {
        Ok(Submission {
            id: SubmissionId::from_db(&value.id)?,
            url: value.url.clone(),
            platform: Platform::from_db(&value.platform)?,
            submitter: value.submitter.clone(),
            created_at: UtcDateTime::from_db(&value.created_at)?,
        })
    }
}
