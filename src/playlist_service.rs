use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::{
    classifier,
    models::{Platform, Submission, SubmissionId},
    repository::SubmissionStore,
    utils::formatting::format_utc,
};

/// A stored submission as shown on the playlist page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlaylistEntry {
    pub id: SubmissionId,
    pub url: String,
    pub platform: Platform,
    #[serde(rename = "user")]
    pub submitter: String,
    pub created_at: String,
    /// Empty when the link cannot be embedded.
    pub embed: String,
}

impl From<Submission> for PlaylistEntry {
    fn from(submission: Submission) -> Self {
        let embed = classifier::derive_embed(&submission.url, submission.platform);

        PlaylistEntry {
            id: submission.id,
            url: submission.url,
            platform: submission.platform,
            submitter: submission.submitter,
            created_at: format_utc(submission.created_at),
            embed,
        }
    }
}

/// Read and delete operations behind the playlist HTTP API.
pub struct PlaylistService {
    store: Arc<dyn SubmissionStore>,
}

impl PlaylistService {
    pub fn new(store: Arc<dyn SubmissionStore>) -> PlaylistService {
        PlaylistService { store }
    }

    pub async fn list_all(&self) -> anyhow::Result<Vec<PlaylistEntry>> {
        let submissions = self.store.list_all().await?;
        Ok(submissions.into_iter().map(PlaylistEntry::from).collect())
    }

    pub async fn delete_one(&self, id: SubmissionId) -> anyhow::Result<()> {
        self.store.delete_by_id(id).await?;
        info!("Deleted video {id:?}");
        Ok(())
    }

    /// Removes every submission. There is no undo.
    pub async fn clear_all(&self) -> anyhow::Result<()> {
        self.store.delete_all_and_compact().await?;
        info!("Cleared the playlist");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use time::{macros::datetime, Duration};

    use crate::{
        models::{types::UtcDateTime, NewSubmission, Platform, SubmissionId},
        repository::{
            testing::{memory_pool, BrokenStore},
            SubmissionRepository, SubmissionStore,
        },
    };

    use super::PlaylistService;

    async fn seeded_service() -> (PlaylistService, Arc<SubmissionRepository>) {
        let store = Arc::new(SubmissionRepository::new(memory_pool().await));
        let start = UtcDateTime::from(datetime!(2024-06-01 20:00 UTC));

        let seed = [
            ("https://youtu.be/XYZ789?t=5", Platform::YouTube, "Alice"),
            ("https://clips.twitch.tv/Clip", Platform::Twitch, "Bob"),
            ("https://x.com/a/status/1", Platform::Twitter, "Carol"),
        ];

        for (minute, (url, platform, submitter)) in seed.into_iter().enumerate() {
            store
                .insert(&NewSubmission {
                    url: url.to_owned(),
                    platform,
                    submitter: submitter.to_owned(),
                    created_at: start + Duration::minutes(minute as i64),
                })
                .await
                .unwrap();
        }

        (PlaylistService::new(store.clone()), store)
    }

    #[test_log::test(tokio::test)]
    async fn lists_entries_with_embeds() {
        let (service, _store) = seeded_service().await;

        let entries = service.list_all().await.unwrap();
        let embeds: Vec<&str> = entries.iter().map(|e| e.embed.as_str()).collect();

        assert_eq!(
            embeds,
            [
                "https://www.youtube.com/embed/XYZ789",
                "https://clips.twitch.tv/Clip",
                "",
            ]
        );
        assert_eq!(entries[0].submitter, "Alice");
        assert_eq!(entries[0].created_at, "2024-06-01 20:00:00");
        assert_eq!(entries[2].created_at, "2024-06-01 20:02:00");
    }

    #[test_log::test(tokio::test)]
    async fn deleting_unknown_id_changes_nothing() {
        let (service, store) = seeded_service().await;

        service.delete_one(SubmissionId(424242)).await.unwrap();

        assert_eq!(store.list_all().await.unwrap().len(), 3);
    }

    #[test_log::test(tokio::test)]
    async fn delete_one_twice_is_fine() {
        let (service, _store) = seeded_service().await;
        let first = service.list_all().await.unwrap()[0].id;

        service.delete_one(first).await.unwrap();
        service.delete_one(first).await.unwrap();

        let remaining = service.list_all().await.unwrap();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().all(|e| e.id != first));
    }

    #[test_log::test(tokio::test)]
    async fn clear_all_empties_the_list() {
        let (service, _store) = seeded_service().await;

        service.clear_all().await.unwrap();

        assert!(service.list_all().await.unwrap().is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn storage_failures_propagate() {
        let service = PlaylistService::new(Arc::new(BrokenStore));

        assert!(service.list_all().await.is_err());
        assert!(service.delete_one(SubmissionId(1)).await.is_err());
        assert!(service.clear_all().await.is_err());
    }
}
