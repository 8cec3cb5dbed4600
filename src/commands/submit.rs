use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{debug, error, info};

use crate::{
    classifier,
    commands::{match_trigger, reply_for_error, ChatMessage, ChatSender, SubmitError},
    models::{types::UtcDateTime, NewSubmission, Submission},
    rate_limiter::{RateLimitDecision, RateLimiter},
    repository::SubmissionStore,
};

/// Turns `!video <url>` chat commands into stored submissions.
///
/// Messages must be handled one at a time: the rate limiter is owned
/// here and is not synchronised.
pub struct CommandPipeline<L: RateLimiter> {
    store: Arc<dyn SubmissionStore>,
    rate_limiter: L,
}

impl<L: RateLimiter> CommandPipeline<L> {
    pub fn new(store: Arc<dyn SubmissionStore>, rate_limiter: L) -> CommandPipeline<L> {
        CommandPipeline {
            store,
            rate_limiter,
        }
    }

    /// Processes one chat message and sends the reply, if any, through `chat`.
    #[tracing::instrument(skip_all, fields(sender = %message.sender))]
    pub async fn handle(&mut self, message: &ChatMessage, now: OffsetDateTime, chat: &dyn ChatSender) {
        let reply = match self.process(message, now).await {
            None => return,
            Some(Ok(_)) => format!(
                "@{} added! It will show up in the list in a few seconds.",
                message.sender
            ),
            Some(Err(err)) => reply_for_error(&message.sender, &err),
        };

        if let Err(err) = chat.say(&message.channel, &reply).await {
            error!("Failed to send a reply: {err}\nThe reply was: {reply}");
        }
    }

    /// Runs the submission steps for one message.
    ///
    /// Returns `None` when the message is not a command at all.
    pub async fn process(
        &mut self,
        message: &ChatMessage,
        now: OffsetDateTime,
    ) -> Option<Result<Submission, SubmitError>> {
        if message.is_self {
            return None;
        }

        let (trigger, rest) = match_trigger(message.text.trim())?;
        debug!("Matched trigger {trigger}");

        Some(self.submit(&message.sender, trigger, rest, now).await)
    }

    async fn submit(
        &mut self,
        user: &str,
        trigger: &'static str,
        rest: &str,
        now: OffsetDateTime,
    ) -> Result<Submission, SubmitError> {
        if let RateLimitDecision::Denied { seconds_remaining } = self.rate_limiter.check(user, now)
        {
            return Err(SubmitError::RateLimited { seconds_remaining });
        }

        let url = rest.trim();
        if !classifier::validate(url) {
            return Err(SubmitError::InvalidUrl { trigger });
        }

        if self.store.find_by_url(url).await?.is_some() {
            return Err(SubmitError::Duplicate);
        }

        let new_submission = NewSubmission {
            url: url.to_owned(),
            platform: classifier::detect_platform(url),
            submitter: user.to_owned(),
            created_at: UtcDateTime::from(now),
        };

        // The store has the final say on uniqueness.
        let submission = self
            .store
            .insert(&new_submission)
            .await?
            .ok_or(SubmitError::Duplicate)?;

        self.rate_limiter.record(user, now);

        info!(
            "Added {} video {:?} from {user} (id {:?})",
            submission.platform, submission.url, submission.id
        );

        Ok(submission)
    }
}
