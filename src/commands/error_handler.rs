use tracing::{debug, error, info};

use super::SubmitError;

/// Turns a failed submission into the single chat line shown to the user.
pub fn reply_for_error(user: &str, error: &SubmitError) -> String {
    match error {
        SubmitError::RateLimited { seconds_remaining } => {
            debug!("{user} is rate limited for {seconds_remaining} s");
            format!("@{user} please wait {seconds_remaining}s before sending another video")
        }

        SubmitError::InvalidUrl { trigger } => {
            debug!("{user} sent an invalid URL");
            format!("@{user} invalid format. Use: {trigger} <video URL>")
        }

        SubmitError::Duplicate => {
            info!("{user} submitted a link that is already in the list");
            format!("@{user} that link is already in the list.")
        }

        SubmitError::Storage(err) => {
            error!("Could not store submission from {user}: {err:#}");
            format!("@{user} could not add your video right now, try again later.")
        }
    }
}
