mod error_handler;
mod submit;

use async_trait::async_trait;

pub use error_handler::reply_for_error;
pub use submit::CommandPipeline;

/// Chat commands that submit a video, matched case-insensitively and in this
/// order.
pub const SUBMIT_TRIGGERS: &[&str] = &["!video", "!v", "!addvideo"];

/// An inbound chat line as delivered by the chat transport.
#[derive(Clone, Debug)]
pub struct ChatMessage {
    pub channel: String,
    /// Display name of the author, used both for replies and as the
    /// rate-limit identity.
    pub sender: String,
    pub text: String,
    /// The bot's own message echoed back by the server.
    pub is_self: bool,
}

#[async_trait]
pub trait ChatSender: Send + Sync {
    async fn say(&self, channel: &str, text: &str) -> anyhow::Result<()>;
}

#[derive(thiserror::Error, Debug)]
pub enum SubmitError {
    #[error("not a valid URL")]
    InvalidUrl { trigger: &'static str },
    #[error("URL is already in the list")]
    Duplicate,
    #[error("rate limited for {seconds_remaining} s")]
    RateLimited { seconds_remaining: u64 },
    #[error("storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Splits a trimmed chat line into the trigger it starts with and the rest
/// of the line. A trigger must be followed by a space.
pub fn match_trigger(text: &str) -> Option<(&'static str, &str)> {
    SUBMIT_TRIGGERS.iter().find_map(|trigger| {
        let head = text.get(..trigger.len())?;
        let rest = text[trigger.len()..].strip_prefix(' ')?;

        head.eq_ignore_ascii_case(trigger).then_some((*trigger, rest))
    })
}
