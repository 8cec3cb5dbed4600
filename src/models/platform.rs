use serde::Serialize;
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// The hosting service a submitted link points to.
///
/// Assigned once when a submission is stored and never recomputed.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Display, AsRefStr, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Platform {
    YouTube,
    Twitch,
    TikTok,
    Twitter,
    Other,
}
