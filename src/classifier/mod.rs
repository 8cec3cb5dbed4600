//! Pure helpers that decide whether a chat-submitted link is usable and how
//! the playlist page can play it. Nothing here performs I/O.

use lazy_regex::regex_captures;
use url::Url;

use crate::models::Platform;

/// Checked in order, the first marker found decides the platform.
const PLATFORM_MARKERS: &[(&str, Platform)] = &[
    ("youtube.com", Platform::YouTube),
    ("youtu.be", Platform::YouTube),
    ("twitch.tv", Platform::Twitch),
    ("tiktok.com", Platform::TikTok),
    ("twitter.com", Platform::Twitter),
    ("x.com", Platform::Twitter),
];

/// Returns `true` if `raw` is an absolute URL with a scheme and an authority.
pub fn validate(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => !url.cannot_be_a_base() && url.has_host(),
        Err(_) => false,
    }
}

pub fn detect_platform(url: &str) -> Platform {
    let url = url.to_lowercase();

    PLATFORM_MARKERS
        .iter()
        .find(|(marker, _)| url.contains(marker))
        .map(|(_, platform)| *platform)
        .unwrap_or(Platform::Other)
}

/// Builds the link the front end should embed, or an empty string when the
/// link cannot be embedded.
///
/// Twitch and TikTok links are passed through untouched: their players need
/// a parent domain or an official script, which the page handles itself.
pub fn derive_embed(url: &str, platform: Platform) -> String {
    match platform {
        Platform::YouTube => youtube_video_id(url)
            .map(|id| format!("https://www.youtube.com/embed/{id}"))
            .unwrap_or_default(),

        Platform::Twitch | Platform::TikTok => url.to_owned(),

        Platform::Twitter | Platform::Other => String::new(),
    }
}

fn youtube_video_id(url: &str) -> Option<String> {
    if url.contains("watch?v=") {
        let id = Url::parse(url).ok().and_then(|parsed| {
            parsed
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned())
        });

        if let Some(id) = id.filter(|id| !id.is_empty()) {
            return Some(id);
        }
    }

    let (_whole, id) = regex_captures!(r#"youtu\.be/([^?]*)"#, url)?;

    match id {
        "" => None,
        id => Some(id.to_owned()),
    }
}
