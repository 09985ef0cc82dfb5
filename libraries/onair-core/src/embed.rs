//! Embed id extraction
//!
//! The engine instance for an `audio-embed` item is keyed by the video id
//! found in its source locator. Supported shapes:
//! - `youtu.be/<id>`
//! - `youtube.com/watch?v=<id>`
//! - `youtube.com/embed/<id>`
//! - `youtube.com/v/<id>`

use url::Url;

use crate::error::{CoreError, Result};

/// Extract the engine id from a source locator
///
/// Locators without a scheme are accepted (`youtu.be/abc`).
pub fn extract_embed_id(raw: &str) -> Result<String> {
    let raw = raw.trim();
    let url = match Url::parse(raw) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("https://{}", raw))
            .map_err(|_| CoreError::InvalidSourceUrl(raw.to_string()))?,
        Err(_) => return Err(CoreError::InvalidSourceUrl(raw.to_string())),
    };

    let host = url
        .host_str()
        .map(|h| h.trim_start_matches("www.").trim_start_matches("m."))
        .unwrap_or_default();

    let mut segments = url.path_segments().into_iter().flatten().filter(|s| !s.is_empty());

    let id = match host {
        "youtu.be" => segments.next().map(str::to_string),
        "youtube.com" | "youtube-nocookie.com" => match segments.next() {
            Some("watch") => url
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned()),
            Some("embed" | "v") => segments.next().map(str::to_string),
            _ => None,
        },
        _ => None,
    };

    id.filter(|id| !id.is_empty())
        .ok_or_else(|| CoreError::InvalidSourceUrl(raw.to_string()))
}
