/// Media item domain type
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::embed::extract_embed_id;
use crate::error::{CoreError, Result};

/// How a media item is rendered by the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MediaKind {
    /// Streamed through an embedded external engine
    #[default]
    #[serde(alias = "youtube")]
    AudioEmbed,

    /// Read aloud by the browser's speech synthesizer
    #[serde(alias = "tts")]
    SynthesizedSpeech,
}

/// Content family an item was picked from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentType {
    /// News article with an audio rendition
    #[serde(alias = "news")]
    Article,

    /// Curated audio/video station
    Station,
}

impl ContentType {
    /// Route prefix used by content pages
    pub fn route_prefix(self) -> &'static str {
        match self {
            ContentType::Article => "news",
            ContentType::Station => "station",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentType::Article => f.write_str("article"),
            ContentType::Station => f.write_str("station"),
        }
    }
}

/// Content identity of a media item
///
/// Two items with the same identity are the same track, whatever their
/// `id` or display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaIdentity {
    pub content_type: ContentType,
    pub slug: String,
}

impl fmt::Display for MediaIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.content_type, self.slug)
    }
}

/// A playable unit supplied by content pages
///
/// Immutable once built; the player only references it. Derived
/// `PartialEq` compares every field, use [`MediaItem::is_same_track`] for
/// playlist identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    /// Opaque identifier from the content source
    pub id: String,

    /// Rendering path
    #[serde(default, alias = "mediaType")]
    pub media_kind: MediaKind,

    /// Content family
    #[serde(alias = "type")]
    pub content_type: ContentType,

    /// Routing key, unique within `content_type`
    pub slug: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub thumbnail_url: String,

    #[serde(default)]
    pub author: String,

    /// External media locator (embed items only)
    #[serde(default, alias = "mediaUrl")]
    pub source_url: Option<String>,

    /// Publication timestamp
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,

    /// Explicit location label
    #[serde(default)]
    pub location: Option<String>,

    /// Station city
    #[serde(default)]
    pub city: Option<String>,

    /// Pre-formatted display date
    #[serde(default, alias = "date")]
    pub display_date: Option<String>,
}

impl MediaItem {
    /// Create a new item with minimal metadata
    pub fn new(
        id: impl Into<String>,
        content_type: ContentType,
        slug: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            media_kind: MediaKind::AudioEmbed,
            content_type,
            slug: slug.into(),
            title: title.into(),
            description: String::new(),
            thumbnail_url: String::new(),
            author: String::new(),
            source_url: None,
            published_at: None,
            location: None,
            city: None,
            display_date: None,
        }
    }

    pub fn with_media_kind(mut self, kind: MediaKind) -> Self {
        self.media_kind = kind;
        self
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_thumbnail_url(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = url.into();
        self
    }

    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    /// Check the identity fields the player relies on
    pub fn validate(&self) -> Result<()> {
        if self.slug.trim().is_empty() {
            return Err(CoreError::MissingSlug {
                id: self.id.clone(),
            });
        }
        Ok(())
    }

    /// Content identity of this item
    pub fn identity(&self) -> MediaIdentity {
        MediaIdentity {
            content_type: self.content_type,
            slug: self.slug.clone(),
        }
    }

    /// Whether both items denote the same track
    pub fn is_same_track(&self, other: &MediaItem) -> bool {
        self.slug == other.slug && self.content_type == other.content_type
    }

    /// Engine instance identity, if this item is played through an embed
    pub fn embed_id(&self) -> Option<String> {
        if self.media_kind != MediaKind::AudioEmbed {
            return None;
        }
        self.source_url
            .as_deref()
            .and_then(|url| extract_embed_id(url).ok())
    }

    /// Title for logs and display, falling back to the slug
    pub fn label(&self) -> &str {
        if self.title.is_empty() {
            &self.slug
        } else {
            &self.title
        }
    }

    /// Page route of the content this item was picked from
    pub fn route(&self) -> String {
        format!("/{}/{}", self.content_type.route_prefix(), self.slug)
    }
}
