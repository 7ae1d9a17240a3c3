//! Core post data types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Status
// ============================================================================

/// Lifecycle status of a post.
///
/// `pending -> processing -> {completed | failed}`, `failed -> processing`.
/// `completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl PostStatus {
    /// Returns the status name used in APIs and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Pending => "pending",
            PostStatus::Processing => "processing",
            PostStatus::Completed => "completed",
            PostStatus::Failed => "failed",
        }
    }

    /// Whether the orchestrator may pick this post up.
    pub fn is_eligible(&self) -> bool {
        matches!(self, PostStatus::Pending | PostStatus::Failed)
    }

    /// Whether the operator may edit or delete a post in this status.
    pub fn is_editable(&self) -> bool {
        matches!(self, PostStatus::Pending | PostStatus::Failed)
    }

    /// Whether no automatic transition leaves this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PostStatus::Completed | PostStatus::Failed)
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PostStatus::Pending),
            "processing" => Ok(PostStatus::Processing),
            "completed" => Ok(PostStatus::Completed),
            "failed" => Ok(PostStatus::Failed),
            other => Err(format!("unknown post status: {}", other)),
        }
    }
}

// ============================================================================
// Media
// ============================================================================

/// Kind of media attached to a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    /// File extension used when the payload does not name one.
    pub fn default_extension(&self) -> &'static str {
        match self {
            MediaKind::Image => "jpg",
            MediaKind::Video => "mp4",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a media locator points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceKind {
    /// `data:<mime>;base64,<payload>` carried inline.
    InlineEncoded,
    /// A file path, possibly under the uploads URL prefix.
    StagedPath,
    /// An `http(s)://` URL handed to the worker unchanged.
    RemoteUrl,
}

impl SourceKind {
    /// Classify a raw locator string.
    pub fn classify(locator: &str) -> Self {
        if locator.starts_with("data:") {
            SourceKind::InlineEncoded
        } else if locator.starts_with("http://") || locator.starts_with("https://") {
            SourceKind::RemoteUrl
        } else {
            SourceKind::StagedPath
        }
    }
}

/// A media item attached to a post. Immutable once attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRef {
    pub kind: MediaKind,
    pub source_kind: SourceKind,
    pub locator: String,
}

impl MediaRef {
    /// Create a media ref, classifying the locator.
    pub fn new(kind: MediaKind, locator: impl Into<String>) -> Self {
        let locator = locator.into();
        Self {
            kind,
            source_kind: SourceKind::classify(&locator),
            locator,
        }
    }

    pub fn image(locator: impl Into<String>) -> Self {
        Self::new(MediaKind::Image, locator)
    }

    pub fn video(locator: impl Into<String>) -> Self {
        Self::new(MediaKind::Video, locator)
    }
}

/// Media as submitted by the operator: a bare locator, or an object carrying
/// `url` or `data`. Resolved once into a [`MediaRef`] at ingestion.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MediaDescriptor {
    Locator(String),
    Url { url: String },
    Data { data: String },
}

impl MediaDescriptor {
    pub fn into_media_ref(self, kind: MediaKind) -> MediaRef {
        match self {
            MediaDescriptor::Locator(locator) | MediaDescriptor::Url { url: locator } => {
                MediaRef::new(kind, locator)
            }
            MediaDescriptor::Data { data } => MediaRef {
                kind,
                source_kind: SourceKind::InlineEncoded,
                locator: data,
            },
        }
    }
}

// ============================================================================
// Post
// ============================================================================

/// A single post job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub content: String,
    /// Reference into the external account directory.
    pub account_ref: String,
    #[serde(default)]
    pub media: Vec<MediaRef>,
    pub status: PostStatus,
    /// Message of the most recent failed attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn images(&self) -> impl Iterator<Item = &MediaRef> {
        self.media.iter().filter(|m| m.kind == MediaKind::Image)
    }

    pub fn videos(&self) -> impl Iterator<Item = &MediaRef> {
        self.media.iter().filter(|m| m.kind == MediaKind::Video)
    }
}

/// Request to add a post to the queue.
#[derive(Debug, Clone, Default)]
pub struct CreatePostRequest {
    pub content: String,
    pub account_ref: String,
    pub media: Vec<MediaRef>,
}

/// Partial update of an editable post. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdatePostRequest {
    pub content: Option<String>,
    pub account_ref: Option<String>,
    pub media: Option<Vec<MediaRef>>,
}

/// Number of posts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
}
