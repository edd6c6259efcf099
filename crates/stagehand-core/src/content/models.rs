use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Business identifier of a content record (the issue number)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(pub u32);

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ContentId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// A content record as supplied by the content service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ContentId,
    /// Dense, unique ordering key; listings are sorted by it descending
    pub number: u32,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// Loaded lazily; absent in listings
    #[serde(default)]
    pub detail: Option<ContentDetail>,
}

/// Full body of a content record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentDetail {
    pub body: String,
    #[serde(default)]
    pub contributors: Vec<String>,
}

impl ContentItem {
    /// Copy of this record without its detail
    pub fn summary(&self) -> Self {
        Self {
            detail: None,
            ..self.clone()
        }
    }

    pub fn has_detail(&self) -> bool {
        self.detail.is_some()
    }
}

/// Order a listing most recent first
pub fn sort_listing(items: &mut [ContentItem]) {
    items.sort_by(|a, b| b.number.cmp(&a.number));
}
