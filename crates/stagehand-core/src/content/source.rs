use std::path::Path;

use super::models::{sort_listing, ContentId, ContentItem};
use crate::Result;

/// External content collaborator (CMS-backed listing/detail service)
#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    /// Ordered listing of summaries, most recent first
    async fn list_items(&self) -> Result<Vec<ContentItem>>;

    /// A single record with its detail, or `None` when the id is unknown
    async fn get_item(&self, id: ContentId) -> Result<Option<ContentItem>>;
}

/// In-memory content source, optionally backed by a JSON file
#[derive(Debug, Clone, Default)]
pub struct StaticContentSource {
    items: Vec<ContentItem>,
}

impl StaticContentSource {
    pub fn new(mut items: Vec<ContentItem>) -> Self {
        sort_listing(&mut items);
        Self { items }
    }

    /// Load a JSON array of content records
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let items: Vec<ContentItem> = serde_json::from_str(&content)?;
        tracing::debug!(path = %path.display(), count = items.len(), "Loaded static content");
        Ok(Self::new(items))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait::async_trait]
impl ContentSource for StaticContentSource {
    async fn list_items(&self) -> Result<Vec<ContentItem>> {
        Ok(self.items.iter().map(ContentItem::summary).collect())
    }

    async fn get_item(&self, id: ContentId) -> Result<Option<ContentItem>> {
        Ok(self.items.iter().find(|item| item.id == id).cloned())
    }
}
