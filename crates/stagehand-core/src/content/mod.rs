mod http;
pub mod loader;
mod models;
mod source;

pub use http::HttpContentSource;
pub use loader::{ContentLoader, DetailState, ListState, LoadEvent, RequestOutcome};
pub use models::{sort_listing, ContentDetail, ContentId, ContentItem};
pub use source::{ContentSource, StaticContentSource};

use std::sync::Arc;

use crate::config::{AppConfig, ContentSourceKind};
use crate::{Error, Result};

/// Build the content source selected in the configuration
pub fn source_from_config(config: &AppConfig) -> Result<Arc<dyn ContentSource>> {
    match config.content.source {
        ContentSourceKind::Static => {
            let path = config
                .content_path()
                .ok_or_else(|| Error::Config("content.path is not set".to_string()))?;
            Ok(Arc::new(StaticContentSource::from_json_file(&path)?))
        }
        ContentSourceKind::Http => Ok(Arc::new(HttpContentSource::from_config(config)?)),
    }
}
