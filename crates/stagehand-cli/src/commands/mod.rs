pub mod config;
pub mod list;
pub mod replay;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use stagehand_core::content::{source_from_config, StaticContentSource};
use stagehand_core::{AppConfig, ContentSource};

/// The `--content` file when given, otherwise the configured source
pub fn content_source(config: &AppConfig, content: Option<&Path>) -> Result<Arc<dyn ContentSource>> {
    match content {
        Some(path) => {
            let source = StaticContentSource::from_json_file(path)?;
            if source.is_empty() {
                tracing::warn!(path = %path.display(), "Content file has no records");
            }
            Ok(Arc::new(source))
        }
        None => Ok(source_from_config(config)?),
    }
}
