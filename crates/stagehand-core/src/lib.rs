pub mod config;
pub mod content;
pub mod error;

pub use config::{AppConfig, EasingType};
pub use content::{ContentDetail, ContentId, ContentItem, ContentLoader, ContentSource};
pub use error::{Error, Result};
