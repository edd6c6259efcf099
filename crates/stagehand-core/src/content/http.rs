use std::time::Duration;

use reqwest::{Client, StatusCode};
use url::Url;

use super::models::{sort_listing, ContentId, ContentItem};
use super::source::ContentSource;
use crate::config::AppConfig;
use crate::{Error, Result};

/// Content source backed by the CMS JSON API
///
/// `GET {base}/items` returns the listing, `GET {base}/items/{id}` a single
/// record with its detail. Retry and caching policy belong to the service.
pub struct HttpContentSource {
    client: Client,
    base_url: Url,
}

impl HttpContentSource {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        // A trailing slash keeps `join` from replacing the last path segment
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }

        Ok(Self {
            client,
            base_url: Url::parse(&base)?,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let base_url = config
            .content
            .base_url
            .as_deref()
            .ok_or_else(|| Error::Config("content.base_url is not set".to_string()))?;
        Self::new(base_url, config.content.request_timeout_secs)
    }

    fn items_url(&self) -> Result<Url> {
        Ok(self.base_url.join("items")?)
    }

    fn item_url(&self, id: ContentId) -> Result<Url> {
        Ok(self.base_url.join(&format!("items/{}", id))?)
    }
}

#[async_trait::async_trait]
impl ContentSource for HttpContentSource {
    async fn list_items(&self) -> Result<Vec<ContentItem>> {
        let url = self.items_url()?;
        tracing::debug!(url = %url, "Fetching content listing");

        let mut items: Vec<ContentItem> = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        sort_listing(&mut items);
        Ok(items)
    }

    async fn get_item(&self, id: ContentId) -> Result<Option<ContentItem>> {
        let url = self.item_url(id)?;
        tracing::debug!(url = %url, id = %id, "Fetching content detail");

        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let item = response.error_for_status()?.json().await?;
        Ok(Some(item))
    }
}
