//! Dish image retrieval from the remote file store.

use async_trait::async_trait;
use tracing::debug;

use crate::errors::{BotError, BotResult};

/// Source of dish images addressed by catalog reference
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn fetch(&self, reference: &str) -> BotResult<Vec<u8>>;
}

/// Downloads images over HTTP, resolving references against a base URL
#[derive(Clone, Debug)]
pub struct HttpImageStore {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl HttpImageStore {
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Absolute URL for a catalog image reference
    pub fn resolve(&self, reference: &str) -> BotResult<String> {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            return Ok(reference.to_string());
        }

        match &self.base_url {
            Some(base) => Ok(format!(
                "{}/{}",
                base.trim_end_matches('/'),
                reference.trim_start_matches('/')
            )),
            None => Err(BotError::Image(format!(
                "Relative image reference '{reference}' without IMAGE_BASE_URL"
            ))),
        }
    }
}

#[async_trait]
impl ImageStore for HttpImageStore {
    async fn fetch(&self, reference: &str) -> BotResult<Vec<u8>> {
        let url = self.resolve(reference)?;
        debug!(url = %url, "Downloading dish image");

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;

        debug!(url = %url, size = bytes.len(), "Dish image downloaded");
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_reference() {
        let store = HttpImageStore::new(Some("https://cdn.example.com/menu/".to_string()));
        assert_eq!(
            store.resolve("/drinks/lemonade.jpg").unwrap(),
            "https://cdn.example.com/menu/drinks/lemonade.jpg"
        );
    }

    #[test]
    fn test_resolve_absolute_reference() {
        let store = HttpImageStore::new(None);
        assert_eq!(
            store.resolve("https://img.example.com/a.png").unwrap(),
            "https://img.example.com/a.png"
        );
    }

    #[test]
    fn test_resolve_relative_without_base_fails() {
        let store = HttpImageStore::new(None);
        assert!(matches!(
            store.resolve("lemonade.jpg"),
            Err(BotError::Image(_))
        ));
    }
}
