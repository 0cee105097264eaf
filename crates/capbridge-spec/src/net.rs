//! HTTP reference implementation of the capability fetcher.

use std::time::Duration;

use async_trait::async_trait;
use capbridge_core::fetch::{
    CapabilityFetcher, FetchError, TemplateCategory, TemplateDictionary,
};

/// Configuration for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct HttpFetcherConfig {
    /// Base URL serving capability documents.
    pub instance_base_url: String,
    /// Base URL serving translation dictionaries.
    pub template_base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        Self {
            instance_base_url: "https://spec.cap-bridge.net/cap-spec-v2".to_string(),
            template_base_url: "https://spec.cap-bridge.net/template".to_string(),
            timeout: Duration::from_secs(15),
        }
    }
}

impl HttpFetcherConfig {
    pub fn with_instance_base_url(mut self, url: impl Into<String>) -> Self {
        self.instance_base_url = url.into();
        self
    }

    pub fn with_template_base_url(mut self, url: impl Into<String>) -> Self {
        self.template_base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// reqwest-backed capability fetcher.
pub struct HttpFetcher {
    config: HttpFetcherConfig,
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: HttpFetcherConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|error| FetchError::Request(error.to_string()))?;
        Ok(Self { config, client })
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|error| FetchError::Request(error.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let text = response
            .text()
            .await
            .map_err(|error| FetchError::Request(error.to_string()))?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl CapabilityFetcher for HttpFetcher {
    async fn fetch_instance(&self, identifier: &str) -> Result<serde_json::Value, FetchError> {
        let url = format!(
            "{}/instance?type={}",
            self.config.instance_base_url, identifier
        );
        tracing::debug!(%identifier, "fetching capability document");
        self.get_json(&url).await
    }

    async fn fetch_template_list(
        &self,
        category: TemplateCategory,
        extended: bool,
    ) -> Result<TemplateDictionary, FetchError> {
        let url = format!(
            "{}/list?category={}&extended={}",
            self.config.template_base_url, category, extended
        );
        tracing::debug!(%category, extended, "fetching template dictionary");
        let value = self.get_json(&url).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn fetch_instance_translations(
        &self,
        identifier: &str,
    ) -> Result<serde_json::Value, FetchError> {
        let url = format!(
            "{}/translations?type={}",
            self.config.template_base_url, identifier
        );
        tracing::debug!(%identifier, "fetching instance translations");
        self.get_json(&url).await
    }
}
