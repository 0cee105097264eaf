//! Capability source abstraction.
//!
//! The graph builder talks to whatever serves capability documents through
//! [`CapabilityFetcher`]; production code plugs in an HTTP client, tests plug
//! in a static map. Implementations own their transport details (base URLs,
//! auth, timeouts) and surface failures through [`FetchError`].

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by a capability source.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Translation dictionary category on the template service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateCategory {
    Device,
    Service,
    Property,
    Event,
    Action,
    PropertyValue,
}

impl TemplateCategory {
    /// All categories, in refresh order.
    pub const ALL: [TemplateCategory; 6] = [
        Self::Device,
        Self::Service,
        Self::Property,
        Self::Event,
        Self::Action,
        Self::PropertyValue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Device => "device",
            Self::Service => "service",
            Self::Property => "property",
            Self::Event => "event",
            Self::Action => "action",
            Self::PropertyValue => "property-value",
        }
    }
}

impl std::fmt::Display for TemplateCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Dictionary shape served per category: type prefix → language → text.
pub type TemplateDictionary = HashMap<String, HashMap<String, String>>;

/// Source of capability documents and translation dictionaries.
#[async_trait]
pub trait CapabilityFetcher: Send + Sync {
    /// Fetch the raw capability document for a versioned identifier URN.
    async fn fetch_instance(&self, identifier: &str) -> Result<serde_json::Value, FetchError>;

    /// Fetch one standard-library translation dictionary. The extended list
    /// carries community-maintained entries layered over the base list.
    async fn fetch_template_list(
        &self,
        category: TemplateCategory,
        extended: bool,
    ) -> Result<TemplateDictionary, FetchError>;

    /// Fetch per-instance cloud translations, keyed by language then by
    /// compact node path.
    async fn fetch_instance_translations(
        &self,
        identifier: &str,
    ) -> Result<serde_json::Value, FetchError>;
}
