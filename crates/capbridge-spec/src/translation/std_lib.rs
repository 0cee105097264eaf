//! Standard-library translation dictionaries.
//!
//! The vendor vocabulary ships generic names for every standard type
//! ("Temperature", "Indicator Light", …) in many languages, served per
//! category by the template endpoint. The merged dictionaries are persisted
//! as one cache blob `{ time, data }` and considered fresh for two weeks;
//! inside that window startup never touches the network.

use std::collections::HashMap;

use capbridge_core::cache::SpecCache;
use capbridge_core::fetch::{
    CapabilityFetcher, FetchError, TemplateCategory, TemplateDictionary,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

const CACHE_DOMAIN: &str = "std_lib";
const CACHE_NAME: &str = "dictionaries";
const TTL_SECONDS: i64 = 14 * 24 * 3600;
const FALLBACK_LANG: &str = "en";

/// Cached, periodically refreshed translation dictionaries.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SpecStdLib {
    /// Category name → dictionary key → language → text.
    #[serde(default)]
    data: HashMap<String, TemplateDictionary>,
    /// Unix seconds of the last successful refresh; 0 = never.
    #[serde(default)]
    time: i64,
}

impl SpecStdLib {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fresh(&self, now: i64) -> bool {
        self.time > 0 && now - self.time < TTL_SECONDS
    }

    pub fn is_empty(&self) -> bool {
        self.data.values().all(|dict| dict.is_empty())
    }

    /// Generic translation for a dictionary key, with English fallback.
    pub fn translate(&self, category: TemplateCategory, key: &str, lang: &str) -> Option<String> {
        let languages = self.data.get(category.as_str())?.get(key)?;
        languages
            .get(lang)
            .or_else(|| languages.get(FALLBACK_LANG))
            .filter(|text| !text.is_empty())
            .cloned()
    }

    /// Compound key used by the property-value dictionary: the property's
    /// type prefix joined with the enumeration item's machine name.
    pub fn value_key(property_prefix: &str, value_name: &str) -> String {
        format!("{}|{}", property_prefix, value_name)
    }

    /// Fetch all six categories, base list first, extended list merged on
    /// top (extended wins per language). Any failed fetch aborts the refresh
    /// and leaves `self` untouched.
    pub async fn refresh(&mut self, fetcher: &dyn CapabilityFetcher) -> Result<(), FetchError> {
        let mut data = HashMap::new();
        for category in TemplateCategory::ALL {
            let mut dictionary = fetcher.fetch_template_list(category, false).await?;
            let extended = fetcher.fetch_template_list(category, true).await?;
            for (key, languages) in extended {
                dictionary.entry(key).or_default().extend(languages);
            }
            data.insert(category.as_str().to_string(), dictionary);
        }
        self.data = data;
        self.time = Utc::now().timestamp();
        Ok(())
    }

    /// Load the persisted blob; corrupt blobs count as absent.
    pub async fn load_cached(cache: &dyn SpecCache) -> Option<SpecStdLib> {
        let blob = match cache.get(CACHE_DOMAIN, CACHE_NAME).await {
            Ok(blob) => blob?,
            Err(error) => {
                tracing::warn!(%error, "standard library cache read failed");
                return None;
            }
        };
        match serde_json::from_value(blob) {
            Ok(lib) => Some(lib),
            Err(error) => {
                tracing::warn!(%error, "cached standard library is corrupt, ignoring");
                None
            }
        }
    }

    /// Persist the blob; failures are logged, never fatal.
    pub async fn persist(&self, cache: &dyn SpecCache) {
        match serde_json::to_value(self) {
            Ok(blob) => {
                if let Err(error) = cache.put(CACHE_DOMAIN, CACHE_NAME, &blob).await {
                    tracing::warn!(%error, "failed to persist standard library");
                }
            }
            Err(error) => tracing::warn!(%error, "failed to encode standard library"),
        }
    }

    /// Cache-first initialization.
    ///
    /// A fresh cached blob is used as-is with zero network calls. An expired
    /// or missing blob triggers a refresh; when the network fails the stale
    /// blob (or an empty library) keeps the pipeline usable.
    pub async fn init(fetcher: &dyn CapabilityFetcher, cache: &dyn SpecCache) -> SpecStdLib {
        let cached = Self::load_cached(cache).await;
        let now = Utc::now().timestamp();
        if let Some(lib) = &cached {
            if lib.is_fresh(now) {
                tracing::debug!("standard library cache is fresh, skipping refresh");
                return cached.unwrap_or_default();
            }
        }

        let mut fresh = SpecStdLib::new();
        match fresh.refresh(fetcher).await {
            Ok(()) => {
                fresh.persist(cache).await;
                tracing::info!("standard library refreshed from network");
                fresh
            }
            Err(error) => {
                tracing::warn!(%error, "standard library refresh failed, using last known data");
                cached.unwrap_or_default()
            }
        }
    }
}
