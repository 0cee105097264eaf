//! Durability tests for the redb-backed spec cache: round-trips, reopen
//! behavior and an offline parse served entirely from disk.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use capbridge_core::cache::SpecCache;
use capbridge_core::fetch::{CapabilityFetcher, FetchError, TemplateCategory, TemplateDictionary};
use capbridge_spec::{OverlayStack, SpecParser};
use capbridge_storage::RedbCache;
use serde_json::{json, Value};

const HEATER: &str = "urn:cap-spec-v2:device:heater:0000A01A:acme-h1:1";

fn heater_doc() -> Value {
    json!({
        "type": HEATER,
        "description": "Space Heater",
        "services": [
            {
                "iid": 2,
                "type": "urn:cap-spec-v2:service:heater:0000783E:acme-h1:1",
                "description": "Heater",
                "properties": [
                    {
                        "iid": 1,
                        "type": "urn:cap-spec-v2:property:on:00000006:acme-h1:1",
                        "description": "Switch Status",
                        "format": "bool",
                        "access": ["read", "write", "notify"]
                    },
                    {
                        "iid": 2,
                        "type": "urn:cap-spec-v2:property:target-temperature:00000021:acme-h1:1",
                        "description": "Target Temperature",
                        "format": "float",
                        "access": ["read", "write", "notify"],
                        "unit": "celsius",
                        "value-range": [18, 28, 0.5]
                    }
                ]
            }
        ]
    })
}

/// Serves one canned document; `None` means every call fails.
struct CannedFetcher {
    doc: Option<Value>,
}

#[async_trait]
impl CapabilityFetcher for CannedFetcher {
    async fn fetch_instance(&self, _identifier: &str) -> Result<Value, FetchError> {
        match &self.doc {
            Some(doc) => Ok(doc.clone()),
            None => Err(FetchError::Status(503)),
        }
    }

    async fn fetch_template_list(
        &self,
        _category: TemplateCategory,
        _extended: bool,
    ) -> Result<TemplateDictionary, FetchError> {
        Ok(HashMap::new())
    }

    async fn fetch_instance_translations(&self, _identifier: &str) -> Result<Value, FetchError> {
        Ok(json!({}))
    }
}

#[tokio::test]
async fn test_round_trip_reports_the_replace_flag() {
    let dir = tempfile::tempdir().unwrap();
    let cache = RedbCache::open(dir.path().join("cache.redb")).unwrap();

    assert!(cache.get("spec_graphs", "en_acme").await.unwrap().is_none());

    let replaced = cache
        .put("spec_graphs", "en_acme", &json!({"services": [{"iid": 2}]}))
        .await
        .unwrap();
    assert!(!replaced);

    let loaded = cache.get("spec_graphs", "en_acme").await.unwrap().unwrap();
    assert_eq!(loaded["services"][0]["iid"], 2);

    let replaced = cache
        .put("spec_graphs", "en_acme", &json!({"services": []}))
        .await
        .unwrap();
    assert!(replaced);
}

#[tokio::test]
async fn test_domains_do_not_collide() {
    let cache = RedbCache::memory().unwrap();
    cache
        .put("std_lib", "dictionaries", &json!({"time": 1}))
        .await
        .unwrap();
    cache
        .put("spec_graphs", "dictionaries", &json!({"services": []}))
        .await
        .unwrap();

    assert_eq!(
        cache.get("std_lib", "dictionaries").await.unwrap(),
        Some(json!({"time": 1}))
    );
    assert_eq!(
        cache.get("spec_graphs", "dictionaries").await.unwrap(),
        Some(json!({"services": []}))
    );
}

#[tokio::test]
async fn test_entries_survive_a_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.redb");

    {
        let cache = RedbCache::open(&path).unwrap();
        cache
            .put("spec_graphs", "en_acme", &json!({"name": "heater"}))
            .await
            .unwrap();
    }

    let cache = RedbCache::open(&path).unwrap();
    assert_eq!(
        cache.get("spec_graphs", "en_acme").await.unwrap(),
        Some(json!({"name": "heater"}))
    );
}

#[tokio::test]
async fn test_parent_directories_are_created() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("deep").join("cache.redb");

    let cache = RedbCache::open(&path).unwrap();
    cache.put("spec_graphs", "en_x", &json!(1)).await.unwrap();

    assert!(path.exists());
    assert!(cache.is_persistent());
}

#[tokio::test]
async fn test_offline_parse_is_served_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.redb");

    // First run: online, graph lands in the database.
    {
        let cache = Arc::new(RedbCache::open(&path).unwrap());
        let fetcher = Arc::new(CannedFetcher {
            doc: Some(heater_doc()),
        });
        let parser = SpecParser::new("en", fetcher, cache, Arc::new(OverlayStack::empty()));
        let instance = parser.parse(HEATER, false).await.unwrap();
        assert_eq!(instance.services.len(), 1);
    }

    // Second run: fresh parser, reopened database, upstream down.
    let cache = Arc::new(RedbCache::open(&path).unwrap());
    let fetcher = Arc::new(CannedFetcher { doc: None });
    let parser = SpecParser::new("en", fetcher, cache, Arc::new(OverlayStack::empty()));

    let instance = parser.parse(HEATER, false).await.unwrap();
    assert_eq!(instance.identifier, HEATER);

    let heater = instance.service_by_name("heater").unwrap();
    assert!(heater.property_by_name("target-temperature").is_some());
}
