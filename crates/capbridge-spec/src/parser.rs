//! Capability specification parser.
//!
//! `SpecParser` turns a raw capability document into the canonical typed
//! graph, cache-first:
//!
//! ```text
//! cache ──hit──────────────────────────────► SpecInstance
//!   │ miss
//!   ▼
//! fetch ──► overlay (add/filter/modify) ──► translate ──► SpecInstance
//!   │ 3 failures                                             │
//!   ▼                                                        ▼
//! stale cache ──► SpecInstance            persisted as "<lang>_<identifier>"
//! ```
//!
//! Per-node problems (missing fields, dangling references) skip the node and
//! keep its siblings; only an unusable document or an unreachable network
//! without a cached copy fails the identifier.

use std::collections::HashSet;
use std::sync::Arc;

use capbridge_core::cache::SpecCache;
use capbridge_core::fetch::{CapabilityFetcher, TemplateCategory};
use capbridge_core::node::{
    NodeHandle, SpecAccess, SpecAction, SpecEvent, SpecFormat, SpecInstance, SpecProperty,
    SpecService, SpecValueList,
};
use capbridge_core::urn;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::SpecError;
use crate::overlay::modify;
use crate::overlay::{FilterView, ModifyView, OverlayStack};
use crate::translation::multi_lang::{
    action_tag, event_tag, property_tag, service_tag, value_tag,
};
use crate::translation::std_lib::SpecStdLib;
use crate::translation::TranslationTable;
use crate::wire;

const CACHE_DOMAIN: &str = "spec_graphs";
const BUILD_RETRIES: usize = 3;
const REFRESH_BATCH: usize = 5;

/// Cache-first builder of canonical capability graphs.
pub struct SpecParser {
    lang: String,
    fetcher: Arc<dyn CapabilityFetcher>,
    cache: Arc<dyn SpecCache>,
    overlays: Arc<OverlayStack>,
    initialized: Mutex<bool>,
}

/// Per-parse working state: overlay views and the handle counter.
struct ParseContext<'a> {
    trans: &'a TranslationTable,
    std_lib: &'a SpecStdLib,
    filter: FilterView,
    modify: ModifyView,
    next_handle: u32,
}

impl ParseContext<'_> {
    fn alloc(&mut self) -> NodeHandle {
        self.next_handle += 1;
        NodeHandle(self.next_handle)
    }
}

impl SpecParser {
    pub fn new(
        lang: impl Into<String>,
        fetcher: Arc<dyn CapabilityFetcher>,
        cache: Arc<dyn SpecCache>,
        overlays: Arc<OverlayStack>,
    ) -> Self {
        Self {
            lang: lang.into(),
            fetcher,
            cache,
            overlays,
            initialized: Mutex::new(false),
        }
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    /// One-shot initialization: refresh the standard-library dictionaries
    /// (cache-first). Idempotent and safe to call from multiple sites; later
    /// calls return immediately. Never fails: network problems degrade to
    /// the last cached dictionaries or to empty ones.
    pub async fn init(&self) {
        let mut done = self.initialized.lock().await;
        if *done {
            return;
        }
        let lib = SpecStdLib::init(self.fetcher.as_ref(), self.cache.as_ref()).await;
        *self.overlays.std_lib.write().await = lib;
        *done = true;
    }

    /// Parse one identifier into its canonical graph.
    ///
    /// Unless `skip_cache` is set, a cached graph short-circuits all network
    /// and overlay work (apart from re-applied metadata patches). A network
    /// build is attempted up to 3 times; on exhaustion the last-good cached
    /// graph is used even under `skip_cache`, and only when that is absent
    /// too does the identifier fail.
    pub async fn parse(
        &self,
        identifier: &str,
        skip_cache: bool,
    ) -> Result<SpecInstance, SpecError> {
        if !skip_cache {
            if let Some(instance) = self.load_cached(identifier).await {
                return Ok(instance);
            }
        }

        for attempt in 1..=BUILD_RETRIES {
            match self.build(identifier).await {
                Ok(instance) => {
                    self.persist(identifier, &instance).await;
                    tracing::info!(
                        %identifier,
                        services = instance.services.len(),
                        nodes = instance.node_count(),
                        "capability specification parsed"
                    );
                    return Ok(instance);
                }
                Err(error) => {
                    tracing::warn!(%identifier, attempt, %error, "specification build failed");
                }
            }
        }

        if let Some(instance) = self.load_cached(identifier).await {
            tracing::warn!(%identifier, "network exhausted, using cached specification");
            return Ok(instance);
        }
        Err(SpecError::Unavailable(identifier.to_string()))
    }

    /// Rebuild many identifiers, bypassing the cache, in concurrent groups
    /// of 5. Returns how many succeeded; individual failures are logged and
    /// do not abort the batch.
    pub async fn refresh(&self, identifiers: &[String]) -> usize {
        let mut succeeded = 0;
        for chunk in identifiers.chunks(REFRESH_BATCH) {
            let builds = chunk.iter().map(|identifier| self.parse(identifier, true));
            for (identifier, result) in chunk.iter().zip(futures::future::join_all(builds).await) {
                match result {
                    Ok(_) => succeeded += 1,
                    Err(error) => {
                        tracing::warn!(%identifier, %error, "refresh failed for identifier");
                    }
                }
            }
        }
        tracing::info!(
            total = identifiers.len(),
            succeeded,
            "specification refresh finished"
        );
        succeeded
    }

    fn cache_name(&self, identifier: &str) -> String {
        format!("{}_{}", self.lang, identifier)
    }

    async fn load_cached(&self, identifier: &str) -> Option<SpecInstance> {
        let blob = match self.cache.get(CACHE_DOMAIN, &self.cache_name(identifier)).await {
            Ok(blob) => blob?,
            Err(error) => {
                tracing::warn!(%identifier, %error, "specification cache read failed");
                return None;
            }
        };
        let mut instance: SpecInstance = match serde_json::from_value(blob) {
            Ok(instance) => instance,
            Err(error) => {
                tracing::warn!(%identifier, %error, "cached specification is corrupt, rebuilding");
                return None;
            }
        };

        // Metadata corrections shipped after the graph was cached still
        // apply without a refetch.
        let patches = self.overlays.modify.select(identifier);
        if !patches.is_empty() {
            for service in &mut instance.services {
                for property in &mut service.properties {
                    if let Some(patch) = patches.patch_for(service.iid, property.iid) {
                        modify::reapply_metadata(property, patch);
                    }
                }
            }
        }
        tracing::debug!(%identifier, "loaded specification from cache");
        Some(instance)
    }

    async fn persist(&self, identifier: &str, instance: &SpecInstance) {
        match serde_json::to_value(instance) {
            Ok(blob) => {
                if let Err(error) = self
                    .cache
                    .put(CACHE_DOMAIN, &self.cache_name(identifier), &blob)
                    .await
                {
                    tracing::warn!(%identifier, %error, "failed to cache parsed specification");
                }
            }
            Err(error) => {
                tracing::warn!(%identifier, %error, "failed to encode parsed specification");
            }
        }
    }

    async fn build(&self, identifier: &str) -> Result<SpecInstance, SpecError> {
        let document = self.fetcher.fetch_instance(identifier).await?;

        let cloud = match self.fetcher.fetch_instance_translations(identifier).await {
            Ok(raw) => raw,
            Err(error) => {
                tracing::debug!(%identifier, %error, "no cloud translations available");
                Value::Null
            }
        };
        let mut trans = TranslationTable::from_cloud(&cloud, &self.lang);
        trans.apply_override(
            self.overlays
                .local_override
                .table_for(identifier, &self.lang),
        );

        let std_lib = self.overlays.std_lib.read().await;
        self.build_graph(identifier, &document, &trans, &std_lib)
    }

    /// Structural parse of a raw document into the typed graph.
    fn build_graph(
        &self,
        identifier: &str,
        document: &Value,
        trans: &TranslationTable,
        std_lib: &SpecStdLib,
    ) -> Result<SpecInstance, SpecError> {
        let root = document
            .as_object()
            .ok_or_else(|| SpecError::malformed(identifier, "document is not an object"))?;
        root.get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| SpecError::malformed(identifier, "missing type"))?;
        let raw_description = root
            .get("description")
            .and_then(Value::as_str)
            .ok_or_else(|| SpecError::malformed(identifier, "missing description"))?;
        let raw_services = root
            .get("services")
            .and_then(Value::as_array)
            .ok_or_else(|| SpecError::malformed(identifier, "missing services"))?;

        let mut service_values = raw_services.clone();
        service_values.extend(self.overlays.add.services_for(identifier));

        let description = urn::type_prefix(identifier)
            .and_then(|prefix| std_lib.translate(TemplateCategory::Device, prefix, &self.lang))
            .or_else(|| (!raw_description.is_empty()).then(|| raw_description.to_string()))
            .unwrap_or_else(|| urn::name(identifier).to_string());

        let mut ctx = ParseContext {
            trans,
            std_lib,
            filter: self.overlays.filter.select(identifier),
            modify: self.overlays.modify.select(identifier),
            next_handle: 0,
        };

        let mut instance = SpecInstance::new(identifier, description);
        let mut seen_siids = HashSet::new();
        for raw_service in &service_values {
            if let Some(service) = self.parse_service(&mut ctx, raw_service, &mut seen_siids) {
                instance.services.push(service);
            }
        }
        tracing::debug!(
            %identifier,
            services = instance.services.len(),
            nodes = instance.node_count(),
            "built capability graph"
        );
        Ok(instance)
    }

    fn parse_service(
        &self,
        ctx: &mut ParseContext<'_>,
        raw: &Value,
        seen: &mut HashSet<u32>,
    ) -> Option<SpecService> {
        let Some(obj) = raw.as_object() else {
            tracing::warn!("service entry is not an object, skipped");
            return None;
        };
        let Some(iid) = obj.get("iid").and_then(Value::as_u64) else {
            tracing::warn!("service without iid, skipped");
            return None;
        };
        let iid = iid as u32;
        let Some(urn_str) = obj.get("type").and_then(Value::as_str) else {
            tracing::warn!(siid = iid, "service without type, skipped");
            return None;
        };
        let Some(raw_description) = obj.get("description").and_then(Value::as_str) else {
            tracing::warn!(siid = iid, "service without description, skipped");
            return None;
        };
        if urn::name(urn_str) == "device-information" {
            tracing::debug!(siid = iid, "dropping device-information service");
            return None;
        }
        if !seen.insert(iid) {
            tracing::warn!(siid = iid, "duplicate service iid, later entry skipped");
            return None;
        }

        // The document's own flag wins over the filter table; injected
        // fragments arrive pre-stamped false.
        let filtered = obj
            .get("filter")
            .and_then(Value::as_bool)
            .unwrap_or_else(|| ctx.filter.filter_service(iid));

        let handle = ctx.alloc();
        let description = self.translate_node(
            ctx,
            &service_tag(iid),
            TemplateCategory::Service,
            urn_str,
            raw_description,
        );

        let mut properties: Vec<SpecProperty> = Vec::new();
        let mut seen_piids = HashSet::new();
        for raw_property in list_field(obj, "properties") {
            if let Some(property) = self.parse_property(ctx, iid, raw_property) {
                if seen_piids.insert(property.iid) {
                    properties.push(property);
                } else {
                    tracing::warn!(
                        siid = iid,
                        piid = property.iid,
                        "duplicate property iid, later entry skipped"
                    );
                }
            }
        }

        let mut events: Vec<SpecEvent> = Vec::new();
        let mut seen_eiids = HashSet::new();
        for raw_event in list_field(obj, "events") {
            if let Some(event) = self.parse_event(ctx, iid, raw_event, &properties) {
                if seen_eiids.insert(event.iid) {
                    events.push(event);
                } else {
                    tracing::warn!(
                        siid = iid,
                        eiid = event.iid,
                        "duplicate event iid, later entry skipped"
                    );
                }
            }
        }

        let mut actions: Vec<SpecAction> = Vec::new();
        let mut seen_aiids = HashSet::new();
        for raw_action in list_field(obj, "actions") {
            if let Some(action) = self.parse_action(ctx, iid, raw_action, &properties) {
                if seen_aiids.insert(action.iid) {
                    actions.push(action);
                } else {
                    tracing::warn!(
                        siid = iid,
                        aiid = action.iid,
                        "duplicate action iid, later entry skipped"
                    );
                }
            }
        }

        Some(SpecService {
            handle,
            iid,
            urn: urn_str.to_string(),
            name: urn::name(urn_str).to_string(),
            description,
            proprietary: urn::is_proprietary(urn_str),
            filtered,
            properties,
            events,
            actions,
        })
    }

    fn parse_property(
        &self,
        ctx: &mut ParseContext<'_>,
        siid: u32,
        raw: &Value,
    ) -> Option<SpecProperty> {
        let Some(obj) = raw.as_object() else {
            tracing::warn!(siid, "property entry is not an object, skipped");
            return None;
        };
        let Some(iid) = obj.get("iid").and_then(Value::as_u64) else {
            tracing::warn!(siid, "property without iid, skipped");
            return None;
        };
        let iid = iid as u32;
        let Some(urn_str) = obj.get("type").and_then(Value::as_str) else {
            tracing::warn!(siid, piid = iid, "property without type, skipped");
            return None;
        };
        let Some(raw_description) = obj.get("description").and_then(Value::as_str) else {
            tracing::warn!(siid, piid = iid, "property without description, skipped");
            return None;
        };
        if ctx.filter.filter_property(siid, iid) {
            tracing::debug!(siid, piid = iid, "property filtered out");
            return None;
        }

        let format = obj
            .get("format")
            .and_then(Value::as_str)
            .map(SpecFormat::from_wire)
            .unwrap_or_default();
        let modes: Vec<&str> = obj
            .get("access")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let access = SpecAccess::from_wire(&modes);
        let unit = obj.get("unit").and_then(Value::as_str).map(str::to_string);

        let value_range = obj.get("value-range").and_then(|raw_range| {
            let range = wire::parse_value_range(raw_range);
            if range.is_none() {
                tracing::warn!(siid, piid = iid, "unusable value-range, ignored");
            }
            range
        });

        let description = self.translate_node(
            ctx,
            &property_tag(siid, iid),
            TemplateCategory::Property,
            urn_str,
            raw_description,
        );

        let value_list = obj
            .get("value-list")
            .map(|raw_list| {
                let mut items = wire::parse_value_list_items(raw_list);
                for (index, item) in items.iter_mut().enumerate() {
                    if let Some(text) = ctx.trans.get(&value_tag(siid, iid, index)) {
                        item.description = text.to_string();
                    } else if let Some(prefix) = urn::type_prefix(urn_str) {
                        if let Some(text) = ctx.std_lib.translate(
                            TemplateCategory::PropertyValue,
                            &SpecStdLib::value_key(prefix, &item.name),
                            &self.lang,
                        ) {
                            item.description = text;
                        }
                    }
                    if item.description.is_empty() {
                        item.description = item.name.clone();
                    }
                }
                SpecValueList::from_items(items)
            })
            .filter(|list| !list.is_empty());

        let precision = value_range.as_ref().map(|r| r.precision).unwrap_or(0);

        let mut property = SpecProperty {
            handle: ctx.alloc(),
            iid,
            urn: urn_str.to_string(),
            name: urn::name(urn_str).to_string(),
            description,
            format,
            access,
            unit,
            value_range,
            value_list,
            expr: None,
            icon: None,
            precision,
        };

        // Patches win over everything parsed above.
        if let Some(patch) = ctx.modify.patch_for(siid, iid) {
            modify::apply_patch(&mut property, patch);
        }

        // Booleans without a declared list get the synthesized enumeration.
        if property.format == SpecFormat::Bool && property.value_list.is_none() {
            property.value_list = Some(
                self.overlays
                    .bool_trans
                    .value_list(&property.urn, &self.lang),
            );
        }

        Some(property)
    }

    fn parse_event(
        &self,
        ctx: &mut ParseContext<'_>,
        siid: u32,
        raw: &Value,
        properties: &[SpecProperty],
    ) -> Option<SpecEvent> {
        let Some(obj) = raw.as_object() else {
            tracing::warn!(siid, "event entry is not an object, skipped");
            return None;
        };
        let Some(iid) = obj.get("iid").and_then(Value::as_u64) else {
            tracing::warn!(siid, "event without iid, skipped");
            return None;
        };
        let iid = iid as u32;
        let Some(urn_str) = obj.get("type").and_then(Value::as_str) else {
            tracing::warn!(siid, eiid = iid, "event without type, skipped");
            return None;
        };
        let Some(raw_description) = obj.get("description").and_then(Value::as_str) else {
            tracing::warn!(siid, eiid = iid, "event without description, skipped");
            return None;
        };
        if ctx.filter.filter_event(siid, iid) {
            tracing::debug!(siid, eiid = iid, "event filtered out");
            return None;
        }

        let description = self.translate_node(
            ctx,
            &event_tag(siid, iid),
            TemplateCategory::Event,
            urn_str,
            raw_description,
        );
        let arguments = resolve_references(obj, "arguments", siid, iid, properties);

        Some(SpecEvent {
            handle: ctx.alloc(),
            iid,
            urn: urn_str.to_string(),
            name: urn::name(urn_str).to_string(),
            description,
            arguments,
        })
    }

    fn parse_action(
        &self,
        ctx: &mut ParseContext<'_>,
        siid: u32,
        raw: &Value,
        properties: &[SpecProperty],
    ) -> Option<SpecAction> {
        let Some(obj) = raw.as_object() else {
            tracing::warn!(siid, "action entry is not an object, skipped");
            return None;
        };
        let Some(iid) = obj.get("iid").and_then(Value::as_u64) else {
            tracing::warn!(siid, "action without iid, skipped");
            return None;
        };
        let iid = iid as u32;
        let Some(urn_str) = obj.get("type").and_then(Value::as_str) else {
            tracing::warn!(siid, aiid = iid, "action without type, skipped");
            return None;
        };
        let Some(raw_description) = obj.get("description").and_then(Value::as_str) else {
            tracing::warn!(siid, aiid = iid, "action without description, skipped");
            return None;
        };
        if ctx.filter.filter_action(siid, iid) {
            tracing::debug!(siid, aiid = iid, "action filtered out");
            return None;
        }

        let description = self.translate_node(
            ctx,
            &action_tag(siid, iid),
            TemplateCategory::Action,
            urn_str,
            raw_description,
        );
        let input = resolve_references(obj, "in", siid, iid, properties);
        let output = resolve_references(obj, "out", siid, iid, properties);

        Some(SpecAction {
            handle: ctx.alloc(),
            iid,
            urn: urn_str.to_string(),
            name: urn::name(urn_str).to_string(),
            description,
            input,
            output,
        })
    }

    /// Translation chain: per-instance table (override already merged on
    /// top of cloud), standard library by type prefix, raw description,
    /// machine name.
    fn translate_node(
        &self,
        ctx: &ParseContext<'_>,
        tag: &str,
        category: TemplateCategory,
        urn_str: &str,
        raw_description: &str,
    ) -> String {
        ctx.trans
            .get(tag)
            .map(str::to_string)
            .or_else(|| {
                urn::type_prefix(urn_str)
                    .and_then(|prefix| ctx.std_lib.translate(category, prefix, &self.lang))
            })
            .or_else(|| (!raw_description.is_empty()).then(|| raw_description.to_string()))
            .unwrap_or_else(|| urn::name(urn_str).to_string())
    }
}

fn list_field<'a>(
    obj: &'a serde_json::Map<String, Value>,
    key: &str,
) -> impl Iterator<Item = &'a Value> {
    obj.get(key).and_then(Value::as_array).into_iter().flatten()
}

/// Resolve a list of referenced property iids to handles within the owning
/// service; dangling references are skipped with a warning.
fn resolve_references(
    obj: &serde_json::Map<String, Value>,
    key: &str,
    siid: u32,
    iid: u32,
    properties: &[SpecProperty],
) -> Vec<NodeHandle> {
    let mut handles = Vec::new();
    for entry in obj.get(key).and_then(Value::as_array).into_iter().flatten() {
        let Some(piid) = entry.as_u64() else {
            tracing::warn!(siid, iid, "non-numeric property reference, skipped");
            continue;
        };
        match properties.iter().find(|p| p.iid == piid as u32) {
            Some(property) => handles.push(property.handle),
            None => {
                tracing::warn!(siid, iid, piid, "reference to unknown property, skipped");
            }
        }
    }
    handles
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use capbridge_core::cache::MemoryCache;
    use capbridge_core::fetch::{FetchError, TemplateDictionary};
    use capbridge_core::value::SpecValue;
    use serde_json::json;

    use crate::overlay::{SpecAdd, SpecFilter, SpecModify};

    const AC: &str = "urn:cap-spec-v2:device:air-conditioner:0000A004:acme-mc5:1";

    struct NullFetcher;

    #[async_trait]
    impl CapabilityFetcher for NullFetcher {
        async fn fetch_instance(&self, _identifier: &str) -> Result<Value, FetchError> {
            Err(FetchError::Request("offline".into()))
        }

        async fn fetch_template_list(
            &self,
            _category: TemplateCategory,
            _extended: bool,
        ) -> Result<TemplateDictionary, FetchError> {
            Err(FetchError::Request("offline".into()))
        }

        async fn fetch_instance_translations(
            &self,
            _identifier: &str,
        ) -> Result<Value, FetchError> {
            Err(FetchError::Request("offline".into()))
        }
    }

    fn parser_with(overlays: OverlayStack) -> SpecParser {
        SpecParser::new(
            "en",
            Arc::new(NullFetcher),
            Arc::new(MemoryCache::new()),
            Arc::new(overlays),
        )
    }

    fn air_conditioner_doc() -> Value {
        json!({
            "type": AC,
            "description": "Air Conditioner",
            "services": [
                {
                    "iid": 1,
                    "type": "urn:cap-spec-v2:service:device-information:00007801:acme-mc5:1",
                    "description": "Device Information",
                    "properties": []
                },
                {
                    "iid": 2,
                    "type": "urn:cap-spec-v2:service:air-conditioner:00007811:acme-mc5:1",
                    "description": "Air Conditioner",
                    "properties": [
                        {
                            "iid": 1,
                            "type": "urn:cap-spec-v2:property:on:00000006:acme-mc5:1",
                            "description": "Switch Status",
                            "format": "bool",
                            "access": ["read", "write", "notify"]
                        },
                        {
                            "iid": 2,
                            "type": "urn:cap-spec-v2:property:mode:00000008:acme-mc5:1",
                            "description": "Mode",
                            "format": "uint8",
                            "access": ["read", "write", "notify"],
                            "value-list": [
                                {"value": 0, "name": "cool", "description": "Cool"},
                                {"value": 1, "name": "heat"}
                            ]
                        },
                        {
                            "iid": 3,
                            "type": "urn:cap-spec-v2:property:target-temperature:00000021:acme-mc5:1",
                            "description": "Target Temperature",
                            "format": "float",
                            "access": ["read", "write", "notify"],
                            "unit": "celsius",
                            "value-range": [16, 31, 0.5]
                        }
                    ],
                    "events": [
                        {
                            "iid": 1,
                            "type": "urn:cap-spec-v2:event:temperature-change:00005005:acme-mc5:1",
                            "description": "Temperature Change",
                            "arguments": [3, 99]
                        }
                    ],
                    "actions": [
                        {
                            "iid": 1,
                            "type": "urn:cap-spec-v2:action:toggle:00002811:acme-mc5:1",
                            "description": "Toggle",
                            "in": [],
                            "out": []
                        }
                    ]
                }
            ]
        })
    }

    #[test]
    fn test_build_graph_shapes_the_document() {
        let parser = parser_with(OverlayStack::empty());
        let instance = parser
            .build_graph(
                AC,
                &air_conditioner_doc(),
                &TranslationTable::default(),
                &SpecStdLib::new(),
            )
            .unwrap();

        assert_eq!(instance.name, "air-conditioner");
        assert_eq!(instance.description, "Air Conditioner");

        // The device-information service never reaches the graph.
        assert_eq!(instance.services.len(), 1);
        let ac = &instance.services[0];
        assert_eq!(ac.iid, 2);
        assert_eq!(ac.name, "air-conditioner");
        assert!(!ac.filtered);
        assert!(!ac.proprietary);

        // Handles follow document order, starting at 1.
        assert_eq!(ac.handle, NodeHandle(1));
        assert_eq!(ac.properties[0].handle, NodeHandle(2));
        assert_eq!(ac.properties[2].handle, NodeHandle(4));
        assert_eq!(ac.events[0].handle, NodeHandle(5));
        assert_eq!(ac.actions[0].handle, NodeHandle(6));

        // A bool without a declared list gets the synthesized enumeration.
        let on = ac.property_by_name("on").unwrap();
        assert_eq!(on.format, SpecFormat::Bool);
        let list = on.value_list.as_ref().unwrap();
        assert_eq!(list.description_of(&SpecValue::Bool(true)), Some("True"));
        assert_eq!(list.description_of(&SpecValue::Bool(false)), Some("False"));

        // A declared list keeps its entries; a missing description falls
        // back to the machine name.
        let mode = ac.property_by_name("mode").unwrap();
        let list = mode.value_list.as_ref().unwrap();
        assert_eq!(list.description_of(&SpecValue::Int(0)), Some("Cool"));
        assert_eq!(list.description_of(&SpecValue::Int(1)), Some("heat"));

        // Precision carries over from the range step.
        let target = ac.property_by_name("target-temperature").unwrap();
        assert_eq!(target.precision, 1);
        assert_eq!(target.unit.as_deref(), Some("celsius"));

        // The dangling argument 99 is dropped, 3 resolves to its handle.
        assert_eq!(ac.events[0].arguments, vec![target.handle]);
    }

    #[test]
    fn test_build_graph_rejects_unusable_documents() {
        let parser = parser_with(OverlayStack::empty());
        let trans = TranslationTable::default();
        let lib = SpecStdLib::new();

        let err = parser
            .build_graph(AC, &json!("not an object"), &trans, &lib)
            .unwrap_err();
        assert!(matches!(err, SpecError::MalformedDocument { .. }));

        let err = parser
            .build_graph(AC, &json!({"type": AC, "description": "x"}), &trans, &lib)
            .unwrap_err();
        assert!(matches!(err, SpecError::MalformedDocument { .. }));
    }

    #[test]
    fn test_broken_service_skipped_siblings_survive() {
        let parser = parser_with(OverlayStack::empty());
        let mut doc = air_conditioner_doc();
        doc["services"]
            .as_array_mut()
            .unwrap()
            .push(json!({"iid": 9, "description": "no type"}));
        let instance = parser
            .build_graph(AC, &doc, &TranslationTable::default(), &SpecStdLib::new())
            .unwrap();
        assert_eq!(instance.services.len(), 1);
        assert_eq!(instance.services[0].iid, 2);
    }

    #[test]
    fn test_duplicate_service_iid_keeps_first() {
        let parser = parser_with(OverlayStack::empty());
        let mut doc = air_conditioner_doc();
        let dup = json!({
            "iid": 2,
            "type": "urn:cap-spec-v2:service:fan:00007808:acme-mc5:1",
            "description": "Fan",
            "properties": []
        });
        doc["services"].as_array_mut().unwrap().push(dup);
        let instance = parser
            .build_graph(AC, &doc, &TranslationTable::default(), &SpecStdLib::new())
            .unwrap();
        assert_eq!(instance.services.len(), 1);
        assert_eq!(instance.services[0].name, "air-conditioner");
    }

    #[test]
    fn test_filter_table_marks_service_and_drops_property() {
        let filter = SpecFilter::from_json(
            r#"{
                "urn:cap-spec-v2:device:air-conditioner:0000A004:acme-mc5": {
                    "services": ["2"],
                    "properties": ["2.2"]
                }
            }"#,
        )
        .unwrap();
        let parser = parser_with(OverlayStack::empty().with_filter(filter));
        let instance = parser
            .build_graph(
                AC,
                &air_conditioner_doc(),
                &TranslationTable::default(),
                &SpecStdLib::new(),
            )
            .unwrap();

        let ac = &instance.services[0];
        assert!(ac.filtered);
        assert!(ac.property_by_name("mode").is_none());
        assert!(ac.property_by_name("on").is_some());
    }

    #[test]
    fn test_wildcard_filter_empties_the_service() {
        let filter = SpecFilter::from_json(
            r#"{
                "urn:cap-spec-v2:device:air-conditioner:0000A004:acme-mc5": {
                    "properties": ["2.*"]
                }
            }"#,
        )
        .unwrap();
        let parser = parser_with(OverlayStack::empty().with_filter(filter));
        let instance = parser
            .build_graph(
                AC,
                &air_conditioner_doc(),
                &TranslationTable::default(),
                &SpecStdLib::new(),
            )
            .unwrap();

        // Every property under service 2 is gone; the service itself and its
        // event and action stay, the event losing its now-dangling argument.
        let ac = &instance.services[0];
        assert!(!ac.filtered);
        assert!(ac.properties.is_empty());
        assert_eq!(ac.events.len(), 1);
        assert!(ac.events[0].arguments.is_empty());
        assert_eq!(ac.actions.len(), 1);
    }

    #[test]
    fn test_added_fragment_joins_the_graph_unfiltered() {
        let add = SpecAdd::from_json(&format!(
            r#"{{
                "{AC}": [
                    {{
                        "iid": 7,
                        "type": "urn:cap-spec-v2:service:indicator-light:00007803:acme-mc5:1",
                        "description": "Indicator Light",
                        "properties": [
                            {{
                                "iid": 1,
                                "type": "urn:cap-spec-v2:property:on:00000006:acme-mc5:1",
                                "description": "Switch Status",
                                "format": "bool",
                                "access": ["read", "write"]
                            }}
                        ]
                    }}
                ]
            }}"#
        ))
        .unwrap();
        // The filter names the injected siid; the fragment's own stamp wins.
        let filter = SpecFilter::from_json(
            r#"{"urn:cap-spec-v2:device:air-conditioner:0000A004:acme-mc5": {"services": ["7"]}}"#,
        )
        .unwrap();
        let parser = parser_with(OverlayStack::empty().with_add(add).with_filter(filter));
        let instance = parser
            .build_graph(
                AC,
                &air_conditioner_doc(),
                &TranslationTable::default(),
                &SpecStdLib::new(),
            )
            .unwrap();

        let light = instance.service_by_name("indicator-light").unwrap();
        assert_eq!(light.iid, 7);
        assert!(!light.filtered);
        assert_eq!(light.properties.len(), 1);
    }

    #[test]
    fn test_modify_patch_applied_during_build() {
        let modify = SpecModify::from_json(&format!(
            r#"{{
                "{AC}": {{
                    "2.3": {{
                        "unit": "fahrenheit",
                        "expr": "value * 1.8 + 32",
                        "value-range": [61, 88, 1]
                    }}
                }}
            }}"#
        ))
        .unwrap();
        let parser = parser_with(OverlayStack::empty().with_modify(modify));
        let instance = parser
            .build_graph(
                AC,
                &air_conditioner_doc(),
                &TranslationTable::default(),
                &SpecStdLib::new(),
            )
            .unwrap();

        let target = instance.services[0].property_by_name("target-temperature").unwrap();
        assert_eq!(target.unit.as_deref(), Some("fahrenheit"));
        assert_eq!(target.expr.as_deref(), Some("value * 1.8 + 32"));
        let range = target.value_range.as_ref().unwrap();
        assert_eq!(range.min, 61.0);
        assert_eq!(range.precision, 0);
    }

    #[test]
    fn test_translation_chain_prefers_tags_then_std_lib() {
        let cloud = json!({"en": {"s:2:p:3": "Thermostat Setpoint"}});
        let trans = TranslationTable::from_cloud(&cloud, "en");
        let lib: SpecStdLib = serde_json::from_value(json!({
            "time": 0,
            "data": {
                "service": {
                    "urn:cap-spec-v2:service:air-conditioner:00007811": {"en": "Air Conditioner Unit"}
                },
                "property-value": {
                    "urn:cap-spec-v2:property:mode:00000008|heat": {"en": "Heat"}
                }
            }
        }))
        .unwrap();

        let parser = parser_with(OverlayStack::empty());
        let instance = parser
            .build_graph(AC, &air_conditioner_doc(), &trans, &lib)
            .unwrap();

        let ac = &instance.services[0];
        // Service text from the standard library, property text from the
        // per-instance tag, value text from the compound value key.
        assert_eq!(ac.description, "Air Conditioner Unit");
        let target = ac.property_by_name("target-temperature").unwrap();
        assert_eq!(target.description, "Thermostat Setpoint");
        let mode = ac.property_by_name("mode").unwrap();
        let list = mode.value_list.as_ref().unwrap();
        assert_eq!(list.description_of(&SpecValue::Int(1)), Some("Heat"));
    }
}
