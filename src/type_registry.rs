//! Host type registry behind the `typeResolve` intrinsic
//!
//! Types live in named modules. Only some modules are loaded up front; the rest are
//! loaded on demand while resolving. Resolution order:
//!
//! 1. exact name in an already loaded module
//! 2. if the name contains `.`, load the module named by the prefix before the first
//!    `.` and look the name up there
//! 3. load and search every module referenced by the primary module
//!
//! Absence is `None`, never an error.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{json, Value as JsonValue};

/* ===================== Handles ===================== */

/// Stable identity of a registered type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(u32);

#[derive(Debug)]
struct TypeInfo {
    key: TypeKey,
    full_name: String,
    module: String,
    fields: BTreeMap<String, JsonValue>,
}

/// Reference to a registered type; equality is identity
#[derive(Debug, Clone)]
pub struct TypeHandle(Arc<TypeInfo>);

impl TypeHandle {
    pub fn key(&self) -> TypeKey {
        self.0.key
    }

    pub fn full_name(&self) -> &str {
        &self.0.full_name
    }

    pub fn module(&self) -> &str {
        &self.0.module
    }

    pub fn fields(&self) -> &BTreeMap<String, JsonValue> {
        &self.0.fields
    }

    /// JSON description handed to script code
    pub fn describe(&self) -> JsonValue {
        json!({
            "name": self.0.full_name,
            "module": self.0.module,
            "fields": self.0.fields,
        })
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for TypeHandle {}

/* ===================== Modules ===================== */

/// Module definition used while building a registry
#[derive(Debug, Clone, Default)]
pub struct TypeModule {
    name: String,
    types: Vec<(String, BTreeMap<String, JsonValue>)>,
    references: Vec<String>,
}

impl TypeModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, full_name: impl Into<String>, fields: JsonValue) -> Self {
        let fields = match fields {
            JsonValue::Object(map) => map.into_iter().collect(),
            JsonValue::Null => BTreeMap::new(),
            other => BTreeMap::from([("value".to_string(), other)]),
        };
        self.types.push((full_name.into(), fields));
        self
    }

    pub fn with_reference(mut self, module: impl Into<String>) -> Self {
        self.references.push(module.into());
        self
    }
}

#[derive(Debug)]
struct LoadedModule {
    types: HashMap<String, TypeHandle>,
    references: Vec<String>,
}

/// Which step of the resolution order found a type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStrategy {
    Direct,
    ModulePrefix,
    PrimaryReferences,
}

/* ===================== Registry ===================== */

#[derive(Debug)]
pub struct TypeRegistry {
    primary: String,
    modules: HashMap<String, LoadedModule>,
    loaded: RwLock<BTreeSet<String>>,
}

impl TypeRegistry {
    pub fn builder(primary: impl Into<String>) -> TypeRegistryBuilder {
        TypeRegistryBuilder {
            primary: primary.into(),
            modules: Vec::new(),
            preload: Vec::new(),
        }
    }

    /// Registry used by the CLI
    ///
    /// `system` is preloaded, `host` is the primary module and references `time`,
    /// `net` is only reachable through its name prefix.
    pub fn standard() -> Self {
        Self::builder("host")
            .module(
                TypeModule::new("system")
                    .with_type("system.Object", json!({ "kind": "object" }))
                    .with_type("system.String", json!({ "kind": "primitive" }))
                    .with_type("system.Number", json!({ "kind": "primitive" }))
                    .with_type("system.Boolean", json!({ "kind": "primitive" })),
            )
            .module(
                TypeModule::new("host")
                    .with_type("host.Bridge", json!({ "kind": "service" }))
                    .with_type("host.Console", json!({ "kind": "service" }))
                    .with_reference("time"),
            )
            .module(
                TypeModule::new("time")
                    .with_type("time.Clock", json!({ "resolution_ms": 1 }))
                    .with_type("time.Duration", json!({ "unit": "ms" }))
                    .with_type("Stopwatch", json!({ "resolution_ms": 1 })),
            )
            .module(TypeModule::new("net").with_type("net.Socket", json!({ "kind": "stream" })))
            .preload("system")
            .build()
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    pub fn is_loaded(&self, module: &str) -> bool {
        self.loaded.read().contains(module)
    }

    /// Mark a known module as loaded; false if the module does not exist
    pub fn load(&self, module: &str) -> bool {
        if !self.modules.contains_key(module) {
            return false;
        }
        self.loaded.write().insert(module.to_string());
        true
    }

    pub fn resolve(&self, name: &str) -> Option<TypeHandle> {
        self.resolve_with_strategy(name).map(|(handle, _)| handle)
    }

    pub fn resolve_with_strategy(&self, name: &str) -> Option<(TypeHandle, ResolveStrategy)> {
        if let Some(handle) = self.resolve_direct(name) {
            return Some((handle, ResolveStrategy::Direct));
        }
        if let Some(handle) = self.resolve_via_prefix(name) {
            return Some((handle, ResolveStrategy::ModulePrefix));
        }
        if let Some(handle) = self.resolve_via_references(name) {
            return Some((handle, ResolveStrategy::PrimaryReferences));
        }
        tracing::debug!(name, "type not resolved");
        None
    }

    fn lookup_in(&self, module: &str, name: &str) -> Option<TypeHandle> {
        self.modules.get(module)?.types.get(name).cloned()
    }

    fn resolve_direct(&self, name: &str) -> Option<TypeHandle> {
        let loaded = self.loaded.read();
        loaded.iter().find_map(|module| self.lookup_in(module, name))
    }

    fn resolve_via_prefix(&self, name: &str) -> Option<TypeHandle> {
        let (prefix, _) = name.split_once('.')?;
        if !self.load(prefix) {
            return None;
        }
        self.lookup_in(prefix, name)
    }

    fn resolve_via_references(&self, name: &str) -> Option<TypeHandle> {
        let primary = self.modules.get(&self.primary)?;
        primary.references.iter().find_map(|module| {
            if self.load(module) {
                self.lookup_in(module, name)
            } else {
                None
            }
        })
    }
}

/* ===================== Builder ===================== */

pub struct TypeRegistryBuilder {
    primary: String,
    modules: Vec<TypeModule>,
    preload: Vec<String>,
}

impl TypeRegistryBuilder {
    pub fn module(mut self, module: TypeModule) -> Self {
        self.modules.push(module);
        self
    }

    pub fn preload(mut self, module: impl Into<String>) -> Self {
        self.preload.push(module.into());
        self
    }

    pub fn build(self) -> TypeRegistry {
        let mut next_key = 0u32;
        let mut modules = HashMap::new();

        for module in self.modules {
            let mut types = HashMap::new();
            for (full_name, fields) in module.types {
                let handle = TypeHandle(Arc::new(TypeInfo {
                    key: TypeKey(next_key),
                    full_name: full_name.clone(),
                    module: module.name.clone(),
                    fields,
                }));
                next_key += 1;
                types.insert(full_name, handle);
            }
            modules.insert(
                module.name,
                LoadedModule {
                    types,
                    references: module.references,
                },
            );
        }

        let mut loaded = BTreeSet::new();
        for name in std::iter::once(&self.primary).chain(self.preload.iter()) {
            if modules.contains_key(name) {
                loaded.insert(name.clone());
            }
        }

        TypeRegistry {
            primary: self.primary,
            modules,
            loaded: RwLock::new(loaded),
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_lookup_in_preloaded_module() {
        let registry = TypeRegistry::standard();
        let (handle, strategy) = registry.resolve_with_strategy("system.String").unwrap();
        assert_eq!(handle.full_name(), "system.String");
        assert_eq!(strategy, ResolveStrategy::Direct);
    }

    #[test]
    fn test_prefix_fallback_loads_module() {
        let registry = TypeRegistry::standard();
        assert!(!registry.is_loaded("net"));

        let (handle, strategy) = registry.resolve_with_strategy("net.Socket").unwrap();
        assert_eq!(strategy, ResolveStrategy::ModulePrefix);
        assert_eq!(handle.module(), "net");
        assert!(registry.is_loaded("net"));
    }

    #[test]
    fn test_prefix_and_direct_return_same_handle() {
        let registry = TypeRegistry::standard();
        let via_prefix = registry.resolve("net.Socket").unwrap();

        let (via_direct, strategy) = registry.resolve_with_strategy("net.Socket").unwrap();
        assert_eq!(strategy, ResolveStrategy::Direct);
        assert_eq!(via_prefix, via_direct);
        assert_eq!(via_prefix.key(), via_direct.key());
    }

    #[test]
    fn test_reference_scan_finds_unprefixed_type() {
        let registry = TypeRegistry::standard();
        let (handle, strategy) = registry.resolve_with_strategy("Stopwatch").unwrap();
        assert_eq!(strategy, ResolveStrategy::PrimaryReferences);
        assert_eq!(handle.module(), "time");
    }

    #[test]
    fn test_unresolvable_name_is_none() {
        let registry = TypeRegistry::standard();
        assert!(registry.resolve("nowhere.Missing").is_none());
        assert!(registry.resolve("Missing").is_none());
        assert!(registry.resolve("").is_none());
    }

    #[test]
    fn test_describe_carries_fields() {
        let registry = TypeRegistry::standard();
        let clock = registry.resolve("time.Clock").unwrap();
        assert_eq!(clock.describe()["fields"]["resolution_ms"], json!(1));
        assert_eq!(clock.describe()["module"], json!("time"));
    }

    #[test]
    fn test_builder_ignores_unknown_preload() {
        let registry = TypeRegistry::builder("app")
            .module(TypeModule::new("app").with_type("app.Main", JsonValue::Null))
            .preload("missing")
            .build();
        assert!(registry.is_loaded("app"));
        assert!(!registry.is_loaded("missing"));
        assert!(registry.resolve("app.Main").unwrap().fields().is_empty());
    }
}
