//! Versioned generator registry.

use crate::generator::Generator;
use oxgen_onnx::DEFAULT_DOMAIN;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Factory building a fresh generator instance.
pub type GeneratorFactory = Arc<dyn Fn() -> Box<dyn Generator> + Send + Sync>;

/// Normalize an optional domain, mapping `None` and `""` to [`DEFAULT_DOMAIN`].
pub fn normalize_domain(domain: Option<&str>) -> &str {
    match domain {
        None | Some("") => DEFAULT_DOMAIN,
        Some(domain) => domain,
    }
}

/// One registered generator version.
///
/// `version` is the lowest opset the generator supports. `source` labels the
/// unit that defined it (`"builtin"`, or the path of a plugin source).
#[derive(Clone)]
pub struct GeneratorPack {
    version: i64,
    source: String,
    factory: GeneratorFactory,
}

impl GeneratorPack {
    /// Create a pack.
    pub fn new<F>(version: i64, source: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Generator> + Send + Sync + 'static,
    {
        Self {
            version,
            source: source.into(),
            factory: Arc::new(factory),
        }
    }

    /// Lowest opset version this pack serves.
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Label of the defining unit.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Build a new generator instance.
    pub fn instantiate(&self) -> Box<dyn Generator> {
        (self.factory)()
    }
}

impl fmt::Debug for GeneratorPack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorPack")
            .field("version", &self.version)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Registry of code generators keyed by (domain, operator).
///
/// Each entry holds packs sorted by version, highest first. Lookups with a
/// requested version return the highest pack not above it, so a pack
/// registered at version 9 serves opsets 9 through the next registered
/// version. Lookups build a fresh instance every time.
///
/// The registry does no locking; mutation from several threads must be
/// serialized by the caller.
///
/// # Example
///
/// ```ignore
/// let mut registry = GeneratorRegistry::new();
/// registry.register(None, "Relu", GeneratorPack::new(14, "builtin", || Box::new(Relu::new())));
///
/// let generator = registry.lookup(None, "Relu", Some(17)).unwrap();
/// ```
#[derive(Debug, Default)]
pub struct GeneratorRegistry {
    /// domain -> operator -> packs (version descending).
    domains: HashMap<String, HashMap<String, Vec<GeneratorPack>>>,
}

impl GeneratorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a generator pack.
    ///
    /// Returns `self` for method chaining.
    pub fn register(
        &mut self,
        domain: Option<&str>,
        op_type: &str,
        pack: GeneratorPack,
    ) -> &mut Self {
        let domain = normalize_domain(domain);
        tracing::trace!(domain, op_type, version = pack.version, source = %pack.source, "registering generator");

        let packs = self
            .domains
            .entry(domain.to_string())
            .or_default()
            .entry(op_type.to_string())
            .or_default();
        packs.push(pack);
        // Stable sort: equal versions keep registration order.
        packs.sort_by(|a, b| b.version.cmp(&a.version));
        self
    }

    /// Build a generator for `op_type` in `domain`.
    ///
    /// Without a version the highest registered version is used. With one,
    /// the first pack whose version is not above it is used. Returns `None`
    /// if the operator is unknown or every pack is newer than requested.
    pub fn lookup(
        &self,
        domain: Option<&str>,
        op_type: &str,
        version: Option<i64>,
    ) -> Option<Box<dyn Generator>> {
        let packs = self.packs(domain, op_type)?;
        let pack = match version {
            None => packs.first(),
            Some(version) => packs.iter().find(|pack| pack.version <= version),
        };
        pack.map(GeneratorPack::instantiate)
    }

    /// Remove one operator, or a whole domain when `op_type` is `None`.
    ///
    /// A domain left without operators is removed as well.
    pub fn remove(&mut self, domain: Option<&str>, op_type: Option<&str>) {
        let domain = normalize_domain(domain);
        match op_type {
            None => {
                self.domains.remove(domain);
            }
            Some(op_type) => {
                if let Some(operators) = self.domains.get_mut(domain) {
                    operators.remove(op_type);
                    if operators.is_empty() {
                        self.domains.remove(domain);
                    }
                }
            }
        }
    }

    /// Remove every registered generator.
    pub fn reset(&mut self) {
        self.domains.clear();
    }

    /// Number of (domain, operator) entries.
    ///
    /// Several versions of one operator count once.
    pub fn count(&self) -> usize {
        self.domains.values().map(HashMap::len).sum()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Check if any version of an operator is registered.
    pub fn contains(&self, domain: Option<&str>, op_type: &str) -> bool {
        self.packs(domain, op_type).is_some()
    }

    /// Registered versions of an operator, highest first.
    pub fn versions(&self, domain: Option<&str>, op_type: &str) -> Vec<i64> {
        self.packs(domain, op_type)
            .map(|packs| packs.iter().map(GeneratorPack::version).collect())
            .unwrap_or_default()
    }

    /// Iterate over all registered domains.
    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.domains.keys().map(String::as_str)
    }

    /// Iterate over operator names registered in `domain`.
    pub fn operator_names(&self, domain: Option<&str>) -> impl Iterator<Item = &str> {
        self.domains
            .get(normalize_domain(domain))
            .into_iter()
            .flat_map(|operators| operators.keys().map(String::as_str))
    }

    fn packs(&self, domain: Option<&str>, op_type: &str) -> Option<&[GeneratorPack]> {
        self.domains
            .get(normalize_domain(domain))?
            .get(op_type)
            .map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EmitCtx, Generation, GeneratorBase, Result};

    // Mock generator that reports the version it was registered under
    struct VersionedGen {
        base: GeneratorBase,
    }

    impl Generator for VersionedGen {
        fn base(&self) -> &GeneratorBase {
            &self.base
        }

        fn generate(&self, _ctx: &mut EmitCtx<'_>) -> Result<Generation> {
            Ok(Generation::default())
        }
    }

    fn pack(domain: &'static str, op_type: &'static str, version: i64) -> GeneratorPack {
        GeneratorPack::new(version, "test", move || {
            Box::new(VersionedGen {
                base: GeneratorBase::custom(domain, op_type, version, Default::default()),
            })
        })
    }

    #[test]
    fn test_versioned_lookup() {
        let mut registry = GeneratorRegistry::new();
        registry
            .register(Some("com.test"), "Op", pack("com.test", "Op", 9))
            .register(Some("com.test"), "Op", pack("com.test", "Op", 13));

        let found = registry.lookup(Some("com.test"), "Op", Some(11)).unwrap();
        assert_eq!(found.version(), 9);

        let found = registry.lookup(Some("com.test"), "Op", None).unwrap();
        assert_eq!(found.version(), 13);

        let found = registry.lookup(Some("com.test"), "Op", Some(13)).unwrap();
        assert_eq!(found.version(), 13);

        assert!(registry.lookup(Some("com.test"), "Op", Some(5)).is_none());
    }

    #[test]
    fn test_registration_order_does_not_matter() {
        let mut registry = GeneratorRegistry::new();
        registry
            .register(None, "Op", pack(DEFAULT_DOMAIN, "Op", 13))
            .register(None, "Op", pack(DEFAULT_DOMAIN, "Op", 1))
            .register(None, "Op", pack(DEFAULT_DOMAIN, "Op", 9));

        assert_eq!(registry.versions(None, "Op"), vec![13, 9, 1]);
        assert_eq!(registry.lookup(None, "Op", Some(12)).unwrap().version(), 9);
    }

    #[test]
    fn test_domain_normalization() {
        let mut registry = GeneratorRegistry::new();
        registry.register(Some(""), "Op", pack(DEFAULT_DOMAIN, "Op", 1));

        assert!(registry.lookup(None, "Op", None).is_some());
        assert!(registry.lookup(Some(DEFAULT_DOMAIN), "Op", None).is_some());
        assert_eq!(registry.domains().collect::<Vec<_>>(), vec![DEFAULT_DOMAIN]);
    }

    #[test]
    fn test_lookup_misses() {
        let mut registry = GeneratorRegistry::new();
        registry.register(None, "Op", pack(DEFAULT_DOMAIN, "Op", 1));

        assert!(registry.lookup(None, "Other", None).is_none());
        assert!(registry.lookup(Some("custom"), "Op", None).is_none());
    }

    #[test]
    fn test_lookup_builds_fresh_instances() {
        let mut registry = GeneratorRegistry::new();
        registry.register(None, "Op", pack(DEFAULT_DOMAIN, "Op", 1));

        let a = registry.lookup(None, "Op", None).unwrap();
        let b = registry.lookup(None, "Op", None).unwrap();
        assert!(!std::ptr::eq(a.base(), b.base()));
    }

    #[test]
    fn test_count_is_per_operator_not_per_version() {
        let mut registry = GeneratorRegistry::new();
        assert_eq!(registry.count(), 0);
        assert!(registry.is_empty());

        registry.register(Some("d"), "Op", pack("d", "Op", 9));
        assert_eq!(registry.count(), 1);

        registry.register(Some("d"), "Op", pack("d", "Op", 13));
        assert_eq!(registry.count(), 1);

        registry.register(Some("d"), "Other", pack("d", "Other", 1));
        registry.register(None, "Op", pack(DEFAULT_DOMAIN, "Op", 1));
        assert_eq!(registry.count(), 3);
    }

    #[test]
    fn test_remove_operator_cascades_to_domain() {
        let mut registry = GeneratorRegistry::new();
        registry
            .register(Some("d"), "A", pack("d", "A", 1))
            .register(Some("d"), "B", pack("d", "B", 1));

        registry.remove(Some("d"), Some("A"));
        assert!(!registry.contains(Some("d"), "A"));
        assert_eq!(registry.operator_names(Some("d")).collect::<Vec<_>>(), vec!["B"]);

        registry.remove(Some("d"), Some("B"));
        assert!(registry.domains().next().is_none());
        assert!(registry.is_empty());
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_remove_domain_and_reset() {
        let mut registry = GeneratorRegistry::new();
        registry
            .register(Some("d"), "A", pack("d", "A", 1))
            .register(Some("d"), "B", pack("d", "B", 1))
            .register(None, "A", pack(DEFAULT_DOMAIN, "A", 1));

        registry.remove(Some("d"), None);
        assert_eq!(registry.count(), 1);
        assert!(registry.contains(None, "A"));

        // Removing unknown entries is a no-op
        registry.remove(Some("missing"), Some("A"));
        registry.remove(None, Some("missing"));
        assert_eq!(registry.count(), 1);

        registry.reset();
        assert!(registry.is_empty());
    }
}
