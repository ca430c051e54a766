//! The service registry ("compose").
//!
//! A [`ServiceRegistry`] owns every [`ServiceRecord`] decoded from one
//! document. It never changes after construction: [`ServiceRegistry::union`]
//! and [`ServiceRegistry::filter`] derive new registries and leave their
//! inputs untouched.
//!
//! # Graph cache
//!
//! The [`DependencyGraph`] is derived from the registry on first use and kept
//! in a [`OnceLock`] for the registry's lifetime. Concurrent first calls may
//! both build the graph; building is deterministic, so whichever copy is
//! stored is identical to the other. Registries derived through `union` or
//! `filter` start with an empty cache.
//!
//! Both [`ServiceRegistry`] and [`DependencyGraph`] are `Send + Sync`, so a
//! loaded registry can be shared read-only across threads.

use crate::ancestry;
use crate::domain::{ServiceName, ServiceRecord, value_type_name};
use crate::error::{Error, Result};
use crate::graph::DependencyGraph;
use serde_yaml::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

/// Immutable mapping from service name to [`ServiceRecord`].
///
/// Iteration is in name order, so every listing derived from a registry is
/// reproducible between runs.
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    services: BTreeMap<ServiceName, ServiceRecord>,
    graph: OnceLock<DependencyGraph>,
}

impl PartialEq for ServiceRegistry {
    fn eq(&self, other: &Self) -> bool {
        self.services == other.services
    }
}

impl ServiceRegistry {
    /// Decode a registry from a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the text is not valid YAML or does not
    /// have the shape `{ name: { ... } | null }`.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let value: Value =
            serde_yaml::from_str(content).map_err(|e| Error::Decode(e.to_string()))?;
        Self::from_value(value)
    }

    /// Decode a registry from an already parsed document.
    ///
    /// A null document is an empty registry. A null service entry is a service
    /// with no attributes. Merge keys (`<<: *anchor`) are expanded first, so
    /// attributes inherited through an anchor, `links` included, count as
    /// declared on the service.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if a merge key is malformed, the document is
    /// not a mapping, a service name is not a string, or a service entry is
    /// neither a mapping nor null.
    pub fn from_value(mut value: Value) -> Result<Self> {
        value
            .apply_merge()
            .map_err(|e| Error::Decode(e.to_string()))?;

        let entries = match value {
            Value::Null => return Ok(Self::default()),
            Value::Mapping(entries) => entries,
            other => {
                return Err(Error::Decode(format!(
                    "document must be a mapping of services, got {}",
                    value_type_name(&other)
                )));
            }
        };

        let mut services = BTreeMap::new();
        for (key, entry) in entries {
            let name = match key {
                Value::String(name) => name,
                other => {
                    return Err(Error::Decode(format!(
                        "service names must be strings, got {}",
                        value_type_name(&other)
                    )));
                }
            };

            let record = match entry {
                Value::Null => ServiceRecord::empty(name.as_str()),
                Value::Mapping(attributes) => {
                    ServiceRecord::new(name.as_str(), decode_attributes(&name, attributes)?)?
                }
                other => {
                    return Err(Error::Decode(format!(
                        "service '{name}' must be a mapping or null, got {}",
                        value_type_name(&other)
                    )));
                }
            };
            services.insert(ServiceName::new(name), record);
        }

        tracing::debug!(services = services.len(), "Decoded service registry");

        Ok(Self {
            services,
            graph: OnceLock::new(),
        })
    }

    /// Build a registry from explicit records.
    ///
    /// Later records replace earlier ones with the same name.
    pub fn from_records(records: impl IntoIterator<Item = ServiceRecord>) -> Self {
        let services = records
            .into_iter()
            .map(|record| (record.name().clone(), record))
            .collect();

        Self {
            services,
            graph: OnceLock::new(),
        }
    }

    /// Merge two registries into a new one.
    ///
    /// On a name collision the record from `other` wins.
    #[must_use]
    pub fn union(&self, other: &ServiceRegistry) -> ServiceRegistry {
        let mut services = self.services.clone();
        services.extend(
            other
                .services
                .iter()
                .map(|(name, record)| (name.clone(), record.clone())),
        );

        ServiceRegistry {
            services,
            graph: OnceLock::new(),
        }
    }

    /// Keep only the services for which `predicate(name, record)` holds.
    #[must_use]
    pub fn filter<P>(&self, predicate: P) -> ServiceRegistry
    where
        P: Fn(&str, &ServiceRecord) -> bool,
    {
        let services = self
            .services
            .iter()
            .filter(|(name, record)| predicate(name.as_str(), record))
            .map(|(name, record)| (name.clone(), record.clone()))
            .collect();

        ServiceRegistry {
            services,
            graph: OnceLock::new(),
        }
    }

    /// Iterate over the records in name order.
    pub fn iter(&self) -> impl Iterator<Item = &ServiceRecord> {
        self.services.values()
    }

    /// Iterate over the service names in order.
    pub fn names(&self) -> impl Iterator<Item = &ServiceName> {
        self.services.keys()
    }

    /// Look up a record by name.
    pub fn get(&self, name: &str) -> Option<&ServiceRecord> {
        self.services.get(name)
    }

    /// Whether a service with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// Number of services.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Whether the registry has no services.
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// The dependency graph of this registry, built on first call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnresolvedDependency`] if a record links to a service
    /// that is not in this registry. Nothing is cached in that case.
    pub fn graph(&self) -> Result<&DependencyGraph> {
        if let Some(graph) = self.graph.get() {
            return Ok(graph);
        }

        let graph = DependencyGraph::build(self)?;
        Ok(self.graph.get_or_init(|| graph))
    }

    /// Records of every service the given services transitively depend on.
    ///
    /// # Errors
    ///
    /// Fails if the graph cannot be built or a seed is not in the registry.
    pub fn ancestors<I, S>(&self, seeds: I) -> Result<Vec<&ServiceRecord>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = ancestry::ancestors(self.graph()?, seeds)?;
        Ok(self.resolve(&names))
    }

    /// Records of every service that transitively depends on the given ones.
    ///
    /// # Errors
    ///
    /// Fails if the graph cannot be built or a seed is not in the registry.
    pub fn dependents<I, S>(&self, seeds: I) -> Result<Vec<&ServiceRecord>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = ancestry::descendants(self.graph()?, seeds)?;
        Ok(self.resolve(&names))
    }

    /// Map a set of names back to this registry's records, in name order.
    ///
    /// Names that are not in the registry are skipped.
    pub fn resolve(&self, names: &BTreeSet<ServiceName>) -> Vec<&ServiceRecord> {
        names
            .iter()
            .filter_map(|name| self.services.get(name))
            .collect()
    }
}

impl<'a> IntoIterator for &'a ServiceRegistry {
    type Item = &'a ServiceRecord;
    type IntoIter = std::collections::btree_map::Values<'a, ServiceName, ServiceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.services.values()
    }
}

fn decode_attributes(
    service: &str,
    attributes: serde_yaml::Mapping,
) -> Result<BTreeMap<String, Value>> {
    attributes
        .into_iter()
        .map(|(key, value)| match key {
            Value::String(key) => Ok((key, value)),
            other => Err(Error::Decode(format!(
                "service '{service}': attribute names must be strings, got {}",
                value_type_name(&other)
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn names(records: &[&ServiceRecord]) -> Vec<String> {
        records.iter().map(|r| r.name().to_string()).collect()
    }

    #[fixture]
    fn stack() -> ServiceRegistry {
        ServiceRegistry::from_yaml_str(
            "
db:
cache:
  image: redis
api:
  links: [db, 'cache:redis']
web:
  type: front
  links: [api]
shop:
  type: application
  links: [web]
",
        )
        .unwrap()
    }

    // ========== Decoding ==========

    #[rstest]
    fn test_decode_null_entry_is_empty_record(stack: ServiceRegistry) {
        let db = stack.get("db").unwrap();
        assert!(db.attributes().is_empty());
        assert_eq!(db.kind().as_str(), "service");
    }

    #[rstest]
    fn test_decode_keeps_raw_attributes(stack: ServiceRegistry) {
        let cache = stack.get("cache").unwrap();
        assert_eq!(
            cache.attribute("image"),
            Some(&Value::String("redis".to_string()))
        );
    }

    #[rstest]
    fn test_iteration_is_sorted_by_name(stack: ServiceRegistry) {
        let listed: Vec<_> = stack.names().map(ServiceName::as_str).collect();
        assert_eq!(listed, ["api", "cache", "db", "shop", "web"]);
    }

    #[rstest]
    #[case::merged_links("base: &base {links: [db]}\ndb:\nweb: {<<: *base, type: front}\n", &["db"])]
    #[case::merge_list(
        "a: &a {links: [db]}\nb: &b {image: x}\ndb:\nweb: {<<: [*a, *b]}\n",
        &["db"]
    )]
    #[case::own_links_win(
        "base: &base {links: [db]}\ndb:\ncache:\nweb: {<<: *base, links: [cache]}\n",
        &["cache"]
    )]
    fn test_decode_applies_merge_keys(#[case] yaml: &str, #[case] expected: &[&str]) {
        let registry = ServiceRegistry::from_yaml_str(yaml).unwrap();
        let web = registry.get("web").unwrap();

        let links: Vec<_> = web.dependencies().iter().map(ServiceName::as_str).collect();
        assert_eq!(links, expected);
        assert!(web.attribute("<<").is_none());
    }

    #[test]
    fn test_decode_null_document_is_empty() {
        let registry = ServiceRegistry::from_value(Value::Null).unwrap();
        assert!(registry.is_empty());
    }

    #[rstest]
    #[case::list_document("- a\n- b\n", "must be a mapping of services")]
    #[case::scalar_document("just text", "must be a mapping of services")]
    #[case::scalar_record("a: 3\n", "must be a mapping or null")]
    #[case::list_record("a: [b]\n", "must be a mapping or null")]
    #[case::numeric_name("1: {}\n", "names must be strings")]
    #[case::numeric_attribute("a: {1: x}\n", "attribute names must be strings")]
    #[case::bad_links("a: {links: b}\n", "must be a list")]
    #[case::invalid_yaml("a: [b\n", "")]
    #[case::merge_of_scalar("web: {<<: 3}\n", "")]
    fn test_decode_rejects_malformed_documents(#[case] yaml: &str, #[case] expected: &str) {
        let err = ServiceRegistry::from_yaml_str(yaml).unwrap_err();

        assert!(matches!(err, Error::Decode(_)), "unexpected error: {err:?}");
        assert!(
            err.to_string().contains(expected),
            "Expected error to contain '{expected}', got: '{err}'"
        );
    }

    // ========== Union and filter ==========

    #[rstest]
    fn test_union_right_hand_precedence(stack: ServiceRegistry) {
        let other = ServiceRegistry::from_yaml_str("db:\n  type: perf\nextra:\n").unwrap();

        let merged = stack.union(&other);

        assert_eq!(merged.len(), stack.len() + 1);
        assert_eq!(merged.get("db").unwrap().kind().as_str(), "perf");
        // inputs are untouched
        assert_eq!(stack.get("db").unwrap().kind().as_str(), "service");
        assert!(!stack.contains("extra"));
    }

    #[rstest]
    fn test_self_union_is_identity(stack: ServiceRegistry) {
        assert_eq!(stack.union(&stack), stack);
    }

    #[rstest]
    fn test_filter_by_name_and_record(stack: ServiceRegistry) {
        let fronts = stack.filter(|_, record| record.kind().as_str() == "front");
        assert_eq!(
            fronts.names().map(ServiceName::as_str).collect::<Vec<_>>(),
            ["web"]
        );

        let starts_with_c = stack.filter(|name, _| name.starts_with('c'));
        assert_eq!(starts_with_c.len(), 1);
        assert!(starts_with_c.contains("cache"));
    }

    #[rstest]
    fn test_filter_does_not_share_graph_cache(stack: ServiceRegistry) {
        assert_eq!(stack.graph().unwrap().node_count(), 5);

        let subset = stack.filter(|name, _| name == "db" || name == "cache");
        let graph = subset.graph().unwrap();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_from_records_last_writer_wins() {
        let first = ServiceRecord::empty("a");
        let second =
            ServiceRecord::new("a", serde_yaml::from_str("{type: perf}").unwrap()).unwrap();

        let registry = ServiceRegistry::from_records([first, second]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("a").unwrap().kind().as_str(), "perf");
    }

    // ========== Graph cache and queries ==========

    #[test]
    fn test_registry_and_graph_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}

        assert_send_sync::<ServiceRegistry>();
        assert_send_sync::<DependencyGraph>();
    }

    #[test]
    fn test_graph_shared_across_threads() {
        let registry = ServiceRegistry::from_yaml_str("db:\nweb:\n  links: [db]\n").unwrap();

        let counts: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| registry.graph().unwrap().edge_count()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(counts, [1, 1, 1, 1]);
    }

    #[rstest]
    fn test_graph_is_memoized(stack: ServiceRegistry) {
        let first: *const DependencyGraph = stack.graph().unwrap();
        let second: *const DependencyGraph = stack.graph().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_graph_failure_is_not_cached() {
        let registry = ServiceRegistry::from_yaml_str("x:\n  links: [missing]\n").unwrap();

        assert!(registry.graph().is_err());
        assert!(matches!(
            registry.graph(),
            Err(Error::UnresolvedDependency { .. })
        ));
    }

    #[rstest]
    fn test_ancestors_resolve_to_records(stack: ServiceRegistry) {
        let found = stack.ancestors(["web"]).unwrap();
        assert_eq!(names(&found), ["api", "cache", "db"]);
    }

    #[rstest]
    fn test_dependents_resolve_to_records(stack: ServiceRegistry) {
        let found = stack.dependents(["cache"]).unwrap();
        assert_eq!(names(&found), ["api", "shop", "web"]);
    }

    #[rstest]
    fn test_ancestors_unknown_seed(stack: ServiceRegistry) {
        let err = stack.ancestors(["nope"]).unwrap_err();
        assert!(matches!(err, Error::ServiceNotFound(name) if name == "nope"));
    }
}
