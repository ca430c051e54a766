//! Composed queries over a registry.
//!
//! Filters are structured values ([`ServiceFilter`]) rather than lookups on
//! arbitrary attribute names, so a filter can never be ambiguous about which
//! attribute it tests. Filtered registries are combined with
//! [`ServiceRegistry::union`] to build sub-inventories such as
//! "applications plus perf services"; [`compose`] does exactly that for a list
//! of filters.

use crate::ancestry;
use crate::domain::{ServiceKind, ServiceName, ServiceRecord};
use crate::error::Result;
use crate::registry::ServiceRegistry;
use serde_yaml::Value;
use std::collections::BTreeSet;
use std::ops::Not;

/// A predicate over `(name, record)` pairs.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceFilter {
    /// Matches every service
    All,

    /// Services whose `type` equals the given kind
    Kind(ServiceKind),

    /// The service with exactly this name
    Name(ServiceName),

    /// Services whose name is in the set
    NamesIn(BTreeSet<ServiceName>),

    /// Services whose raw attribute `key` equals `value`
    Attribute {
        /// Attribute name
        key: String,
        /// Expected value
        value: Value,
    },

    /// Services that declare attribute `key`, whatever its value
    HasAttribute(String),

    /// Services matched by every inner filter
    And(Vec<ServiceFilter>),

    /// Services matched by at least one inner filter
    Or(Vec<ServiceFilter>),

    /// Services not matched by the inner filter
    Not(Box<ServiceFilter>),
}

impl ServiceFilter {
    /// Filter on the `type` attribute.
    pub fn kind(kind: impl Into<String>) -> Self {
        Self::Kind(ServiceKind::new(kind))
    }

    /// Filter on a single name.
    pub fn name(name: impl Into<ServiceName>) -> Self {
        Self::Name(name.into())
    }

    /// Filter on membership in a set of names.
    pub fn names_in<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ServiceName>,
    {
        Self::NamesIn(names.into_iter().map(Into::into).collect())
    }

    /// Filter on a raw attribute value.
    pub fn attribute(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Attribute {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Both this filter and `other`.
    #[must_use]
    pub fn and(self, other: ServiceFilter) -> Self {
        match self {
            Self::And(mut filters) => {
                filters.push(other);
                Self::And(filters)
            }
            this => Self::And(vec![this, other]),
        }
    }

    /// Either this filter or `other`.
    #[must_use]
    pub fn or(self, other: ServiceFilter) -> Self {
        match self {
            Self::Or(mut filters) => {
                filters.push(other);
                Self::Or(filters)
            }
            this => Self::Or(vec![this, other]),
        }
    }

    /// Whether the service passes this filter.
    pub fn matches(&self, name: &str, record: &ServiceRecord) -> bool {
        match self {
            Self::All => true,
            Self::Kind(kind) => record.kind() == kind,
            Self::Name(expected) => expected.as_str() == name,
            Self::NamesIn(names) => names.contains(name),
            Self::Attribute { key, value } => record.attribute(key) == Some(value),
            Self::HasAttribute(key) => record.attribute(key).is_some(),
            Self::And(filters) => filters.iter().all(|f| f.matches(name, record)),
            Self::Or(filters) => filters.iter().any(|f| f.matches(name, record)),
            Self::Not(inner) => !inner.matches(name, record),
        }
    }

    /// The sub-registry of services passing this filter.
    pub fn apply(&self, registry: &ServiceRegistry) -> ServiceRegistry {
        registry.filter(|name, record| self.matches(name, record))
    }
}

impl Not for ServiceFilter {
    type Output = ServiceFilter;

    fn not(self) -> Self::Output {
        match self {
            Self::Not(inner) => *inner,
            this => Self::Not(Box::new(this)),
        }
    }
}

/// Union of the sub-registries selected by each filter.
///
/// Services matched by several filters appear once. An empty filter list
/// selects nothing.
pub fn compose(registry: &ServiceRegistry, filters: &[ServiceFilter]) -> ServiceRegistry {
    filters
        .iter()
        .fold(ServiceRegistry::default(), |acc, filter| {
            acc.union(&filter.apply(registry))
        })
}

/// Everything the named applications transitively depend on.
///
/// With no names, returns every service in the graph. Otherwise the registry
/// is narrowed to services of kind `application` whose name was requested,
/// and the ancestor sets of those applications are merged into one.
///
/// The applications themselves are not part of the result unless one of them
/// is a dependency of another selected application. Requested names that are
/// not applications are skipped with a warning.
///
/// # Errors
///
/// Fails if the registry's graph cannot be built.
pub fn by_applications<'r, S>(
    registry: &'r ServiceRegistry,
    names: &[S],
) -> Result<Vec<&'r ServiceRecord>>
where
    S: AsRef<str>,
{
    let graph = registry.graph()?;

    if names.is_empty() {
        let all: BTreeSet<ServiceName> = graph.nodes().cloned().collect();
        return Ok(registry.resolve(&all));
    }

    let requested = ServiceFilter::names_in(names.iter().map(|name| name.as_ref()));
    let applications = ServiceFilter::kind(ServiceKind::APPLICATION)
        .and(requested)
        .apply(registry);

    for name in names.iter().map(|name| name.as_ref()) {
        if !applications.contains(name) {
            tracing::warn!(service = name, "Not an application, skipping");
        }
    }

    let found = ancestry::ancestors(graph, applications.names())?;
    tracing::debug!(
        applications = applications.len(),
        dependencies = found.len(),
        "Resolved application dependencies"
    );

    Ok(registry.resolve(&found))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn names(records: &[&ServiceRecord]) -> Vec<String> {
        records.iter().map(|r| r.name().to_string()).collect()
    }

    fn registry_names(registry: &ServiceRegistry) -> Vec<String> {
        registry.names().map(ToString::to_string).collect()
    }

    #[fixture]
    fn deployment() -> ServiceRegistry {
        ServiceRegistry::from_yaml_str(
            "
db:
queue:
  image: rabbitmq
api:
  links: [db, queue]
worker:
  links: [queue]
front:
  type: front
  links: [api]
shop:
  type: application
  links: [front]
jobs:
  type: application
  links: [worker]
bench:
  type: perf
  links: [api]
",
        )
        .unwrap()
    }

    // ========== by_applications ==========

    #[test]
    fn test_by_applications_excludes_the_application() {
        let registry = ServiceRegistry::from_yaml_str(
            "a:\nb: {links: [a]}\nc: {links: [a, b], type: application}\n",
        )
        .unwrap();

        let found = by_applications(&registry, &["c"]).unwrap();
        assert_eq!(names(&found), ["a", "b"]);
    }

    #[rstest]
    fn test_by_applications_merges_sets(deployment: ServiceRegistry) {
        let shop = by_applications(&deployment, &["shop"]).unwrap();
        assert_eq!(names(&shop), ["api", "db", "front", "queue"]);

        let both = by_applications(&deployment, &["shop", "jobs"]).unwrap();
        assert_eq!(names(&both), ["api", "db", "front", "queue", "worker"]);
    }

    #[rstest]
    fn test_by_applications_without_names_returns_everything(deployment: ServiceRegistry) {
        let found = by_applications::<&str>(&deployment, &[]).unwrap();
        assert_eq!(found.len(), deployment.len());
    }

    #[rstest]
    #[case::not_an_application("bench")]
    #[case::unknown("nobody")]
    fn test_by_applications_skips_non_applications(
        deployment: ServiceRegistry,
        #[case] name: &str,
    ) {
        let found = by_applications(&deployment, &[name]).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_application_depending_on_application_is_included() {
        let registry = ServiceRegistry::from_yaml_str(
            "core: {type: application}\nportal: {type: application, links: [core]}\n",
        )
        .unwrap();

        let found = by_applications(&registry, &["core", "portal"]).unwrap();
        assert_eq!(names(&found), ["core"]);
    }

    // ========== Filters ==========

    #[rstest]
    #[case::kind(ServiceFilter::kind("application"), &["jobs", "shop"])]
    #[case::name(ServiceFilter::name("db"), &["db"])]
    #[case::names_in(ServiceFilter::names_in(["db", "api", "ghost"]), &["api", "db"])]
    #[case::attribute(ServiceFilter::attribute("image", "rabbitmq"), &["queue"])]
    #[case::has_attribute(ServiceFilter::HasAttribute("links".into()), &["api", "bench", "front", "jobs", "shop", "worker"])]
    #[case::not(!ServiceFilter::kind("service"), &["bench", "front", "jobs", "shop"])]
    #[case::and(
        ServiceFilter::HasAttribute("links".into()).and(ServiceFilter::kind("service")),
        &["api", "worker"]
    )]
    #[case::or(
        ServiceFilter::kind("perf").or(ServiceFilter::name("db")),
        &["bench", "db"]
    )]
    fn test_filter_selection(
        deployment: ServiceRegistry,
        #[case] filter: ServiceFilter,
        #[case] expected: &[&str],
    ) {
        assert_eq!(registry_names(&filter.apply(&deployment)), expected);
    }

    #[test]
    fn test_double_negation_collapses() {
        let filter = ServiceFilter::kind("perf");
        assert_eq!(!!filter.clone(), filter);
    }

    #[test]
    fn test_and_flattens() {
        let filter = ServiceFilter::All
            .and(ServiceFilter::kind("a"))
            .and(ServiceFilter::kind("b"));

        assert!(matches!(filter, ServiceFilter::And(ref inner) if inner.len() == 3));
    }

    #[rstest]
    fn test_compose_applications_and_perf(deployment: ServiceRegistry) {
        let composed = compose(
            &deployment,
            &[ServiceFilter::kind("application"), ServiceFilter::kind("perf")],
        );

        assert_eq!(registry_names(&composed), ["bench", "jobs", "shop"]);
    }

    #[rstest]
    fn test_compose_overlapping_filters(deployment: ServiceRegistry) {
        let composed = compose(
            &deployment,
            &[ServiceFilter::name("db"), ServiceFilter::names_in(["db", "api"])],
        );

        assert_eq!(registry_names(&composed), ["api", "db"]);
    }

    #[rstest]
    fn test_compose_nothing(deployment: ServiceRegistry) {
        assert!(compose(&deployment, &[]).is_empty());
    }
}
