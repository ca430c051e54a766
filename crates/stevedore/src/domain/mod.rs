//! Domain types for service descriptions.
//!
//! A [`ServiceRecord`] is one declared service: its name, the raw attribute
//! mapping it was decoded from, and two attributes with structural meaning,
//! the `type` tag ([`ServiceKind`]) and the `links` list (its dependencies).

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

/// Attribute holding the list of linked services.
pub const LINKS_KEY: &str = "links";

/// Attribute holding the classification tag.
pub const KIND_KEY: &str = "type";

/// Separator between a linked service name and its qualifier (`db:database`).
const LINK_QUALIFIER_SEPARATOR: char = ':';

/// Unique identifier for a service
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceName(pub String);

impl ServiceName {
    /// Create a new service name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ServiceName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ServiceName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ServiceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ServiceName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Free-form classification tag of a service (its `type` attribute).
///
/// Only [`ServiceKind::APPLICATION`] has meaning to the query layer; every
/// other value is used for filtering and display alone.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceKind(pub String);

impl ServiceKind {
    /// Kind assigned when a record has no `type` attribute.
    pub const DEFAULT: &'static str = "service";

    /// Kind of the top-level applications queried by `by_applications`.
    pub const APPLICATION: &'static str = "application";

    /// Kind of user-facing front ends.
    pub const FRONT: &'static str = "front";

    /// Kind of performance tooling services.
    pub const PERF: &'static str = "perf";

    /// Create a new kind tag
    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    /// Borrow the tag as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the application kind
    pub fn is_application(&self) -> bool {
        self.0 == Self::APPLICATION
    }
}

impl Default for ServiceKind {
    fn default() -> Self {
        Self::new(Self::DEFAULT)
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ServiceKind {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One declared service.
///
/// Records are immutable once built; `kind` and `dependencies` are derived
/// from `attributes` at construction time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceRecord {
    name: ServiceName,
    kind: ServiceKind,
    dependencies: Vec<ServiceName>,
    attributes: BTreeMap<String, Value>,
}

impl ServiceRecord {
    /// Build a record from its decoded attribute mapping.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if `links` is not a sequence of non-empty
    /// strings or `type` is not a string. A null value for either attribute
    /// counts as absent.
    pub fn new(name: impl Into<ServiceName>, attributes: BTreeMap<String, Value>) -> Result<Self> {
        let name = name.into();
        let kind = decode_kind(&name, attributes.get(KIND_KEY))?;
        let dependencies = decode_links(&name, attributes.get(LINKS_KEY))?;

        Ok(Self {
            name,
            kind,
            dependencies,
            attributes,
        })
    }

    /// Build a record with no attributes (a `null` entry in the document).
    pub fn empty(name: impl Into<ServiceName>) -> Self {
        Self {
            name: name.into(),
            kind: ServiceKind::default(),
            dependencies: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    /// The service name
    pub fn name(&self) -> &ServiceName {
        &self.name
    }

    /// The classification tag, `service` when undeclared
    pub fn kind(&self) -> &ServiceKind {
        &self.kind
    }

    /// Bare names of the linked services, in declaration order.
    pub fn dependencies(&self) -> &[ServiceName] {
        &self.dependencies
    }

    /// Raw attributes as decoded from the document
    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    /// Look up a single raw attribute
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

/// Strip the qualifier from a link reference (`name:alias` -> `name`).
pub fn link_target(link: &str) -> &str {
    link.split_once(LINK_QUALIFIER_SEPARATOR)
        .map_or(link, |(name, _)| name)
}

fn decode_kind(service: &ServiceName, value: Option<&Value>) -> Result<ServiceKind> {
    match value {
        None | Some(Value::Null) => Ok(ServiceKind::default()),
        Some(Value::String(kind)) => Ok(ServiceKind::new(kind.as_str())),
        Some(other) => Err(Error::Decode(format!(
            "service '{service}': '{KIND_KEY}' must be a string, got {}",
            value_type_name(other)
        ))),
    }
}

fn decode_links(service: &ServiceName, value: Option<&Value>) -> Result<Vec<ServiceName>> {
    let links = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Sequence(links)) => links,
        Some(other) => {
            return Err(Error::Decode(format!(
                "service '{service}': '{LINKS_KEY}' must be a list, got {}",
                value_type_name(other)
            )));
        }
    };

    links
        .iter()
        .map(|link| match link {
            Value::String(link) => {
                let target = link_target(link);
                if target.is_empty() {
                    Err(Error::Decode(format!(
                        "service '{service}': link '{link}' has no service name"
                    )))
                } else {
                    Ok(ServiceName::from(target))
                }
            }
            other => Err(Error::Decode(format!(
                "service '{service}': link entries must be strings, got {}",
                value_type_name(other)
            ))),
        })
        .collect()
}

/// Human-readable name of a YAML value's type, for error messages.
pub(crate) fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
