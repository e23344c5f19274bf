//! Management-object registry: introspectable handles for running
//! components, endpoints, and routes.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::RwLock;
use tracing::debug;

use crate::observability::events;

const COMPONENT: &str = "management";

/// Management object categories, queryable by wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManagedKind {
    Components,
    Endpoints,
    Routes,
}

impl Display for ManagedKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ManagedKind::Components => write!(f, "components"),
            ManagedKind::Endpoints => write!(f, "endpoints"),
            ManagedKind::Routes => write!(f, "routes"),
        }
    }
}

/// Stable management identifier: context name + type + instance name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ManagementName {
    context: String,
    kind: ManagedKind,
    name: String,
}

impl ManagementName {
    pub fn new(context: impl Into<String>, kind: ManagedKind, name: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            kind,
            name: name.into(),
        }
    }

    pub fn kind(&self) -> ManagedKind {
        self.kind
    }

    pub fn instance_name(&self) -> &str {
        &self.name
    }
}

impl Display for ManagementName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:type={},name=\"{}\"",
            self.context, self.kind, self.name
        )
    }
}

/// Registry of management objects for one routing context.
///
/// Objects register on start and deregister on stop; deregistration removes
/// exactly the named object, leaving siblings untouched.
pub struct ManagementRegistry {
    context: String,
    objects: RwLock<HashMap<String, ManagementName>>,
}

impl ManagementRegistry {
    pub(crate) fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn register(&self, kind: ManagedKind, name: &str) {
        let object = ManagementName::new(self.context.clone(), kind, name);
        let key = object.to_string();
        debug!(
            event = events::MANAGEMENT_REGISTER,
            component = COMPONENT,
            object = %key,
            "registered management object"
        );
        let mut objects = self.objects.write().expect("management registry poisoned");
        objects.insert(key, object);
    }

    pub(crate) fn deregister(&self, kind: ManagedKind, name: &str) {
        let key = ManagementName::new(self.context.clone(), kind, name).to_string();
        let mut objects = self.objects.write().expect("management registry poisoned");
        if objects.remove(&key).is_some() {
            debug!(
                event = events::MANAGEMENT_DEREGISTER,
                component = COMPONENT,
                object = %key,
                "deregistered management object"
            );
        }
    }

    /// Enumerates objects of one kind, mirroring a `type=<kind>,*` wildcard
    /// query. Names are sorted for stable assertions.
    pub fn query(&self, kind: ManagedKind) -> Vec<ManagementName> {
        let objects = self.objects.read().expect("management registry poisoned");
        let mut matched: Vec<ManagementName> = objects
            .values()
            .filter(|object| object.kind == kind)
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.name.cmp(&b.name));
        matched
    }

    pub fn count(&self, kind: ManagedKind) -> usize {
        let objects = self.objects.read().expect("management registry poisoned");
        objects.values().filter(|object| object.kind == kind).count()
    }

    pub fn total(&self) -> usize {
        self.objects.read().expect("management registry poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::{ManagedKind, ManagementName, ManagementRegistry};

    #[test]
    fn name_format_matches_naming_scheme() {
        let name = ManagementName::new("ctx", ManagedKind::Endpoints, "direct:start");

        assert_eq!(name.to_string(), "ctx:type=endpoints,name=\"direct:start\"");
    }

    #[test]
    fn deregister_removes_exactly_the_named_object() {
        let registry = ManagementRegistry::new("ctx");
        registry.register(ManagedKind::Endpoints, "direct:a");
        registry.register(ManagedKind::Endpoints, "direct:b");
        registry.register(ManagedKind::Routes, "route-1");

        registry.deregister(ManagedKind::Endpoints, "direct:a");

        let survivors = registry.query(ManagedKind::Endpoints);
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].instance_name(), "direct:b");
        assert_eq!(registry.count(ManagedKind::Routes), 1);
    }

    #[test]
    fn query_filters_by_kind_wildcard() {
        let registry = ManagementRegistry::new("ctx");
        registry.register(ManagedKind::Components, "direct");
        registry.register(ManagedKind::Endpoints, "direct:start");

        assert_eq!(registry.count(ManagedKind::Components), 1);
        assert_eq!(registry.count(ManagedKind::Endpoints), 1);
        assert_eq!(registry.total(), 2);
    }

    #[test]
    fn deregistering_an_absent_object_is_a_no_op() {
        let registry = ManagementRegistry::new("ctx");
        registry.register(ManagedKind::Routes, "route-1");

        registry.deregister(ManagedKind::Routes, "route-2");

        assert_eq!(registry.count(ManagedKind::Routes), 1);
    }
}
