//! Endpoint identity keying used by service ownership.

use crate::cache::ResolvedEndpoint;
use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identity key over the resolved-endpoint instance. Cache singletons share
/// one instance per canonical URI, so instance identity is service identity.
#[derive(Clone)]
pub(crate) struct EndpointIdentityKey {
    endpoint: Arc<ResolvedEndpoint>,
}

impl EndpointIdentityKey {
    pub(crate) fn new(endpoint: Arc<ResolvedEndpoint>) -> Self {
        Self { endpoint }
    }
}

impl Hash for EndpointIdentityKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.endpoint).hash(state);
    }
}

impl PartialEq for EndpointIdentityKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.endpoint, &other.endpoint)
    }
}

impl Eq for EndpointIdentityKey {}

impl Debug for EndpointIdentityKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointIdentityKey")
            .field("uri", &self.endpoint.canonical_uri())
            .finish()
    }
}
