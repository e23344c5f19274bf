//! Canonical-URI endpoint cache with construct-once semantics.

use crate::component::ResolutionError;
use crate::endpoint::Endpoint;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::observability::events;

const COMPONENT: &str = "endpoint_cache";

/// A cached, resolved endpoint plus the core-level options stripped from its
/// configuration string before the component saw it.
pub struct ResolvedEndpoint {
    endpoint: Arc<dyn Endpoint>,
    canonical_uri: String,
    managed: bool,
    singleton: bool,
}

impl ResolvedEndpoint {
    pub(crate) fn new(
        endpoint: Arc<dyn Endpoint>,
        canonical_uri: String,
        managed: bool,
        singleton: bool,
    ) -> Self {
        Self {
            endpoint,
            canonical_uri,
            managed,
            singleton,
        }
    }

    pub fn endpoint(&self) -> &Arc<dyn Endpoint> {
        &self.endpoint
    }

    pub fn canonical_uri(&self) -> &str {
        &self.canonical_uri
    }

    /// Whether this endpoint registers a management object when its resource
    /// starts (`managed=false` opts out).
    pub fn managed(&self) -> bool {
        self.managed
    }

    pub fn singleton(&self) -> bool {
        self.singleton
    }
}

impl Debug for ResolvedEndpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedEndpoint")
            .field("uri", &self.canonical_uri)
            .field("managed", &self.managed)
            .field("singleton", &self.singleton)
            .finish()
    }
}

/// Singleton-per-URI endpoint storage owned by one routing context.
///
/// The map lock is held across construction so at most one endpoint instance
/// is ever observable for a given canonical key, also under concurrent
/// resolution of the same key.
pub(crate) struct EndpointCache {
    entries: Mutex<HashMap<String, Arc<ResolvedEndpoint>>>,
}

impl EndpointCache {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) async fn get_or_create<F>(
        &self,
        canonical: &str,
        construct: F,
    ) -> Result<Arc<ResolvedEndpoint>, ResolutionError>
    where
        F: FnOnce() -> Result<ResolvedEndpoint, ResolutionError>,
    {
        let mut entries = self.entries.lock().await;
        if let Some(existing) = entries.get(canonical) {
            debug!(
                event = events::ENDPOINT_CACHE_HIT,
                component = COMPONENT,
                uri = canonical,
                "returning cached endpoint"
            );
            return Ok(existing.clone());
        }

        let resolved = Arc::new(construct()?);
        if resolved.singleton() {
            entries.insert(canonical.to_string(), resolved.clone());
        }
        debug!(
            event = events::ENDPOINT_CACHE_INSERT,
            component = COMPONENT,
            uri = canonical,
            singleton = resolved.singleton(),
            "constructed endpoint"
        );
        Ok(resolved)
    }

    pub(crate) async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub(crate) async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{EndpointCache, ResolvedEndpoint};
    use crate::endpoint::{
        Consumer, Endpoint, ExchangeHandler, Producer, UnsupportedOperationError,
    };
    use std::sync::Arc;

    struct NullEndpoint {
        uri: String,
    }

    impl Endpoint for NullEndpoint {
        fn uri(&self) -> &str {
            &self.uri
        }

        fn create_producer(&self) -> Result<Arc<dyn Producer>, UnsupportedOperationError> {
            Err(UnsupportedOperationError::producer(&self.uri))
        }

        fn create_consumer(
            &self,
            _handler: Arc<dyn ExchangeHandler>,
        ) -> Result<Arc<dyn Consumer>, UnsupportedOperationError> {
            Err(UnsupportedOperationError::consumer(&self.uri))
        }
    }

    fn resolved(uri: &str, singleton: bool) -> ResolvedEndpoint {
        ResolvedEndpoint::new(
            Arc::new(NullEndpoint {
                uri: uri.to_string(),
            }),
            uri.to_string(),
            true,
            singleton,
        )
    }

    #[tokio::test]
    async fn identical_key_returns_identical_instance() {
        let cache = EndpointCache::new();

        let first = cache
            .get_or_create("null:a", || Ok(resolved("null:a", true)))
            .await
            .expect("resolve");
        let second = cache
            .get_or_create("null:a", || panic!("must not construct twice"))
            .await
            .expect("resolve");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn distinct_keys_construct_distinct_instances() {
        let cache = EndpointCache::new();

        let a = cache
            .get_or_create("null:a", || Ok(resolved("null:a", true)))
            .await
            .expect("resolve");
        let b = cache
            .get_or_create("null:a?x=1", || Ok(resolved("null:a?x=1", true)))
            .await
            .expect("resolve");

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len().await, 2);
    }

    #[test]
    fn debug_output_names_the_endpoint_identity() {
        let formatted = format!("{:?}", resolved("null:a?x=1", true));

        assert!(formatted.contains("null:a?x=1"));
        assert!(formatted.contains("managed: true"));
    }

    #[tokio::test]
    async fn non_singleton_endpoints_bypass_the_cache() {
        let cache = EndpointCache::new();

        let first = cache
            .get_or_create("null:a", || Ok(resolved("null:a", false)))
            .await
            .expect("resolve");
        let second = cache
            .get_or_create("null:a", || Ok(resolved("null:a", false)))
            .await
            .expect("resolve");

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len().await, 0);
    }
}
