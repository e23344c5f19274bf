//! Refcounted endpoint service ownership shared across routes.

use crate::cache::ResolvedEndpoint;
use crate::control_plane::endpoint_identity::EndpointIdentityKey;
use crate::endpoint::ResourceError;
use crate::management::{ManagedKind, ManagementRegistry};
use crate::observability::events;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const COMPONENT: &str = "service_pool";

/// Tracks, per endpoint instance, how many running routes reference it.
///
/// The underlying resource starts on the first referencing route's start and
/// stops only when the last referencing route stops. The refcount is the only
/// mutable shared field; the map lock is held across start/stop so the
/// transition is observed exactly once.
pub(crate) struct ServicePool {
    management: Arc<ManagementRegistry>,
    bindings: Mutex<HashMap<EndpointIdentityKey, usize>>,
}

impl ServicePool {
    pub(crate) fn new(management: Arc<ManagementRegistry>) -> Self {
        Self {
            management,
            bindings: Mutex::new(HashMap::new()),
        }
    }

    /// Attaches one route reference, starting the endpoint resource on the
    /// zero-to-one transition. A failed acquisition inserts nothing, so the
    /// started count never drifts on the error path.
    pub(crate) async fn attach(
        &self,
        endpoint: &Arc<ResolvedEndpoint>,
    ) -> Result<(), ResourceError> {
        let key = EndpointIdentityKey::new(endpoint.clone());
        let mut bindings = self.bindings.lock().await;
        let count = bindings.get(&key).copied().unwrap_or(0);

        if count == 0 {
            endpoint.endpoint().start().await?;
            if endpoint.managed() {
                self.management
                    .register(ManagedKind::Endpoints, endpoint.canonical_uri());
            }
            debug!(
                event = events::ENDPOINT_SERVICE_START,
                component = COMPONENT,
                uri = endpoint.canonical_uri(),
                "endpoint resource started"
            );
        } else {
            debug!(
                event = events::ENDPOINT_SERVICE_REUSE,
                component = COMPONENT,
                uri = endpoint.canonical_uri(),
                ref_count = count,
                "reusing started endpoint resource"
            );
        }
        bindings.insert(key, count + 1);
        Ok(())
    }

    /// Detaches one route reference, stopping the endpoint resource on the
    /// one-to-zero transition. Detaching an untracked endpoint is a no-op.
    pub(crate) async fn detach(
        &self,
        endpoint: &Arc<ResolvedEndpoint>,
    ) -> Result<(), ResourceError> {
        let key = EndpointIdentityKey::new(endpoint.clone());
        let mut bindings = self.bindings.lock().await;
        let Some(count) = bindings.get_mut(&key) else {
            warn!(
                component = COMPONENT,
                uri = endpoint.canonical_uri(),
                "detach for untracked endpoint"
            );
            return Ok(());
        };

        *count -= 1;
        if *count == 0 {
            bindings.remove(&key);
            endpoint.endpoint().stop().await?;
            if endpoint.managed() {
                self.management
                    .deregister(ManagedKind::Endpoints, endpoint.canonical_uri());
            }
            debug!(
                event = events::ENDPOINT_SERVICE_STOP,
                component = COMPONENT,
                uri = endpoint.canonical_uri(),
                "endpoint resource stopped"
            );
        }
        Ok(())
    }

    /// Number of endpoint resources currently started.
    pub(crate) async fn started_count(&self) -> usize {
        self.bindings.lock().await.len()
    }
}
