//! Route lifecycle orchestration: state machine, start/stop ordering, and
//! stop-time draining.

use crate::cache::ResolvedEndpoint;
use crate::control_plane::ServicePool;
use crate::endpoint::{Consumer, ResourceError};
use crate::management::{ManagedKind, ManagementRegistry};
use crate::observability::events;
use crate::runtime::Pipeline;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const COMPONENT: &str = "route_controller";

/// Route lifecycle states.
///
/// `Suspended` differs from `Stopped`: suspension pauses the consumer's
/// listening activity while its underlying resource stays acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteState {
    Stopped,
    Starting,
    Started,
    Stopping,
    Suspending,
    Suspended,
    Resuming,
}

impl Display for RouteState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RouteState::Stopped => "Stopped",
            RouteState::Starting => "Starting",
            RouteState::Started => "Started",
            RouteState::Stopping => "Stopping",
            RouteState::Suspending => "Suspending",
            RouteState::Suspended => "Suspended",
            RouteState::Resuming => "Resuming",
        };
        write!(f, "{label}")
    }
}

/// How long a stopping route waits for in-flight exchanges before abandoning
/// them.
#[derive(Debug, Clone, Copy)]
pub struct StopPolicy {
    pub grace: Duration,
}

impl Default for StopPolicy {
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(5),
        }
    }
}

/// Lifecycle transition failures. Idempotent no-ops (stop on stopped) are
/// not errors; the refcount discipline prevents ordering violations.
#[derive(Debug)]
pub enum LifecycleError {
    UnknownRoute(String),
    InvalidTransition {
        route: String,
        from: RouteState,
        attempted: &'static str,
    },
    Resource(ResourceError),
}

impl Display for LifecycleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleError::UnknownRoute(id) => write!(f, "no route with id {id}"),
            LifecycleError::InvalidTransition {
                route,
                from,
                attempted,
            } => write!(f, "route {route} cannot {attempted} from state {from}"),
            LifecycleError::Resource(err) => write!(f, "endpoint resource failure: {err}"),
        }
    }
}

impl Error for LifecycleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LifecycleError::Resource(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResourceError> for LifecycleError {
    fn from(err: ResourceError) -> Self {
        LifecycleError::Resource(err)
    }
}

/// One compiled route plus its lifecycle state.
pub(crate) struct RouteRuntime {
    pub(crate) id: String,
    pub(crate) consumer_endpoint: Arc<ResolvedEndpoint>,
    pub(crate) producer_endpoints: Vec<Arc<ResolvedEndpoint>>,
    pub(crate) pipeline: Arc<Pipeline>,
    pub(crate) consumer: Arc<dyn Consumer>,
    pub(crate) state: Mutex<RouteState>,
}

/// Starts and stops routes in dependency order and keeps management state in
/// step with every transition.
pub(crate) struct RouteController {
    routes: Mutex<Vec<Arc<RouteRuntime>>>,
    service_pool: ServicePool,
    management: Arc<ManagementRegistry>,
    stop_policy: StopPolicy,
}

impl RouteController {
    pub(crate) fn new(management: Arc<ManagementRegistry>, stop_policy: StopPolicy) -> Self {
        Self {
            routes: Mutex::new(Vec::new()),
            service_pool: ServicePool::new(management.clone()),
            management,
            stop_policy,
        }
    }

    /// Adds a compiled route. Returns `false` when the id is already taken.
    pub(crate) async fn insert(&self, route: RouteRuntime) -> bool {
        let mut routes = self.routes.lock().await;
        if routes.iter().any(|existing| existing.id == route.id) {
            return false;
        }
        routes.push(Arc::new(route));
        true
    }

    pub(crate) async fn route_ids(&self) -> Vec<String> {
        let routes = self.routes.lock().await;
        routes.iter().map(|route| route.id.clone()).collect()
    }

    pub(crate) async fn started_endpoint_count(&self) -> usize {
        self.service_pool.started_count().await
    }

    async fn find(&self, id: &str) -> Result<Arc<RouteRuntime>, LifecycleError> {
        let routes = self.routes.lock().await;
        routes
            .iter()
            .find(|route| route.id == id)
            .cloned()
            .ok_or_else(|| LifecycleError::UnknownRoute(id.to_string()))
    }

    pub(crate) async fn route_state(&self, id: &str) -> Result<RouteState, LifecycleError> {
        let route = self.find(id).await?;
        let state = route.state.lock().await;
        Ok(*state)
    }

    /// Starts the route: consumer endpoint first, then producer endpoints in
    /// declaration order, then the listening activity. Rolls back attached
    /// services when a later step fails.
    pub(crate) async fn start_route(&self, id: &str) -> Result<(), LifecycleError> {
        let route = self.find(id).await?;
        let mut state = route.state.lock().await;
        match *state {
            RouteState::Started => return Ok(()),
            RouteState::Stopped => {}
            from => {
                return Err(LifecycleError::InvalidTransition {
                    route: id.to_string(),
                    from,
                    attempted: "start",
                });
            }
        }
        *state = RouteState::Starting;

        let mut attached: Vec<Arc<ResolvedEndpoint>> = Vec::new();
        let startup = async {
            self.service_pool.attach(&route.consumer_endpoint).await?;
            attached.push(route.consumer_endpoint.clone());
            for endpoint in &route.producer_endpoints {
                self.service_pool.attach(endpoint).await?;
                attached.push(endpoint.clone());
            }
            route.consumer.start().await?;
            Ok::<(), ResourceError>(())
        }
        .await;

        if let Err(err) = startup {
            warn!(
                event = events::ROUTE_START_FAILED,
                component = COMPONENT,
                route_id = id,
                err = %err,
                "route start failed, rolling back attached services"
            );
            self.rollback(&attached).await;
            *state = RouteState::Stopped;
            return Err(err.into());
        }

        self.management.register(ManagedKind::Routes, id);
        *state = RouteState::Started;
        debug!(
            event = events::ROUTE_START_OK,
            component = COMPONENT,
            route_id = id,
            "route started"
        );
        Ok(())
    }

    async fn rollback(&self, attached: &[Arc<ResolvedEndpoint>]) {
        for endpoint in attached.iter().rev() {
            if let Err(err) = self.service_pool.detach(endpoint).await {
                warn!(
                    component = COMPONENT,
                    uri = endpoint.canonical_uri(),
                    err = %err,
                    "unable to detach endpoint during rollback"
                );
            }
        }
    }

    /// Stops the route: stop accepting input, drain in-flight exchanges up
    /// to the grace period, then release services in reverse start order.
    /// Stop on an already-stopped route is a no-op.
    pub(crate) async fn stop_route(&self, id: &str) -> Result<(), LifecycleError> {
        let route = self.find(id).await?;
        let mut state = route.state.lock().await;
        match *state {
            RouteState::Stopped => return Ok(()),
            RouteState::Started | RouteState::Suspended => {}
            from => {
                return Err(LifecycleError::InvalidTransition {
                    route: id.to_string(),
                    from,
                    attempted: "stop",
                });
            }
        }
        *state = RouteState::Stopping;

        if let Err(err) = route.consumer.stop().await {
            warn!(
                component = COMPONENT,
                route_id = id,
                err = %err,
                "consumer stop reported an error"
            );
        }

        if !route.pipeline.inflight().drain(self.stop_policy.grace).await {
            warn!(
                event = events::ROUTE_STOP_DRAIN_TIMEOUT,
                component = COMPONENT,
                route_id = id,
                remaining = route.pipeline.inflight().current(),
                "grace period elapsed, abandoning in-flight exchanges"
            );
        }

        for endpoint in route.producer_endpoints.iter().rev() {
            if let Err(err) = self.service_pool.detach(endpoint).await {
                warn!(
                    component = COMPONENT,
                    uri = endpoint.canonical_uri(),
                    err = %err,
                    "unable to detach producer endpoint"
                );
            }
        }
        if let Err(err) = self.service_pool.detach(&route.consumer_endpoint).await {
            warn!(
                component = COMPONENT,
                uri = route.consumer_endpoint.canonical_uri(),
                err = %err,
                "unable to detach consumer endpoint"
            );
        }

        self.management.deregister(ManagedKind::Routes, id);
        *state = RouteState::Stopped;
        debug!(
            event = events::ROUTE_STOP_OK,
            component = COMPONENT,
            route_id = id,
            "route stopped"
        );
        Ok(())
    }

    /// Pauses the consumer's listening activity; the underlying endpoint
    /// resource stays acquired.
    pub(crate) async fn suspend_route(&self, id: &str) -> Result<(), LifecycleError> {
        let route = self.find(id).await?;
        let mut state = route.state.lock().await;
        match *state {
            RouteState::Suspended => return Ok(()),
            RouteState::Started => {}
            from => {
                return Err(LifecycleError::InvalidTransition {
                    route: id.to_string(),
                    from,
                    attempted: "suspend",
                });
            }
        }
        *state = RouteState::Suspending;

        if let Err(err) = route.consumer.suspend().await {
            *state = RouteState::Started;
            return Err(err.into());
        }

        *state = RouteState::Suspended;
        debug!(
            event = events::ROUTE_SUSPEND_OK,
            component = COMPONENT,
            route_id = id,
            "route suspended"
        );
        Ok(())
    }

    pub(crate) async fn resume_route(&self, id: &str) -> Result<(), LifecycleError> {
        let route = self.find(id).await?;
        let mut state = route.state.lock().await;
        match *state {
            RouteState::Started => return Ok(()),
            RouteState::Suspended => {}
            from => {
                return Err(LifecycleError::InvalidTransition {
                    route: id.to_string(),
                    from,
                    attempted: "resume",
                });
            }
        }
        *state = RouteState::Resuming;

        if let Err(err) = route.consumer.resume().await {
            *state = RouteState::Suspended;
            return Err(err.into());
        }

        *state = RouteState::Started;
        debug!(
            event = events::ROUTE_RESUME_OK,
            component = COMPONENT,
            route_id = id,
            "route resumed"
        );
        Ok(())
    }

    pub(crate) async fn start_all(&self) -> Result<(), LifecycleError> {
        for id in self.route_ids().await {
            self.start_route(&id).await?;
        }
        Ok(())
    }

    /// Stops all routes in reverse declaration order.
    pub(crate) async fn stop_all(&self) -> Result<(), LifecycleError> {
        let mut ids = self.route_ids().await;
        ids.reverse();
        for id in ids {
            self.stop_route(&id).await?;
        }
        Ok(())
    }
}
