/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! The routing context: the owning scope for components, resolved endpoints,
//! routes, and their shared lifecycle.
//!
//! Resolution walks configuration string -> placeholder substitution ->
//! parse -> component factory -> cached endpoint. Route declarations compile
//! against resolved endpoints once, at [`RoutingContext::add_route`] time, so
//! every addressing failure surfaces before any exchange flows.

use crate::cache::{EndpointCache, ResolvedEndpoint};
use crate::component::{Component, ComponentRegistry, ComponentSetup, ResolutionError};
use crate::config::{resolve_placeholders, EndpointUri};
use crate::control_plane::{LifecycleError, RouteController, RouteRuntime, RouteState, StopPolicy};
use crate::convert::TypeConverterRegistry;
use crate::endpoint::UnsupportedOperationError;
use crate::exchange::Exchange;
use crate::management::{ManagedKind, ManagementRegistry};
use crate::observability::events;
use crate::route::{RouteBuilder, StepDefinition};
use crate::runtime::{Pipeline, Step};
use futures::future::BoxFuture;
use std::any::Any;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, warn};

const COMPONENT: &str = "routing_context";

/// Route-declaration failures, reported before the route is registered.
#[derive(Debug)]
pub enum AddRouteError {
    DuplicateRouteId(String),
    Resolution(ResolutionError),
    UnsupportedOperation(UnsupportedOperationError),
}

impl Display for AddRouteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AddRouteError::DuplicateRouteId(id) => {
                write!(f, "a route with id {id} already exists")
            }
            AddRouteError::Resolution(err) => write!(f, "{err}"),
            AddRouteError::UnsupportedOperation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AddRouteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AddRouteError::Resolution(err) => Some(err),
            AddRouteError::UnsupportedOperation(err) => Some(err),
            AddRouteError::DuplicateRouteId(_) => None,
        }
    }
}

impl From<ResolutionError> for AddRouteError {
    fn from(err: ResolutionError) -> Self {
        AddRouteError::Resolution(err)
    }
}

impl From<UnsupportedOperationError> for AddRouteError {
    fn from(err: UnsupportedOperationError) -> Self {
        AddRouteError::UnsupportedOperation(err)
    }
}

/// Failures sending an exchange directly to an endpoint from outside a route.
#[derive(Debug)]
pub enum SendError {
    Resolution(ResolutionError),
    UnsupportedOperation(UnsupportedOperationError),
}

impl Display for SendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SendError::Resolution(err) => write!(f, "{err}"),
            SendError::UnsupportedOperation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SendError::Resolution(err) => Some(err),
            SendError::UnsupportedOperation(err) => Some(err),
        }
    }
}

impl From<ResolutionError> for SendError {
    fn from(err: ResolutionError) -> Self {
        SendError::Resolution(err)
    }
}

impl From<UnsupportedOperationError> for SendError {
    fn from(err: UnsupportedOperationError) -> Self {
        SendError::UnsupportedOperation(err)
    }
}

/// One routing scope: its own component bindings, endpoint cache, routes,
/// type converters, and management objects. Contexts are independent; nothing
/// is shared between two contexts unless explicitly passed to both.
pub struct RoutingContext {
    name: String,
    components: ComponentRegistry,
    cache: EndpointCache,
    converters: Arc<TypeConverterRegistry>,
    properties: RwLock<HashMap<String, String>>,
    management: Arc<ManagementRegistry>,
    controller: RouteController,
    route_counter: AtomicUsize,
}

impl RoutingContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_stop_policy(name, StopPolicy::default())
    }

    pub fn with_stop_policy(name: impl Into<String>, stop_policy: StopPolicy) -> Self {
        let name = name.into();
        let management = Arc::new(ManagementRegistry::new(&name));
        Self {
            name,
            components: ComponentRegistry::new(),
            cache: EndpointCache::new(),
            converters: Arc::new(TypeConverterRegistry::new()),
            properties: RwLock::new(HashMap::new()),
            management: management.clone(),
            controller: RouteController::new(management, stop_policy),
            route_counter: AtomicUsize::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Binds a scheme to a component and exposes it as a management object.
    pub fn register_component(&self, scheme: impl Into<String>, component: Arc<dyn Component>) {
        let scheme = scheme.into();
        self.components.register(scheme.clone(), component);
        self.management.register(ManagedKind::Components, &scheme);
    }

    /// Sets a property consulted by `{{name}}` placeholder substitution.
    pub fn set_property(&self, name: impl Into<String>, value: impl Into<String>) {
        let mut properties = self.properties.write().expect("property store poisoned");
        properties.insert(name.into(), value.into());
    }

    pub fn converters(&self) -> &Arc<TypeConverterRegistry> {
        &self.converters
    }

    pub fn management(&self) -> &Arc<ManagementRegistry> {
        &self.management
    }

    /// Resolves a configuration string to an endpoint, constructing it on
    /// first use and returning the cached instance afterwards.
    ///
    /// The canonical form of the full string, core-level options included, is
    /// the cache key; `managed` and `singleton` are stripped before the
    /// component sees the parameters.
    pub async fn resolve_endpoint(
        &self,
        uri: &str,
    ) -> Result<Arc<ResolvedEndpoint>, ResolutionError> {
        debug!(
            event = events::ENDPOINT_RESOLVE_START,
            component = COMPONENT,
            uri,
            "resolving endpoint"
        );
        let result = self.resolve_inner(uri).await;
        if let Err(err) = &result {
            warn!(
                event = events::ENDPOINT_RESOLVE_FAILED,
                component = COMPONENT,
                uri,
                err = %err,
                "endpoint resolution failed"
            );
        }
        result
    }

    async fn resolve_inner(&self, uri: &str) -> Result<Arc<ResolvedEndpoint>, ResolutionError> {
        let resolved_text = {
            let properties = self.properties.read().expect("property store poisoned");
            resolve_placeholders(uri, &*properties)?
        };
        let mut parsed = EndpointUri::parse(&resolved_text)?;

        let managed = parsed
            .parameters_mut()
            .take_bool("managed")?
            .unwrap_or(true);
        let singleton = parsed
            .parameters_mut()
            .take_bool("singleton")?
            .unwrap_or(true);

        let scheme = parsed.scheme().to_string();
        let component = self
            .components
            .lookup(&scheme)
            .ok_or_else(|| ResolutionError::UnknownScheme(scheme.clone()))?;

        let canonical = parsed.canonical().to_string();
        let setup = ComponentSetup::new(self.converters.clone());
        self.cache
            .get_or_create(&canonical, || {
                let endpoint = component.create_endpoint(&mut parsed, &setup)?;
                if !parsed.parameters().is_empty() {
                    return Err(ResolutionError::UnsupportedParameters {
                        scheme,
                        names: parsed.parameters().names(),
                    });
                }
                Ok(ResolvedEndpoint::new(
                    endpoint,
                    canonical.clone(),
                    managed,
                    singleton,
                ))
            })
            .await
    }

    /// Compiles and registers a route declaration. Every endpoint in the
    /// declaration is resolved here; the returned id addresses the route in
    /// later lifecycle calls.
    pub async fn add_route(&self, builder: RouteBuilder) -> Result<String, AddRouteError> {
        let id = match builder.route_id {
            Some(id) => id,
            None => format!("route-{}", self.route_counter.fetch_add(1, Ordering::SeqCst) + 1),
        };
        if self.controller.route_ids().await.contains(&id) {
            return Err(AddRouteError::DuplicateRouteId(id));
        }

        let consumer_endpoint = self.resolve_endpoint(&builder.from_uri).await?;

        let mut producer_endpoints = Vec::new();
        let steps = self
            .compile_steps(builder.chain.into_steps(), &mut producer_endpoints)
            .await?;
        let on_failure = match builder.on_failure {
            Some(chain) => Some(
                self.compile_steps(chain.into_steps(), &mut producer_endpoints)
                    .await?,
            ),
            None => None,
        };

        let pipeline = Arc::new(Pipeline::new(id.clone(), steps, on_failure, builder.completion));
        let consumer = consumer_endpoint
            .endpoint()
            .create_consumer(pipeline.clone())?;

        let inserted = self
            .controller
            .insert(RouteRuntime {
                id: id.clone(),
                consumer_endpoint,
                producer_endpoints,
                pipeline,
                consumer,
                state: Mutex::new(RouteState::Stopped),
            })
            .await;
        if !inserted {
            return Err(AddRouteError::DuplicateRouteId(id));
        }
        Ok(id)
    }

    fn compile_steps<'a>(
        &'a self,
        definitions: Vec<StepDefinition>,
        producers: &'a mut Vec<Arc<ResolvedEndpoint>>,
    ) -> BoxFuture<'a, Result<Vec<Step>, AddRouteError>> {
        Box::pin(async move {
            let mut steps = Vec::with_capacity(definitions.len());
            for definition in definitions {
                match definition {
                    StepDefinition::Process(processor) => steps.push(Step::Process(processor)),
                    StepDefinition::To(uri) => {
                        let resolved = self.resolve_endpoint(&uri).await?;
                        let producer = resolved.endpoint().create_producer()?;
                        steps.push(Step::Produce {
                            uri: resolved.canonical_uri().to_string(),
                            producer,
                        });
                        producers.push(resolved);
                    }
                    StepDefinition::Choice(choice) => {
                        let mut branches = Vec::with_capacity(choice.branches.len());
                        for (predicate, branch) in choice.branches {
                            let compiled = self.compile_steps(branch, &mut *producers).await?;
                            branches.push((predicate, compiled));
                        }
                        let fallback = match choice.otherwise {
                            Some(chain) => {
                                Some(self.compile_steps(chain, &mut *producers).await?)
                            }
                            None => None,
                        };
                        steps.push(Step::Choice { branches, fallback });
                    }
                }
            }
            Ok(steps)
        })
    }

    /// Starts every route in declaration order.
    pub async fn start(&self) -> Result<(), LifecycleError> {
        self.controller.start_all().await
    }

    /// Stops every route in reverse declaration order, then releases the
    /// context's own management objects and cached endpoints.
    pub async fn stop(&self) -> Result<(), LifecycleError> {
        self.controller.stop_all().await?;
        for scheme in self.components.schemes() {
            self.management.deregister(ManagedKind::Components, &scheme);
        }
        self.cache.clear().await;
        Ok(())
    }

    pub async fn start_route(&self, id: &str) -> Result<(), LifecycleError> {
        self.controller.start_route(id).await
    }

    pub async fn stop_route(&self, id: &str) -> Result<(), LifecycleError> {
        self.controller.stop_route(id).await
    }

    pub async fn suspend_route(&self, id: &str) -> Result<(), LifecycleError> {
        self.controller.suspend_route(id).await
    }

    pub async fn resume_route(&self, id: &str) -> Result<(), LifecycleError> {
        self.controller.resume_route(id).await
    }

    pub async fn route_state(&self, id: &str) -> Result<RouteState, LifecycleError> {
        self.controller.route_state(id).await
    }

    pub async fn route_ids(&self) -> Vec<String> {
        self.controller.route_ids().await
    }

    /// Number of endpoint resources currently started across all routes.
    pub async fn started_endpoint_count(&self) -> usize {
        self.controller.started_endpoint_count().await
    }

    /// Sends a body straight to an endpoint, outside any route. The returned
    /// exchange carries the outcome, failure included.
    pub async fn send_body<T: Any + Send + Sync>(
        &self,
        uri: &str,
        body: T,
    ) -> Result<Exchange, SendError> {
        self.send_with(uri, Exchange::with_body(body)).await
    }

    /// Sends a caller-built exchange straight to an endpoint.
    pub async fn send_with(&self, uri: &str, mut exchange: Exchange) -> Result<Exchange, SendError> {
        let resolved = self.resolve_endpoint(uri).await?;
        let producer = resolved.endpoint().create_producer()?;
        producer.process(&mut exchange).await;
        Ok(exchange)
    }
}

#[cfg(test)]
mod tests {
    use super::{AddRouteError, RoutingContext};
    use crate::component::{Component, ComponentSetup, ResolutionError};
    use crate::components::{DirectComponent, MockComponent};
    use crate::config::EndpointUri;
    use crate::control_plane::RouteState;
    use crate::endpoint::{
        Consumer, Endpoint, ExchangeHandler, Producer, UnsupportedOperationError,
    };
    use crate::management::ManagedKind;
    use crate::route::RouteBuilder;
    use std::sync::Arc;
    use std::time::Duration;

    fn context() -> (RoutingContext, Arc<MockComponent>) {
        let context = RoutingContext::new("test-ctx");
        let mock = MockComponent::new();
        context.register_component("direct", Arc::new(DirectComponent));
        context.register_component("mock", mock.clone());
        (context, mock)
    }

    struct TunedEndpoint {
        uri: String,
    }

    impl Endpoint for TunedEndpoint {
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

    /// Consumes `retain` and `size` so parameterized strings resolve cleanly.
    struct TunedComponent;

    impl Component for TunedComponent {
        fn create_endpoint(
            &self,
            uri: &mut EndpointUri,
            _setup: &ComponentSetup,
        ) -> Result<Arc<dyn Endpoint>, ResolutionError> {
            let _ = uri.parameters_mut().take_bool("retain")?;
            let _ = uri.parameters_mut().take_usize("size")?;
            Ok(Arc::new(TunedEndpoint {
                uri: uri.path().to_string(),
            }))
        }
    }

    #[tokio::test]
    async fn equivalent_strings_resolve_to_the_same_instance() {
        let (context, _) = context();
        context.register_component("tuned", Arc::new(TunedComponent));

        let a = context
            .resolve_endpoint("tuned:result?retain=true&size=5")
            .await
            .expect("resolve");
        let b = context
            .resolve_endpoint("tuned:result?size=5&retain=true")
            .await
            .expect("resolve");

        assert!(Arc::ptr_eq(&a, &b));

        // A differing value is a different identity.
        let c = context
            .resolve_endpoint("tuned:result?retain=true&size=9")
            .await
            .expect("resolve");
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[tokio::test]
    async fn unknown_scheme_is_a_resolution_error() {
        let (context, _) = context();

        assert!(matches!(
            context.resolve_endpoint("bogus:thing").await,
            Err(ResolutionError::UnknownScheme(scheme)) if scheme == "bogus"
        ));
    }

    #[tokio::test]
    async fn leftover_parameters_are_reported_as_unsupported() {
        let (context, _) = context();

        let err = context
            .resolve_endpoint("direct:start?bogus=1")
            .await
            .expect_err("must fail");

        assert!(matches!(
            err,
            ResolutionError::UnsupportedParameters { scheme, names }
                if scheme == "direct" && names == vec!["bogus".to_string()]
        ));
    }

    #[tokio::test]
    async fn placeholders_resolve_from_context_properties() {
        let (context, _) = context();
        context.set_property("sink", "result");

        let endpoint = context
            .resolve_endpoint("mock:{{sink}}")
            .await
            .expect("resolve");

        assert_eq!(endpoint.canonical_uri(), "mock:result");
    }

    #[tokio::test]
    async fn unresolved_placeholder_fails_resolution() {
        let (context, _) = context();

        assert!(context.resolve_endpoint("mock:{{missing}}").await.is_err());
    }

    #[tokio::test]
    async fn managed_and_singleton_are_core_options_invisible_to_components() {
        let (context, _) = context();

        let opted_out = context
            .resolve_endpoint("direct:a?managed=false")
            .await
            .expect("resolve");
        let plain = context.resolve_endpoint("direct:a").await.expect("resolve");

        assert!(!opted_out.managed());
        assert!(plain.managed());
        // The option is part of the identity: these are distinct endpoints.
        assert!(!Arc::ptr_eq(&opted_out, &plain));
    }

    #[tokio::test]
    async fn route_ids_are_generated_when_unset() {
        let (context, _) = context();

        let first = context
            .add_route(RouteBuilder::from("direct:a").to("mock:a"))
            .await
            .expect("add");
        let second = context
            .add_route(RouteBuilder::from("direct:b").to("mock:b"))
            .await
            .expect("add");

        assert_eq!(first, "route-1");
        assert_eq!(second, "route-2");
    }

    #[tokio::test]
    async fn duplicate_route_id_is_rejected() {
        let (context, _) = context();
        context
            .add_route(RouteBuilder::from("direct:a").route_id("dup").to("mock:a"))
            .await
            .expect("add");

        let err = context
            .add_route(RouteBuilder::from("direct:b").route_id("dup").to("mock:b"))
            .await
            .expect_err("must fail");

        assert!(matches!(err, AddRouteError::DuplicateRouteId(id) if id == "dup"));
    }

    #[tokio::test]
    async fn consume_from_a_produce_only_endpoint_fails_route_declaration() {
        let (context, _) = context();

        let err = context
            .add_route(RouteBuilder::from("mock:sink").to("mock:out"))
            .await
            .expect_err("must fail");

        assert!(matches!(err, AddRouteError::UnsupportedOperation(_)));
    }

    #[tokio::test]
    async fn exchange_flows_from_entry_to_sink() {
        let (context, mock) = context();
        let sink = mock.endpoint("result");
        sink.expect_bodies_received(&["Hello World"]);

        context
            .add_route(
                RouteBuilder::from("direct:start")
                    .set_body(|_| "Hello World".to_string())
                    .to("mock:result"),
            )
            .await
            .expect("add");
        context.start().await.expect("start");

        context
            .send_body("direct:start", ())
            .await
            .expect("send");

        sink.assert_satisfied(Duration::from_millis(200)).await;
        context.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn context_registers_management_objects_per_kind() {
        let (context, _) = context();
        context
            .add_route(RouteBuilder::from("direct:start").to("mock:result"))
            .await
            .expect("add");
        context.start().await.expect("start");

        assert_eq!(context.management().count(ManagedKind::Components), 2);
        assert_eq!(context.management().count(ManagedKind::Endpoints), 2);
        assert_eq!(context.management().count(ManagedKind::Routes), 1);
        assert_eq!(
            context.route_state("route-1").await.expect("state"),
            RouteState::Started
        );

        context.stop().await.expect("stop");
        assert_eq!(context.management().total(), 0);
    }
}
