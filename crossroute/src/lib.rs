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

//! # crossroute
//!
//! `crossroute` wires message routes over pluggable transport components:
//! endpoints are addressed by configuration string, resolved and cached by a
//! [`RoutingContext`], and connected into routes whose lifecycle the context
//! manages.
//!
//! Typical usage is API-first and remains centered on [`RoutingContext`] and
//! [`RouteBuilder`]. Internal modules are organized by domain layer to keep
//! behavior ownership explicit.
//!
//! ## Quick start
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use crossroute::components::{DirectComponent, MockComponent};
//! use crossroute::{RouteBuilder, RoutingContext};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let context = RoutingContext::new("quick-start");
//! let mock = MockComponent::new();
//! context.register_component("direct", Arc::new(DirectComponent));
//! context.register_component("mock", mock.clone());
//!
//! let sink = mock.endpoint("result");
//! sink.expect_bodies_received(&["Hello World"]);
//!
//! context
//!     .add_route(
//!         RouteBuilder::from("direct:start")
//!             .set_body(|_| "Hello World".to_string())
//!             .to("mock:result"),
//!     )
//!     .await
//!     .unwrap();
//! context.start().await.unwrap();
//!
//! context.send_body("direct:start", ()).await.unwrap();
//!
//! sink.assert_satisfied(Duration::from_secs(1)).await;
//! context.stop().await.unwrap();
//! # });
//! ```
//!
//! ## Endpoint identity
//!
//! Configuration strings follow `scheme:path?key=value&key=value`. Two
//! strings that differ only in parameter order address the same endpoint: the
//! context canonicalizes the string and constructs at most one endpoint
//! instance per canonical form. `{{name}}` placeholders substitute from
//! context properties before parsing, and an unresolved placeholder is an
//! error, never an empty string.
//!
//! ## Internal architecture map
//!
//! - Config: configuration-string parsing, canonical identity, placeholders
//! - Component layer: scheme registry and endpoint factories
//! - Control plane: route lifecycle state machine and refcounted endpoint
//!   service ownership
//! - Runtime: compiled pipelines and exchange propagation
//! - Management: introspectable objects for components, endpoints, and routes
//!
//! ## Observability model
//!
//! The workspace uses `tracing` for logs/events.
//! Library code emits events/spans and does not unconditionally initialize a
//! global subscriber. Binaries and tests are responsible for one-time
//! `tracing_subscriber` initialization at process boundaries.

mod cache;
pub use cache::ResolvedEndpoint;

mod component;
pub use component::{Component, ComponentRegistry, ComponentSetup, ResolutionError};

pub mod components;

pub mod config;

mod context;
pub use context::{AddRouteError, RoutingContext, SendError};

mod control_plane;
pub use control_plane::{LifecycleError, RouteState, StopPolicy};

mod convert;
pub use convert::TypeConverterRegistry;

mod endpoint;
pub use endpoint::{
    Consumer, Endpoint, ExchangeHandler, Producer, ResourceError, UnsupportedOperationError,
};

mod exchange;
pub use exchange::{BodyValue, Exchange, HeaderValue, Message, TransportFailure};

mod management;
pub use management::{ManagedKind, ManagementName, ManagementRegistry};

#[doc(hidden)]
pub mod observability;

mod route;
pub use route::{ChainBuilder, ChoiceBuilder, CompletionListener, Predicate, RouteBuilder};

mod runtime;
pub use runtime::Processor;
