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

//! Capability contracts implemented by transport adapters.
//!
//! An [`Endpoint`] is one resolved, cached, lifecycle-managed address. It
//! creates [`Producer`]s (send out) and [`Consumer`]s (receive in); adapters
//! implement the directions they support and reject the other with
//! [`UnsupportedOperationError`]. Adapters implement these traits directly;
//! there is no shared base carrying behavior.

use crate::exchange::Exchange;
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Raised when a one-directional endpoint is asked for the unsupported
/// direction. Fatal at route construction.
#[derive(Debug, Clone)]
pub struct UnsupportedOperationError {
    uri: String,
    operation: &'static str,
}

impl UnsupportedOperationError {
    pub fn producer(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            operation: "producer",
        }
    }

    pub fn consumer(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            operation: "consumer",
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }
}

impl Display for UnsupportedOperationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "endpoint {} cannot create a {}", self.uri, self.operation)
    }
}

impl Error for UnsupportedOperationError {}

/// Endpoint resource lifecycle failures.
#[derive(Debug, Clone)]
pub struct ResourceError {
    message: String,
}

impl ResourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for ResourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for ResourceError {}

/// The entry point a consumer hands freshly-built exchanges to.
///
/// A route's compiled pipeline implements this; the consumer invokes it once
/// per received external input.
#[async_trait]
pub trait ExchangeHandler: Send + Sync {
    async fn handle(&self, exchange: &mut Exchange);
}

/// One resolved transport address plus options.
///
/// Endpoints are shared across routes; the endpoint, not any single route,
/// owns the underlying resource. `start`/`stop` must be idempotent.
#[async_trait]
pub trait Endpoint: Send + Sync {
    /// Canonical configuration string this endpoint was resolved from.
    fn uri(&self) -> &str;

    fn create_producer(&self) -> Result<Arc<dyn Producer>, UnsupportedOperationError>;

    fn create_consumer(
        &self,
        handler: Arc<dyn ExchangeHandler>,
    ) -> Result<Arc<dyn Consumer>, UnsupportedOperationError>;

    /// Acquires the underlying resource. Repeated start is a no-op.
    async fn start(&self) -> Result<(), ResourceError> {
        Ok(())
    }

    /// Releases the underlying resource. Repeated stop is a no-op.
    async fn stop(&self) -> Result<(), ResourceError> {
        Ok(())
    }
}

/// Sends one exchange per invocation against the transport.
///
/// On success the exchange's output message may be populated and no failure
/// is set. On transport error the failure field is set as data; the error
/// never propagates past this boundary. Deferred completion is expressed
/// through the returned future: resolving before first poll signals
/// "already done", resolving later signals completion from another execution
/// context. Either way the future completes exactly once by construction,
/// and callers must handle both without assuming which occurred.
#[async_trait]
pub trait Producer: Send + Sync {
    async fn process(&self, exchange: &mut Exchange);
}

/// Owns one background listening activity originating exchanges.
///
/// At most one active listening activity per started consumer instance.
/// `suspend` pauses consumption while retaining the underlying resource;
/// `stop` releases the listening registration.
#[async_trait]
pub trait Consumer: Send + Sync {
    async fn start(&self) -> Result<(), ResourceError>;

    async fn stop(&self) -> Result<(), ResourceError>;

    async fn suspend(&self) -> Result<(), ResourceError>;

    async fn resume(&self) -> Result<(), ResourceError>;
}
