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

//! Component factories and the scheme registry consulted at resolution time.

use crate::config::{ConfigurationError, EndpointUri};
use crate::convert::TypeConverterRegistry;
use crate::endpoint::Endpoint;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, RwLock};

/// Endpoint-resolution failures. Fatal to the caller building the route.
#[derive(Debug)]
pub enum ResolutionError {
    Configuration(ConfigurationError),
    UnknownScheme(String),
    /// The component left parameters unconsumed after endpoint construction.
    UnsupportedParameters {
        scheme: String,
        names: Vec<String>,
    },
    /// Adapter-specific construction failure.
    Component(String),
}

impl Display for ResolutionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionError::Configuration(err) => write!(f, "invalid configuration: {err}"),
            ResolutionError::UnknownScheme(scheme) => {
                write!(f, "no component registered for scheme {scheme}")
            }
            ResolutionError::UnsupportedParameters { scheme, names } => write!(
                f,
                "unsupported parameters for scheme {scheme}: {}",
                names.join(", ")
            ),
            ResolutionError::Component(message) => {
                write!(f, "component failed to create endpoint: {message}")
            }
        }
    }
}

impl Error for ResolutionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ResolutionError::Configuration(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigurationError> for ResolutionError {
    fn from(err: ConfigurationError) -> Self {
        ResolutionError::Configuration(err)
    }
}

/// Collaborators a component may need while constructing an endpoint.
pub struct ComponentSetup {
    converters: Arc<TypeConverterRegistry>,
}

impl ComponentSetup {
    pub(crate) fn new(converters: Arc<TypeConverterRegistry>) -> Self {
        Self { converters }
    }

    pub fn converters(&self) -> &Arc<TypeConverterRegistry> {
        &self.converters
    }
}

/// Stateless endpoint factory bound to one scheme.
///
/// A component must `take` every parameter it understands from the passed
/// URI; the resolver reports whatever remains as unsupported.
pub trait Component: Send + Sync {
    fn create_endpoint(
        &self,
        uri: &mut EndpointUri,
        setup: &ComponentSetup,
    ) -> Result<Arc<dyn Endpoint>, ResolutionError>;
}

/// Scheme-name to component factory mapping, owned by one routing context.
///
/// Populated at startup, read-only per resolution afterwards.
pub struct ComponentRegistry {
    components: RwLock<HashMap<String, Arc<dyn Component>>>,
}

impl ComponentRegistry {
    pub(crate) fn new() -> Self {
        Self {
            components: RwLock::new(HashMap::new()),
        }
    }

    /// Binds a scheme to a component. Re-registering a scheme replaces the
    /// previous binding.
    pub fn register(&self, scheme: impl Into<String>, component: Arc<dyn Component>) {
        let mut components = self.components.write().expect("component registry poisoned");
        components.insert(scheme.into(), component);
    }

    pub fn lookup(&self, scheme: &str) -> Option<Arc<dyn Component>> {
        let components = self.components.read().expect("component registry poisoned");
        components.get(scheme).cloned()
    }

    pub fn schemes(&self) -> Vec<String> {
        let components = self.components.read().expect("component registry poisoned");
        let mut schemes: Vec<String> = components.keys().cloned().collect();
        schemes.sort();
        schemes
    }
}
