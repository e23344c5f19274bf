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

//! Endpoint configuration-string parsing and canonical identity.
//!
//! A configuration string has the shape `scheme:path?key=value&key=value`.
//! Placeholder tokens (`{{name}}`) must be resolved through
//! [`resolve_placeholders`][placeholders::resolve_placeholders] before parsing.

mod placeholders;
pub use placeholders::{resolve_placeholders, PropertySource};

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Configuration-string failures surfaced at resolution time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The string carries no `scheme:` prefix.
    MissingScheme(String),
    /// A query token is not a `key=value` pair, or a typed parameter failed to parse.
    InvalidParameter { name: String, value: String },
    /// A `{{name}}` token had no value in the supplied property source.
    UnresolvedPlaceholder(String),
}

impl Display for ConfigurationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigurationError::MissingScheme(uri) => {
                write!(f, "configuration string has no scheme: {uri}")
            }
            ConfigurationError::InvalidParameter { name, value } => {
                write!(f, "invalid parameter {name}={value}")
            }
            ConfigurationError::UnresolvedPlaceholder(name) => {
                write!(f, "unresolved placeholder {{{{{name}}}}}")
            }
        }
    }
}

impl Error for ConfigurationError {}

/// Ordered, consumable parameter mapping parsed from the query part.
///
/// Components `take` every parameter they understand; whatever remains after
/// endpoint construction is reported as unsupported by the resolver.
#[derive(Debug, Clone, Default)]
pub struct ParameterMap {
    entries: Vec<(String, String)>,
}

impl ParameterMap {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Remaining parameter names, in declaration order, deduplicated.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for (name, _) in &self.entries {
            if !names.iter().any(|existing| existing == name) {
                names.push(name.clone());
            }
        }
        names
    }

    /// Consumes a single-valued parameter. Duplicate keys: last occurrence wins.
    pub fn take(&mut self, name: &str) -> Option<String> {
        let mut found = None;
        self.entries.retain(|(key, value)| {
            if key == name {
                found = Some(value.clone());
                false
            } else {
                true
            }
        });
        found
    }

    /// Consumes a multi-valued parameter, accumulating every occurrence in order.
    pub fn take_all(&mut self, name: &str) -> Vec<String> {
        let mut values = Vec::new();
        self.entries.retain(|(key, value)| {
            if key == name {
                values.push(value.clone());
                false
            } else {
                true
            }
        });
        values
    }

    /// Consumes a boolean parameter (`true`/`false`).
    pub fn take_bool(&mut self, name: &str) -> Result<Option<bool>, ConfigurationError> {
        match self.take(name) {
            None => Ok(None),
            Some(value) => match value.as_str() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                _ => Err(ConfigurationError::InvalidParameter {
                    name: name.to_string(),
                    value,
                }),
            },
        }
    }

    /// Consumes an unsigned integer parameter.
    pub fn take_usize(&mut self, name: &str) -> Result<Option<usize>, ConfigurationError> {
        match self.take(name) {
            None => Ok(None),
            Some(value) => value.parse::<usize>().map(Some).map_err(|_| {
                ConfigurationError::InvalidParameter {
                    name: name.to_string(),
                    value,
                }
            }),
        }
    }
}

/// A parsed endpoint configuration string.
///
/// Two strings that differ only in parameter order produce the same
/// [`canonical`][EndpointUri::canonical] form and therefore the same cache key.
#[derive(Debug, Clone)]
pub struct EndpointUri {
    scheme: String,
    path: String,
    parameters: ParameterMap,
    canonical: String,
}

impl EndpointUri {
    /// Parses `scheme:path?k=v&k=v` with percent-decoded keys and values.
    pub fn parse(uri: &str) -> Result<Self, ConfigurationError> {
        let Some((scheme, rest)) = uri.split_once(':') else {
            return Err(ConfigurationError::MissingScheme(uri.to_string()));
        };
        if scheme.is_empty() {
            return Err(ConfigurationError::MissingScheme(uri.to_string()));
        }

        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rest, None),
        };

        let mut entries: Vec<(String, String)> = Vec::new();
        if let Some(query) = query {
            for token in query.split('&').filter(|token| !token.is_empty()) {
                if !token.contains('=') {
                    return Err(ConfigurationError::InvalidParameter {
                        name: token.to_string(),
                        value: String::new(),
                    });
                }
                // form_urlencoded decodes both halves of the single pair.
                if let Some((key, value)) = form_urlencoded::parse(token.as_bytes()).next() {
                    entries.push((key.into_owned(), value.into_owned()));
                }
            }
        }

        let canonical = Self::canonicalize(scheme, path, &entries);

        Ok(Self {
            scheme: scheme.to_string(),
            path: path.to_string(),
            parameters: ParameterMap { entries },
            canonical,
        })
    }

    fn canonicalize(scheme: &str, path: &str, entries: &[(String, String)]) -> String {
        if entries.is_empty() {
            return format!("{scheme}:{path}");
        }
        let mut sorted: Vec<&(String, String)> = entries.iter().collect();
        // Stable sort keeps duplicate-key values in declaration order.
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        let query: Vec<String> = sorted
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        format!("{scheme}:{path}?{}", query.join("&"))
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn parameters(&self) -> &ParameterMap {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut ParameterMap {
        &mut self.parameters
    }

    /// Canonical identity string: scheme, path, and parameters sorted by key.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }
}

impl Display for EndpointUri {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical)
    }
}
