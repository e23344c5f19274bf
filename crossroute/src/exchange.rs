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

//! One unit of routing work: the [`Exchange`] and its [`Message`]s.

use std::any::Any;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque typed message payload.
pub type BodyValue = Box<dyn Any + Send + Sync>;

/// Header value kinds carried on a [`Message`].
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl Display for HeaderValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            HeaderValue::Str(value) => write!(f, "{value}"),
            HeaderValue::Int(value) => write!(f, "{value}"),
            HeaderValue::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        HeaderValue::Str(value.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        HeaderValue::Str(value)
    }
}

impl From<i64> for HeaderValue {
    fn from(value: i64) -> Self {
        HeaderValue::Int(value)
    }
}

impl From<bool> for HeaderValue {
    fn from(value: bool) -> Self {
        HeaderValue::Bool(value)
    }
}

/// Body plus uniquely-named headers. Header name casing is owned by the
/// protocol adapter; the core treats names as opaque keys.
#[derive(Default)]
pub struct Message {
    body: Option<BodyValue>,
    headers: HashMap<String, HeaderValue>,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body<T: Any + Send + Sync>(body: T) -> Self {
        let mut message = Self::default();
        message.set_body(body);
        message
    }

    pub fn set_body<T: Any + Send + Sync>(&mut self, body: T) {
        self.body = Some(Box::new(body));
    }

    pub fn clear_body(&mut self) {
        self.body = None;
    }

    pub fn body(&self) -> Option<&BodyValue> {
        self.body.as_ref()
    }

    /// Borrows the body as `T` without conversion.
    pub fn body_as<T: Any>(&self) -> Option<&T> {
        self.body.as_deref().and_then(|body| body.downcast_ref())
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<HeaderValue>) {
        self.headers.insert(name.into(), value.into());
    }

    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers.get(name)
    }

    pub fn headers(&self) -> &HashMap<String, HeaderValue> {
        &self.headers
    }

    /// Copies headers into a fresh message, leaving the body behind.
    pub fn clone_headers(&self) -> HashMap<String, HeaderValue> {
        self.headers.clone()
    }
}

/// A transport error recorded on an exchange during processing.
///
/// Failures are data, not propagating faults: downstream failure handlers
/// inspect and act on them, and one failing exchange never corrupts siblings.
#[derive(Debug, Clone)]
pub struct TransportFailure {
    message: String,
}

impl TransportFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for TransportFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for TransportFailure {}

/// One in-flight unit of routing work.
///
/// The exchange is mutated in place as it flows through a route, so every
/// processing step sees the cumulative effect of prior steps. Identity is
/// unique per routing attempt.
pub struct Exchange {
    id: Uuid,
    input: Message,
    output: Option<Message>,
    failure: Option<TransportFailure>,
}

impl Exchange {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            input: Message::new(),
            output: None,
            failure: None,
        }
    }

    pub fn with_body<T: Any + Send + Sync>(body: T) -> Self {
        let mut exchange = Self::new();
        exchange.input.set_body(body);
        exchange
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn input(&self) -> &Message {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut Message {
        &mut self.input
    }

    pub fn output(&self) -> Option<&Message> {
        self.output.as_ref()
    }

    pub fn set_output(&mut self, message: Message) {
        self.output = Some(message);
    }

    /// The message a processing step should read: the output once a
    /// request-reply producer populated it, else the input.
    pub fn current(&self) -> &Message {
        self.output.as_ref().unwrap_or(&self.input)
    }

    pub fn current_mut(&mut self) -> &mut Message {
        self.output.as_mut().unwrap_or(&mut self.input)
    }

    pub fn failure(&self) -> Option<&TransportFailure> {
        self.failure.as_ref()
    }

    pub fn set_failure(&mut self, failure: TransportFailure) {
        self.failure = Some(failure);
    }

    pub fn clear_failure(&mut self) {
        self.failure = None;
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

impl Default for Exchange {
    fn default() -> Self {
        Self::new()
    }
}
