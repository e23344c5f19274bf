//! Assertion sink endpoint: records received exchanges and verifies
//! expected count/body/header patterns with a bounded wait.

use crate::component::{Component, ComponentSetup, ResolutionError};
use crate::config::EndpointUri;
use crate::convert::TypeConverterRegistry;
use crate::endpoint::{
    Consumer, Endpoint, ExchangeHandler, Producer, UnsupportedOperationError,
};
use crate::exchange::{Exchange, HeaderValue};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{timeout_at, Instant};
use uuid::Uuid;

/// Component for the `mock` scheme. Produce-only; endpoints are shared by
/// path so tests can set expectations before routes run.
pub struct MockComponent {
    endpoints: Mutex<HashMap<String, Arc<MockEndpoint>>>,
}

impl MockComponent {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            endpoints: Mutex::new(HashMap::new()),
        })
    }

    /// The mock endpoint for a path (`endpoint("result")` for `mock:result`),
    /// created on first access.
    pub fn endpoint(&self, path: &str) -> Arc<MockEndpoint> {
        let mut endpoints = self.endpoints.lock().expect("mock registry poisoned");
        endpoints
            .entry(path.to_string())
            .or_insert_with(|| Arc::new(MockEndpoint::new(format!("mock:{path}"))))
            .clone()
    }
}

impl Component for MockComponent {
    fn create_endpoint(
        &self,
        uri: &mut EndpointUri,
        setup: &ComponentSetup,
    ) -> Result<Arc<dyn Endpoint>, ResolutionError> {
        let endpoint = self.endpoint(uri.path());
        let _ = endpoint.state.converters.set(setup.converters().clone());
        Ok(endpoint)
    }
}

/// Snapshot of one exchange observed by a mock endpoint.
#[derive(Debug, Clone)]
pub struct ReceivedExchange {
    pub exchange_id: Uuid,
    pub body: Option<String>,
    pub headers: HashMap<String, HeaderValue>,
    pub failure: Option<String>,
}

#[derive(Default)]
struct Expectations {
    count: Option<usize>,
    bodies: Vec<String>,
    headers: Vec<(String, HeaderValue)>,
}

#[derive(Default)]
struct MockState {
    converters: OnceLock<Arc<TypeConverterRegistry>>,
    received: Mutex<Vec<ReceivedExchange>>,
    expectations: Mutex<Expectations>,
    arrived: Notify,
}

pub struct MockEndpoint {
    uri: String,
    state: Arc<MockState>,
}

impl MockEndpoint {
    fn new(uri: String) -> Self {
        Self {
            uri,
            state: Arc::new(MockState::default()),
        }
    }

    pub fn expect_message_count(&self, count: usize) {
        self.state
            .expectations
            .lock()
            .expect("mock expectations poisoned")
            .count = Some(count);
    }

    /// Expects these bodies, in arrival order. Implies the message count.
    pub fn expect_bodies_received(&self, bodies: &[&str]) {
        let mut expectations = self
            .state
            .expectations
            .lock()
            .expect("mock expectations poisoned");
        expectations.bodies = bodies.iter().map(|body| body.to_string()).collect();
    }

    /// Expects every received exchange to carry this header value. Implies
    /// at least one message when no count is set, so the assertion cannot
    /// pass vacuously against an empty endpoint.
    pub fn expect_header_received(&self, name: &str, value: impl Into<HeaderValue>) {
        self.state
            .expectations
            .lock()
            .expect("mock expectations poisoned")
            .headers
            .push((name.to_string(), value.into()));
    }

    pub fn received(&self) -> Vec<ReceivedExchange> {
        self.state
            .received
            .lock()
            .expect("mock received poisoned")
            .clone()
    }

    pub fn received_count(&self) -> usize {
        self.state
            .received
            .lock()
            .expect("mock received poisoned")
            .len()
    }

    pub fn reset(&self) {
        self.state
            .received
            .lock()
            .expect("mock received poisoned")
            .clear();
        *self
            .state
            .expectations
            .lock()
            .expect("mock expectations poisoned") = Expectations::default();
    }

    fn expected_count(&self) -> usize {
        let expectations = self
            .state
            .expectations
            .lock()
            .expect("mock expectations poisoned");
        let implied = usize::from(!expectations.headers.is_empty());
        expectations
            .count
            .unwrap_or(0)
            .max(expectations.bodies.len())
            .max(implied)
    }

    /// Waits up to `wait` for the expected message count, then verifies body
    /// and header expectations. Panics with a diagnostic on mismatch, like
    /// any test assertion.
    pub async fn assert_satisfied(&self, wait: Duration) {
        let deadline = Instant::now() + wait;
        let expected = self.expected_count();
        loop {
            let arrived = self.state.arrived.notified();
            if self.received_count() >= expected {
                break;
            }
            if timeout_at(deadline, arrived).await.is_err() {
                panic!(
                    "{}: expected {} messages, received {} within {:?}",
                    self.uri,
                    expected,
                    self.received_count(),
                    wait
                );
            }
        }

        let received = self.received();
        let expectations = self
            .state
            .expectations
            .lock()
            .expect("mock expectations poisoned");

        if let Some(count) = expectations.count {
            assert_eq!(received.len(), count, "{}: message count mismatch", self.uri);
        }
        for (index, expected_body) in expectations.bodies.iter().enumerate() {
            let actual = received
                .get(index)
                .unwrap_or_else(|| panic!("{}: missing message {index}", self.uri));
            assert_eq!(
                actual.body.as_deref(),
                Some(expected_body.as_str()),
                "{}: body mismatch at message {index}",
                self.uri
            );
        }
        for (name, value) in &expectations.headers {
            for (index, actual) in received.iter().enumerate() {
                assert_eq!(
                    actual.headers.get(name),
                    Some(value),
                    "{}: header {name} mismatch at message {index}",
                    self.uri
                );
            }
        }
    }
}

impl Endpoint for MockEndpoint {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn create_producer(&self) -> Result<Arc<dyn Producer>, UnsupportedOperationError> {
        Ok(Arc::new(MockProducer {
            state: self.state.clone(),
        }))
    }

    fn create_consumer(
        &self,
        _handler: Arc<dyn ExchangeHandler>,
    ) -> Result<Arc<dyn Consumer>, UnsupportedOperationError> {
        Err(UnsupportedOperationError::consumer(&self.uri))
    }
}

struct MockProducer {
    state: Arc<MockState>,
}

#[async_trait]
impl Producer for MockProducer {
    async fn process(&self, exchange: &mut Exchange) {
        let message = exchange.current();
        // Without a converter registry (endpoint never went through
        // resolution) a plain String body is still recorded as-is.
        let body = message.body().map(|body| {
            match self.state.converters.get() {
                Some(converters) => converters.convert_to::<String>(body),
                None => body.downcast_ref::<String>().cloned(),
            }
            .unwrap_or_else(|| "<opaque>".to_string())
        });
        let snapshot = ReceivedExchange {
            exchange_id: exchange.id(),
            body,
            headers: message.clone_headers(),
            failure: exchange.failure().map(|failure| failure.message().to_string()),
        };
        self.state
            .received
            .lock()
            .expect("mock received poisoned")
            .push(snapshot);
        self.state.arrived.notify_waiters();
    }
}
