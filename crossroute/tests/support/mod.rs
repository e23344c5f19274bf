use async_trait::async_trait;
use crossroute::components::{DirectComponent, MockComponent};
use crossroute::config::EndpointUri;
use crossroute::{
    Component, ComponentSetup, Consumer, Endpoint, Exchange, ExchangeHandler, Producer,
    ResolutionError, ResourceError, RoutingContext, TransportFailure, UnsupportedOperationError,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Once};
use uuid::Uuid;

static INIT: Once = Once::new();

pub(crate) fn init_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Context with the `direct`, `queue`, and `mock` schemes bound, matching
/// the smallest useful wiring for route tests.
pub(crate) fn make_context(name: &str) -> (RoutingContext, Arc<MockComponent>) {
    init_logging();
    let context = RoutingContext::new(name);
    let mock = MockComponent::new();
    context.register_component("direct", Arc::new(DirectComponent));
    context.register_component("queue", Arc::new(QueueComponent));
    context.register_component("mock", mock.clone());
    (context, mock)
}

/// Broker-style in-memory component for the `queue` scheme: like `direct`,
/// but the transport assigns a delivery id header on every send, the way a
/// real broker stamps a message id.
pub(crate) struct QueueComponent;

#[allow(dead_code)]
pub(crate) const QUEUE_ID_HEADER: &str = "queue.id";

impl Component for QueueComponent {
    fn create_endpoint(
        &self,
        uri: &mut EndpointUri,
        _setup: &ComponentSetup,
    ) -> Result<Arc<dyn Endpoint>, ResolutionError> {
        Ok(Arc::new(QueueEndpoint {
            uri: uri.canonical().to_string(),
            state: Arc::new(QueueState::default()),
        }))
    }
}

#[derive(Default)]
struct QueueState {
    handler: Mutex<Option<Arc<dyn ExchangeHandler>>>,
    suspended: AtomicBool,
}

struct QueueEndpoint {
    uri: String,
    state: Arc<QueueState>,
}

impl Endpoint for QueueEndpoint {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn create_producer(&self) -> Result<Arc<dyn Producer>, UnsupportedOperationError> {
        Ok(Arc::new(QueueProducer {
            uri: self.uri.clone(),
            state: self.state.clone(),
        }))
    }

    fn create_consumer(
        &self,
        handler: Arc<dyn ExchangeHandler>,
    ) -> Result<Arc<dyn Consumer>, UnsupportedOperationError> {
        Ok(Arc::new(QueueConsumer {
            state: self.state.clone(),
            handler,
        }))
    }
}

struct QueueProducer {
    uri: String,
    state: Arc<QueueState>,
}

#[async_trait]
impl Producer for QueueProducer {
    async fn process(&self, exchange: &mut Exchange) {
        if self.state.suspended.load(Ordering::Acquire) {
            exchange.set_failure(TransportFailure::new(format!(
                "queue {} is suspended",
                self.uri
            )));
            return;
        }
        exchange
            .current_mut()
            .set_header(QUEUE_ID_HEADER, format!("ID:{}", Uuid::new_v4()));
        let handler = self.state.handler.lock().expect("queue slot poisoned").clone();
        match handler {
            Some(handler) => handler.handle(exchange).await,
            None => exchange.set_failure(TransportFailure::new(format!(
                "no consumer available on {}",
                self.uri
            ))),
        }
    }
}

struct QueueConsumer {
    state: Arc<QueueState>,
    handler: Arc<dyn ExchangeHandler>,
}

#[async_trait]
impl Consumer for QueueConsumer {
    async fn start(&self) -> Result<(), ResourceError> {
        let mut slot = self.state.handler.lock().expect("queue slot poisoned");
        *slot = Some(self.handler.clone());
        self.state.suspended.store(false, Ordering::Release);
        Ok(())
    }

    async fn stop(&self) -> Result<(), ResourceError> {
        let mut slot = self.state.handler.lock().expect("queue slot poisoned");
        *slot = None;
        Ok(())
    }

    async fn suspend(&self) -> Result<(), ResourceError> {
        self.state.suspended.store(true, Ordering::Release);
        Ok(())
    }

    async fn resume(&self) -> Result<(), ResourceError> {
        self.state.suspended.store(false, Ordering::Release);
        Ok(())
    }
}
