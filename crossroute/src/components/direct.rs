//! Synchronous in-memory endpoint: a producer hands exchanges straight to
//! the consumer started on the same endpoint.

use crate::component::{Component, ComponentSetup, ResolutionError};
use crate::config::EndpointUri;
use crate::endpoint::{
    Consumer, Endpoint, ExchangeHandler, Producer, ResourceError, UnsupportedOperationError,
};
use crate::exchange::{Exchange, TransportFailure};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Component for the `direct` scheme. Takes no parameters.
pub struct DirectComponent;

impl Component for DirectComponent {
    fn create_endpoint(
        &self,
        uri: &mut EndpointUri,
        _setup: &ComponentSetup,
    ) -> Result<Arc<dyn Endpoint>, ResolutionError> {
        Ok(Arc::new(DirectEndpoint {
            uri: uri.canonical().to_string(),
            state: Arc::new(DirectState::default()),
        }))
    }
}

#[derive(Default)]
struct DirectState {
    handler: Mutex<Option<Arc<dyn ExchangeHandler>>>,
    suspended: AtomicBool,
}

struct DirectEndpoint {
    uri: String,
    state: Arc<DirectState>,
}

impl Endpoint for DirectEndpoint {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn create_producer(&self) -> Result<Arc<dyn Producer>, UnsupportedOperationError> {
        Ok(Arc::new(DirectProducer {
            uri: self.uri.clone(),
            state: self.state.clone(),
        }))
    }

    fn create_consumer(
        &self,
        handler: Arc<dyn ExchangeHandler>,
    ) -> Result<Arc<dyn Consumer>, UnsupportedOperationError> {
        Ok(Arc::new(DirectConsumer {
            uri: self.uri.clone(),
            state: self.state.clone(),
            handler,
        }))
    }
}

struct DirectProducer {
    uri: String,
    state: Arc<DirectState>,
}

#[async_trait]
impl Producer for DirectProducer {
    async fn process(&self, exchange: &mut Exchange) {
        if self.state.suspended.load(Ordering::Acquire) {
            exchange.set_failure(TransportFailure::new(format!(
                "consumer on {} is suspended",
                self.uri
            )));
            return;
        }
        // Clone out of the slot so the lock is not held across the handler.
        let handler = self.state.handler.lock().expect("direct slot poisoned").clone();
        match handler {
            Some(handler) => handler.handle(exchange).await,
            None => exchange.set_failure(TransportFailure::new(format!(
                "no consumer available on {}",
                self.uri
            ))),
        }
    }
}

struct DirectConsumer {
    uri: String,
    state: Arc<DirectState>,
    handler: Arc<dyn ExchangeHandler>,
}

#[async_trait]
impl Consumer for DirectConsumer {
    async fn start(&self) -> Result<(), ResourceError> {
        let mut slot = self.state.handler.lock().expect("direct slot poisoned");
        if let Some(existing) = slot.as_ref() {
            if Arc::ptr_eq(existing, &self.handler) {
                return Ok(());
            }
            return Err(ResourceError::new(format!(
                "a consumer is already started on {}",
                self.uri
            )));
        }
        *slot = Some(self.handler.clone());
        self.state.suspended.store(false, Ordering::Release);
        Ok(())
    }

    async fn stop(&self) -> Result<(), ResourceError> {
        let mut slot = self.state.handler.lock().expect("direct slot poisoned");
        if let Some(existing) = slot.as_ref() {
            if Arc::ptr_eq(existing, &self.handler) {
                *slot = None;
            }
        }
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
