//! Exchange runtime: processor capability and compiled pipelines.

mod inflight;
mod pipeline;

pub(crate) use inflight::InflightTracker;
pub(crate) use pipeline::{Pipeline, Step};

use crate::exchange::Exchange;
use async_trait::async_trait;

/// One processing step in a route chain.
///
/// Steps consume the exchange in place and may mutate its message. A step
/// that needs to signal a transport-level problem records it with
/// [`Exchange::set_failure`] rather than panicking.
#[async_trait]
pub trait Processor: Send + Sync {
    async fn process(&self, exchange: &mut Exchange);
}

/// Adapts a synchronous closure into a [`Processor`].
pub(crate) struct FnProcessor<F> {
    f: F,
}

impl<F> FnProcessor<F> {
    pub(crate) fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> Processor for FnProcessor<F>
where
    F: Fn(&mut Exchange) + Send + Sync,
{
    async fn process(&self, exchange: &mut Exchange) {
        (self.f)(exchange)
    }
}
