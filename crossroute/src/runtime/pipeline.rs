//! Compiled route pipeline and exchange propagation.

use crate::endpoint::{ExchangeHandler, Producer};
use crate::exchange::{Exchange, TransportFailure};
use crate::observability::{events, fields};
use crate::route::{CompletionListener, Predicate};
use crate::runtime::{InflightTracker, Processor};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::{debug, trace};

const COMPONENT: &str = "pipeline";

/// One compiled processing step.
pub(crate) enum Step {
    Process(Arc<dyn Processor>),
    Produce {
        uri: String,
        producer: Arc<dyn Producer>,
    },
    Choice {
        branches: Vec<(Predicate, Vec<Step>)>,
        fallback: Option<Vec<Step>>,
    },
}

/// A route's compiled chain. Implements [`ExchangeHandler`] so the route's
/// consumer can hand freshly-built exchanges straight to it.
pub(crate) struct Pipeline {
    route_id: String,
    steps: Vec<Step>,
    on_failure: Option<Vec<Step>>,
    completion: Option<Arc<dyn CompletionListener>>,
    inflight: InflightTracker,
}

impl Pipeline {
    pub(crate) fn new(
        route_id: String,
        steps: Vec<Step>,
        on_failure: Option<Vec<Step>>,
        completion: Option<Arc<dyn CompletionListener>>,
    ) -> Self {
        Self {
            route_id,
            steps,
            on_failure,
            completion,
            inflight: InflightTracker::new(),
        }
    }

    pub(crate) fn inflight(&self) -> &InflightTracker {
        &self.inflight
    }
}

/// Runs steps in declared order. When `skip_on_failure` is set, a recorded
/// failure short-circuits the remaining steps; failure-handling chains run
/// with it unset so they can inspect and act on the failed exchange.
fn run_steps<'a>(
    steps: &'a [Step],
    exchange: &'a mut Exchange,
    skip_on_failure: bool,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        for step in steps {
            if skip_on_failure && exchange.is_failed() {
                return;
            }
            match step {
                Step::Process(processor) => processor.process(exchange).await,
                Step::Produce { uri, producer } => {
                    trace!(
                        component = COMPONENT,
                        uri = uri.as_str(),
                        exchange_id = %fields::format_exchange_id(exchange),
                        "handing exchange to producer"
                    );
                    producer.process(exchange).await
                }
                Step::Choice { branches, fallback } => {
                    run_choice(branches, fallback.as_deref(), exchange, skip_on_failure).await
                }
            }
        }
    })
}

/// First matching branch over declared order wins; `otherwise` catches the
/// rest; no match and no `otherwise` fails the exchange.
async fn run_choice(
    branches: &[(Predicate, Vec<Step>)],
    fallback: Option<&[Step]>,
    exchange: &mut Exchange,
    skip_on_failure: bool,
) {
    for (predicate, branch) in branches {
        if predicate(exchange) {
            run_steps(branch, exchange, skip_on_failure).await;
            return;
        }
    }
    if let Some(fallback) = fallback {
        run_steps(fallback, exchange, skip_on_failure).await;
        return;
    }
    debug!(
        event = events::CHOICE_NO_MATCH,
        component = COMPONENT,
        exchange_id = %fields::format_exchange_id(exchange),
        "no branch matched and no otherwise configured"
    );
    exchange.set_failure(TransportFailure::new(
        "no matching branch in choice and no otherwise configured",
    ));
}

#[async_trait]
impl ExchangeHandler for Pipeline {
    async fn handle(&self, exchange: &mut Exchange) {
        self.inflight.enter();

        run_steps(&self.steps, exchange, true).await;

        if exchange.is_failed() {
            if let Some(failure_steps) = &self.on_failure {
                debug!(
                    event = events::EXCHANGE_FAILURE_HANDLED,
                    component = COMPONENT,
                    route_id = %self.route_id,
                    exchange_id = %fields::format_exchange_id(exchange),
                    err = %fields::format_failure(exchange),
                    "transferring to failure continuation"
                );
                run_steps(failure_steps, exchange, false).await;
            }
        }

        if exchange.is_failed() {
            debug!(
                event = events::EXCHANGE_FAILED,
                component = COMPONENT,
                route_id = %self.route_id,
                exchange_id = %fields::format_exchange_id(exchange),
                err = %fields::format_failure(exchange),
                "exchange completed in failed state"
            );
        } else {
            debug!(
                event = events::EXCHANGE_COMPLETE,
                component = COMPONENT,
                route_id = %self.route_id,
                exchange_id = %fields::format_exchange_id(exchange),
                "exchange completed"
            );
        }

        if let Some(completion) = &self.completion {
            completion.on_complete(exchange);
        }

        self.inflight.exit();
    }
}
