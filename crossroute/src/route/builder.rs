//! Route builder DSL: `from(...)`, processing steps, branches, `to(...)`.

use crate::exchange::{Exchange, HeaderValue};
use crate::route::CompletionListener;
use crate::runtime::{FnProcessor, Processor};
use std::any::Any;
use std::sync::Arc;

/// Predicate evaluated against the current exchange by a choice branch.
pub type Predicate = Arc<dyn Fn(&Exchange) -> bool + Send + Sync>;

/// One declared processing step, compiled by the routing context.
pub(crate) enum StepDefinition {
    Process(Arc<dyn Processor>),
    To(String),
    Choice(ChoiceDefinition),
}

pub(crate) struct ChoiceDefinition {
    pub(crate) branches: Vec<(Predicate, Vec<StepDefinition>)>,
    pub(crate) otherwise: Option<Vec<StepDefinition>>,
}

/// Ordered sequence of steps shared by routes, choice branches, and failure
/// handlers.
#[derive(Default)]
pub struct ChainBuilder {
    steps: Vec<StepDefinition>,
}

impl ChainBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process(mut self, processor: impl Processor + 'static) -> Self {
        self.steps.push(StepDefinition::Process(Arc::new(processor)));
        self
    }

    pub fn process_fn(mut self, f: impl Fn(&mut Exchange) + Send + Sync + 'static) -> Self {
        self.steps
            .push(StepDefinition::Process(Arc::new(FnProcessor::new(f))));
        self
    }

    /// Replaces the current message body with the computed value.
    pub fn set_body<T, F>(self, f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Exchange) -> T + Send + Sync + 'static,
    {
        self.process_fn(move |exchange| {
            let body = f(exchange);
            exchange.current_mut().set_body(body);
        })
    }

    /// Sets a header on the current message from the computed value.
    pub fn set_header<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Exchange) -> HeaderValue + Send + Sync + 'static,
    {
        let name = name.into();
        self.process_fn(move |exchange| {
            let value = f(exchange);
            exchange.current_mut().set_header(name.clone(), value);
        })
    }

    /// Adds a terminal producer step addressed by configuration string.
    pub fn to(mut self, uri: impl Into<String>) -> Self {
        self.steps.push(StepDefinition::To(uri.into()));
        self
    }

    /// Adds a branch step. Branches are evaluated first-match-wins over the
    /// declared order, falling back to the `otherwise` chain when none match.
    pub fn choice(mut self, build: impl FnOnce(ChoiceBuilder) -> ChoiceBuilder) -> Self {
        let choice = build(ChoiceBuilder::default());
        self.steps.push(StepDefinition::Choice(ChoiceDefinition {
            branches: choice.branches,
            otherwise: choice.otherwise,
        }));
        self
    }

    pub(crate) fn into_steps(self) -> Vec<StepDefinition> {
        self.steps
    }
}

/// Builder for one `choice` step.
#[derive(Default)]
pub struct ChoiceBuilder {
    branches: Vec<(Predicate, Vec<StepDefinition>)>,
    otherwise: Option<Vec<StepDefinition>>,
}

impl ChoiceBuilder {
    pub fn when(
        mut self,
        predicate: impl Fn(&Exchange) -> bool + Send + Sync + 'static,
        build: impl FnOnce(ChainBuilder) -> ChainBuilder,
    ) -> Self {
        let chain = build(ChainBuilder::new());
        self.branches
            .push((Arc::new(predicate), chain.into_steps()));
        self
    }

    pub fn otherwise(mut self, build: impl FnOnce(ChainBuilder) -> ChainBuilder) -> Self {
        let chain = build(ChainBuilder::new());
        self.otherwise = Some(chain.into_steps());
        self
    }
}

/// Declares one route: exactly one consumer entry plus an ordered step chain.
pub struct RouteBuilder {
    pub(crate) from_uri: String,
    pub(crate) route_id: Option<String>,
    pub(crate) chain: ChainBuilder,
    pub(crate) on_failure: Option<ChainBuilder>,
    pub(crate) completion: Option<Arc<dyn CompletionListener>>,
}

impl RouteBuilder {
    pub fn from(uri: impl Into<String>) -> Self {
        Self {
            from_uri: uri.into(),
            route_id: None,
            chain: ChainBuilder::new(),
            on_failure: None,
            completion: None,
        }
    }

    /// Explicit route identifier; generated (`route-N`) when unset.
    pub fn route_id(mut self, id: impl Into<String>) -> Self {
        self.route_id = Some(id.into());
        self
    }

    pub fn process(mut self, processor: impl Processor + 'static) -> Self {
        self.chain = self.chain.process(processor);
        self
    }

    pub fn process_fn(mut self, f: impl Fn(&mut Exchange) + Send + Sync + 'static) -> Self {
        self.chain = self.chain.process_fn(f);
        self
    }

    pub fn set_body<T, F>(mut self, f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Exchange) -> T + Send + Sync + 'static,
    {
        self.chain = self.chain.set_body(f);
        self
    }

    pub fn set_header<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Exchange) -> HeaderValue + Send + Sync + 'static,
    {
        self.chain = self.chain.set_header(name, f);
        self
    }

    pub fn to(mut self, uri: impl Into<String>) -> Self {
        self.chain = self.chain.to(uri);
        self
    }

    pub fn choice(mut self, build: impl FnOnce(ChoiceBuilder) -> ChoiceBuilder) -> Self {
        self.chain = self.chain.choice(build);
        self
    }

    /// Failure-handling continuation: runs when a step records a failure,
    /// instead of the remaining normal steps.
    pub fn on_failure(mut self, build: impl FnOnce(ChainBuilder) -> ChainBuilder) -> Self {
        self.on_failure = Some(build(ChainBuilder::new()));
        self
    }

    /// Completion observer invoked once per exchange after the chain ends.
    pub fn on_completion(mut self, listener: impl CompletionListener + 'static) -> Self {
        self.completion = Some(Arc::new(listener));
        self
    }
}
