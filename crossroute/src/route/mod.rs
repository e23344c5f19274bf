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

//! Declarative route graph: one consumer entry, an ordered step chain, and
//! zero or more terminal producers.

mod builder;
pub use builder::{ChainBuilder, ChoiceBuilder, Predicate, RouteBuilder};
pub(crate) use builder::StepDefinition;

use crate::exchange::Exchange;

/// Observer notified once per exchange after the chain finishes, whether the
/// exchange completed cleanly or in failed state.
pub trait CompletionListener: Send + Sync {
    fn on_complete(&self, exchange: &Exchange);
}

impl<F> CompletionListener for F
where
    F: Fn(&Exchange) + Send + Sync,
{
    fn on_complete(&self, exchange: &Exchange) {
        self(exchange)
    }
}
