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

//! In-core components: synchronous in-memory dispatch (`direct`) and the
//! assertion sink used as the verification surface in tests (`mock`).

mod direct;
mod mock;

pub use direct::DirectComponent;
pub use mock::{MockComponent, MockEndpoint, ReceivedExchange};
