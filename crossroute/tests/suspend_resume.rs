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

mod support;

use crossroute::{RouteBuilder, RouteState, RoutingContext, StopPolicy};
use std::sync::Arc;
use std::time::Duration;
use support::make_context;

const ASSERT_WAIT: Duration = Duration::from_secs(1);

#[tokio::test(flavor = "multi_thread")]
async fn suspension_pauses_input_while_retaining_the_resource() {
    let (context, mock) = make_context("suspend-basic");
    let sink = mock.endpoint("result");

    context
        .add_route(
            RouteBuilder::from("direct:start")
                .route_id("route-1")
                .to("mock:result"),
        )
        .await
        .expect("route");
    context.start().await.expect("start");
    let started_endpoints = context.started_endpoint_count().await;

    context.suspend_route("route-1").await.expect("suspend");
    assert_eq!(
        context.route_state("route-1").await.expect("state"),
        RouteState::Suspended
    );
    // Suspension is not a stop: every endpoint resource stays acquired.
    assert_eq!(context.started_endpoint_count().await, started_endpoints);

    let rejected = context
        .send_body("direct:start", "while suspended".to_string())
        .await
        .expect("send");
    assert!(rejected.is_failed());
    assert_eq!(sink.received_count(), 0);

    context.resume_route("route-1").await.expect("resume");
    assert_eq!(
        context.route_state("route-1").await.expect("state"),
        RouteState::Started
    );

    sink.expect_bodies_received(&["after resume"]);
    let delivered = context
        .send_body("direct:start", "after resume".to_string())
        .await
        .expect("send");
    assert!(!delivered.is_failed());
    sink.assert_satisfied(ASSERT_WAIT).await;

    context.stop().await.expect("stop");
}

#[tokio::test(flavor = "multi_thread")]
async fn suspend_and_resume_are_idempotent_at_the_edges() {
    let (context, _) = make_context("suspend-idempotent");
    context
        .add_route(
            RouteBuilder::from("direct:start")
                .route_id("route-1")
                .to("mock:result"),
        )
        .await
        .expect("route");
    context.start().await.expect("start");

    // Resume on a started route is a no-op; suspend from stopped is invalid.
    assert!(context.resume_route("route-1").await.is_ok());
    context.suspend_route("route-1").await.expect("suspend");
    assert!(context.suspend_route("route-1").await.is_ok());

    context.stop_route("route-1").await.expect("stop");
    assert!(context.suspend_route("route-1").await.is_err());
    assert!(context.resume_route("route-1").await.is_err());

    context.stop().await.expect("stop");
}

#[tokio::test(flavor = "multi_thread")]
async fn a_suspended_route_stops_cleanly() {
    let (context, _) = make_context("suspend-stop");
    context
        .add_route(
            RouteBuilder::from("direct:start")
                .route_id("route-1")
                .to("mock:result"),
        )
        .await
        .expect("route");
    context.start().await.expect("start");
    context.suspend_route("route-1").await.expect("suspend");

    context.stop_route("route-1").await.expect("stop");
    assert_eq!(
        context.route_state("route-1").await.expect("state"),
        RouteState::Stopped
    );
    assert_eq!(context.started_endpoint_count().await, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn stop_waits_for_in_flight_work_up_to_the_grace_period() {
    support::init_logging();
    let context = Arc::new(RoutingContext::with_stop_policy(
        "suspend-drain",
        StopPolicy {
            grace: Duration::from_millis(50),
        },
    ));
    let mock = crossroute::components::MockComponent::new();
    context.register_component(
        "direct",
        Arc::new(crossroute::components::DirectComponent),
    );
    context.register_component("mock", mock.clone());

    context
        .add_route(
            RouteBuilder::from("direct:slow")
                .route_id("route-1")
                .process_fn(|_| std::thread::sleep(Duration::from_millis(10)))
                .to("mock:result"),
        )
        .await
        .expect("route");
    context.start().await.expect("start");

    let sender = context.clone();
    let inflight = tokio::spawn(async move {
        sender
            .send_body("direct:slow", "in flight".to_string())
            .await
            .expect("send")
    });
    tokio::task::yield_now().await;

    // Stop succeeds whether the in-flight exchange drains inside the grace
    // period or gets abandoned after it.
    context.stop_route("route-1").await.expect("stop");
    assert_eq!(
        context.route_state("route-1").await.expect("state"),
        RouteState::Stopped
    );

    // The in-flight send still completes; depending on timing it either
    // delivered before the consumer detached or carries a failure.
    let _exchange = inflight.await.expect("join");
}
