//! Control plane: route lifecycle orchestration and refcounted endpoint
//! service ownership.

mod endpoint_identity;
mod route_controller;
mod service_pool;

pub use route_controller::{LifecycleError, RouteState, StopPolicy};
pub(crate) use route_controller::{RouteController, RouteRuntime};
pub(crate) use service_pool::ServicePool;
