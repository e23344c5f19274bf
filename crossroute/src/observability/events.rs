//! Canonical structured event names used across `crossroute`.

// Resolution and cache events.
pub const ENDPOINT_RESOLVE_START: &str = "endpoint_resolve_start";
pub const ENDPOINT_RESOLVE_FAILED: &str = "endpoint_resolve_failed";
pub const ENDPOINT_CACHE_HIT: &str = "endpoint_cache_hit";
pub const ENDPOINT_CACHE_INSERT: &str = "endpoint_cache_insert";

// Route lifecycle events.
pub const ROUTE_START_OK: &str = "route_start_ok";
pub const ROUTE_START_FAILED: &str = "route_start_failed";
pub const ROUTE_STOP_OK: &str = "route_stop_ok";
pub const ROUTE_SUSPEND_OK: &str = "route_suspend_ok";
pub const ROUTE_RESUME_OK: &str = "route_resume_ok";
pub const ROUTE_STOP_DRAIN_TIMEOUT: &str = "route_stop_drain_timeout";

// Endpoint service ownership events.
pub const ENDPOINT_SERVICE_START: &str = "endpoint_service_start";
pub const ENDPOINT_SERVICE_STOP: &str = "endpoint_service_stop";
pub const ENDPOINT_SERVICE_REUSE: &str = "endpoint_service_reuse";

// Exchange runtime events.
pub const EXCHANGE_COMPLETE: &str = "exchange_complete";
pub const EXCHANGE_FAILED: &str = "exchange_failed";
pub const EXCHANGE_FAILURE_HANDLED: &str = "exchange_failure_handled";
pub const CHOICE_NO_MATCH: &str = "choice_no_match";

// Management events.
pub const MANAGEMENT_REGISTER: &str = "management_register";
pub const MANAGEMENT_DEREGISTER: &str = "management_deregister";
